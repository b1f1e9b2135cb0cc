//! The Moodboard view: the song list and the three actions that change it.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use crate::clients::{
    entities::{CreatePlaylistRequest, MoodInput, SimilarRequest, Song},
    errors::{Error, Result},
    local_storage::SessionToken,
    recommender::RecommendationApi,
};
use crate::mood;

/// Most songs a single like may add to the board.
pub const LIKE_BATCH: usize = 5;

pub const DEFAULT_PLAYLIST_NAME: &str = "Moodboard Mix";

/// Serializable view of the board, as shown to the user.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub songs: Vec<Song>,
    #[serde(rename = "claudeMood", skip_serializing_if = "Option::is_none")]
    pub interpreted_mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True only while an action is running. Actions hold `&mut Moodboard`,
    /// so a snapshot taken between actions always reports `false`.
    pub loading: bool,
}

pub struct Moodboard<A> {
    api: A,
    songs: Vec<Song>,
    interpreted_mood: Option<String>,
    last_mood: Option<String>,
    error: Option<String>,
    loading: bool,
}

impl<A: RecommendationApi> Moodboard<A> {
    pub fn new(api: A) -> Self {
        Moodboard {
            api,
            songs: Vec::new(),
            interpreted_mood: None,
            last_mood: None,
            error: None,
            loading: false,
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn interpreted_mood(&self) -> Option<&str> {
        self.interpreted_mood.as_deref()
    }

    /// Message of the last failed action, cleared when the next one starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Only observable from inside an action; between actions it is `false`.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            songs: self.songs.clone(),
            interpreted_mood: self.interpreted_mood.clone(),
            error: self.error.clone(),
            loading: self.loading,
        }
    }

    fn begin(&mut self) {
        self.error = None;
        self.loading = true;
    }

    fn finish<T>(&mut self, res: Result<T>) -> Result<T> {
        self.loading = false;
        if let Err(e) = &res {
            warn!("Moodboard action failed: {e}");
            self.error = Some(e.to_string());
        }
        res
    }

    fn song_at(&self, index: usize) -> Result<&Song> {
        self.songs.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.songs.len(),
        })
    }

    /// Replace the board with recommendations for `input`.
    ///
    /// Invalid mood text sets the error and returns without a request.
    pub async fn submit(&mut self, input: MoodInput) -> Result<()> {
        let request = match mood::to_request(&input) {
            Ok(req) => req,
            Err(e) => return self.finish(Err(e)),
        };
        self.begin();
        self.songs.clear();
        self.interpreted_mood = None;
        self.last_mood = match &input {
            MoodInput::Text(text) => Some(text.trim().to_owned()),
            MoodInput::Image(_) => None,
        };

        let res = self.api.recommend(&request).await.map(|res| {
            info!("Received {} recommendations", res.songs.len());
            self.songs = res.songs;
            self.interpreted_mood = res.interpreted_mood;
        });
        self.finish(res)
    }

    /// Append up to [`LIKE_BATCH`] songs similar to the one at `index`.
    /// Returns how many were added.
    pub async fn like(&mut self, index: usize) -> Result<usize> {
        let request = SimilarRequest::for_song(self.song_at(index)?, &self.songs);
        self.begin();
        let res = self.api.similar(&request).await.map(|res| {
            let mut seen: HashSet<String> = self.songs.iter().map(|s| s.name.clone()).collect();
            let fresh: Vec<Song> = res
                .songs
                .into_iter()
                .filter(|s| seen.insert(s.name.clone()))
                .take(LIKE_BATCH)
                .collect();
            debug!("Liked '{}', adding {} songs", request.title, fresh.len());
            let added = fresh.len();
            self.songs.extend(fresh);
            added
        });
        self.finish(res)
    }

    /// Swap the song at `index` for the first similar song not already on the board.
    /// Returns whether a replacement was found; the board length never changes.
    pub async fn dislike(&mut self, index: usize) -> Result<bool> {
        let request = SimilarRequest::for_song(self.song_at(index)?, &self.songs);
        self.begin();
        let res = self.api.similar(&request).await.map(|res| {
            let taken: HashSet<&str> = self.songs.iter().map(|s| s.name.as_str()).collect();
            let replacement = res
                .songs
                .into_iter()
                .find(|s| !taken.contains(s.name.as_str()));
            match replacement {
                Some(song) => {
                    debug!("Disliked '{}', replacing with '{}'", request.title, song.name);
                    self.songs[index] = song;
                    true
                }
                None => {
                    debug!("No replacement found for '{}'", request.title);
                    false
                }
            }
        });
        self.finish(res)
    }

    pub fn default_playlist_name(&self) -> String {
        match &self.last_mood {
            Some(mood) => format!("Moodboard: {mood}"),
            None => DEFAULT_PLAYLIST_NAME.to_owned(),
        }
    }

    /// Save every song that has a Spotify URI to a new playlist and return its URL.
    pub async fn create_playlist(&self, token: &SessionToken, name: &str) -> Result<String> {
        let uris: Vec<String> = self.songs.iter().filter_map(|s| s.uri.clone()).collect();
        if uris.is_empty() {
            return Err(Error::NothingToSave);
        }
        let request = CreatePlaylistRequest {
            name: name.to_owned(),
            uris,
        };
        let res = self
            .api
            .create_playlist(&token.access_token, &request)
            .await?;
        info!("Created playlist '{name}' with {} songs", request.uris.len());
        Ok(res.url)
    }
}
