use std::fmt;

use serde::{Deserialize, Serialize};

/// A recommended track as returned by the recommendation service.
///
/// Songs are compared by `name` only when deduplicating the board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub name: String,
    pub artist: String,
    /// Cover art URL. Older service versions omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Playback link
    #[serde(default)]
    pub url: String,
    /// Spotify URI, required for playlist creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} — {}", self.name, self.artist)
    }
}

/// What the user submits: a free-text mood or raw image bytes, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoodInput {
    /// Free-text mood, validated before sending
    Text(String),
    /// Image file contents, sent base64 encoded
    Image(Vec<u8>),
}

/// Body of `POST /recommend`: `{"mood": ...}` or `{"image": ...}`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendRequest {
    /// Trimmed mood text
    Mood(String),
    /// Base64 encoded image
    Image(String),
}

/// Response of `POST /recommend`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RecommendResponse {
    #[serde(default)]
    pub songs: Vec<Song>,
    /// Mood the service read out of an image or text, if it reports one
    #[serde(rename = "claudeMood", default, skip_serializing_if = "Option::is_none")]
    pub interpreted_mood: Option<String>,
}

/// A title already on the board, sent so the service can skip it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExistingTitle {
    pub title: String,
}

/// Body of `POST /similar`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SimilarRequest {
    pub title: String,
    pub artist: String,
    pub existing: Vec<ExistingTitle>,
}

impl SimilarRequest {
    /// Build a request for songs similar to `song`, excluding every title in `board`.
    pub fn for_song(song: &Song, board: &[Song]) -> Self {
        SimilarRequest {
            title: song.name.clone(),
            artist: song.artist.clone(),
            existing: board
                .iter()
                .map(|s| ExistingTitle {
                    title: s.name.clone(),
                })
                .collect(),
        }
    }
}

/// Response of `POST /similar`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SimilarResponse {
    #[serde(default)]
    pub songs: Vec<Song>,
}

/// Body of `POST /create-playlist`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub uris: Vec<String>,
}

/// Response of `POST /create-playlist`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatePlaylistResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recommend_request_uses_single_key_body() {
        let mood = serde_json::to_value(RecommendRequest::Mood("happy".into())).unwrap();
        assert_eq!(mood, json!({"mood": "happy"}));

        let image = serde_json::to_value(RecommendRequest::Image("aGk=".into())).unwrap();
        assert_eq!(image, json!({"image": "aGk="}));
    }

    #[test]
    fn song_without_image_or_uri_deserializes() {
        let song: Song = serde_json::from_value(json!({
            "name": "A",
            "artist": "X",
            "url": "https://open.spotify.com/track/1"
        }))
        .unwrap();
        assert_eq!(song.image, None);
        assert_eq!(song.uri, None);
        assert_eq!(song.to_string(), "A — X");
    }

    #[test]
    fn recommend_response_reads_interpreted_mood() {
        let res: RecommendResponse = serde_json::from_value(json!({
            "songs": [],
            "claudeMood": "chill"
        }))
        .unwrap();
        assert!(res.songs.is_empty());
        assert_eq!(res.interpreted_mood.as_deref(), Some("chill"));
    }

    #[test]
    fn similar_request_lists_board_titles() {
        let board = vec![
            Song {
                name: "A".into(),
                artist: "X".into(),
                image: None,
                url: String::new(),
                uri: None,
            },
            Song {
                name: "B".into(),
                artist: "Y".into(),
                image: None,
                url: String::new(),
                uri: None,
            },
        ];
        let req = SimilarRequest::for_song(&board[0], &board);
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({
                "title": "A",
                "artist": "X",
                "existing": [{"title": "A"}, {"title": "B"}]
            })
        );
    }
}
