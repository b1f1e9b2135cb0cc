//! Saving the board to Spotify, including the redirect-based authorization.

use log::{info, warn};

use crate::board::Moodboard;
use crate::clients::{
    errors::{Error, Result},
    local_storage::TokenStore,
    recommender::RecommendationApi,
    spotify::SpotifyClient,
};

pub struct PlaylistFlow {
    spotify: Option<SpotifyClient>,
    store: TokenStore,
}

impl PlaylistFlow {
    /// `spotify` may be absent when no client id is configured; saving then
    /// works only with a token that is already stored.
    pub fn new(spotify: Option<SpotifyClient>, store: TokenStore) -> Self {
        PlaylistFlow { spotify, store }
    }

    fn spotify(&self) -> Result<&SpotifyClient> {
        self.spotify.as_ref().ok_or_else(|| {
            Error::ConfigurationError(
                "Spotify authorization is not configured, set RSPOTIFY_CLIENT_ID and RSPOTIFY_REDIRECT_URI".into(),
            )
        })
    }

    fn authorization_required(&self) -> Result<Error> {
        Ok(Error::AuthorizationRequired {
            url: self.spotify()?.authorize_url()?,
        })
    }

    /// Create a playlist from the board with the stored token.
    ///
    /// Without a usable token this fails with [`Error::AuthorizationRequired`]
    /// carrying the URL the user has to visit.
    pub async fn save<A: RecommendationApi>(
        &self,
        board: &Moodboard<A>,
        name: &str,
    ) -> Result<String> {
        let Some(token) = self.store.load().await? else {
            return Err(self.authorization_required()?);
        };
        match board.create_playlist(&token, name).await {
            Err(Error::UnexpectedResponse { status: 401, body }) => {
                warn!("Session token was rejected: {body}");
                self.store.clear().await?;
                Err(self.authorization_required()?)
            }
            res => res,
        }
    }

    /// Finish the grant: read the token from `redirect_url`, check it against
    /// Spotify and keep it for later runs. Returns the user's display name.
    pub async fn complete_authorization(&self, redirect_url: &str) -> Result<Option<String>> {
        let spotify = self.spotify()?;
        let token = spotify.parse_redirect(redirect_url)?;
        let user = spotify.validate_token(&token).await?;
        self.store.store(&token).await?;
        info!(
            "Spotify connected as {}",
            user.as_deref().unwrap_or("unknown user")
        );
        Ok(user)
    }

    pub fn authorize_url(&self) -> Result<String> {
        self.spotify()?.authorize_url()
    }

    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await
    }
}
