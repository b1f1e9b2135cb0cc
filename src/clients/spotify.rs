use std::collections::HashMap;

use log::debug;
use rspotify::{AuthCodeSpotify, Config, Credentials, OAuth, Token, prelude::*, scopes};
use url::Url;

use crate::clients::{
    errors::{Error, Result},
    local_storage::SessionToken,
};

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const SETUP_DOC: &str = "README.md";

/// Spotify side of playlist creation: builds the implicit grant URL, reads the
/// token back out of the redirect and checks it against the Web API.
pub struct SpotifyClient {
    creds: Credentials,
    oauth: OAuth,
}

impl SpotifyClient {
    pub fn new(creds: Credentials, oauth: OAuth) -> Self {
        SpotifyClient { creds, oauth }
    }

    // Create a SpotifyClient from environment variables or raise a configuration error
    pub fn try_default() -> Result<Self> {
        let creds = Credentials::from_env()
        .ok_or_else(|| Error::ConfigurationError(format!("Missing RSPOTIFY_CLIENT_ID in environment variables. Check {SETUP_DOC} for details.")))?;
        let oauth = OAuth::from_env(scopes!("playlist-modify-public", "playlist-modify-private"))
        .ok_or_else(|| Error::ConfigurationError(format!("Missing RSPOTIFY_REDIRECT_URI in environment variables. Check {SETUP_DOC} for details.")))?;
        Ok(Self::new(creds, oauth))
    }

    /// URL the user must open to grant playlist access. The token comes back in
    /// the fragment of the redirect URI (`response_type=token`).
    pub fn authorize_url(&self) -> Result<String> {
        let mut scopes: Vec<&str> = self.oauth.scopes.iter().map(String::as_str).collect();
        scopes.sort_unstable();
        let scope = scopes.join(" ");
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.creds.id.as_str()),
                ("response_type", "token"),
                ("redirect_uri", self.oauth.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", self.oauth.state.as_str()),
            ],
        )?;
        Ok(url.into())
    }

    /// Extract the session token from the URL the authorization server redirected to.
    pub fn parse_redirect(&self, redirect_url: &str) -> Result<SessionToken> {
        let url = Url::parse(redirect_url.trim())
            .map_err(|e| Error::Authorization(format!("redirect URL is not valid: {e}")))?;
        let fragment = url
            .fragment()
            .ok_or_else(|| Error::Authorization("redirect URL has no fragment".into()))?;
        let params: HashMap<String, String> = url::form_urlencoded::parse(fragment.as_bytes())
            .into_owned()
            .collect();

        if let Some(error) = params.get("error") {
            return Err(Error::Authorization(error.clone()));
        }
        if params.get("state").map(String::as_str) != Some(self.oauth.state.as_str()) {
            return Err(Error::Authorization("state mismatch".into()));
        }
        let access_token = params
            .get("access_token")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authorization("redirect carries no access token".into()))?;
        let expires_in = params.get("expires_in").and_then(|s| s.parse().ok());

        debug!("Received session token, expires in {expires_in:?}s");
        Ok(SessionToken::new(access_token.as_str(), expires_in))
    }

    /// Ask the Web API who the token belongs to. Returns the display name.
    pub async fn validate_token(&self, token: &SessionToken) -> Result<Option<String>> {
        let spotify = AuthCodeSpotify::from_token_with_config(
            Token {
                access_token: token.access_token.clone(),
                ..Default::default()
            },
            self.creds.clone(),
            self.oauth.clone(),
            // implicit grant tokens carry no refresh token
            Config {
                token_refreshing: false,
                ..Default::default()
            },
        );
        let user = spotify.me().await?;
        debug!("Authenticated as user: {:?}", user.display_name);
        Ok(user.display_name)
    }
}
