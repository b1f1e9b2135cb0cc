//! Runtime configuration, read from the environment (and `.env`).

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use log::debug;
use url::Url;

use crate::clients::{
    errors::{Error, Result},
    local_storage::TokenStore,
    recommender::HttpRecommender,
    spotify::SpotifyClient,
};

pub const API_URL_VAR: &str = "MOODBOARD_API_URL";
pub const TIMEOUT_VAR: &str = "MOODBOARD_TIMEOUT_SECS";
pub const LISTEN_VAR: &str = "MOODBOARD_LISTEN";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LISTEN: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000));

pub struct Config {
    pub recommender: HttpRecommender,
    /// `None` when Spotify credentials are missing; playlists then need a stored token
    pub spotify: Option<SpotifyClient>,
    pub store: TokenStore,
    /// Bind address of the local view API
    pub listen: SocketAddr,
}

#[derive(Default)]
pub struct ConfigBuilder {
    api_url: Option<Url>,
    timeout: Option<Duration>,
    spotify: Option<SpotifyClient>,
    store: Option<TokenStore>,
    listen: Option<SocketAddr>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_url(mut self, url: Url) -> Self {
        self.api_url = Some(url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn spotify(mut self, spotify: SpotifyClient) -> Self {
        self.spotify = Some(spotify);
        self
    }

    pub fn store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.listen = Some(addr);
        self
    }

    pub fn build(self) -> Result<Config> {
        let api_url = match self.api_url {
            Some(url) => url,
            None => {
                let raw = std::env::var(API_URL_VAR).map_err(|_| {
                    Error::ConfigurationError(format!(
                        "{API_URL_VAR} must point at the recommendation service"
                    ))
                })?;
                Url::parse(&raw)?
            }
        };
        let timeout = match self.timeout {
            Some(t) => t,
            None => env_parsed(TIMEOUT_VAR)?.map_or(DEFAULT_TIMEOUT, Duration::from_secs),
        };
        let listen = match self.listen {
            Some(addr) => addr,
            None => env_parsed(LISTEN_VAR)?.unwrap_or(DEFAULT_LISTEN),
        };
        let spotify = match self.spotify {
            Some(s) => Some(s),
            None => match SpotifyClient::try_default() {
                Ok(s) => Some(s),
                Err(e) => {
                    debug!("Playlist authorization disabled: {e}");
                    None
                }
            },
        };
        debug!("Recommendation service at {api_url}, timeout {timeout:?}");

        Ok(Config {
            recommender: HttpRecommender::new(api_url, timeout)?,
            spotify,
            store: self.store.unwrap_or_else(TokenStore::try_default),
            listen,
        })
    }
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Result<Option<T>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::ConfigurationError(format!("{var} has an invalid value: {raw}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
