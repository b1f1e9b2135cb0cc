use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::clients::errors::Result;

const TOKEN_FILE: &str = "moodboard_session.json";

/// Bearer token for the playlist endpoint, as handed back by the authorization redirect.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub access_token: String,
    /// Unix timestamp (seconds) after which the token is no longer accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl SessionToken {
    pub fn new(access_token: impl Into<String>, expires_in: Option<u64>) -> Self {
        SessionToken {
            access_token: access_token.into(),
            expires_at: expires_in.map(|secs| unix_now().saturating_add(secs)),
        }
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Keeps the session token between runs in a small JSON file.
// NOTE: single user, one token per machine.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn try_default() -> Self {
        let path = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
            .join(TOKEN_FILE);
        TokenStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token. Missing, unreadable or expired tokens all read as `None`.
    pub async fn load(&self) -> Result<Option<SessionToken>> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!("No stored session token in {:?}", self.path);
            return Ok(None);
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let token: SessionToken = match serde_json::from_str(&contents) {
            Ok(token) => token,
            Err(e) => {
                warn!("Discarding unreadable session token {:?}: {e}", self.path);
                self.clear().await?;
                return Ok(None);
            }
        };
        if token.is_expired() {
            debug!("Stored session token has expired");
            return Ok(None);
        }
        debug!("Loaded session token from {:?}", self.path);
        Ok(Some(token))
    }

    pub async fn store(&self, token: &SessionToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(token)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Stored session token in {:?}", self.path);
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed session token {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TokenStore {
        TokenStore::new(dir.path().join("nested").join(TOKEN_FILE))
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stored_token_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let token = SessionToken::new("abc", Some(3600));
        store_in(&dir).store(&token).await.unwrap();

        let loaded = store_in(&dir).load().await.unwrap();
        assert_eq!(loaded, Some(token));
    }

    #[tokio::test]
    async fn expired_token_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .store(&SessionToken {
                access_token: "old".into(),
                expires_at: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_token_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.store(&SessionToken::new("abc", None)).await.unwrap();
        tokio::fs::write(store.path(), r#"{"access_tok"#).await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
        assert!(!tokio::fs::try_exists(store.path()).await.unwrap());
    }

    #[tokio::test]
    async fn store_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.store(&SessionToken::new("abc", None)).await.unwrap();

        let tmp = store.path().with_extension("json.tmp");
        assert!(!tokio::fs::try_exists(&tmp).await.unwrap());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.store(&SessionToken::new("abc", None)).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[test]
    fn token_without_expiry_never_expires() {
        let token = SessionToken::new("abc", None);
        assert!(!token.is_expired_at(u64::MAX));
    }
}
