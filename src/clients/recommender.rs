use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::header;
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::clients::{
    entities::{
        CreatePlaylistRequest, CreatePlaylistResponse, RecommendRequest, RecommendResponse,
        SimilarRequest, SimilarResponse,
    },
    errors::{Error, Result},
};

/// The remote recommendation service the board talks to.
///
/// Implemented over HTTP by [`HttpRecommender`]; tests plug in fakes.
pub trait RecommendationApi {
    /// `POST /recommend`
    fn recommend(
        &self,
        req: &RecommendRequest,
    ) -> impl Future<Output = Result<RecommendResponse>> + Send;

    /// `POST /similar`
    fn similar(&self, req: &SimilarRequest)
    -> impl Future<Output = Result<SimilarResponse>> + Send;

    /// `POST /create-playlist`, authorized with the user's bearer token
    fn create_playlist(
        &self,
        token: &str,
        req: &CreatePlaylistRequest,
    ) -> impl Future<Output = Result<CreatePlaylistResponse>> + Send;
}

pub struct HttpRecommender {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRecommender {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpRecommender {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn post_json<B, R>(&self, path: &str, body: &B, bearer: Option<&str>) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        debug!("POST {url}");
        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("{path} failed with {status}: {body}");
            return Err(Error::UnexpectedResponse {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl RecommendationApi for HttpRecommender {
    async fn recommend(&self, req: &RecommendRequest) -> Result<RecommendResponse> {
        self.post_json("recommend", req, None).await
    }

    async fn similar(&self, req: &SimilarRequest) -> Result<SimilarResponse> {
        self.post_json("similar", req, None).await
    }

    async fn create_playlist(
        &self,
        token: &str,
        req: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse> {
        self.post_json("create-playlist", req, Some(token)).await
    }
}

// Url::join drops the last path segment unless the base ends with '/'
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
