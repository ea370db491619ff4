//! Reqwest-backed ORCID peer-review adapter.
//!
//! Each call authenticates with the reviewer's own bearer token. Tokens are
//! borrowed for the request and never stored by the client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};

use super::dto::{PeerReviewPayload, PeerReviewsDto};
use crate::domain::ports::{ProfileReviews, ProfileReviewsError};
use crate::domain::{ProfileReview, PutCode, RepositoryReview, User};
use crate::outbound::AdapterBuildError;
use crate::outbound::http_status::{StatusClass, status_message};

const API_VERSION_PATH: &str = "/v3.0/";
const ORCID_JSON: &str = "application/vnd.orcid+json";

/// Profile adapter calling the ORCID member API.
pub struct OrcidHttpClient {
    client: Client,
    api_url: Url,
}

impl OrcidHttpClient {
    /// Build an adapter for the ORCID API host at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// base URL cannot carry the API version path.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, AdapterBuildError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: base_url.join(API_VERSION_PATH)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProfileReviewsError> {
        self.api_url.join(path).map_err(|err| {
            ProfileReviewsError::invalid_request(format!("cannot build URL for {path:?}: {err}"))
        })
    }

    fn authorised(&self, request: RequestBuilder, user: &User) -> RequestBuilder {
        request
            .header(reqwest::header::ACCEPT, ORCID_JSON)
            .bearer_auth(user.access_token().expose())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ProfileReviewsError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ProfileReviews for OrcidHttpClient {
    async fn peer_reviews(&self, user: &User) -> Result<Vec<ProfileReview>, ProfileReviewsError> {
        let url = self.endpoint(&format!("{}/peer-reviews", user.orcid_id()))?;
        let body = self
            .send(self.authorised(self.client.get(url), user))
            .await?;
        parse_peer_reviews(&body)
    }

    async fn add_peer_review(
        &self,
        user: &User,
        review: &RepositoryReview,
    ) -> Result<(), ProfileReviewsError> {
        let payload = build_payload(review)?;
        let url = self.endpoint(&format!("{}/peer-review", user.orcid_id()))?;
        let request = self
            .authorised(self.client.post(url), user)
            .header(reqwest::header::CONTENT_TYPE, ORCID_JSON)
            .body(payload);
        self.send(request).await.map(drop)
    }

    async fn delete_peer_review(
        &self,
        user: &User,
        put_code: PutCode,
    ) -> Result<(), ProfileReviewsError> {
        let url = self.endpoint(&format!("{}/peer-review/{put_code}", user.orcid_id()))?;
        self.send(self.authorised(self.client.delete(url), user))
            .await
            .map(drop)
    }
}

fn parse_peer_reviews(body: &[u8]) -> Result<Vec<ProfileReview>, ProfileReviewsError> {
    let decoded: PeerReviewsDto = serde_json::from_slice(body).map_err(|error| {
        ProfileReviewsError::decode(format!("invalid ORCID JSON payload: {error}"))
    })?;
    decoded
        .into_prereview_reviews()
        .map_err(ProfileReviewsError::decode)
}

fn build_payload(review: &RepositoryReview) -> Result<Vec<u8>, ProfileReviewsError> {
    let payload =
        PeerReviewPayload::for_review(review).map_err(ProfileReviewsError::validation)?;
    serde_json::to_vec(&payload).map_err(|err| ProfileReviewsError::validation(err.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> ProfileReviewsError {
    if error.is_timeout() {
        ProfileReviewsError::timeout(error.to_string())
    } else {
        ProfileReviewsError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ProfileReviewsError {
    let message = status_message(status, body);
    match StatusClass::of(status) {
        StatusClass::RateLimited => ProfileReviewsError::rate_limited(message),
        StatusClass::Timeout => ProfileReviewsError::timeout(message),
        StatusClass::InvalidRequest => ProfileReviewsError::invalid_request(message),
        StatusClass::Transport => ProfileReviewsError::transport(message),
    }
}
