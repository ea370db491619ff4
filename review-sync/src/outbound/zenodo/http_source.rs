//! Reqwest-backed Zenodo record search adapter.
//!
//! Every request waits on the shared [`RateGate`] first. Only the first page
//! of results (100 records, newest first) is read.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::RecordsResponseDto;
use crate::domain::ports::{RateGate, ReviewRepository, ReviewRepositoryError};
use crate::domain::{OrcidId, RepositoryReviews};
use crate::outbound::AdapterBuildError;
use crate::outbound::http_status::{StatusClass, status_message};

const RECORDS_PATH: &str = "/api/records";
const PAGE_SIZE: &str = "100";
const REVIEW_RESOURCE_TYPE: &str = "publication::publication-peerreview";
const PREREVIEW_COMMUNITY: &str = "prereview-reviews";

/// Review repository adapter querying the Zenodo records API.
pub struct ZenodoHttpSource {
    client: Client,
    records_url: Url,
    rate_gate: Arc<dyn RateGate>,
}

impl ZenodoHttpSource {
    /// Build an adapter for the Zenodo instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// base URL cannot carry the records path.
    pub fn new(
        base_url: &Url,
        timeout: Duration,
        rate_gate: Arc<dyn RateGate>,
    ) -> Result<Self, AdapterBuildError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            records_url: base_url.join(RECORDS_PATH)?,
            rate_gate,
        })
    }
}

#[async_trait]
impl ReviewRepository for ZenodoHttpSource {
    async fn reviews_for_orcid_id(
        &self,
        orcid_id: &OrcidId,
    ) -> Result<RepositoryReviews, ReviewRepositoryError> {
        self.rate_gate.acquire().await;

        let response = self
            .client
            .get(search_url(&self.records_url, orcid_id))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_reviews(body.as_ref())
    }
}

fn search_url(records_url: &Url, orcid_id: &OrcidId) -> Url {
    let mut url = records_url.clone();
    url.query_pairs_mut()
        .append_pair(
            "q",
            &format!("metadata.creators.person_or_org.identifiers.identifier:{orcid_id}"),
        )
        .append_pair("page", "1")
        .append_pair("size", PAGE_SIZE)
        .append_pair("sort", "publication-desc")
        .append_pair("resource_type", REVIEW_RESOURCE_TYPE)
        .append_pair("communities", PREREVIEW_COMMUNITY);
    url
}

fn parse_reviews(body: &[u8]) -> Result<RepositoryReviews, ReviewRepositoryError> {
    let decoded: RecordsResponseDto = serde_json::from_slice(body).map_err(|error| {
        ReviewRepositoryError::decode(format!("invalid Zenodo JSON payload: {error}"))
    })?;
    decoded
        .into_domain()
        .map_err(ReviewRepositoryError::decode)
}

fn map_transport_error(error: reqwest::Error) -> ReviewRepositoryError {
    if error.is_timeout() {
        ReviewRepositoryError::timeout(error.to_string())
    } else {
        ReviewRepositoryError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ReviewRepositoryError {
    let message = status_message(status, body);
    match StatusClass::of(status) {
        StatusClass::RateLimited => ReviewRepositoryError::rate_limited(message),
        StatusClass::Timeout => ReviewRepositoryError::timeout(message),
        StatusClass::InvalidRequest => ReviewRepositoryError::invalid_request(message),
        StatusClass::Transport => ReviewRepositoryError::transport(message),
    }
}
