//! Driven port for reading PREreview reviews published on Zenodo.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{OrcidId, RepositoryReviews};

define_port_error! {
    /// Errors surfaced while searching Zenodo.
    pub enum ReviewRepositoryError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "zenodo transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout { message: String } =>
            "zenodo timeout: {message}",
        /// Zenodo throttled the request.
        RateLimited { message: String } =>
            "zenodo rate limited the request: {message}",
        /// Zenodo rejected the request.
        InvalidRequest { message: String } =>
            "zenodo rejected the request: {message}",
        /// The response did not match the expected record shape.
        Decode { message: String } =>
            "zenodo response decode failed: {message}",
    }
}

/// Port for finding the reviews a reviewer has published.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Return the first page (up to 100 records, newest first) of reviews
    /// credited to `orcid_id`.
    ///
    /// A record that fails to decode fails the whole call.
    async fn reviews_for_orcid_id(
        &self,
        orcid_id: &OrcidId,
    ) -> Result<RepositoryReviews, ReviewRepositoryError>;
}
