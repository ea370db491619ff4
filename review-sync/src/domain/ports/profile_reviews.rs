//! Driven port for the peer-review section of an ORCID record.
//!
//! Reads and writes are scoped to the group this service generates; entries
//! added to the profile by anyone else are never seen or touched.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{ProfileReview, PutCode, RepositoryReview, User};

define_port_error! {
    /// Errors surfaced while calling the ORCID member API.
    pub enum ProfileReviewsError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "orcid transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout { message: String } =>
            "orcid timeout: {message}",
        /// ORCID throttled the request.
        RateLimited { message: String } =>
            "orcid rate limited the request: {message}",
        /// ORCID rejected the request, including expired or revoked tokens.
        InvalidRequest { message: String } =>
            "orcid rejected the request: {message}",
        /// The response did not match the expected peer-review shape.
        Decode { message: String } =>
            "orcid response decode failed: {message}",
        /// The outgoing peer review could not be built.
        Validation { message: String } =>
            "orcid peer review invalid: {message}",
    }
}

/// Port for reading and correcting a reviewer's ORCID peer reviews.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileReviews: Send + Sync {
    /// List the entries in the PREreview peer-review group.
    ///
    /// A profile without that group has no entries.
    async fn peer_reviews(&self, user: &User) -> Result<Vec<ProfileReview>, ProfileReviewsError>;

    /// Record `review` on the user's profile.
    async fn add_peer_review(
        &self,
        user: &User,
        review: &RepositoryReview,
    ) -> Result<(), ProfileReviewsError>;

    /// Delete the entry identified by `put_code`.
    async fn delete_peer_review(
        &self,
        user: &User,
        put_code: PutCode,
    ) -> Result<(), ProfileReviewsError>;
}
