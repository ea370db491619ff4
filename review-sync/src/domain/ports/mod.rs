//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod key_value_store;
mod profile_reviews;
mod rate_gate;
mod review_repository;

#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{KeyValueStore, KeyValueStoreError, ScanCursor, ScanPage};
#[cfg(test)]
pub use profile_reviews::MockProfileReviews;
pub use profile_reviews::{ProfileReviews, ProfileReviewsError};
pub use rate_gate::{RateGate, UnthrottledRateGate};
#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::{ReviewRepository, ReviewRepositoryError};
