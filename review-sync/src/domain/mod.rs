//! Domain model and services for review reconciliation.
//!
//! Everything here is transport agnostic. Adapters in `crate::outbound`
//! implement the traits in [`ports`]; the services below only ever talk to
//! those traits.

mod credential_source;
mod credentials;
mod decision;
mod identifiers;
pub mod ports;
mod reconciler;
mod reviews;
mod runner;

pub use credential_source::{CREDENTIAL_KEY_PREFIX, CredentialSource, CredentialSourceError};
pub use credentials::{AccessToken, Credential, UPDATE_ACTIVITIES_SCOPE, User};
pub use decision::{Decision, make_decisions};
pub use identifiers::{Doi, IdentifierValidationError, OrcidId};
pub use reconciler::{ReconcileError, ReconcilerConfig, ReconciliationOutcome, ReviewReconciler};
pub use reviews::{ProfileReview, PutCode, RepositoryReview, RepositoryReviews};
pub use runner::{RunSummary, SyncRunError, SyncRunner};
