//! Reconciles one reviewer's ORCID profile with their Zenodo reviews.
//!
//! A pass reads both sides concurrently, computes the [`Decision`]s and then
//! applies them with bounded concurrency. Each decision is isolated: a failed
//! write is logged and counted without stopping its siblings.

use std::sync::Arc;

use futures_util::{StreamExt, stream};
use thiserror::Error;
use tracing::{error, info};

use super::ports::{ProfileReviews, ProfileReviewsError, ReviewRepository, ReviewRepositoryError};
use super::{Decision, RepositoryReview, User, make_decisions};

/// Reconciler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Upper bound on profile writes in flight for one reviewer.
    pub max_concurrent_writes: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_writes: 4,
        }
    }
}

/// Counts describing one reviewer's pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconciliationOutcome {
    /// Reviews written to the profile.
    pub reviews_added: usize,
    /// Stale entries deleted from the profile.
    pub reviews_removed: usize,
    /// Decisions whose write failed.
    pub decisions_failed: usize,
}

/// Reasons a reviewer's pass could not start.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Zenodo could not be searched.
    #[error("failed to read reviews from Zenodo: {0}")]
    Repository(#[from] ReviewRepositoryError),
    /// The ORCID profile could not be read.
    #[error("failed to read reviews from ORCID: {0}")]
    Profile(#[from] ProfileReviewsError),
}

enum Applied {
    Added,
    Removed,
    Failed,
}

/// Domain service driving a single reviewer's reconciliation.
pub struct ReviewReconciler {
    repository: Arc<dyn ReviewRepository>,
    profile: Arc<dyn ProfileReviews>,
    config: ReconcilerConfig,
}

impl ReviewReconciler {
    /// Build a reconciler over the two review ports.
    pub fn new(
        repository: Arc<dyn ReviewRepository>,
        profile: Arc<dyn ProfileReviews>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            repository,
            profile,
            config,
        }
    }

    /// Bring `user`'s profile in line with Zenodo.
    ///
    /// # Errors
    ///
    /// Fails only when either side cannot be read. Write failures are
    /// reported through [`ReconciliationOutcome::decisions_failed`].
    pub async fn reconcile(&self, user: &User) -> Result<ReconciliationOutcome, ReconcileError> {
        info!(orcid_id = %user.orcid_id(), "Processing user");

        let (repository, profile) = tokio::join!(
            self.repository.reviews_for_orcid_id(user.orcid_id()),
            self.profile.peer_reviews(user),
        );
        let repository = repository?;
        let profile = profile?;

        if repository.reviews.is_empty() {
            info!("No reviews on Zenodo found");
        } else {
            info!(
                total = repository.total,
                count = repository.reviews.len(),
                "Found reviews on Zenodo"
            );
        }
        if profile.is_empty() {
            info!("No reviews on ORCID found");
        } else {
            info!(count = profile.len(), "Found reviews on ORCID");
        }

        let decisions = make_decisions(user.orcid_id(), &repository.reviews, &profile);
        if decisions.is_empty() {
            info!("Nothing to do");
            return Ok(ReconciliationOutcome::default());
        }

        let outcome = stream::iter(decisions)
            .map(|decision| self.apply(user, decision))
            .buffer_unordered(self.config.max_concurrent_writes.max(1))
            .fold(ReconciliationOutcome::default(), |mut outcome, applied| {
                match applied {
                    Applied::Added => outcome.reviews_added += 1,
                    Applied::Removed => outcome.reviews_removed += 1,
                    Applied::Failed => outcome.decisions_failed += 1,
                }
                async move { outcome }
            })
            .await;
        Ok(outcome)
    }

    async fn apply(&self, user: &User, decision: Decision) -> Applied {
        match decision {
            Decision::AddReviewToProfile {
                doi,
                preprint_doi,
                publication_date,
                ..
            } => {
                info!(doi = %doi, "Adding review");
                let review = RepositoryReview {
                    doi,
                    preprint_doi,
                    publication_date,
                };
                match self.profile.add_peer_review(user, &review).await {
                    Ok(()) => Applied::Added,
                    Err(err) => {
                        error!(doi = %review.doi, error = %err, "Failed to add review");
                        Applied::Failed
                    }
                }
            }
            Decision::RemoveReviewFromProfile { put_code, .. } => {
                info!(put_code = %put_code, "Removing review");
                match self.profile.delete_peer_review(user, put_code).await {
                    Ok(()) => Applied::Removed,
                    Err(err) => {
                        error!(put_code = %put_code, error = %err, "Failed to remove review");
                        Applied::Failed
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
