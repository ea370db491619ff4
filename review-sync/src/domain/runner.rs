//! Drives reconciliation across every reviewer in the credential store.

use std::pin::pin;

use futures_util::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use super::{CredentialSource, CredentialSourceError, ReconciliationOutcome, ReviewReconciler};

/// Totals for one run over the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Reviewers whose pass completed, even with failed decisions.
    pub users_processed: usize,
    /// Reviewers whose credential or reviews could not be read.
    pub users_failed: usize,
    /// Reviews written across all profiles.
    pub reviews_added: usize,
    /// Stale entries deleted across all profiles.
    pub reviews_removed: usize,
    /// Writes that failed across all profiles.
    pub decisions_failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: ReconciliationOutcome) {
        self.users_processed += 1;
        self.reviews_added += outcome.reviews_added;
        self.reviews_removed += outcome.reviews_removed;
        self.decisions_failed += outcome.decisions_failed;
    }
}

/// Failures that end a run early.
#[derive(Debug, Error)]
pub enum SyncRunError {
    /// Reviewers could no longer be enumerated.
    #[error("user enumeration aborted: {0}")]
    Enumeration(#[source] CredentialSourceError),
}

/// Sequential driver over the reviewer stream.
pub struct SyncRunner {
    credentials: CredentialSource,
    reconciler: ReviewReconciler,
}

impl SyncRunner {
    /// Build a runner from its two services.
    pub fn new(credentials: CredentialSource, reconciler: ReviewReconciler) -> Self {
        Self {
            credentials,
            reconciler,
        }
    }

    /// Reconcile every reviewer, one at a time.
    ///
    /// Cancelling `shutdown` lets the reviewer in flight finish, then stops
    /// before the next one is read.
    ///
    /// # Errors
    ///
    /// Returns [`SyncRunError::Enumeration`] when the credential store can no
    /// longer be scanned or holds a corrupt key. Failures confined to one
    /// reviewer are logged and counted instead.
    pub async fn run(&self, shutdown: &CancellationToken) -> Result<RunSummary, SyncRunError> {
        let mut users = pin!(self.credentials.users());
        let mut summary = RunSummary::default();

        loop {
            let next = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    warn!("Shutdown requested; stopping before the next user");
                    break;
                }
                next = users.next() => next,
            };
            let Some(next) = next else {
                break;
            };

            match next {
                Ok(user) => {
                    let span = info_span!("user", orcid_id = %user.orcid_id());
                    match self.reconciler.reconcile(&user).instrument(span).await {
                        Ok(outcome) => summary.record(outcome),
                        Err(err) => {
                            summary.users_failed += 1;
                            error!(
                                orcid_id = %user.orcid_id(),
                                error = %err,
                                "Failed to process user"
                            );
                        }
                    }
                }
                Err(err) if err.is_stream_fatal() => {
                    error!(error = %err, "Aborting run");
                    return Err(SyncRunError::Enumeration(err));
                }
                Err(err) => {
                    summary.users_failed += 1;
                    error!(
                        orcid_id = ?err.orcid_id().map(ToString::to_string),
                        error = %err,
                        "Failed to load credential"
                    );
                }
            }
        }

        info!(
            users_processed = summary.users_processed,
            users_failed = summary.users_failed,
            reviews_added = summary.reviews_added,
            reviews_removed = summary.reviews_removed,
            decisions_failed = summary.decisions_failed,
            "Finished run"
        );
        Ok(summary)
    }
}
