//! Unit tests for single-reviewer reconciliation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::time::Instant;
use mockall::predicate::{always, eq};
use rstest::{fixture, rstest};

use super::{ReconcileError, ReconcilerConfig, ReconciliationOutcome, ReviewReconciler};
use crate::domain::ports::{
    MockProfileReviews, MockReviewRepository, ProfileReviews, ProfileReviewsError,
    ReviewRepository, ReviewRepositoryError,
};
use crate::domain::{
    AccessToken, Credential, Doi, OrcidId, ProfileReview, PutCode, RepositoryReview,
    RepositoryReviews, UPDATE_ACTIVITIES_SCOPE, User,
};

#[fixture]
fn user() -> User {
    let orcid_id = OrcidId::new("0000-0002-1825-0097").expect("valid ORCID iD");
    Credential::new(
        orcid_id,
        AccessToken::new("token"),
        [UPDATE_ACTIVITIES_SCOPE.to_owned()],
    )
    .into_user()
    .expect("scope gate passes")
}

fn doi(suffix: &str) -> Doi {
    Doi::new(format!("10.5281/zenodo.{suffix}")).expect("valid DOI")
}

fn repository_review(suffix: &str) -> RepositoryReview {
    RepositoryReview {
        doi: doi(suffix),
        preprint_doi: Some(Doi::new(format!("10.1101/{suffix}")).expect("valid DOI")),
        publication_date: NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date"),
    }
}

fn profile_review(suffix: &str, put_code: u64) -> ProfileReview {
    ProfileReview {
        doi: doi(suffix),
        put_code: PutCode::new(put_code),
    }
}

fn repository_returning(suffixes: &'static [&'static str]) -> MockReviewRepository {
    let mut repository = MockReviewRepository::new();
    repository
        .expect_reviews_for_orcid_id()
        .times(1)
        .returning(move |_| {
            Ok(RepositoryReviews {
                reviews: suffixes.iter().map(|suffix| repository_review(suffix)).collect(),
                total: suffixes.len() as u64,
            })
        });
    repository
}

fn reconciler(
    repository: MockReviewRepository,
    profile: impl ProfileReviews + 'static,
) -> ReviewReconciler {
    ReviewReconciler::new(
        Arc::new(repository),
        Arc::new(profile),
        ReconcilerConfig::default(),
    )
}

#[rstest]
#[tokio::test]
async fn adds_missing_and_removes_stale_reviews(user: User) {
    let repository = repository_returning(&["b", "c"]);
    let mut profile = MockProfileReviews::new();
    profile
        .expect_peer_reviews()
        .times(1)
        .returning(|_| Ok(vec![profile_review("a", 11), profile_review("b", 12)]));
    profile
        .expect_add_peer_review()
        .withf(|_, review| review == &repository_review("c"))
        .times(1)
        .returning(|_, _| Ok(()));
    profile
        .expect_delete_peer_review()
        .with(always(), eq(PutCode::new(11)))
        .times(1)
        .returning(|_, _| Ok(()));

    let outcome = reconciler(repository, profile)
        .reconcile(&user)
        .await
        .expect("reconciliation succeeds");

    assert_eq!(
        outcome,
        ReconciliationOutcome {
            reviews_added: 1,
            reviews_removed: 1,
            decisions_failed: 0,
        }
    );
}

#[rstest]
#[tokio::test]
async fn empty_sources_write_nothing(user: User) {
    let repository = repository_returning(&[]);
    let mut profile = MockProfileReviews::new();
    profile.expect_peer_reviews().returning(|_| Ok(Vec::new()));
    profile.expect_add_peer_review().never();
    profile.expect_delete_peer_review().never();

    let outcome = reconciler(repository, profile)
        .reconcile(&user)
        .await
        .expect("reconciliation succeeds");

    assert_eq!(outcome, ReconciliationOutcome::default());
}

#[rstest]
#[tokio::test]
async fn failing_remove_does_not_block_sibling_adds(user: User) {
    let repository = repository_returning(&["b", "c"]);
    let mut profile = MockProfileReviews::new();
    profile
        .expect_peer_reviews()
        .returning(|_| Ok(vec![profile_review("a", 11)]));
    profile
        .expect_add_peer_review()
        .times(2)
        .returning(|_, _| Ok(()));
    profile
        .expect_delete_peer_review()
        .times(1)
        .returning(|_, _| Err(ProfileReviewsError::invalid_request("status 409")));

    let outcome = reconciler(repository, profile)
        .reconcile(&user)
        .await
        .expect("write failures stay inside the pass");

    assert_eq!(outcome.reviews_added, 2);
    assert_eq!(outcome.reviews_removed, 0);
    assert_eq!(outcome.decisions_failed, 1);
}

#[rstest]
#[tokio::test]
async fn repository_failure_aborts_before_any_write(user: User) {
    let mut repository = MockReviewRepository::new();
    repository
        .expect_reviews_for_orcid_id()
        .times(1)
        .returning(|_| Err(ReviewRepositoryError::timeout("30s elapsed")));
    let mut profile = MockProfileReviews::new();
    profile
        .expect_peer_reviews()
        .times(1)
        .returning(|_| Ok(vec![profile_review("a", 11)]));
    profile.expect_delete_peer_review().never();

    let error = reconciler(repository, profile)
        .reconcile(&user)
        .await
        .expect_err("read failure fails the pass");

    assert!(matches!(error, ReconcileError::Repository(_)));
}

#[rstest]
#[tokio::test]
async fn profile_failure_aborts_before_any_write(user: User) {
    let repository = repository_returning(&["a"]);
    let mut profile = MockProfileReviews::new();
    profile
        .expect_peer_reviews()
        .returning(|_| Err(ProfileReviewsError::decode("missing put-code")));
    profile.expect_add_peer_review().never();

    let error = reconciler(repository, profile)
        .reconcile(&user)
        .await
        .expect_err("read failure fails the pass");

    assert!(matches!(error, ReconcileError::Profile(_)));
}

/// Profile stub that records how many writes overlap.
#[derive(Default)]
struct OverlapTrackingProfile {
    active: AtomicUsize,
    max_active: AtomicUsize,
    writes: AtomicUsize,
}

impl OverlapTrackingProfile {
    async fn write(&self) {
        let active_now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active_now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileReviews for OverlapTrackingProfile {
    async fn peer_reviews(&self, _user: &User) -> Result<Vec<ProfileReview>, ProfileReviewsError> {
        Ok(Vec::new())
    }

    async fn add_peer_review(
        &self,
        _user: &User,
        _review: &RepositoryReview,
    ) -> Result<(), ProfileReviewsError> {
        self.write().await;
        Ok(())
    }

    async fn delete_peer_review(
        &self,
        _user: &User,
        _put_code: PutCode,
    ) -> Result<(), ProfileReviewsError> {
        self.write().await;
        Ok(())
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[tokio::test(start_paused = true)]
async fn writes_respect_the_concurrency_bound(user: User, #[case] bound: usize) {
    let repository = repository_returning(&["a", "b", "c", "d", "e"]);
    let profile = Arc::new(OverlapTrackingProfile::default());
    let reconciler = ReviewReconciler::new(
        Arc::new(repository),
        Arc::clone(&profile) as Arc<dyn ProfileReviews>,
        ReconcilerConfig {
            max_concurrent_writes: bound,
        },
    );

    let outcome = reconciler.reconcile(&user).await.expect("reconciliation succeeds");

    assert_eq!(outcome.reviews_added, 5);
    assert_eq!(profile.writes.load(Ordering::SeqCst), 5);
    assert_eq!(profile.max_active.load(Ordering::SeqCst), bound);
}

/// Repository stub answering after a fixed delay.
struct DelayedRepository {
    delay: Duration,
    fails: bool,
}

#[async_trait]
impl ReviewRepository for DelayedRepository {
    async fn reviews_for_orcid_id(
        &self,
        _orcid_id: &OrcidId,
    ) -> Result<RepositoryReviews, ReviewRepositoryError> {
        tokio::time::sleep(self.delay).await;
        if self.fails {
            return Err(ReviewRepositoryError::transport("connection reset"));
        }
        Ok(RepositoryReviews::default())
    }
}

/// Profile stub whose read answers after a fixed delay.
struct DelayedProfile {
    delay: Duration,
    reads_finished: AtomicUsize,
}

impl DelayedProfile {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            reads_finished: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProfileReviews for DelayedProfile {
    async fn peer_reviews(&self, _user: &User) -> Result<Vec<ProfileReview>, ProfileReviewsError> {
        tokio::time::sleep(self.delay).await;
        self.reads_finished.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn add_peer_review(
        &self,
        _user: &User,
        _review: &RepositoryReview,
    ) -> Result<(), ProfileReviewsError> {
        Err(ProfileReviewsError::invalid_request("unexpected write"))
    }

    async fn delete_peer_review(
        &self,
        _user: &User,
        _put_code: PutCode,
    ) -> Result<(), ProfileReviewsError> {
        Err(ProfileReviewsError::invalid_request("unexpected write"))
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn reads_overlap_instead_of_running_back_to_back(user: User) {
    let profile = Arc::new(DelayedProfile::new(Duration::from_millis(300)));
    let reconciler = ReviewReconciler::new(
        Arc::new(DelayedRepository {
            delay: Duration::from_millis(200),
            fails: false,
        }),
        Arc::clone(&profile) as Arc<dyn ProfileReviews>,
        ReconcilerConfig::default(),
    );
    let started = Instant::now();

    let outcome = reconciler.reconcile(&user).await.expect("reconciliation succeeds");

    let elapsed = started.elapsed();
    assert_eq!(outcome, ReconciliationOutcome::default());
    assert!(elapsed >= Duration::from_millis(300), "elapsed: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(500), "elapsed: {elapsed:?}");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_read_waits_for_its_sibling(user: User) {
    let profile = Arc::new(DelayedProfile::new(Duration::from_millis(250)));
    let reconciler = ReviewReconciler::new(
        Arc::new(DelayedRepository {
            delay: Duration::from_millis(10),
            fails: true,
        }),
        Arc::clone(&profile) as Arc<dyn ProfileReviews>,
        ReconcilerConfig::default(),
    );

    let error = reconciler
        .reconcile(&user)
        .await
        .expect_err("repository failure fails the pass");

    assert!(matches!(error, ReconcileError::Repository(_)));
    assert_eq!(profile.reads_finished.load(Ordering::SeqCst), 1);
}
