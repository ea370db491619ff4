//! In-memory port implementations shared by unit and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature so the
//! behaviour tests in `tests/` can drive whole runs without Redis or HTTP.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    KeyValueStore, KeyValueStoreError, ProfileReviews, ProfileReviewsError, ReviewRepository,
    ReviewRepositoryError, ScanCursor, ScanPage,
};
use crate::domain::{
    Doi, OrcidId, ProfileReview, PutCode, RepositoryReview, RepositoryReviews, User,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Key-value store backed by a sorted map.
///
/// Scans walk the keys in order, `page_size` keys per step, and honour only
/// trailing-`*` glob patterns.
#[derive(Debug)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
    page_size: usize,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::with_page_size(10)
    }
}

impl InMemoryKeyValueStore {
    /// Empty store returning at most `page_size` keys per scan step.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Add or replace an entry.
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace an entry on a shared store.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        lock(&self.entries).insert(key.into(), value.into());
    }
}

fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn scan(
        &self,
        cursor: ScanCursor,
        pattern: &str,
    ) -> Result<ScanPage, KeyValueStoreError> {
        let entries = lock(&self.entries);
        let start = usize::try_from(cursor.get())
            .map_err(|_| KeyValueStoreError::command("cursor out of range"))?;
        let keys = entries
            .keys()
            .skip(start)
            .take(self.page_size)
            .filter(|key| matches_pattern(pattern, key))
            .cloned()
            .collect();
        let end = start + self.page_size;
        let next = if end >= entries.len() {
            ScanCursor::START
        } else {
            ScanCursor::new(end as u64)
        };
        Ok(ScanPage { keys, next })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }
}

/// Review repository answering from a fixed map of reviewers to reviews.
#[derive(Debug, Default)]
pub struct InMemoryReviewRepository {
    reviews: Mutex<HashMap<OrcidId, Vec<RepositoryReview>>>,
    unavailable: Mutex<BTreeSet<OrcidId>>,
}

impl InMemoryReviewRepository {
    /// Publish `reviews` for `orcid_id`, replacing any earlier set.
    pub fn publish(&self, orcid_id: &OrcidId, reviews: Vec<RepositoryReview>) {
        lock(&self.reviews).insert(orcid_id.clone(), reviews);
    }

    /// Make every search for `orcid_id` fail with a transport error.
    pub fn make_unavailable(&self, orcid_id: &OrcidId) {
        lock(&self.unavailable).insert(orcid_id.clone());
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn reviews_for_orcid_id(
        &self,
        orcid_id: &OrcidId,
    ) -> Result<RepositoryReviews, ReviewRepositoryError> {
        if lock(&self.unavailable).contains(orcid_id) {
            return Err(ReviewRepositoryError::transport("connection reset"));
        }
        let reviews = lock(&self.reviews)
            .get(orcid_id)
            .cloned()
            .unwrap_or_default();
        Ok(RepositoryReviews {
            total: reviews.len() as u64,
            reviews,
        })
    }
}

#[derive(Debug, Default)]
struct ProfileState {
    reviews: HashMap<OrcidId, Vec<ProfileReview>>,
    next_put_code: u64,
    rejected_dois: BTreeSet<Doi>,
    writes: usize,
}

/// ORCID profile store that assigns put-codes and records every write.
#[derive(Debug, Default)]
pub struct InMemoryProfile {
    state: Mutex<ProfileState>,
}

impl InMemoryProfile {
    /// Seed `orcid_id`'s profile with an existing entry.
    pub fn seed(&self, orcid_id: &OrcidId, doi: Doi, put_code: PutCode) {
        let mut state = lock(&self.state);
        state.next_put_code = state.next_put_code.max(put_code.get());
        state
            .reviews
            .entry(orcid_id.clone())
            .or_default()
            .push(ProfileReview { doi, put_code });
    }

    /// Reject every attempt to add a review with `doi`.
    pub fn reject(&self, doi: Doi) {
        lock(&self.state).rejected_dois.insert(doi);
    }

    /// Current entries on `orcid_id`'s profile.
    pub fn reviews(&self, orcid_id: &OrcidId) -> Vec<ProfileReview> {
        lock(&self.state)
            .reviews
            .get(orcid_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successful add and delete calls so far.
    pub fn writes(&self) -> usize {
        lock(&self.state).writes
    }
}

#[async_trait]
impl ProfileReviews for InMemoryProfile {
    async fn peer_reviews(&self, user: &User) -> Result<Vec<ProfileReview>, ProfileReviewsError> {
        Ok(self.reviews(user.orcid_id()))
    }

    async fn add_peer_review(
        &self,
        user: &User,
        review: &RepositoryReview,
    ) -> Result<(), ProfileReviewsError> {
        let mut state = lock(&self.state);
        if state.rejected_dois.contains(&review.doi) {
            return Err(ProfileReviewsError::invalid_request(format!(
                "status 400: {} rejected",
                review.doi
            )));
        }
        state.next_put_code += 1;
        let put_code = PutCode::new(state.next_put_code);
        state.writes += 1;
        state
            .reviews
            .entry(user.orcid_id().clone())
            .or_default()
            .push(ProfileReview {
                doi: review.doi.clone(),
                put_code,
            });
        Ok(())
    }

    async fn delete_peer_review(
        &self,
        user: &User,
        put_code: PutCode,
    ) -> Result<(), ProfileReviewsError> {
        let mut state = lock(&self.state);
        let entries = state.reviews.entry(user.orcid_id().clone()).or_default();
        let before = entries.len();
        entries.retain(|review| review.put_code != put_code);
        if entries.len() == before {
            return Err(ProfileReviewsError::invalid_request(format!(
                "status 404: put-code {put_code} not found"
            )));
        }
        state.writes += 1;
        Ok(())
    }
}
