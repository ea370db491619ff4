//! Corrective actions computed from the difference between Zenodo and ORCID.
//!
//! `to_add` is every Zenodo review whose DOI is absent from the profile and
//! `to_remove` every profile entry whose DOI Zenodo no longer reports.
//! Matching is exact [`Doi`] equality.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::{Doi, OrcidId, ProfileReview, PutCode, RepositoryReview};

/// One change to apply to a reviewer's ORCID profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Zenodo has a review the profile lacks.
    AddReviewToProfile {
        /// Profile to write to.
        orcid_id: OrcidId,
        /// DOI of the review.
        doi: Doi,
        /// DOI of the reviewed preprint.
        preprint_doi: Option<Doi>,
        /// Publication date of the review.
        publication_date: NaiveDate,
    },
    /// The profile lists a review Zenodo no longer backs.
    RemoveReviewFromProfile {
        /// Profile to delete from.
        orcid_id: OrcidId,
        /// Put-code of the stale entry.
        put_code: PutCode,
    },
}

impl Decision {
    /// Build an add decision from a Zenodo review.
    pub fn add(orcid_id: &OrcidId, review: &RepositoryReview) -> Self {
        Self::AddReviewToProfile {
            orcid_id: orcid_id.clone(),
            doi: review.doi.clone(),
            preprint_doi: review.preprint_doi.clone(),
            publication_date: review.publication_date,
        }
    }

    /// Build a remove decision from a profile entry.
    pub fn remove(orcid_id: &OrcidId, review: &ProfileReview) -> Self {
        Self::RemoveReviewFromProfile {
            orcid_id: orcid_id.clone(),
            put_code: review.put_code,
        }
    }
}

/// Compute the decisions reconciling `profile` with `repository`.
///
/// Adds come first in Zenodo order (first occurrence of a DOI wins), followed
/// by removals in profile order.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use review_sync::domain::{
///     Decision, Doi, OrcidId, ProfileReview, PutCode, RepositoryReview, make_decisions,
/// };
///
/// let orcid_id = OrcidId::new("0000-0002-1825-0097").unwrap();
/// let repository = vec![RepositoryReview {
///     doi: Doi::new("10.5281/zenodo.2").unwrap(),
///     preprint_doi: None,
///     publication_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
/// }];
/// let profile = vec![ProfileReview {
///     doi: Doi::new("10.5281/zenodo.2").unwrap(),
///     put_code: PutCode::new(7),
/// }];
///
/// assert!(make_decisions(&orcid_id, &repository, &profile).is_empty());
/// ```
pub fn make_decisions(
    orcid_id: &OrcidId,
    repository: &[RepositoryReview],
    profile: &[ProfileReview],
) -> Vec<Decision> {
    let on_profile = profile
        .iter()
        .map(|review| &review.doi)
        .collect::<HashSet<_>>();
    let on_repository = repository
        .iter()
        .map(|review| &review.doi)
        .collect::<HashSet<_>>();

    let mut queued = HashSet::new();
    let additions = repository
        .iter()
        .filter(|review| !on_profile.contains(&review.doi))
        .filter(|review| queued.insert(&review.doi))
        .map(|review| Decision::add(orcid_id, review));

    let removals = profile
        .iter()
        .filter(|review| !on_repository.contains(&review.doi))
        .map(|review| Decision::remove(orcid_id, review));

    additions.chain(removals).collect()
}
