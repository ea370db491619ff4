//! Normalised review records read from Zenodo and ORCID.

use std::fmt;

use chrono::NaiveDate;

use super::Doi;

/// Review published on Zenodo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReview {
    /// DOI minted for the review record.
    pub doi: Doi,
    /// DOI of the preprint the review is about.
    pub preprint_doi: Option<Doi>,
    /// Date the review was published.
    pub publication_date: NaiveDate,
}

/// One page of Zenodo search results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepositoryReviews {
    /// Reviews decoded from the returned hits.
    pub reviews: Vec<RepositoryReview>,
    /// Total number of matching records reported by Zenodo.
    pub total: u64,
}

/// ORCID put-code identifying a peer-review entry on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PutCode(u64);

impl PutCode {
    /// Wrap a put-code assigned by ORCID.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PutCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Peer-review entry found in the PREreview group of an ORCID profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileReview {
    /// DOI recorded as the review identifier.
    pub doi: Doi,
    /// Handle required to delete the entry.
    pub put_code: PutCode,
}
