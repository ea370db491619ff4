//! DTOs for the ORCID 3.0 peer-review JSON documents.
//!
//! Responses decode loosely: only the PREreview group is held to the shape
//! this service writes. Requests mirror the member API's `peer-review`
//! document.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{Doi, ProfileReview, PutCode, RepositoryReview};

/// Group id shared by every peer review this service writes.
pub(super) const PREREVIEW_GROUP_ID: &str = "orcid-generated:prereview";

const DOI_ID_TYPE: &str = "doi";
const REVIEW_URL_BASE: &str = "https://prereview.org/reviews/";
const ZENODO_DOI_PREFIXES: [&str; 2] = ["10.5072/zenodo.", "10.5281/zenodo."];

#[derive(Debug, Deserialize)]
pub(super) struct PeerReviewsDto {
    #[serde(default)]
    pub(super) group: Vec<PeerReviewGroupDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct PeerReviewGroupDto {
    #[serde(default)]
    pub(super) external_ids: ExternalIdsDto,
    #[serde(default)]
    pub(super) peer_review_group: Vec<PeerReviewDuplicatesDto>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ExternalIdsDto {
    #[serde(default, rename = "external-id")]
    pub(super) external_id: Vec<ExternalIdDto>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct ExternalIdDto {
    pub(super) external_id_type: String,
    pub(super) external_id_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) external_id_relationship: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct PeerReviewDuplicatesDto {
    #[serde(default)]
    pub(super) external_ids: ExternalIdsDto,
    #[serde(default)]
    pub(super) peer_review_summary: Vec<PeerReviewSummaryDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct PeerReviewSummaryDto {
    pub(super) put_code: Option<u64>,
}

impl PeerReviewsDto {
    /// Entries of the PREreview group; an absent group yields none.
    pub(super) fn into_prereview_reviews(self) -> Result<Vec<ProfileReview>, String> {
        let Some(group) = self.group.into_iter().find(PeerReviewGroupDto::is_prereview) else {
            return Ok(Vec::new());
        };
        group
            .peer_review_group
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_domain(index))
            .collect()
    }
}

impl PeerReviewGroupDto {
    fn is_prereview(&self) -> bool {
        self.external_ids
            .external_id
            .first()
            .is_some_and(|id| id.external_id_value == PREREVIEW_GROUP_ID)
    }
}

impl PeerReviewDuplicatesDto {
    fn into_domain(self, index: usize) -> Result<ProfileReview, String> {
        let id = self
            .external_ids
            .external_id
            .into_iter()
            .next()
            .ok_or_else(|| format!("peer review {index} has no external id"))?;
        if id.external_id_type != DOI_ID_TYPE {
            return Err(format!(
                "peer review {index} has external id type {:?}, expected \"doi\"",
                id.external_id_type
            ));
        }
        let doi = Doi::new(&id.external_id_value)
            .map_err(|err| format!("peer review {index}: {err}"))?;
        let put_code = self
            .peer_review_summary
            .first()
            .and_then(|summary| summary.put_code)
            .ok_or_else(|| format!("peer review {index} ({doi}) has no put-code"))?;
        Ok(ProfileReview {
            doi,
            put_code: PutCode::new(put_code),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct PeerReviewPayload {
    reviewer_role: &'static str,
    review_identifiers: ReviewIdentifiers,
    review_url: UrlValue,
    review_type: &'static str,
    review_completion_date: FuzzyDate,
    review_group_id: &'static str,
    subject_external_identifier: ExternalIdDto,
    subject_url: UrlValue,
    convening_organization: Organization,
}

#[derive(Debug, Serialize)]
struct ReviewIdentifiers {
    #[serde(rename = "external-id")]
    external_id: Vec<ExternalIdDto>,
}

#[derive(Debug, Serialize)]
struct UrlValue {
    value: String,
}

#[derive(Debug, Serialize)]
struct FuzzyDate {
    year: DatePart,
    month: DatePart,
    day: DatePart,
}

#[derive(Debug, Serialize)]
struct DatePart {
    value: String,
}

#[derive(Debug, Serialize)]
struct Organization {
    name: &'static str,
    address: Address,
}

#[derive(Debug, Serialize)]
struct Address {
    city: &'static str,
    country: &'static str,
}

impl PeerReviewPayload {
    /// Build the document recording `review` on a profile.
    pub(super) fn for_review(review: &RepositoryReview) -> Result<Self, String> {
        let preprint_doi = review
            .preprint_doi
            .as_ref()
            .ok_or_else(|| format!("review {} has no preprint DOI", review.doi))?;
        let subject_url = preprint_doi
            .resolver_url()
            .map_err(|err| format!("preprint DOI {preprint_doi} has no resolver URL: {err}"))?;

        Ok(Self {
            reviewer_role: "reviewer",
            review_identifiers: ReviewIdentifiers {
                external_id: vec![self_doi(&review.doi)],
            },
            review_url: UrlValue {
                value: review_url(&review.doi)?.into(),
            },
            review_type: "review",
            review_completion_date: FuzzyDate::from(review.publication_date),
            review_group_id: PREREVIEW_GROUP_ID,
            subject_external_identifier: self_doi(preprint_doi),
            subject_url: UrlValue {
                value: subject_url.into(),
            },
            convening_organization: Organization {
                name: "PREreview",
                address: Address {
                    city: "Portland",
                    country: "US",
                },
            },
        })
    }
}

fn self_doi(doi: &Doi) -> ExternalIdDto {
    ExternalIdDto {
        external_id_type: DOI_ID_TYPE.to_owned(),
        external_id_value: doi.to_string(),
        external_id_relationship: Some("self".to_owned()),
    }
}

/// PREreview page for a review minted on Zenodo.
///
/// The Zenodo record id must be numeric; it becomes the final path segment
/// of the review URL.
pub(super) fn review_url(doi: &Doi) -> Result<Url, String> {
    let record_id = ZENODO_DOI_PREFIXES
        .iter()
        .find_map(|prefix| doi.as_ref().strip_prefix(prefix))
        .ok_or_else(|| format!("review DOI {doi} was not minted by Zenodo"))?;
    if record_id.is_empty() || !record_id.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(format!("review DOI {doi} does not name a numeric Zenodo record"));
    }
    let mut url = Url::parse(REVIEW_URL_BASE)
        .map_err(|err| format!("review DOI {doi} has no PREreview URL: {err}"))?;
    url.path_segments_mut()
        .map_err(|()| format!("review DOI {doi} has no PREreview URL"))?
        .pop_if_empty()
        .push(record_id);
    Ok(url)
}

impl From<NaiveDate> for FuzzyDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: DatePart {
                value: format!("{:04}", date.year()),
            },
            month: DatePart {
                value: format!("{:02}", date.month()),
            },
            day: DatePart {
                value: format!("{:02}", date.day()),
            },
        }
    }
}
