//! DTOs for decoding Zenodo record search responses.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{Doi, RepositoryReview, RepositoryReviews};

const REVIEWS_RELATION: &str = "reviews";
const DOI_SCHEME: &str = "doi";

#[derive(Debug, Deserialize)]
pub(super) struct RecordsResponseDto {
    pub(super) hits: HitsDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct HitsDto {
    #[serde(default)]
    pub(super) hits: Vec<RecordDto>,
    pub(super) total: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecordDto {
    pub(super) doi: String,
    pub(super) metadata: MetadataDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct MetadataDto {
    pub(super) publication_date: NaiveDate,
    #[serde(default)]
    pub(super) related_identifiers: Vec<RelatedIdentifierDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RelatedIdentifierDto {
    pub(super) identifier: String,
    pub(super) relation: String,
    pub(super) scheme: String,
}

impl RecordsResponseDto {
    pub(super) fn into_domain(self) -> Result<RepositoryReviews, String> {
        let reviews = self
            .hits
            .hits
            .into_iter()
            .map(RecordDto::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RepositoryReviews {
            reviews,
            total: self.hits.total,
        })
    }
}

impl RecordDto {
    fn into_domain(self) -> Result<RepositoryReview, String> {
        let doi = Doi::new(&self.doi).map_err(|err| format!("record DOI: {err}"))?;

        let mut preprint_doi = None;
        for related in self.metadata.related_identifiers {
            if related.scheme != DOI_SCHEME {
                continue;
            }
            let related_doi = Doi::new(&related.identifier)
                .map_err(|err| format!("record {doi} related identifier: {err}"))?;
            if preprint_doi.is_none() && related.relation == REVIEWS_RELATION {
                preprint_doi = Some(related_doi);
            }
        }

        Ok(RepositoryReview {
            doi,
            preprint_doi,
            publication_date: self.metadata.publication_date,
        })
    }
}
