//! Enumerates reviewers from the credential store.
//!
//! Keys have the form `credential:<orcid-id>`. Each value is a JSON record
//! holding the access token and the scopes it was granted, either flat or
//! wrapped in a `value` object by the credential issuer:
//!
//! ```json
//! { "accessToken": "…", "scopes": ["/activities/update"] }
//! { "value": { "accessToken": "…", "scopes": ["/activities/update"] } }
//! ```

use std::sync::Arc;

use futures_util::{Stream, TryStreamExt, future, stream};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroizing;

use super::ports::{KeyValueStore, KeyValueStoreError, ScanCursor};
use super::{AccessToken, Credential, IdentifierValidationError, OrcidId, User};

/// Namespace shared by every credential key.
pub const CREDENTIAL_KEY_PREFIX: &str = "credential:";

const CREDENTIAL_KEY_PATTERN: &str = "credential:*";

/// Errors raised while enumerating reviewers.
#[derive(Debug, Error)]
pub enum CredentialSourceError {
    /// Scanning the store failed; enumeration cannot continue.
    #[error("credential scan failed: {0}")]
    Scan(#[source] KeyValueStoreError),
    /// A credential key does not end in a valid ORCID iD.
    #[error("credential key {key:?} does not end in an ORCID iD")]
    InvalidKey {
        key: String,
        #[source]
        source: IdentifierValidationError,
    },
    /// The key disappeared between the scan and the read.
    #[error("no credential stored for {orcid_id}")]
    NotFound { orcid_id: OrcidId },
    /// The stored value is not a credential record.
    #[error("credential for {orcid_id} could not be decoded: {message}")]
    Decode { orcid_id: OrcidId, message: String },
    /// Reading one credential failed.
    #[error("credential read failed for {orcid_id}: {source}")]
    Store {
        orcid_id: OrcidId,
        #[source]
        source: KeyValueStoreError,
    },
}

impl CredentialSourceError {
    /// Whether the error ends the enumeration rather than a single user.
    ///
    /// A broken scan or a corrupt key means the store cannot be trusted, so
    /// the run stops. Every other failure belongs to one reviewer.
    pub fn is_stream_fatal(&self) -> bool {
        matches!(self, Self::Scan(_) | Self::InvalidKey { .. })
    }

    /// Reviewer the error belongs to, when known.
    pub fn orcid_id(&self) -> Option<&OrcidId> {
        match self {
            Self::NotFound { orcid_id }
            | Self::Decode { orcid_id, .. }
            | Self::Store { orcid_id, .. } => Some(orcid_id),
            Self::Scan(_) | Self::InvalidKey { .. } => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRecord {
    access_token: String,
    scopes: Vec<String>,
}

/// Reads reviewers and their credentials from a [`KeyValueStore`].
#[derive(Clone)]
pub struct CredentialSource {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialSource {
    /// Build a source over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Lazily list every ORCID iD with a stored credential.
    ///
    /// The store is scanned one cursor step at a time as the stream is
    /// polled. A failed scan ends the stream after yielding its error; an
    /// invalid key is yielded as an error in place of its iD.
    pub fn list_orcid_ids(
        &self,
    ) -> impl Stream<Item = Result<OrcidId, CredentialSourceError>> + Send + '_ {
        stream::try_unfold(Some(ScanCursor::START), move |cursor| async move {
            let Some(cursor) = cursor else {
                return Ok(None);
            };
            let page = self
                .store
                .scan(cursor, CREDENTIAL_KEY_PATTERN)
                .await
                .map_err(CredentialSourceError::Scan)?;
            let next = (!page.next.is_start()).then_some(page.next);
            Ok(Some((page.keys, next)))
        })
        .map_ok(|keys| stream::iter(keys.into_iter().map(Ok)))
        .try_flatten()
        .and_then(|key| future::ready(orcid_id_from_key(key)))
    }

    /// Read and decode the credential stored for `orcid_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialSourceError::NotFound`] when no value is stored,
    /// [`CredentialSourceError::Decode`] when it is not a credential record
    /// and [`CredentialSourceError::Store`] when the read itself fails.
    pub async fn get_credential(
        &self,
        orcid_id: &OrcidId,
    ) -> Result<Credential, CredentialSourceError> {
        let key = format!("{CREDENTIAL_KEY_PREFIX}{orcid_id}");
        let raw = self
            .store
            .get(&key)
            .await
            .map_err(|source| CredentialSourceError::Store {
                orcid_id: orcid_id.clone(),
                source,
            })?
            .map(Zeroizing::new)
            .ok_or_else(|| CredentialSourceError::NotFound {
                orcid_id: orcid_id.clone(),
            })?;

        let record = decode_record(&raw).map_err(|error| CredentialSourceError::Decode {
            orcid_id: orcid_id.clone(),
            message: error.to_string(),
        })?;

        Ok(Credential::new(
            orcid_id.clone(),
            AccessToken::new(record.access_token),
            record.scopes,
        ))
    }

    /// Lazily list reviewers whose credentials may update their profiles.
    ///
    /// Credentials lacking the update scope are skipped with a warning. A
    /// credential that cannot be read is yielded as an error and the stream
    /// carries on with the next reviewer.
    pub fn users(&self) -> impl Stream<Item = Result<User, CredentialSourceError>> + Send + '_ {
        self.list_orcid_ids()
            .try_filter_map(move |orcid_id| async move {
                let credential = self.get_credential(&orcid_id).await?;
                match credential.into_user() {
                    Ok(user) => Ok(Some(user)),
                    Err(credential) => {
                        warn!(
                            orcid_id = %credential.orcid_id(),
                            scopes = ?credential.scopes(),
                            "Skipping user"
                        );
                        Ok(None)
                    }
                }
            })
    }
}

fn orcid_id_from_key(key: String) -> Result<OrcidId, CredentialSourceError> {
    let segment = key.rsplit(':').next().unwrap_or_default();
    OrcidId::new(segment).map_err(|source| CredentialSourceError::InvalidKey { key, source })
}

fn decode_record(raw: &str) -> Result<CredentialRecord, serde_json::Error> {
    let mut value: Value = serde_json::from_str(raw)?;
    if let Some(inner) = value.get_mut("value").filter(|inner| inner.is_object()) {
        value = inner.take();
    }
    serde_json::from_value(value)
}
