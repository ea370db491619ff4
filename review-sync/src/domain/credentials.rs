//! ORCID access credentials read from the credential store.
//!
//! Credentials live only for the duration of one user's reconciliation. The
//! access token is zeroized on drop and never appears in `Debug` output.

use std::collections::BTreeSet;
use std::fmt;

use zeroize::Zeroizing;

use super::OrcidId;

/// Scope a token must carry before the profile may be written to.
pub const UPDATE_ACTIVITIES_SCOPE: &str = "/activities/update";

/// Bearer token issued by ORCID for one reviewer.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a raw bearer token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Raw token value for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Credential record stored for one ORCID iD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    orcid_id: OrcidId,
    access_token: AccessToken,
    scopes: BTreeSet<String>,
}

impl Credential {
    /// Build a credential from its decoded parts.
    pub fn new(
        orcid_id: OrcidId,
        access_token: AccessToken,
        scopes: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            orcid_id,
            access_token,
            scopes: scopes.into_iter().collect(),
        }
    }

    /// Owner of the credential.
    pub fn orcid_id(&self) -> &OrcidId {
        &self.orcid_id
    }

    /// Scopes granted to the token.
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// Whether the token may add and delete activities on the profile.
    pub fn can_update_activities(&self) -> bool {
        self.scopes.contains(UPDATE_ACTIVITIES_SCOPE)
    }

    /// Promote the credential to a [`User`] when it passes the scope gate.
    ///
    /// Returns the credential unchanged when the update scope is missing so
    /// the caller can report what was granted.
    pub fn into_user(self) -> Result<User, Self> {
        if self.can_update_activities() {
            Ok(User {
                orcid_id: self.orcid_id,
                access_token: self.access_token,
            })
        } else {
            Err(self)
        }
    }
}

/// Reviewer whose profile may be reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    orcid_id: OrcidId,
    access_token: AccessToken,
}

impl User {
    /// Reviewer's ORCID iD.
    pub fn orcid_id(&self) -> &OrcidId {
        &self.orcid_id
    }

    /// Token used to authenticate profile reads and writes.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }
}
