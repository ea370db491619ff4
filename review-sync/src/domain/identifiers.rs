//! Validated identifiers shared by the repository and profile adapters.
//!
//! Both identifiers are opaque strings that can only be obtained through
//! validation. Equality is exact string equality of the validated value; no
//! case folding or whitespace trimming is applied.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

const DOI_RESOLVER: &str = "https://doi.org/";

#[expect(
    clippy::expect_used,
    reason = "pattern is a compile-time constant covered by unit tests"
)]
static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^10[.][0-9]{2,}(?:[.][0-9]+)*/\S+$").expect("DOI pattern compiles")
});

/// Validation errors returned by [`Doi::new`] and [`OrcidId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierValidationError {
    /// The value does not follow the DOI grammar.
    InvalidDoi { value: String },
    /// The value is not a well-formed ORCID iD with a valid check digit.
    InvalidOrcidId { value: String },
}

impl fmt::Display for IdentifierValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDoi { value } => write!(f, "expected {value:?} to be a DOI"),
            Self::InvalidOrcidId { value } => write!(f, "expected {value:?} to be an ORCID iD"),
        }
    }
}

impl std::error::Error for IdentifierValidationError {}

/// Digital Object Identifier.
///
/// ## Invariants
/// - Starts with `10.` followed by a registrant code of at least two digits,
///   optional `.`-separated sub-codes, `/` and a non-blank suffix.
/// - Never ends in a `/.` or `/..` path segment.
///
/// # Examples
/// ```
/// use review_sync::domain::Doi;
///
/// let doi = Doi::new("10.5281/zenodo.1061864").unwrap();
/// assert_eq!(doi.as_ref(), "10.5281/zenodo.1061864");
/// assert!(Doi::new("10.5281/.").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi(String);

impl Doi {
    /// Validate and construct a DOI.
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierValidationError> {
        let value = value.as_ref();
        if is_valid_doi(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(IdentifierValidationError::InvalidDoi {
                value: value.to_owned(),
            })
        }
    }

    /// Canonical resolver URL (`https://doi.org/<doi>`).
    ///
    /// # Errors
    ///
    /// Returns an error when the DOI cannot be expressed as a URL path.
    pub fn resolver_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(DOI_RESOLVER)?;
        url.set_path(self.as_ref());
        Ok(url)
    }
}

fn is_valid_doi(value: &str) -> bool {
    DOI_PATTERN.is_match(value) && !value.ends_with("/.") && !value.ends_with("/..")
}

/// ORCID iD identifying a reviewer's profile.
///
/// ## Invariants
/// - Four hyphen-separated groups of four characters, all digits except an
///   optional trailing `X`.
/// - Lies inside the block allocated by ORCID (`0000-0001-5000-0007` to
///   `0000-0003-4999-999X`).
/// - The final character is the ISO 7064 MOD 11-2 check digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrcidId(String);

impl OrcidId {
    /// Validate and construct an ORCID iD.
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierValidationError> {
        let value = value.as_ref();
        if is_valid_orcid_id(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(IdentifierValidationError::InvalidOrcidId {
                value: value.to_owned(),
            })
        }
    }
}

fn is_valid_orcid_id(value: &str) -> bool {
    let groups = value.split('-').collect::<Vec<_>>();
    let [first, second, third, fourth] = groups.as_slice() else {
        return false;
    };
    if [first, second, third, fourth]
        .iter()
        .any(|group| group.len() != 4 || !group.is_ascii())
    {
        return false;
    }

    let digits = format!("{first}{second}{third}{fourth}");
    let (base, check) = digits.split_at(15);
    if !base.chars().all(|ch| ch.is_ascii_digit()) {
        return false;
    }
    if !in_allocated_block(&digits) {
        return false;
    }

    check.chars().next() == Some(check_digit(base))
}

fn in_allocated_block(digits: &str) -> bool {
    digits
        .get(..15)
        .and_then(|base| base.parse::<u64>().ok())
        .is_some_and(|base| (15_000_000..=34_999_999).contains(&base))
}

fn check_digit(base: &str) -> char {
    let total = base
        .chars()
        .filter_map(|ch| ch.to_digit(10))
        .fold(0_u32, |total, digit| (total + digit) * 2 % 11);
    match (12 - total % 11) % 11 {
        10 => 'X',
        remainder => char::from_digit(remainder, 10).unwrap_or('?'),
    }
}

macro_rules! string_identifier_conversions {
    ($name:ident) => {
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdentifierValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_identifier_conversions!(Doi);
string_identifier_conversions!(OrcidId);
