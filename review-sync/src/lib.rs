//! Reconciles PREreview peer reviews published on Zenodo with the peer-review
//! sections of reviewers' ORCID records.
//!
//! The [`domain`] holds the reconciliation rules and the ports they depend
//! on; [`outbound`] implements those ports for Redis, Zenodo and ORCID.

#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
