//! ORCID outbound adapters.
//!
//! This module provides the HTTP implementation of the `ProfileReviews`
//! port against the ORCID 3.0 member API.

mod dto;
mod http_client;

pub use http_client::OrcidHttpClient;
