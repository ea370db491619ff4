//! Zenodo outbound adapters.
//!
//! This module provides the HTTP implementation of the `ReviewRepository`
//! port.

mod dto;
mod http_source;

pub use http_source::ZenodoHttpSource;
