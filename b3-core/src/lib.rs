#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the b3-core crate.
//! [b3_core]: https://docs.rs/b3_core/latest/b3_core/index.html
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

/// Core domain models for the trade aggregator.
///
/// This module contains the fundamental data structures that flow through the
/// ingestion pipeline and out of the query endpoint.
///
/// The models in this module are plain data with minimal business logic, so
/// that parsing, persistence and presentation can live in their own crates.
pub mod models;

/// Interface traits for the trade aggregator.
///
/// This module contains the "ports" in the hexagonal architecture pattern.
///
/// These traits define the contract between the ingestion pipeline and
/// external adapters (databases, diagnostic sinks, HTTP servers) without
/// specifying implementation details, so that tests can substitute in-memory
/// collaborators for real storage.
pub mod ports;
