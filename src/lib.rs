//! tiploc-mapper - resolve railway TIPLOC codes to coordinates
//!
//! This library provides the Solr client and the shared types used by the
//! extraction and merge binaries.

pub mod config;
pub mod merge;
pub mod models;
pub mod solr;
pub mod sources;
pub mod spatial;

pub use models::{Location, LocationRecord, SourceType};
pub use solr::{SolrClient, SolrError, SolrMode};
