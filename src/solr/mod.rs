//! Solr client and operations.
//!
//! Thin wrappers over the v1 (`/solr`) and v2 (`/api`) HTTP endpoints:
//! collection and config management, schema management, queries and updates.

mod admin;
mod client;
mod error;
mod query;
mod schema;
mod update;

pub use admin::{wait_for_success, PollPolicy, SolrMode};
pub use client::{ApiType, Body, SolrClient, DEFAULT_PORT};
pub use error::{Result, SolrError};
pub use query::{clean_doc, pair_facets, Group, QueryParams};
pub use schema::{is_user_field, schema_command, CopyField, FullSchema, SchemaField, SolrField};
pub use update::{atomic_update_docs, check_update};
