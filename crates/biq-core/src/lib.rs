//! Core data model for the BIQ question-to-insight pipeline
//!
//! Everything in this crate is plain data: the schema descriptor fed to the
//! reasoning service, the query catalog, materialized result tables, the
//! statistical digest, narratives and the composite pipeline response.
//! No I/O happens here beyond reading catalog SQL files at startup.

pub mod catalog;
pub mod digest;
pub mod error;
pub mod narrative;
pub mod response;
pub mod schema;
pub mod table;

pub use catalog::{CatalogSource, QueryCatalog};
pub use digest::{ColumnStats, DataDigest, Trend};
pub use error::{truncate_diag, PipelineError, DIAG_LIMIT};
pub use narrative::Narrative;
pub use response::PipelineResponse;
pub use schema::{ColumnDesc, ColumnRole, QueryPattern, SchemaDescriptor, TableDesc};
pub use table::ResultTable;
