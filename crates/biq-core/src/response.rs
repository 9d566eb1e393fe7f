//! Composite pipeline response

use crate::narrative::Narrative;
use crate::table::ResultTable;
use serde::Serialize;
use std::path::PathBuf;

/// Everything the pipeline produces for one question. Composed once per
/// request and owned by the caller; never cached across questions.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResponse {
    pub question: String,
    /// Catalog entry name, when the query came from catalog selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    pub sql: String,
    pub table: ResultTable,
    pub narrative: Narrative,
    /// Path of the rendered chart image, when one was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<PathBuf>,
}
