//! Pipeline orchestration
//!
//! Linear state machine per question: acquire query, execute, analyze,
//! visualize, assemble. Acquisition and execution failures are terminal;
//! an empty result returns early with the fixed empty narrative; a failed
//! visualization degrades to a response without a chart.

use crate::acquire::{select_from_catalog, synthesize_sql};
use crate::insight::analyze;
use crate::llm::Reasoner;
use biq_charts::ChartEngine;
use biq_core::{Narrative, PipelineError, PipelineResponse, QueryCatalog, SchemaDescriptor};
use biq_duck::QueryExecutor;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// How queries are acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    /// Synthesize SQL from the schema descriptor.
    Autonomous,
    /// Select from the pre-written query catalog.
    Catalog,
}

impl AgentMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "autonomous" => Some(AgentMode::Autonomous),
            "catalog" => Some(AgentMode::Catalog),
            _ => None,
        }
    }
}

/// One pipeline instance per session. Holds only read-only shared state
/// (schema, catalog) and stateless handles; every request owns its own
/// table, digest, narrative and response.
pub struct Pipeline {
    reasoner: Arc<dyn Reasoner>,
    schema: Arc<SchemaDescriptor>,
    catalog: Arc<QueryCatalog>,
    executor: QueryExecutor,
    charts: ChartEngine,
    mode: AgentMode,
}

impl Pipeline {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        schema: Arc<SchemaDescriptor>,
        catalog: Arc<QueryCatalog>,
        executor: QueryExecutor,
        charts: ChartEngine,
        mode: AgentMode,
    ) -> Self {
        Self {
            reasoner,
            schema,
            catalog,
            executor,
            charts,
            mode,
        }
    }

    /// Answer a question with the pipeline's configured mode.
    pub async fn ask(&self, question: &str) -> Result<PipelineResponse, PipelineError> {
        self.ask_with_mode(question, self.mode).await
    }

    /// Answer a question, overriding the acquisition mode.
    pub async fn ask_with_mode(
        &self,
        question: &str,
        mode: AgentMode,
    ) -> Result<PipelineResponse, PipelineError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(%request_id, question, ?mode, "pipeline started");

        // ACQUIRE_QUERY
        let (query_name, sql) = match mode {
            AgentMode::Autonomous => (
                None,
                synthesize_sql(self.reasoner.as_ref(), &self.schema, question).await?,
            ),
            AgentMode::Catalog => {
                let (name, sql) =
                    select_from_catalog(self.reasoner.as_ref(), &self.catalog, question).await?;
                (Some(name), sql)
            }
        };
        tracing::debug!(%request_id, sql = %sql, "query acquired");

        // EXECUTE
        let table = self.executor.execute(&sql)?;
        tracing::info!(%request_id, rows = table.row_count(), "query executed");

        // Empty result: early return, no analysis or chart.
        if table.is_empty() {
            return Ok(PipelineResponse {
                question: question.to_string(),
                query_name,
                sql,
                table,
                narrative: Narrative::empty(),
                chart: None,
            });
        }

        // ANALYZE
        let narrative = analyze(self.reasoner.as_ref(), question, &table).await;

        // VISUALIZE (best effort)
        let chart = self.charts.render(&table, question);

        tracing::info!(
            %request_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chart = chart.is_some(),
            "pipeline complete"
        );

        // ASSEMBLE
        Ok(PipelineResponse {
            question: question.to_string(),
            query_name,
            sql,
            table,
            narrative,
            chart,
        })
    }
}
