//! Structured analysis narratives

use crate::digest::DataDigest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The structured narrative produced by the analysis stage.
///
/// Structurally complete by construction: `summary` is always present and
/// the lists are possibly empty but never absent. `summary`, `insights`
/// and `recommendations` are mandatory when deserializing a model reply;
/// `key_metrics` defaults to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub key_metrics: BTreeMap<String, serde_json::Value>,
}

impl Narrative {
    /// Fixed narrative for an empty result set. Produced without any
    /// reasoning-service call.
    pub fn empty() -> Self {
        Self {
            summary: "No data found".to_string(),
            insights: Vec::new(),
            recommendations: Vec::new(),
            key_metrics: BTreeMap::new(),
        }
    }

    /// Deterministic fallback when the reasoning service fails or returns
    /// an unusable structure.
    pub fn fallback(digest: &DataDigest) -> Self {
        let mut insights: Vec<String> = digest
            .statistics
            .iter()
            .map(|s| format!("{}: ranges from {:.2} to {:.2}", s.column, s.min, s.max))
            .collect();

        if let Some(trend) = &digest.trend {
            insights.push(trend.clone());
        }

        if insights.is_empty() {
            insights.push("Data retrieved successfully".to_string());
        }

        Self {
            summary: format!("Analysis of {} records", digest.row_count),
            insights,
            recommendations: vec![
                "Review the data patterns for optimization opportunities".to_string(),
                "Monitor key metrics regularly".to_string(),
            ],
            key_metrics: BTreeMap::new(),
        }
    }
}
