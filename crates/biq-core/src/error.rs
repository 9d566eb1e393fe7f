//! Pipeline-level error taxonomy

use thiserror::Error;

/// Cap on diagnostic message length surfaced to callers.
pub const DIAG_LIMIT: usize = 200;

/// Truncate a diagnostic message to `cap` characters, marking the cut.
pub fn truncate_diag(msg: &str, cap: usize) -> String {
    if msg.chars().count() <= cap {
        return msg.to_string();
    }
    let cut: String = msg.chars().take(cap).collect();
    format!("{cut}...")
}

/// Terminal failures of a pipeline run.
///
/// Analysis degradation and skipped visualization are not errors; they are
/// handled inside their stages and never surface through this type.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No usable query could be produced for the question.
    #[error("no usable query produced: {0}")]
    Acquisition(String),

    /// The tabular store rejected the query.
    #[error("query execution failed: {0}")]
    Execution(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_diag_short_passthrough() {
        assert_eq!(truncate_diag("syntax error", 200), "syntax error");
    }

    #[test]
    fn test_truncate_diag_caps_long_messages() {
        let long = "x".repeat(500);
        let out = truncate_diag(&long, 200);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }
}
