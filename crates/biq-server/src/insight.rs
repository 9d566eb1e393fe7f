//! Insight generation: digest, narrative prompt, fallback
//!
//! Analysis never hard-fails. An empty result set gets the fixed empty
//! narrative without touching the reasoning service; anything the service
//! does wrong (error, timeout, malformed reply, missing fields) degrades
//! to the deterministic fallback built from the digest.

use crate::llm::Reasoner;
use biq_core::{DataDigest, Narrative, ResultTable};

const ANALYSIS_TEMPERATURE: f32 = 0.7;
const ANALYSIS_MAX_TOKENS: u32 = 800;

/// Produce a narrative for a question and its result table.
pub async fn analyze(reasoner: &dyn Reasoner, question: &str, table: &ResultTable) -> Narrative {
    if table.is_empty() {
        return Narrative::empty();
    }

    let digest = DataDigest::compute(table);
    let prompt = analysis_prompt(question, &digest);

    match reasoner
        .complete(&prompt, ANALYSIS_TEMPERATURE, ANALYSIS_MAX_TOKENS)
        .await
    {
        Ok(reply) => match parse_narrative(&reply) {
            Some(narrative) => narrative,
            None => {
                tracing::warn!("analysis reply unusable, falling back to deterministic narrative");
                Narrative::fallback(&digest)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "analysis call failed, falling back to deterministic narrative");
            Narrative::fallback(&digest)
        }
    }
}

fn analysis_prompt(question: &str, digest: &DataDigest) -> String {
    let digest_json =
        serde_json::to_string_pretty(digest).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are a business intelligence analyst. Analyze this data and provide actionable insights.\n\n\
         ORIGINAL QUESTION: {question}\n\n\
         DATA ANALYSIS:\n{digest_json}\n\n\
         Provide a complete business analysis in JSON format:\n\n\
         {{\n\
           \"summary\": \"One sentence summarizing what the data shows\",\n\
           \"insights\": [\n\
             \"First key insight with specific numbers\",\n\
             \"Second key insight about patterns or trends\",\n\
             \"Third key insight about what's important\"\n\
           ],\n\
           \"recommendations\": [\n\
             \"First actionable recommendation\",\n\
             \"Second specific next step\",\n\
             \"Third way to capitalize on insights\"\n\
           ],\n\
           \"key_metrics\": {{\n\
             \"metric_name\": \"human-readable value with context\"\n\
           }}\n\
         }}\n\n\
         Rules:\n\
         - Be specific and data-driven\n\
         - Use actual numbers from the data\n\
         - Keep insights concise (1-2 sentences)\n\
         - Make recommendations concrete\n\
         - Return ONLY valid JSON\n\n\
         JSON Analysis:"
    )
}

/// Parse the first JSON object in a reply into a narrative. Mandatory
/// fields are enforced by the `Narrative` deserializer.
fn parse_narrative(reply: &str) -> Option<Narrative> {
    let object = extract_json_object(reply)?;
    serde_json::from_str(object).ok()
}

/// Find the first balanced brace-delimited object in free text.
///
/// A balanced scanner, not a regex: tracks nesting depth and skips braces
/// inside string literals (with escapes), so nested structures are never
/// truncated.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
