//! Query acquisition: SQL synthesis and catalog selection
//!
//! Two interchangeable strategies, both yielding exactly one query string.
//! Synthesis asks the reasoning service to write SQL against the schema
//! descriptor; selection asks it to pick one entry from the pre-written
//! catalog by number, with a deterministic keyword fallback. Both take
//! exactly one reasoning attempt per call and carry no state.

use crate::llm::Reasoner;
use biq_core::{PipelineError, QueryCatalog, SchemaDescriptor};

const SQL_TEMPERATURE: f32 = 0.1;
const SQL_MAX_TOKENS: u32 = 500;
const SELECT_TEMPERATURE: f32 = 0.1;
const SELECT_MAX_TOKENS: u32 = 16;

/// Ordered keyword rules for catalog selection fallback. First match wins.
const KEYWORD_RULES: &[(&[&str], &str)] = &[
    (&["top customer", "best customer"], "Top Customers"),
    (&["churn", "risk"], "Churn Risk"),
    (&["monthly", "trend"], "Monthly Revenue"),
    (&["category"], "Category Revenue"),
    (&["product", "sell"], "Best Products"),
    (&["delivery"], "Delivery Performance"),
    (&["state"], "State Revenue"),
];

/// Mode A: synthesize a single SQL statement for the question.
pub async fn synthesize_sql(
    reasoner: &dyn Reasoner,
    schema: &SchemaDescriptor,
    question: &str,
) -> Result<String, PipelineError> {
    let prompt = synthesis_prompt(schema, question);

    let raw = reasoner
        .complete(&prompt, SQL_TEMPERATURE, SQL_MAX_TOKENS)
        .await
        .map_err(|e| PipelineError::Acquisition(e.to_string()))?;

    extract_sql_block(&raw).ok_or_else(|| {
        PipelineError::Acquisition("reply contained no SQL statement".to_string())
    })
}

fn synthesis_prompt(schema: &SchemaDescriptor, question: &str) -> String {
    format!(
        "You are an expert SQL developer working with an e-commerce dataset.\n\
         Generate one SQL query to answer the user's question.\n\n\
         {schema}\n\
         CRITICAL RULES:\n\
         1. Return ONLY the SQL query - no explanations, no markdown, no commentary\n\
         2. olist_order_payments_dataset has NO date column - ALWAYS JOIN to olist_orders_dataset for dates\n\
         3. For ANY revenue/payment query with dates: JOIN olist_orders_dataset to olist_order_payments_dataset\n\
         4. Use table aliases (o, p, c, oi) to keep queries clean\n\
         5. Date format: STRFTIME(o.order_purchase_timestamp, '%Y-%m') for monthly aggregations\n\
         6. Filter delivered orders: WHERE o.order_status = 'delivered'\n\
         7. Add LIMIT 100 at the end\n\
         8. Use the EXACT table names shown above (olist_orders_dataset NOT orders)\n\n\
         USER QUESTION: {question}\n\n\
         Generate the SQL query:",
        schema = schema.to_prompt(),
        question = question
    )
}

/// Strip fence markers and keep the contiguous block from the first line
/// containing SELECT to the first semicolon-terminated line. Guards
/// against the service prepending explanations.
pub fn extract_sql_block(raw: &str) -> Option<String> {
    let cleaned = raw.replace("```sql", "").replace("```", "");

    let mut sql_lines = Vec::new();
    let mut in_query = false;

    for line in cleaned.lines() {
        if in_query || line.to_uppercase().contains("SELECT") {
            in_query = true;
            sql_lines.push(line);
            if line.trim().ends_with(';') {
                break;
            }
        }
    }

    if sql_lines.is_empty() {
        return None;
    }
    Some(sql_lines.join("\n").trim().to_string())
}

/// Mode B: pick one catalog entry for the question.
///
/// Never fails for a non-empty catalog: a bad numeric reply or a service
/// error falls through to keyword matching, and an unmatched question
/// defaults to the first entry in insertion order.
pub async fn select_from_catalog(
    reasoner: &dyn Reasoner,
    catalog: &QueryCatalog,
    question: &str,
) -> Result<(String, String), PipelineError> {
    if catalog.is_empty() {
        return Err(PipelineError::Acquisition("query catalog is empty".to_string()));
    }

    let prompt = selection_prompt(catalog, question);

    if let Ok(reply) = reasoner
        .complete(&prompt, SELECT_TEMPERATURE, SELECT_MAX_TOKENS)
        .await
    {
        if let Some(index) = parse_selection(&reply, catalog.len()) {
            if let Some((name, sql)) = catalog.entry_at(index) {
                return Ok((name.to_string(), sql.to_string()));
            }
        }
        tracing::warn!(reply = %reply, "unusable selection reply, using keyword fallback");
    }

    let (name, sql) = keyword_fallback(catalog, question);
    Ok((name.to_string(), sql.to_string()))
}

fn selection_prompt(catalog: &QueryCatalog, question: &str) -> String {
    let entries: Vec<String> = catalog
        .names()
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect();

    format!(
        "User question: \"{question}\"\n\n\
         Available queries:\n{list}\n\n\
         Which query number (1-{count}) best answers this?\n\
         Reply with ONLY the number.",
        question = question,
        list = entries.join("\n"),
        count = catalog.len()
    )
}

/// Parse a 1-based selection reply into a 0-based index.
///
/// Replies are not guaranteed to be bare integers; non-digit characters
/// are stripped before parsing.
fn parse_selection(reply: &str, catalog_len: usize) -> Option<usize> {
    let digits: String = reply.chars().filter(|c| c.is_ascii_digit()).collect();
    let number: usize = digits.parse().ok()?;
    if number >= 1 && number <= catalog_len {
        Some(number - 1)
    } else {
        None
    }
}

fn keyword_fallback<'a>(catalog: &'a QueryCatalog, question: &str) -> (&'a str, &'a str) {
    let q = question.to_lowercase();

    for (needles, entry_name) in KEYWORD_RULES.iter().copied() {
        if needles.iter().any(|n| q.contains(n)) {
            if let Some(sql) = catalog.get(entry_name) {
                return (entry_name, sql);
            }
        }
    }

    // Catalog is checked non-empty by the caller.
    catalog.first().expect("non-empty catalog")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockReasoner;

    fn catalog() -> QueryCatalog {
        let mut c = QueryCatalog::new();
        c.insert("Top Customers", "SELECT 1;");
        c.insert("Churn Risk", "SELECT 2;");
        c.insert("Monthly Revenue", "SELECT 3;");
        c
    }

    #[test]
    fn test_extract_sql_block_from_fenced_reply() {
        let raw = "Here is your query:\n```sql\nSELECT a, b\nFROM t\nORDER BY b DESC;\n```\nHope that helps!";
        let sql = extract_sql_block(raw).unwrap();
        assert_eq!(sql, "SELECT a, b\nFROM t\nORDER BY b DESC;");
    }

    #[test]
    fn test_extract_sql_block_without_terminator_runs_to_end() {
        let raw = "SELECT x\nFROM t\nLIMIT 100";
        assert_eq!(extract_sql_block(raw).unwrap(), "SELECT x\nFROM t\nLIMIT 100");
    }

    #[test]
    fn test_extract_sql_block_rejects_prose() {
        assert_eq!(extract_sql_block("I cannot answer that."), None);
    }

    #[test]
    fn test_parse_selection_strips_surrounding_text() {
        assert_eq!(parse_selection("2", 3), Some(1));
        assert_eq!(parse_selection("The best query is 3.", 3), Some(2));
        assert_eq!(parse_selection("zero", 3), None);
        assert_eq!(parse_selection("7", 3), None);
        assert_eq!(parse_selection("0", 3), None);
    }

    #[tokio::test]
    async fn test_selection_uses_model_reply() {
        let reasoner = MockReasoner::replying("2");
        let (name, sql) = select_from_catalog(&reasoner, &catalog(), "anything")
            .await
            .unwrap();
        assert_eq!(name, "Churn Risk");
        assert_eq!(sql, "SELECT 2;");
    }

    #[tokio::test]
    async fn test_selection_keyword_fallback_on_bad_reply() {
        let reasoner = MockReasoner::replying("definitely not a number");
        let (name, _) = select_from_catalog(&reasoner, &catalog(), "show monthly revenue")
            .await
            .unwrap();
        assert_eq!(name, "Monthly Revenue");
    }

    #[tokio::test]
    async fn test_selection_defaults_to_first_entry() {
        // Failed call and a question matching no keyword rule.
        let reasoner = MockReasoner::failing();
        let (name, _) = select_from_catalog(&reasoner, &catalog(), "hello there")
            .await
            .unwrap();
        assert_eq!(name, "Top Customers");
    }

    #[tokio::test]
    async fn test_selection_fails_on_empty_catalog() {
        let reasoner = MockReasoner::replying("1");
        let result = select_from_catalog(&reasoner, &QueryCatalog::new(), "anything").await;
        assert!(matches!(result, Err(PipelineError::Acquisition(_))));
    }

    #[tokio::test]
    async fn test_synthesis_extracts_query() {
        let reasoner = MockReasoner::replying(
            "```sql\nSELECT c.customer_unique_id, SUM(p.payment_value) AS total_spent\nFROM olist_customers_dataset c\nLIMIT 5;\n```",
        );
        let sql = synthesize_sql(&reasoner, &SchemaDescriptor::ecommerce(), "top customers")
            .await
            .unwrap();
        assert!(sql.starts_with("SELECT"));
        assert!(sql.ends_with("LIMIT 5;"));
    }

    #[tokio::test]
    async fn test_synthesis_service_error_is_acquisition_failure() {
        let reasoner = MockReasoner::failing();
        let result =
            synthesize_sql(&reasoner, &SchemaDescriptor::ecommerce(), "top customers").await;
        assert!(matches!(result, Err(PipelineError::Acquisition(_))));
    }
}
