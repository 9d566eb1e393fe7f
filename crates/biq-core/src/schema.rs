//! Static schema descriptor rendered into synthesis prompts
//!
//! Pure data: table and column descriptions, join guidance and canonical
//! query patterns. Loaded once per process and shared read-only.

use serde::{Deserialize, Serialize};

/// Semantic role of a column, used to annotate prompt output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Key,
    Measure,
    Dimension,
    Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub role: ColumnRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ColumnDesc {
    pub fn new(name: &str, role: ColumnRole) -> Self {
        Self {
            name: name.to_string(),
            role,
            note: None,
        }
    }

    pub fn with_note(name: &str, role: ColumnRole, note: &str) -> Self {
        Self {
            name: name.to_string(),
            role,
            note: Some(note.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDesc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnDesc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

/// A canonical query idiom shown to the reasoning service verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPattern {
    pub label: String,
    pub sql: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub title: String,
    pub join_guidance: Vec<String>,
    pub tables: Vec<TableDesc>,
    pub query_patterns: Vec<QueryPattern>,
}

impl SchemaDescriptor {
    /// Built-in descriptor for the Olist e-commerce dataset.
    pub fn ecommerce() -> Self {
        use ColumnRole::*;

        Self {
            title: "OLIST E-COMMERCE DATABASE SCHEMA".to_string(),
            join_guidance: vec![
                "olist_orders_dataset is the MAIN/CENTRAL table".to_string(),
                "ALL date/time queries MUST use order_purchase_timestamp from olist_orders_dataset".to_string(),
                "Join pattern for revenue: olist_orders_dataset -> olist_order_payments_dataset (via order_id)".to_string(),
                "Join pattern for products: olist_orders_dataset -> olist_order_items_dataset -> olist_products_dataset".to_string(),
            ],
            tables: vec![
                TableDesc {
                    name: "olist_orders_dataset".to_string(),
                    primary_key: Some("order_id".to_string()),
                    columns: vec![
                        ColumnDesc::new("order_id", Key),
                        ColumnDesc::with_note("customer_id", Key, "FK to customers"),
                        ColumnDesc::with_note("order_status", Dimension, "delivered, shipped, etc"),
                        ColumnDesc::with_note(
                            "order_purchase_timestamp",
                            Timestamp,
                            "USE THIS FOR ALL DATE QUERIES",
                        ),
                        ColumnDesc::new("order_approved_at", Timestamp),
                        ColumnDesc::new("order_delivered_customer_date", Timestamp),
                        ColumnDesc::new("order_estimated_delivery_date", Timestamp),
                    ],
                    guidance: Some("MAIN TABLE - HAS ALL DATES".to_string()),
                },
                TableDesc {
                    name: "olist_order_payments_dataset".to_string(),
                    primary_key: None,
                    columns: vec![
                        ColumnDesc::with_note("order_id", Key, "FK to orders"),
                        ColumnDesc::new("payment_sequential", Dimension),
                        ColumnDesc::new("payment_type", Dimension),
                        ColumnDesc::new("payment_installments", Dimension),
                        ColumnDesc::with_note("payment_value", Measure, "REVENUE AMOUNT"),
                    ],
                    guidance: Some("NO DATE COLUMN - JOIN TO ORDERS FOR DATES".to_string()),
                },
                TableDesc {
                    name: "olist_order_items_dataset".to_string(),
                    primary_key: None,
                    columns: vec![
                        ColumnDesc::with_note("order_id", Key, "FK to orders"),
                        ColumnDesc::new("order_item_id", Key),
                        ColumnDesc::with_note("product_id", Key, "FK to products"),
                        ColumnDesc::with_note("seller_id", Key, "FK to sellers"),
                        ColumnDesc::new("price", Measure),
                        ColumnDesc::new("freight_value", Measure),
                    ],
                    guidance: None,
                },
                TableDesc {
                    name: "olist_customers_dataset".to_string(),
                    primary_key: Some("customer_id".to_string()),
                    columns: vec![
                        ColumnDesc::new("customer_id", Key),
                        ColumnDesc::new("customer_unique_id", Key),
                        ColumnDesc::new("customer_zip_code_prefix", Dimension),
                        ColumnDesc::new("customer_city", Dimension),
                        ColumnDesc::new("customer_state", Dimension),
                    ],
                    guidance: None,
                },
                TableDesc {
                    name: "olist_products_dataset".to_string(),
                    primary_key: Some("product_id".to_string()),
                    columns: vec![
                        ColumnDesc::new("product_id", Key),
                        ColumnDesc::new("product_category_name", Dimension),
                        ColumnDesc::new("product_weight_g", Measure),
                        ColumnDesc::new("product_length_cm", Measure),
                    ],
                    guidance: None,
                },
                TableDesc {
                    name: "olist_sellers_dataset".to_string(),
                    primary_key: Some("seller_id".to_string()),
                    columns: vec![
                        ColumnDesc::new("seller_id", Key),
                        ColumnDesc::new("seller_zip_code_prefix", Dimension),
                        ColumnDesc::new("seller_city", Dimension),
                        ColumnDesc::new("seller_state", Dimension),
                    ],
                    guidance: None,
                },
                TableDesc {
                    name: "olist_order_reviews_dataset".to_string(),
                    primary_key: Some("review_id".to_string()),
                    columns: vec![
                        ColumnDesc::new("review_id", Key),
                        ColumnDesc::with_note("order_id", Key, "FK to orders"),
                        ColumnDesc::with_note("review_score", Measure, "1-5"),
                        ColumnDesc::new("review_comment_title", Dimension),
                        ColumnDesc::new("review_comment_message", Dimension),
                    ],
                    guidance: None,
                },
                TableDesc {
                    name: "product_category_name_translation".to_string(),
                    primary_key: None,
                    columns: vec![
                        ColumnDesc::with_note("product_category_name", Key, "Portuguese"),
                        ColumnDesc::new("product_category_name_english", Dimension),
                    ],
                    guidance: None,
                },
            ],
            query_patterns: vec![
                QueryPattern {
                    label: "Monthly Revenue".to_string(),
                    sql: "\
SELECT
    STRFTIME(o.order_purchase_timestamp, '%Y-%m') as month,
    SUM(p.payment_value) as revenue
FROM olist_orders_dataset o
JOIN olist_order_payments_dataset p ON o.order_id = p.order_id
WHERE o.order_status = 'delivered'
GROUP BY month"
                        .to_string(),
                },
                QueryPattern {
                    label: "Top Customers".to_string(),
                    sql: "\
SELECT
    c.customer_unique_id,
    c.customer_city,
    SUM(p.payment_value) as total_spent
FROM olist_customers_dataset c
JOIN olist_orders_dataset o ON c.customer_id = o.customer_id
JOIN olist_order_payments_dataset p ON o.order_id = p.order_id
GROUP BY c.customer_unique_id, c.customer_city
ORDER BY total_spent DESC"
                        .to_string(),
                },
            ],
        }
    }

    /// Render the descriptor as the schema section of a synthesis prompt.
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();

        out.push_str(&self.title);
        out.push_str("\n\nKEY RELATIONSHIPS (CRITICAL FOR JOINS):\n");
        for line in &self.join_guidance {
            out.push_str(&format!("- {line}\n"));
        }

        out.push_str("\nTABLES:\n");
        for table in &self.tables {
            match &table.guidance {
                Some(guidance) => out.push_str(&format!("\nTable: {} ({})\n", table.name, guidance)),
                None => out.push_str(&format!("\nTable: {}\n", table.name)),
            }
            for col in &table.columns {
                let mut tags = Vec::new();
                if table.primary_key.as_deref() == Some(col.name.as_str()) {
                    tags.push("PRIMARY KEY".to_string());
                }
                tags.push(format!("{:?}", col.role).to_lowercase());
                if let Some(note) = &col.note {
                    tags.push(note.clone());
                }
                out.push_str(&format!("  - {} ({})\n", col.name, tags.join(", ")));
            }
        }

        out.push_str("\nCOMMON QUERY PATTERNS:\n");
        for pattern in &self.query_patterns {
            out.push_str(&format!("\n{}:\n{}\n", pattern.label, pattern.sql));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecommerce_descriptor_names_all_tables() {
        let schema = SchemaDescriptor::ecommerce();
        assert_eq!(schema.tables.len(), 8);
        assert_eq!(schema.tables[0].name, "olist_orders_dataset");
        assert_eq!(
            schema.tables[0].primary_key.as_deref(),
            Some("order_id")
        );
    }

    #[test]
    fn test_prompt_contains_join_guidance_and_patterns() {
        let prompt = SchemaDescriptor::ecommerce().to_prompt();
        assert!(prompt.contains("olist_order_payments_dataset"));
        assert!(prompt.contains("KEY RELATIONSHIPS"));
        assert!(prompt.contains("Monthly Revenue"));
        assert!(prompt.contains("payment_value (measure, REVENUE AMOUNT)"));
        assert!(prompt.contains("order_id (PRIMARY KEY, key)"));
    }
}
