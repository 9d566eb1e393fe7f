//! Pre-written query catalog (catalog-selection mode)
//!
//! The catalog is an ordered name → SQL mapping built once at startup from
//! a fixed list of named sources. Each source file holds several queries
//! separated by `-- Query N` marker lines; a source names the file and the
//! 1-based section it wants. Insertion order is stable for the process
//! lifetime because selection replies reference entries by numeric index.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("query catalog is empty: no source yielded a query")]
    Empty,
}

/// One named query source: a SQL file plus the section number inside it.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub name: String,
    pub path: PathBuf,
    pub query_number: usize,
}

impl CatalogSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, query_number: usize) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            query_number,
        }
    }
}

/// Ordered, insertion-stable mapping of query name to SQL text.
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    entries: Vec<(String, String)>,
}

impl QueryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from source files. Sources whose file or section
    /// is missing are skipped; an entirely empty catalog is an error.
    pub fn from_sources(sources: &[CatalogSource]) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for source in sources {
            let Ok(content) = std::fs::read_to_string(&source.path) else {
                continue;
            };
            if let Some(sql) = extract_query(&content, source.query_number) {
                catalog.insert(&source.name, &sql);
            }
        }
        if catalog.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(catalog)
    }

    /// Insert or replace an entry. Names are unique; replacing keeps the
    /// original position so numeric indexes stay stable.
    pub fn insert(&mut self, name: &str, sql: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = sql.to_string();
        } else {
            self.entries.push((name.to_string(), sql.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sql)| sql.as_str())
    }

    /// Entry by 0-based insertion index.
    pub fn entry_at(&self, index: usize) -> Option<(&str, &str)> {
        self.entries
            .get(index)
            .map(|(n, sql)| (n.as_str(), sql.as_str()))
    }

    pub fn first(&self) -> Option<(&str, &str)> {
        self.entry_at(0)
    }
}

/// Extract the Nth query section from a SQL file.
///
/// Sections are delimited by `-- Query` markers. Within a section, capture
/// starts at the first line containing SELECT and stops after the first
/// line terminated by a semicolon.
pub fn extract_query(content: &str, query_number: usize) -> Option<String> {
    let parts: Vec<&str> = content.split("-- Query").collect();
    let section = parts.get(query_number)?;

    let mut sql_lines = Vec::new();
    let mut started = false;

    for line in section.lines() {
        if !started && line.to_uppercase().contains("SELECT") {
            started = true;
        }
        if started {
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

#[cfg(test)]
mod tests {
    use super::*;

    const SQL_FILE: &str = "\
-- Customer analytics
-- Query 1: Top customers by spend
SELECT customer_id, SUM(payment_value) AS total_spent
FROM orders
GROUP BY customer_id
ORDER BY total_spent DESC;

-- Query 2: Churn candidates
-- customers with no recent orders
SELECT customer_id
FROM customers
WHERE last_order < DATE '2018-01-01';
";

    #[test]
    fn test_extract_query_by_section() {
        let q1 = extract_query(SQL_FILE, 1).unwrap();
        assert!(q1.starts_with("SELECT customer_id, SUM"));
        assert!(q1.ends_with("total_spent DESC;"));

        let q2 = extract_query(SQL_FILE, 2).unwrap();
        assert!(q2.starts_with("SELECT customer_id"));
        assert!(q2.contains("last_order"));
    }

    #[test]
    fn test_extract_query_skips_leading_comments() {
        let q2 = extract_query(SQL_FILE, 2).unwrap();
        assert!(!q2.contains("no recent orders"));
    }

    #[test]
    fn test_extract_query_missing_section() {
        assert_eq!(extract_query(SQL_FILE, 9), None);
    }

    #[test]
    fn test_insert_keeps_order_and_uniqueness() {
        let mut catalog = QueryCatalog::new();
        catalog.insert("A", "SELECT 1;");
        catalog.insert("B", "SELECT 2;");
        catalog.insert("A", "SELECT 10;");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entry_at(0), Some(("A", "SELECT 10;")));
        assert_eq!(catalog.entry_at(1), Some(("B", "SELECT 2;")));
        assert_eq!(catalog.first().unwrap().0, "A");
    }

    #[test]
    fn test_from_sources_skips_missing_files() {
        let dir = std::env::temp_dir().join("biq_catalog_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("customer.sql");
        std::fs::write(&path, SQL_FILE).unwrap();

        let sources = vec![
            CatalogSource::new("Top Customers", &path, 1),
            CatalogSource::new("Churn Risk", &path, 2),
            CatalogSource::new("Ghost", dir.join("missing.sql"), 1),
        ];
        let catalog = QueryCatalog::from_sources(&sources).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("Top Customers").is_some());
        assert!(catalog.get("Ghost").is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let sources = vec![CatalogSource::new("Ghost", "/nonexistent/x.sql", 1)];
        assert!(QueryCatalog::from_sources(&sources).is_err());
    }
}
