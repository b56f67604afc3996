//! Output formatting for tabular tool results.
//!
//! run_sql can return results as JSON (default), an ASCII table, or a
//! markdown table. The text formats exist because models often handle a
//! rendered table better than a wall of JSON.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

use crate::models::query::QueryResult;

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// ASCII table format (like the psql CLI)
    Table,
    /// Markdown table format
    Markdown,
}

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// Render a query result as an ASCII table with a trailing row-count line.
pub fn format_as_table(result: &QueryResult) -> String {
    let columns = &result.columns;
    let rows = &result.rows;
    if columns.is_empty() {
        return "Empty set".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.name.width()).collect();
    for row in rows {
        for (i, col) in columns.iter().enumerate() {
            if let Some(value) = row.get(&col.name) {
                let val_width = format_value(value).width();
                widths[i] = widths[i].max(val_width);
            }
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {:^width$} ", col.name, width = w))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in rows {
        let row_str: String = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| {
                let value = row.get(&col.name).cloned().unwrap_or(JsonValue::Null);
                let formatted = format_value(&value);
                if matches!(value, JsonValue::Number(_)) {
                    format!("| {:>width$} ", formatted, width = w)
                } else {
                    format!("| {:<width$} ", formatted, width = w)
                }
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_count = rows.len();
    let row_text = if row_count == 1 { "row" } else { "rows" };
    output.push_str(&format!(
        "{} {} in set ({:.2} sec)\n",
        row_count,
        row_text,
        result.execution_time_ms as f64 / 1000.0
    ));

    output
}

/// Render a query result as a markdown table.
pub fn format_as_markdown(result: &QueryResult) -> String {
    let columns = &result.columns;
    let rows = &result.rows;
    if columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();

    let header: String = columns
        .iter()
        .map(|c| format!("| {} ", c.name))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in rows {
        let row_str: String = columns
            .iter()
            .map(|col| {
                let value = row.get(&col.name).cloned().unwrap_or(JsonValue::Null);
                format!("| {} ", format_value(&value).replace('|', "\\|"))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&format!("\n*{} rows*", rows.len()));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::ColumnMetadata;

    fn result_with_rows() -> QueryResult {
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), serde_json::json!(1));
        row.insert("name".to_string(), serde_json::json!("Ada"));
        QueryResult {
            columns: vec![
                ColumnMetadata::new("id", "int8", false),
                ColumnMetadata::new("name", "text", true),
            ],
            rows: vec![row],
            rows_affected: None,
            truncated: false,
            execution_time_ms: 12,
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&JsonValue::Null), "NULL");
        assert_eq!(format_value(&serde_json::json!(42)), "42");
        assert_eq!(format_value(&serde_json::json!("x")), "x");
        assert_eq!(format_value(&serde_json::json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_table_format() {
        let output = format_as_table(&result_with_rows());
        assert!(output.contains("| id | name |"));
        assert!(output.contains("Ada"));
        assert!(output.contains("1 row in set"));
    }

    #[test]
    fn test_table_format_empty() {
        let output = format_as_table(&QueryResult::empty(5));
        assert_eq!(output, "Empty set");
    }

    #[test]
    fn test_markdown_format() {
        let output = format_as_markdown(&result_with_rows());
        assert!(output.starts_with("| id | name |"));
        assert!(output.contains("|---|---|"));
        assert!(output.contains("*1 rows*"));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let mut row = serde_json::Map::new();
        row.insert("note".to_string(), serde_json::json!("a|b"));
        let result = QueryResult {
            columns: vec![ColumnMetadata::new("note", "text", true)],
            rows: vec![row],
            rows_affected: None,
            truncated: false,
            execution_time_ms: 1,
        };
        let output = format_as_markdown(&result);
        assert!(output.contains("a\\|b"));
    }
}
