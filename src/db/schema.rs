//! Schema introspection module.
//!
//! Produces the schema and sample-row context strings handed to the model
//! alongside query tools. The output is plain text sized for a prompt, not a
//! structured catalog dump.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for
//! each database type. Database-specific implementations are in their
//! respective submodules (postgres, sqlite), each providing the same
//! interface.

use std::fmt::Write as _;

use sqlx::Row;
use tracing::debug;

use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::AgentResult;

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// List user table names, excluding any in `ignore_tables`.
    pub async fn list_tables(pool: &DbPool, ignore_tables: &[String]) -> AgentResult<Vec<String>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_tables(p, ignore_tables).await,
            DbPool::SQLite(p) => sqlite::list_tables(p, ignore_tables).await,
        }
    }

    /// Render the database schema as prompt-ready text.
    pub async fn schema_text(pool: &DbPool, ignore_tables: &[String]) -> AgentResult<String> {
        match pool {
            DbPool::Postgres(p) => postgres::schema_text(p, ignore_tables).await,
            DbPool::SQLite(p) => sqlite::schema_text(p, ignore_tables).await,
        }
    }

    /// Render sample rows from every user table as prompt-ready text.
    ///
    /// A table that fails to sample (permissions, concurrent drop) is reported
    /// inline rather than failing the whole call.
    pub async fn table_samples_text(
        pool: &DbPool,
        ignore_tables: &[String],
        limit: u32,
    ) -> AgentResult<String> {
        let tables = Self::list_tables(pool, ignore_tables).await?;
        debug!(tables = tables.len(), limit, "Sampling tables");

        let mut out = String::new();
        for table in &tables {
            let _ = writeln!(out, "--- Sample data from table: {table} ---");
            match sample_table(pool, table, limit).await {
                Ok(rendered) => out.push_str(&rendered),
                Err(e) => {
                    let _ = writeln!(out, "[Could not retrieve samples for table {table}: {e}]");
                }
            }
            out.push('\n');
        }
        Ok(out)
    }
}

/// Fetch up to `limit` rows from a table and render them as comma-separated
/// text with a header line. NULLs render as the literal `NULL`.
async fn sample_table(pool: &DbPool, table: &str, limit: u32) -> AgentResult<String> {
    let sql = format!("SELECT * FROM {} LIMIT {limit}", quote_ident(table));

    // Column order comes from the row metadata, not the JSON maps, which
    // iterate keys alphabetically
    let (columns, json_rows) = match pool {
        DbPool::Postgres(p) => collect_samples(&sqlx::query(&sql).fetch_all(p).await?),
        DbPool::SQLite(p) => collect_samples(&sqlx::query(&sql).fetch_all(p).await?),
    };

    let mut out = String::new();
    if json_rows.is_empty() {
        out.push_str("(no rows)\n");
        return Ok(out);
    }

    let _ = writeln!(out, "{}", columns.join(", "));

    for row in &json_rows {
        let line = columns
            .iter()
            .map(|c| render_cell(row.get(c.as_str())))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "{line}");
    }
    Ok(out)
}

/// Extract table-order column names plus the JSON form of each row.
fn collect_samples<R: RowToJson>(
    rows: &[R],
) -> (Vec<String>, Vec<serde_json::Map<String, serde_json::Value>>) {
    let columns = rows
        .first()
        .map(|r| {
            r.get_column_metadata()
                .into_iter()
                .map(|meta| meta.name)
                .collect()
        })
        .unwrap_or_default();
    let json_rows = rows.iter().map(|r| r.to_json_map()).collect();
    (columns, json_rows)
}

fn render_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => "NULL".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Quote an identifier with double quotes, doubling any embedded quote.
/// Valid for both Postgres and SQLite.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const LIST_COLUMNS: &str = r#"
            SELECT table_name, column_name, data_type
            FROM information_schema.columns
            WHERE table_schema = 'public'
            AND NOT (table_name = ANY($1))
            ORDER BY table_name, ordinal_position
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT tablename
            FROM pg_catalog.pg_tables
            WHERE schemaname = 'public'
            AND NOT (tablename = ANY($1))
            ORDER BY tablename
            "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES_WITH_SQL: &str = r#"
            SELECT name, sql
            FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::PgPool;

    pub async fn list_tables(pool: &PgPool, ignore_tables: &[String]) -> AgentResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .bind(ignore_tables)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| r.get::<String, _>("tablename"))
            .collect())
    }

    /// Render `Table: <name>` blocks with a column list per table, in
    /// ordinal order.
    pub async fn schema_text(pool: &PgPool, ignore_tables: &[String]) -> AgentResult<String> {
        let rows = sqlx::query(queries::postgres::LIST_COLUMNS)
            .bind(ignore_tables)
            .fetch_all(pool)
            .await?;

        let mut out = String::new();
        let mut current_table: Option<String> = None;
        for row in &rows {
            let table: String = row.get("table_name");
            let column: String = row.get("column_name");
            let data_type: String = row.get("data_type");

            if current_table.as_deref() != Some(table.as_str()) {
                if current_table.is_some() {
                    out.push('\n');
                }
                let _ = writeln!(out, "Table: {table}");
                out.push_str("Columns:\n");
                current_table = Some(table);
            }
            let _ = writeln!(out, "  - {column} ({data_type})");
        }
        if out.is_empty() {
            out.push_str("(no user tables found)\n");
        }
        Ok(out)
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;

    pub async fn list_tables(
        pool: &SqlitePool,
        ignore_tables: &[String],
    ) -> AgentResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES_WITH_SQL)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| r.get::<String, _>("name"))
            .filter(|name| !ignore_tables.contains(name))
            .collect())
    }

    /// Render each table's original CREATE statement from sqlite_master.
    pub async fn schema_text(pool: &SqlitePool, ignore_tables: &[String]) -> AgentResult<String> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES_WITH_SQL)
            .fetch_all(pool)
            .await?;

        let mut out = String::new();
        for row in &rows {
            let name: String = row.get("name");
            if ignore_tables.contains(&name) {
                continue;
            }
            let create_sql: Option<String> = row.get("sql");
            let _ = writeln!(out, "-- Schema for table: {name}");
            if let Some(sql) = create_sql {
                let _ = writeln!(out, "{sql};");
            }
            out.push('\n');
        }
        if out.is_empty() {
            out.push_str("(no user tables found)\n");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_render_cell() {
        assert_eq!(render_cell(None), "NULL");
        assert_eq!(render_cell(Some(&serde_json::Value::Null)), "NULL");
        assert_eq!(
            render_cell(Some(&serde_json::Value::String("abc".to_string()))),
            "abc"
        );
        assert_eq!(render_cell(Some(&serde_json::json!(42))), "42");
    }
}
