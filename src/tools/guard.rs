//! SQL statement gating for the run_sql tool.
//!
//! Read statements are always allowed. DML and DDL are allowed only against
//! sources configured as writable. Transaction control is rejected outright
//! since every statement runs in auto-commit mode against a shared pool.
//!
//! Uses [sqlparser](https://docs.rs/sqlparser/) for accurate SQL parsing,
//! ensuring that no write operation can slip through via formatting tricks
//! or dialect quirks.

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::error::{AgentError, AgentResult};
use crate::models::source::SourceKind;

/// What a statement does, as far as gating is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlAccess {
    /// SELECT, EXPLAIN over a read, SHOW-style statements
    Read,
    /// INSERT, UPDATE, DELETE, and DDL
    Write,
}

/// Statement categories used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementType {
    Read,
    DmlWrite,
    Ddl,
    Transaction,
    Other,
}

fn dialect_for(kind: SourceKind) -> Box<dyn Dialect> {
    match kind {
        SourceKind::Sqlite => Box::new(SQLiteDialect {}),
        _ => Box::new(PostgreSqlDialect {}),
    }
}

/// Check a SQL string against the source's write permission.
///
/// Returns the effective access level so the caller knows whether to fetch
/// rows or execute for an affected-row count. For multi-statement input the
/// strictest statement wins.
pub fn ensure_allowed(sql: &str, kind: SourceKind, writable: bool) -> AgentResult<SqlAccess> {
    let dialect = dialect_for(kind);
    let statements = Parser::parse_sql(dialect.as_ref(), sql)
        .map_err(|e| AgentError::invalid_input(format!("Failed to parse SQL: {}", e)))?;

    if statements.is_empty() {
        return Err(AgentError::invalid_input("Empty SQL statement"));
    }

    let mut access = SqlAccess::Read;
    for stmt in &statements {
        let (stmt_type, operation) = classify_statement(stmt);
        match stmt_type {
            StatementType::Read => {}
            StatementType::DmlWrite | StatementType::Ddl => {
                if !writable {
                    return Err(AgentError::permission(
                        operation,
                        "This data source is read-only. Set 'writable: true' in its registry entry to allow modifications.",
                    ));
                }
                access = SqlAccess::Write;
            }
            StatementType::Transaction => {
                return Err(AgentError::permission(
                    operation,
                    "Transaction control statements are not supported. Each statement runs in auto-commit mode.",
                ));
            }
            StatementType::Other => {
                return Err(AgentError::permission(
                    operation,
                    "This kind of statement is not supported by run_sql.",
                ));
            }
        }
    }
    Ok(access)
}

/// Classify a parsed statement.
fn classify_statement(stmt: &Statement) -> (StatementType, &'static str) {
    match stmt {
        // =====================================================================
        // Read-only operations
        // =====================================================================
        Statement::Query(_) => (StatementType::Read, "SELECT"),
        Statement::ShowTables { .. } => (StatementType::Read, "SHOW TABLES"),
        Statement::ShowColumns { .. } => (StatementType::Read, "SHOW COLUMNS"),
        Statement::ShowDatabases { .. } => (StatementType::Read, "SHOW DATABASES"),
        Statement::ShowSchemas { .. } => (StatementType::Read, "SHOW SCHEMAS"),
        Statement::ShowCreate { .. } => (StatementType::Read, "SHOW CREATE"),
        Statement::ShowVariable { .. } => (StatementType::Read, "SHOW VARIABLE"),
        Statement::ExplainTable { .. } => (StatementType::Read, "EXPLAIN TABLE"),

        // EXPLAIN inherits the classification of the statement it wraps
        Statement::Explain { statement, .. } => {
            let (inner_type, inner_name) = classify_statement(statement);
            if inner_type == StatementType::Read {
                (StatementType::Read, "EXPLAIN")
            } else {
                (inner_type, inner_name)
            }
        }

        // =====================================================================
        // DML write operations
        // =====================================================================
        Statement::Insert(_) => (StatementType::DmlWrite, "INSERT"),
        Statement::Update { .. } => (StatementType::DmlWrite, "UPDATE"),
        Statement::Delete(_) => (StatementType::DmlWrite, "DELETE"),
        Statement::Merge { .. } => (StatementType::DmlWrite, "MERGE"),
        Statement::Copy { .. } => (StatementType::DmlWrite, "COPY"),

        // =====================================================================
        // DDL operations
        // =====================================================================
        Statement::CreateTable { .. } => (StatementType::Ddl, "CREATE TABLE"),
        Statement::CreateView { .. } => (StatementType::Ddl, "CREATE VIEW"),
        Statement::CreateIndex(_) => (StatementType::Ddl, "CREATE INDEX"),
        Statement::CreateSchema { .. } => (StatementType::Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => (StatementType::Ddl, "CREATE DATABASE"),
        Statement::CreateSequence { .. } => (StatementType::Ddl, "CREATE SEQUENCE"),
        Statement::CreateType { .. } => (StatementType::Ddl, "CREATE TYPE"),
        Statement::CreateFunction { .. } => (StatementType::Ddl, "CREATE FUNCTION"),
        Statement::CreateProcedure { .. } => (StatementType::Ddl, "CREATE PROCEDURE"),
        Statement::CreateTrigger { .. } => (StatementType::Ddl, "CREATE TRIGGER"),
        Statement::CreateVirtualTable { .. } => (StatementType::Ddl, "CREATE VIRTUAL TABLE"),
        Statement::CreateExtension { .. } => (StatementType::Ddl, "CREATE EXTENSION"),
        Statement::AlterTable { .. } => (StatementType::Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => (StatementType::Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => (StatementType::Ddl, "ALTER INDEX"),
        Statement::AlterType { .. } => (StatementType::Ddl, "ALTER TYPE"),
        Statement::Drop { .. } => (StatementType::Ddl, "DROP"),
        Statement::DropFunction { .. } => (StatementType::Ddl, "DROP FUNCTION"),
        Statement::DropProcedure { .. } => (StatementType::Ddl, "DROP PROCEDURE"),
        Statement::DropTrigger { .. } => (StatementType::Ddl, "DROP TRIGGER"),
        Statement::Truncate { .. } => (StatementType::Ddl, "TRUNCATE"),
        Statement::Comment { .. } => (StatementType::Ddl, "COMMENT"),

        // =====================================================================
        // Transaction control - always rejected
        // =====================================================================
        Statement::StartTransaction { .. } => (StatementType::Transaction, "BEGIN"),
        Statement::Commit { .. } => (StatementType::Transaction, "COMMIT"),
        Statement::Rollback { .. } => (StatementType::Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => (StatementType::Transaction, "SAVEPOINT"),
        Statement::ReleaseSavepoint { .. } => (StatementType::Transaction, "RELEASE SAVEPOINT"),

        // =====================================================================
        // Everything else - rejected
        // =====================================================================
        Statement::Call { .. } => (StatementType::Other, "CALL"),
        Statement::Execute { .. } => (StatementType::Other, "EXECUTE"),
        Statement::Prepare { .. } => (StatementType::Other, "PREPARE"),
        Statement::Grant { .. } => (StatementType::Other, "GRANT"),
        Statement::Revoke { .. } => (StatementType::Other, "REVOKE"),
        Statement::Set(_) => (StatementType::Other, "SET"),
        Statement::Use(_) => (StatementType::Other, "USE"),
        Statement::Vacuum { .. } => (StatementType::Other, "VACUUM"),
        Statement::Analyze { .. } => (StatementType::Other, "ANALYZE"),
        Statement::LockTables { .. } => (StatementType::Other, "LOCK"),
        Statement::UnlockTables => (StatementType::Other, "UNLOCK"),
        Statement::Pragma { .. } => (StatementType::Other, "PRAGMA"),
        Statement::AttachDatabase { .. } => (StatementType::Other, "ATTACH"),
        Statement::LISTEN { .. } => (StatementType::Other, "LISTEN"),
        Statement::NOTIFY { .. } => (StatementType::Other, "NOTIFY"),
        _ => (StatementType::Other, "Unknown"),
    }
}
