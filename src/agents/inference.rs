//! SQLite-backed data lookup.
//!
//! Flow for one `Inference:` step:
//!
//! ```text
//! step text ─► (graph analysis) ─► model writes SQL ─► extract ─► read-only check ─► run ─► format
//! ```

use crate::agents::analysis::{analyze_question, enhanced_prompt};
use crate::agents::DataLookup;
use crate::database::{QueryOutput, SqliteDatabase};
use crate::llm::{prompts, CompletionModel};
use crate::schema::SchemaGraph;
use crate::types::{AgentError, Result};
use async_trait::async_trait;
use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::sync::{Arc, LazyLock};
use tokio::sync::OnceCell;

static SQL_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:sqlite|sql)?[ \t]*\n?(.*?)```").expect("valid SQL fence pattern")
});

/// Pull the SQL out of a model reply.
///
/// Takes the first fenced block if there is one, otherwise the whole reply.
/// Trailing semicolons are dropped.
pub fn extract_sql(reply: &str) -> String {
    let body = SQL_FENCE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply);

    body.trim().trim_end_matches(';').trim_end().to_string()
}

/// Accept exactly one query statement.
///
/// # Errors
///
/// - `AgentError::SqlParseError` if the text is not SQL
/// - `AgentError::ReadOnlyViolation` for anything but a single query
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql)?;

    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [] => Err(AgentError::ReadOnlyViolation("empty statement".to_string())),
        [_] => Err(AgentError::ReadOnlyViolation(sql.to_string())),
        many => Err(AgentError::ReadOnlyViolation(format!(
            "expected one statement, found {}: {}",
            many.len(),
            sql
        ))),
    }
}

fn summarize(output: &QueryOutput) -> String {
    let count = output.row_count();
    let mut summary = match count {
        0 => "No rows returned.".to_string(),
        1 => "1 row returned.".to_string(),
        n => format!("{} rows returned.", n),
    };
    if output.truncated {
        summary.push_str(&format!(" Output truncated to the first {} rows.", count));
    }
    summary
}

/// Answers inference steps by having a model write SQL against the database.
pub struct InferenceAgent {
    llm: Arc<dyn CompletionModel>,
    db: SqliteDatabase,
    ddl: OnceCell<String>,
}

impl InferenceAgent {
    pub fn new(llm: Arc<dyn CompletionModel>, db: SqliteDatabase) -> Self {
        Self {
            llm,
            db,
            ddl: OnceCell::new(),
        }
    }

    /// Build the model input for a step.
    ///
    /// With a non-empty graph the question is prefixed by the structural
    /// analysis; otherwise it is sent as-is.
    pub fn build_prompt(&self, query: &str, context: Option<&SchemaGraph>) -> String {
        match context {
            Some(graph) if !graph.is_empty() => {
                let analysis = analyze_question(graph, query);
                tracing::info!(
                    tables = ?analysis.table_names(),
                    relationships = analysis.relationships.len(),
                    "Graph analysis complete"
                );
                enhanced_prompt(&analysis, query)
            }
            _ => {
                tracing::info!("No graph available, using plain question");
                query.to_string()
            }
        }
    }

    async fn ddl(&self) -> Result<&str> {
        let ddl = self
            .ddl
            .get_or_try_init(|| async { self.db.schema_ddl().await })
            .await?;
        Ok(ddl.as_str())
    }
}

#[async_trait]
impl DataLookup for InferenceAgent {
    async fn execute(&self, query: &str, context: Option<&SchemaGraph>) -> Result<String> {
        let prompt = self.build_prompt(query, context);
        let ddl = self.ddl().await?;

        let reply = self
            .llm
            .complete(&prompts::inference(self.db.name(), ddl), &prompt)
            .await?;
        let sql = extract_sql(&reply);
        tracing::debug!(sql = %sql, "Model produced SQL");

        ensure_read_only(&sql).inspect_err(|e| tracing::warn!(error = %e, "Rejected generated SQL"))?;

        let output = self.db.run_query(&sql).await?;
        let results = output.to_csv()?;

        Ok(format!(
            "Query Executed: {}\nResults:\n{}\nSummary: {}",
            sql,
            results.trim_end(),
            summarize(&output)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql_from_fence() {
        assert_eq!(extract_sql("```sql\nSELECT count(*) FROM artists;\n```"), "SELECT count(*) FROM artists");
        assert_eq!(
            extract_sql("Here you go:\n```\nSELECT 1\n```\nHope that helps."),
            "SELECT 1"
        );
        assert_eq!(extract_sql("```SELECT 2```"), "SELECT 2");
        assert_eq!(extract_sql("  SELECT 3;  "), "SELECT 3");
    }

    #[test]
    fn test_read_only_accepts_queries() {
        assert!(ensure_read_only("SELECT name FROM artists").is_ok());
        assert!(ensure_read_only("WITH t AS (SELECT 1 AS x) SELECT x FROM t").is_ok());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        assert!(matches!(
            ensure_read_only("DELETE FROM artists"),
            Err(AgentError::ReadOnlyViolation(_))
        ));
        assert!(matches!(
            ensure_read_only("DROP TABLE artists"),
            Err(AgentError::ReadOnlyViolation(_))
        ));
        assert!(matches!(
            ensure_read_only("SELECT 1; DELETE FROM artists"),
            Err(AgentError::ReadOnlyViolation(_))
        ));
        assert!(matches!(
            ensure_read_only("sorry, I can't help with that"),
            Err(AgentError::SqlParseError(_))
        ));
    }

    #[test]
    fn test_summary_wording() {
        let output = QueryOutput {
            columns: vec!["n".into()],
            rows: vec![vec!["5".into()]],
            truncated: false,
        };
        assert_eq!(summarize(&output), "1 row returned.");

        let output = QueryOutput {
            columns: vec!["n".into()],
            rows: vec![vec!["1".into()], vec!["2".into()]],
            truncated: true,
        };
        assert_eq!(
            summarize(&output),
            "2 rows returned. Output truncated to the first 2 rows."
        );
    }
}
