//! Read-only SQLite access.
//!
//! `rusqlite` is synchronous, so every call opens a read-only connection on
//! the blocking pool. Connections are cheap for a local file and this keeps
//! `SqliteDatabase` `Send + Sync` without a lock.

use crate::otel::{db_query_span, db_span, record_db_metrics, DbOperation};
use crate::schema::{ColumnFact, ForeignKeyRef, TableFact};
use crate::types::{AgentError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Default cap on rows returned from one query.
pub const DEFAULT_MAX_ROWS: usize = 200;

/// Tabular query result rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,

    /// More rows existed than the cap allowed
    pub truncated: bool,
}

impl QueryOutput {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render as CSV with a header row.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AgentError::InternalError(format!("CSV flush failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AgentError::InternalError(format!("CSV output not UTF-8: {}", e)))
    }
}

/// Handle to a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    path: PathBuf,
    name: String,
    max_rows: usize,
}

impl SqliteDatabase {
    /// Point at an existing database file.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::ConfigError` if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(AgentError::ConfigError(format!(
                "Database file not found: {}",
                path.display()
            )));
        }

        let name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("database")
            .to_string();

        Ok(Self {
            path,
            name,
            max_rows: DEFAULT_MAX_ROWS,
        })
    }

    /// Override the row cap for `run_query`.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    /// Database name (file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            f(&conn)
        })
        .await
        .map_err(|e| AgentError::InternalError(format!("SQLite task failed: {}", e)))?
    }

    /// Execute a query and collect up to `max_rows` rows.
    pub async fn run_query(&self, sql: &str) -> Result<QueryOutput> {
        let span = db_query_span(sql, &self.name);
        let sql = sql.to_string();
        let max_rows = self.max_rows;

        let output = self
            .with_connection(move |conn| query_rows(conn, &sql, max_rows))
            .await;

        let _guard = span.enter();
        match &output {
            Ok(out) => record_db_metrics(Some(out.row_count()), out.truncated),
            Err(e) => tracing::warn!(error = %e, "Query execution failed"),
        }
        output
    }

    /// List tables and views (name, type).
    ///
    /// Doubles as a connectivity check.
    pub async fn show_tables(&self) -> Result<QueryOutput> {
        let span = db_span(DbOperation::ShowTables, &self.name);
        let output = self
            .with_connection(|conn| {
                query_rows(
                    conn,
                    "SELECT name, type FROM sqlite_master \
                     WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
                     ORDER BY name",
                    usize::MAX,
                )
            })
            .await?;

        let _guard = span.enter();
        record_db_metrics(Some(output.row_count()), false);
        Ok(output)
    }

    /// `CREATE` statements for every table and view.
    pub async fn schema_ddl(&self) -> Result<String> {
        let span = db_span(DbOperation::ReadSchema, &self.name);
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sql FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND sql IS NOT NULL AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )?;
            let statements = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(statements.join(";\n\n") + ";")
        })
        .instrument(span)
        .await
    }

    /// Walk the catalog and collect table facts.
    pub async fn table_facts(&self) -> Result<Vec<TableFact>> {
        let span = db_span(DbOperation::Introspect, &self.name);
        let tables = self.with_connection(read_table_facts).await?;

        let _guard = span.enter();
        record_db_metrics(Some(tables.len()), false);
        Ok(tables)
    }
}

fn render(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

fn query_rows(conn: &Connection, sql: &str, max_rows: usize) -> Result<QueryOutput> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = stmt.query([])?;
    let mut collected = Vec::new();
    let mut truncated = false;

    while let Some(row) = rows.next()? {
        if collected.len() == max_rows {
            truncated = true;
            break;
        }
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(render(row.get_ref(i)?));
        }
        collected.push(values);
    }

    Ok(QueryOutput {
        columns,
        rows: collected,
        truncated,
    })
}

fn primary_key_column(conn: &Connection, table: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) WHERE pk = 1")?;
    let mut names = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;
    Ok(names.next().transpose()?)
}

fn read_table_facts(conn: &Connection) -> Result<Vec<TableFact>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )?;
    let table_names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tables = Vec::with_capacity(table_names.len());
    for table_name in table_names {
        let mut info = conn.prepare(
            "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
        )?;
        let mut columns = info
            .query_map(params![table_name], |row| {
                let not_null: i64 = row.get(2)?;
                let pk: i64 = row.get(3)?;
                Ok(ColumnFact::new(
                    &row.get::<_, String>(0)?,
                    &row.get::<_, String>(1)?,
                    not_null == 0 && pk == 0,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut fk = conn.prepare(
            "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
        )?;
        let references = fk
            .query_map(params![table_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for (from, target_table, target_column) in references {
            let target_column = match target_column {
                Some(column) => Some(column),
                None => primary_key_column(conn, &target_table)?,
            };
            let Some(target_column) = target_column else {
                continue;
            };

            if let Some(column) = columns
                .iter_mut()
                .find(|c| c.column_name == from && c.foreign_key_reference.is_none())
            {
                column.foreign_key_reference = Some(ForeignKeyRef {
                    table: target_table,
                    column: target_column,
                });
            }
        }

        tables.push(TableFact {
            table_name,
            columns,
        });
    }

    Ok(tables)
}
