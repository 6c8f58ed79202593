//! Row-level read contract and its SQLite implementation.

use super::{DbError, DbResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Statement};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

static SQL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"));

/// One result row keyed by column name.
pub type SqlRow = BTreeMap<String, Value>;

/// Read-only row access.
pub trait RecordReader: Send + Sync {
    /// Reads the single row where every `(column, value)` condition holds.
    ///
    /// # Errors
    /// - [`DbError::NoRowFound`] when no row matches.
    fn read_one_row(&self, table: &str, conditions: &[(&str, Value)]) -> DbResult<SqlRow>;

    /// Reads every row of `table` in storage order.
    fn read_all_from_table(&self, table: &str) -> DbResult<Vec<SqlRow>>;
}

/// SQLite-backed [`RecordReader`]. Reads are serialized on one connection.
pub struct SqliteRecordReader {
    conn: Mutex<Connection>,
}

impl SqliteRecordReader {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        super::open_db(path).map(Self::new)
    }

    fn connection(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}

impl RecordReader for SqliteRecordReader {
    fn read_one_row(&self, table: &str, conditions: &[(&str, Value)]) -> DbResult<SqlRow> {
        let started_at = Instant::now();
        let mut sql = format!("SELECT * FROM {}", checked_identifier(table)?);
        for (index, (column, _)) in conditions.iter().enumerate() {
            let keyword = if index == 0 { "WHERE" } else { "AND" };
            sql.push_str(&format!(
                " {keyword} {} = ?{}",
                checked_identifier(column)?,
                index + 1
            ));
        }
        sql.push_str(" LIMIT 1;");

        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let columns = column_names(&stmt);
        let mut rows = stmt.query(params_from_iter(conditions.iter().map(|(_, value)| value)))?;
        let row = match rows.next()? {
            Some(row) => to_sql_row(&columns, row)?,
            None => {
                debug!(
                    "event=db_read module=db status=not_found table={table} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Err(DbError::NoRowFound {
                    table: table.to_string(),
                });
            }
        };
        debug!(
            "event=db_read module=db status=ok table={table} rows=1 duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(row)
    }

    fn read_all_from_table(&self, table: &str) -> DbResult<Vec<SqlRow>> {
        let started_at = Instant::now();
        let sql = format!("SELECT * FROM {};", checked_identifier(table)?);
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let columns = column_names(&stmt);
        let mut rows = stmt.query([])?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(to_sql_row(&columns, row)?);
        }
        debug!(
            "event=db_read module=db status=ok table={table} rows={} duration_ms={}",
            result.len(),
            started_at.elapsed().as_millis()
        );
        Ok(result)
    }
}

fn checked_identifier(name: &str) -> DbResult<&str> {
    if SQL_IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn to_sql_row(columns: &[String], row: &Row<'_>) -> rusqlite::Result<SqlRow> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| Ok((column.clone(), row.get::<_, Value>(index)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{RecordReader, SqliteRecordReader};
    use crate::db::{open_db_in_memory, DbError};
    use rusqlite::types::Value;

    fn reader_with_users() -> SqliteRecordReader {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE alvin_seam_user (id INTEGER PRIMARY KEY, username TEXT, domain TEXT);
             INSERT INTO alvin_seam_user VALUES (3, 'carl', 'uu');
             INSERT INTO alvin_seam_user VALUES (1, 'anna', 'gu');",
        )
        .unwrap();
        SqliteRecordReader::new(conn)
    }

    #[test]
    fn reads_one_row_by_condition() {
        let reader = reader_with_users();
        let row = reader
            .read_one_row("alvin_seam_user", &[("id", Value::Integer(3))])
            .unwrap();
        assert_eq!(row.get("username"), Some(&Value::Text("carl".to_string())));
        assert_eq!(row.get("id"), Some(&Value::Integer(3)));
    }

    #[test]
    fn missing_row_is_reported_distinctly() {
        let reader = reader_with_users();
        let err = reader
            .read_one_row("alvin_seam_user", &[("id", Value::Integer(60000))])
            .unwrap_err();
        assert!(matches!(err, DbError::NoRowFound { .. }));
    }

    #[test]
    fn reads_every_row() {
        let reader = reader_with_users();
        let rows = reader.read_all_from_table("alvin_seam_user").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .any(|row| row.get("username") == Some(&Value::Text("anna".to_string()))));
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        let reader = reader_with_users();
        let err = reader
            .read_all_from_table("alvin_seam_user; DROP TABLE alvin_seam_user")
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier(_)));
        let err = reader
            .read_one_row("alvin_seam_user", &[("id OR 1=1", Value::Integer(1))])
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier(_)));
    }
}
