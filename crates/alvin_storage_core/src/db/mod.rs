//! SQLite access for the read-only user table.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Read single rows and full tables as column/value maps.
//!
//! # Invariants
//! - This crate never writes to or migrates the database; the user table
//!   is owned by the external user administration system.
//! - Table and column names are validated identifiers; values are always
//!   bound as parameters.
//!
//! # See also
//! - docs/architecture/data-model.md

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod record_reader;

pub use open::{open_db, open_db_in_memory};
pub use record_reader::{RecordReader, SqlRow, SqliteRecordReader};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A single-row read matched nothing.
    NoRowFound {
        table: String,
    },
    InvalidIdentifier(String),
    /// A previous holder of the connection lock panicked.
    LockPoisoned,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NoRowFound { table } => write!(f, "no row found in table {table}"),
            Self::InvalidIdentifier(name) => write!(f, "invalid sql identifier `{name}`"),
            Self::LockPoisoned => write!(f, "database connection lock is poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NoRowFound { .. } | Self::InvalidIdentifier(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
