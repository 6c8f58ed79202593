//! Uniform record storage contract.
//!
//! # Responsibility
//! - Define [`RecordStorage`], the single contract every backend and the
//!   router implement.
//! - Define the storage error taxonomy callers branch on.
//!
//! # Invariants
//! - Records are keyed by `(record_type, id)`; nothing is cached between
//!   calls.
//! - Callers branch on [`StorageError::kind`], never on message text.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::config::ConfigError;
use crate::model::record::DataGroup;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod router;
pub mod sql_user;

pub use router::{MixedRecordStorage, RecordKind};
pub use sql_user::{SqlUserStorage, USER_TABLE};

pub type StorageResult<T> = Result<T, StorageError>;

/// Stable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    NotFound,
    NotImplemented,
    Adapter,
    Config,
}

#[derive(Debug)]
pub enum StorageError {
    /// Record absent, id unparsable, or flagged deleted by the backend.
    NotFound { record_type: String, id: String },
    /// Operation/type combination the backend does not support.
    NotImplemented {
        operation: &'static str,
        record_type: Option<String>,
    },
    /// Failure in the underlying repository or conversion step.
    Adapter {
        message: String,
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    Config(ConfigError),
}

impl StorageError {
    pub fn not_found(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    pub fn not_implemented(operation: &'static str) -> Self {
        Self::NotImplemented {
            operation,
            record_type: None,
        }
    }

    pub fn not_implemented_for_type(operation: &'static str, record_type: &str) -> Self {
        Self::NotImplemented {
            operation,
            record_type: Some(record_type.to_string()),
        }
    }

    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter {
            message: message.into(),
            source: None,
        }
    }

    pub fn adapter_with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::Adapter {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> StorageErrorKind {
        match self {
            Self::NotFound { .. } => StorageErrorKind::NotFound,
            Self::NotImplemented { .. } => StorageErrorKind::NotImplemented,
            Self::Adapter { .. } => StorageErrorKind::Adapter,
            Self::Config(_) => StorageErrorKind::Config,
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { record_type, id } => {
                write!(f, "record not found for type: {record_type} and id: {id}")
            }
            Self::NotImplemented {
                operation,
                record_type: Some(record_type),
            } => write!(f, "{operation} is not implemented for type: {record_type}"),
            Self::NotImplemented {
                operation,
                record_type: None,
            } => write!(f, "{operation} is not implemented"),
            Self::Adapter { message, .. } => write!(f, "{message}"),
            Self::Config(err) => write!(f, "invalid storage configuration: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Adapter {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for StorageError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Records returned by list operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageReadResult {
    pub list_of_data_groups: Vec<DataGroup>,
    pub total_number_of_matches: usize,
}

impl StorageReadResult {
    pub fn new(list_of_data_groups: Vec<DataGroup>) -> Self {
        let total_number_of_matches = list_of_data_groups.len();
        Self {
            list_of_data_groups,
            total_number_of_matches,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.list_of_data_groups.is_empty()
    }
}

/// Storage contract shared by every backend.
///
/// `filter` arguments are opaque query groups; backends in this crate do
/// not interpret them.
pub trait RecordStorage: Send + Sync {
    fn read(&self, record_type: &str, id: &str) -> StorageResult<DataGroup>;

    fn create(
        &self,
        record_type: &str,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
        link_list: &DataGroup,
        data_divider: &str,
    ) -> StorageResult<()>;

    fn update(
        &self,
        record_type: &str,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
        link_list: &DataGroup,
        data_divider: &str,
    ) -> StorageResult<()>;

    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()>;

    fn links_exist_for_record(&self, record_type: &str, id: &str) -> StorageResult<bool>;

    fn read_list(&self, record_type: &str, filter: &DataGroup) -> StorageResult<StorageReadResult>;

    fn read_abstract_list(
        &self,
        record_type: &str,
        filter: &DataGroup,
    ) -> StorageResult<StorageReadResult>;

    fn read_link_list(&self, record_type: &str, id: &str) -> StorageResult<DataGroup>;

    fn generate_link_collection_pointing_to_record(
        &self,
        record_type: &str,
        id: &str,
    ) -> StorageResult<Vec<DataGroup>>;

    /// Existence check for a concrete or abstract type and id.
    fn record_exists(&self, record_type: &str, id: &str) -> StorageResult<bool>;

    fn records_exist_for_record_type(&self, record_type: &str) -> StorageResult<bool>;

    fn total_number_of_records_for_type(
        &self,
        record_type: &str,
        filter: &DataGroup,
    ) -> StorageResult<usize>;

    fn total_number_of_records_for_abstract_type(
        &self,
        abstract_type: &str,
        implementing_types: &[String],
        filter: &DataGroup,
    ) -> StorageResult<usize>;
}
