//! Type-based dispatch across the generic, Fedora and SQL backends.
//!
//! # Responsibility
//! - Implement [`RecordStorage`] by forwarding each call to one backend.
//!
//! # Invariants
//! - The record type is classified once per call into a [`RecordKind`].
//! - Every operation/kind pair without an explicit backend goes to the
//!   generic backend; dispatch adds no errors and no conversions.
//! - `record_exists` for `user` goes to the generic backend even though
//!   user reads go to SQL.

use super::sql_user::SqlUserStorage;
use super::{RecordStorage, StorageError, StorageReadResult, StorageResult};
use crate::config::StorageConfig;
use crate::db::SqliteRecordReader;
use crate::fedora::FedoraRecordStorage;
use crate::http::ReqwestHttpClient;
use crate::model::record::DataGroup;
use log::{debug, info};
use std::sync::Arc;

/// Record types with a dedicated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Place,
    User,
    Other,
}

impl RecordKind {
    pub fn of(record_type: &str) -> Self {
        match record_type {
            "place" => Self::Place,
            "user" => Self::User,
            _ => Self::Other,
        }
    }
}

/// Which backend served a call; used for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Generic,
    Fedora,
    Sql,
}

impl Backend {
    fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Fedora => "fedora",
            Self::Sql => "sql",
        }
    }
}

/// Mixed storage routing by record type.
pub struct MixedRecordStorage {
    generic: Arc<dyn RecordStorage>,
    fedora: Arc<dyn RecordStorage>,
    sql_user: Arc<dyn RecordStorage>,
    guest_user_id: Option<String>,
}

impl MixedRecordStorage {
    pub fn new(
        generic: Arc<dyn RecordStorage>,
        fedora: Arc<dyn RecordStorage>,
        sql_user: Arc<dyn RecordStorage>,
    ) -> Self {
        Self {
            generic,
            fedora,
            sql_user,
            guest_user_id: None,
        }
    }

    /// Assembles the Fedora and SQL backends described by `config` around
    /// the caller's `generic` backend.
    ///
    /// # Errors
    /// - [`StorageError::Config`] when `config` does not validate.
    /// - [`StorageError::Adapter`] when the HTTP client or the user database
    ///   can not be opened.
    pub fn from_config(
        config: &StorageConfig,
        generic: Arc<dyn RecordStorage>,
    ) -> StorageResult<Self> {
        config.validate()?;
        let http = ReqwestHttpClient::new()
            .map_err(|err| StorageError::adapter_with_source(err.to_string(), err))?;
        let fedora = FedoraRecordStorage::with_default_converters(
            config.fedora.clone(),
            Arc::new(http),
        );
        let reader = SqliteRecordReader::open(&config.user_db).map_err(|err| {
            let message = format!("unable to open user database: {err}");
            StorageError::adapter_with_source(message, err)
        })?;

        let mut storage = Self::new(
            generic,
            Arc::new(fedora),
            Arc::new(SqlUserStorage::new(reader)),
        );
        if let Some(guest_user_id) = &config.guest_user_id {
            storage = storage.with_guest_user_id(guest_user_id.as_str());
        }
        info!(
            "event=storage_assemble module=storage status=ok guest_user={}",
            storage.guest_user_id.is_some()
        );
        Ok(storage)
    }

    /// Reads of this user id go to the generic backend instead of SQL.
    pub fn with_guest_user_id(mut self, guest_user_id: impl Into<String>) -> Self {
        self.guest_user_id = Some(guest_user_id.into());
        self
    }

    pub fn guest_user_id(&self) -> Option<&str> {
        self.guest_user_id.as_deref()
    }

    fn backend(&self, backend: Backend, operation: &str, record_type: &str) -> &dyn RecordStorage {
        debug!(
            "event=storage_route module=storage operation={operation} record_type={record_type} backend={}",
            backend.as_str()
        );
        match backend {
            Backend::Generic => self.generic.as_ref(),
            Backend::Fedora => self.fedora.as_ref(),
            Backend::Sql => self.sql_user.as_ref(),
        }
    }

    fn is_guest(&self, id: &str) -> bool {
        self.guest_user_id.as_deref() == Some(id)
    }
}

impl RecordStorage for MixedRecordStorage {
    fn read(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        let backend = match RecordKind::of(record_type) {
            RecordKind::Place => Backend::Fedora,
            RecordKind::User if !self.is_guest(id) => Backend::Sql,
            RecordKind::User | RecordKind::Other => Backend::Generic,
        };
        self.backend(backend, "read", record_type)
            .read(record_type, id)
    }

    fn create(
        &self,
        record_type: &str,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
        link_list: &DataGroup,
        data_divider: &str,
    ) -> StorageResult<()> {
        let backend = match RecordKind::of(record_type) {
            RecordKind::Place => Backend::Fedora,
            RecordKind::User | RecordKind::Other => Backend::Generic,
        };
        self.backend(backend, "create", record_type).create(
            record_type,
            id,
            record,
            collected_terms,
            link_list,
            data_divider,
        )
    }

    fn update(
        &self,
        record_type: &str,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
        link_list: &DataGroup,
        data_divider: &str,
    ) -> StorageResult<()> {
        let backend = match RecordKind::of(record_type) {
            RecordKind::Place => Backend::Fedora,
            RecordKind::User | RecordKind::Other => Backend::Generic,
        };
        self.backend(backend, "update", record_type).update(
            record_type,
            id,
            record,
            collected_terms,
            link_list,
            data_divider,
        )
    }

    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()> {
        self.backend(Backend::Generic, "delete_by_type_and_id", record_type)
            .delete_by_type_and_id(record_type, id)
    }

    fn links_exist_for_record(&self, record_type: &str, id: &str) -> StorageResult<bool> {
        self.backend(Backend::Generic, "links_exist_for_record", record_type)
            .links_exist_for_record(record_type, id)
    }

    fn read_list(&self, record_type: &str, filter: &DataGroup) -> StorageResult<StorageReadResult> {
        let backend = match RecordKind::of(record_type) {
            RecordKind::Place => Backend::Fedora,
            RecordKind::User | RecordKind::Other => Backend::Generic,
        };
        self.backend(backend, "read_list", record_type)
            .read_list(record_type, filter)
    }

    fn read_abstract_list(
        &self,
        record_type: &str,
        filter: &DataGroup,
    ) -> StorageResult<StorageReadResult> {
        let backend = match RecordKind::of(record_type) {
            RecordKind::User => Backend::Sql,
            RecordKind::Place | RecordKind::Other => Backend::Generic,
        };
        self.backend(backend, "read_abstract_list", record_type)
            .read_abstract_list(record_type, filter)
    }

    fn read_link_list(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        self.backend(Backend::Generic, "read_link_list", record_type)
            .read_link_list(record_type, id)
    }

    fn generate_link_collection_pointing_to_record(
        &self,
        record_type: &str,
        id: &str,
    ) -> StorageResult<Vec<DataGroup>> {
        self.backend(
            Backend::Generic,
            "generate_link_collection_pointing_to_record",
            record_type,
        )
        .generate_link_collection_pointing_to_record(record_type, id)
    }

    fn record_exists(&self, record_type: &str, id: &str) -> StorageResult<bool> {
        self.backend(Backend::Generic, "record_exists", record_type)
            .record_exists(record_type, id)
    }

    fn records_exist_for_record_type(&self, record_type: &str) -> StorageResult<bool> {
        self.backend(Backend::Generic, "records_exist_for_record_type", record_type)
            .records_exist_for_record_type(record_type)
    }

    fn total_number_of_records_for_type(
        &self,
        record_type: &str,
        filter: &DataGroup,
    ) -> StorageResult<usize> {
        self.backend(Backend::Generic, "total_number_of_records_for_type", record_type)
            .total_number_of_records_for_type(record_type, filter)
    }

    fn total_number_of_records_for_abstract_type(
        &self,
        abstract_type: &str,
        implementing_types: &[String],
        filter: &DataGroup,
    ) -> StorageResult<usize> {
        self.backend(
            Backend::Generic,
            "total_number_of_records_for_abstract_type",
            abstract_type,
        )
        .total_number_of_records_for_abstract_type(abstract_type, implementing_types, filter)
    }
}
