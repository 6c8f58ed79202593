//! Read-only `user` storage over the `alvin_seam_user` table.
//!
//! # Invariants
//! - User ids are integers; an id that does not parse is reported as
//!   NotFound, never as a format error.
//! - Existence checks never fail for `user`; every miss is `false`.

use super::{RecordStorage, StorageError, StorageReadResult, StorageResult};
use crate::convert::{AlvinRowConverterFactory, RowConverterFactory};
use crate::db::{DbError, RecordReader, SqlRow};
use crate::model::record::DataGroup;
use log::{info, warn};
use rusqlite::types::Value;
use std::time::Instant;

pub const USER_TABLE: &str = "alvin_seam_user";
const USER_TYPE: &str = "user";

/// User store backed by a [`RecordReader`].
pub struct SqlUserStorage<R, F = AlvinRowConverterFactory> {
    reader: R,
    converter_factory: F,
}

impl<R: RecordReader> SqlUserStorage<R> {
    pub fn new(reader: R) -> Self {
        Self::with_converter_factory(reader, AlvinRowConverterFactory)
    }
}

impl<R: RecordReader, F: RowConverterFactory> SqlUserStorage<R, F> {
    pub fn with_converter_factory(reader: R, converter_factory: F) -> Self {
        Self {
            reader,
            converter_factory,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    fn read_user_row(&self, id: &str) -> StorageResult<SqlRow> {
        let numeric_id: i32 = id
            .parse()
            .map_err(|_| StorageError::not_found(USER_TYPE, id))?;
        self.reader
            .read_one_row(USER_TABLE, &[("id", Value::Integer(i64::from(numeric_id)))])
            .map_err(|err| match err {
                DbError::NoRowFound { .. } => StorageError::not_found(USER_TYPE, id),
                other => StorageError::adapter_with_source(
                    format!("reading user {id} from database failed: {other}"),
                    other,
                ),
            })
    }

    fn convert_row(&self, record_type: &str, row: &SqlRow) -> StorageResult<DataGroup> {
        let converter = self
            .converter_factory
            .factor(record_type)
            .map_err(|err| StorageError::adapter_with_source(err.to_string(), err))?;
        converter
            .from_row(row)
            .map_err(|err| StorageError::adapter_with_source(err.to_string(), err))
    }
}

impl<R: RecordReader, F: RowConverterFactory> RecordStorage for SqlUserStorage<R, F> {
    fn read(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        if record_type != USER_TYPE {
            return Err(StorageError::not_implemented_for_type("read", record_type));
        }
        let row = self.read_user_row(id)?;
        self.convert_row(record_type, &row)
    }

    fn create(
        &self,
        _record_type: &str,
        _id: &str,
        _record: &DataGroup,
        _collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        Err(StorageError::not_implemented("create"))
    }

    fn update(
        &self,
        _record_type: &str,
        _id: &str,
        _record: &DataGroup,
        _collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        Err(StorageError::not_implemented("update"))
    }

    fn delete_by_type_and_id(&self, _record_type: &str, _id: &str) -> StorageResult<()> {
        Err(StorageError::not_implemented("delete_by_type_and_id"))
    }

    fn links_exist_for_record(&self, _record_type: &str, _id: &str) -> StorageResult<bool> {
        Err(StorageError::not_implemented("links_exist_for_record"))
    }

    fn read_list(&self, record_type: &str, _filter: &DataGroup) -> StorageResult<StorageReadResult> {
        Err(StorageError::not_implemented_for_type("read_list", record_type))
    }

    fn read_abstract_list(
        &self,
        record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<StorageReadResult> {
        if record_type != USER_TYPE {
            return Err(StorageError::not_implemented_for_type(
                "read_abstract_list",
                record_type,
            ));
        }

        let started_at = Instant::now();
        let rows = self.reader.read_all_from_table(USER_TABLE).map_err(|err| {
            StorageError::adapter_with_source(format!("reading all users failed: {err}"), err)
        })?;
        let users = rows
            .iter()
            .map(|row| self.convert_row(record_type, row))
            .collect::<StorageResult<Vec<_>>>()?;
        info!(
            "event=user_list module=storage status=ok count={} duration_ms={}",
            users.len(),
            started_at.elapsed().as_millis()
        );
        Ok(StorageReadResult::new(users))
    }

    fn read_link_list(&self, _record_type: &str, _id: &str) -> StorageResult<DataGroup> {
        Err(StorageError::not_implemented("read_link_list"))
    }

    fn generate_link_collection_pointing_to_record(
        &self,
        _record_type: &str,
        _id: &str,
    ) -> StorageResult<Vec<DataGroup>> {
        Err(StorageError::not_implemented(
            "generate_link_collection_pointing_to_record",
        ))
    }

    fn record_exists(&self, record_type: &str, id: &str) -> StorageResult<bool> {
        if record_type != USER_TYPE {
            return Err(StorageError::not_implemented_for_type(
                "record_exists",
                record_type,
            ));
        }
        match self.read_user_row(id) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(err) => {
                warn!("event=user_exists module=storage status=error error={err}");
                Ok(false)
            }
        }
    }

    fn records_exist_for_record_type(&self, record_type: &str) -> StorageResult<bool> {
        Err(StorageError::not_implemented_for_type(
            "records_exist_for_record_type",
            record_type,
        ))
    }

    fn total_number_of_records_for_type(
        &self,
        record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        Err(StorageError::not_implemented_for_type(
            "total_number_of_records_for_type",
            record_type,
        ))
    }

    fn total_number_of_records_for_abstract_type(
        &self,
        abstract_type: &str,
        _implementing_types: &[String],
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        Err(StorageError::not_implemented_for_type(
            "total_number_of_records_for_abstract_type",
            abstract_type,
        ))
    }
}
