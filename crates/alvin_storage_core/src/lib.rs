//! Mixed record storage for the Alvin archival platform.
//!
//! One [`RecordStorage`] contract, routed by record type to a generic
//! backend, a Fedora place repository or the read-only user database.

pub mod config;
pub mod convert;
pub mod db;
pub mod fedora;
pub mod http;
pub mod logging;
pub mod model;
pub mod storage;
pub mod xml;

pub use config::{ConfigError, FedoraConfig, StorageConfig};
pub use convert::{
    AlvinFedoraConverterFactory, AlvinRowConverterFactory, ConvertError, ConvertResult,
    FedoraConverterFactory, FedoraToRecordConverter, RecordToFedoraConverter,
    RowConverterFactory, RowToRecordConverter,
};
pub use db::{DbError, DbResult, RecordReader, SqlRow, SqliteRecordReader};
pub use fedora::FedoraRecordStorage;
pub use http::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::collected_terms::record_label;
pub use model::record::{DataAtomic, DataAttribute, DataElement, DataGroup};
pub use storage::{
    MixedRecordStorage, RecordKind, RecordStorage, SqlUserStorage, StorageError,
    StorageErrorKind, StorageReadResult, StorageResult,
};
pub use xml::{ParseError, XPathDocument};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
