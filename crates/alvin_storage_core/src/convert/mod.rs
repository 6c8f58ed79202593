//! Conversion between backend representations and records.
//!
//! # Responsibility
//! - Define converter contracts used by the Fedora and SQL adapters.
//! - Provide the default, type-keyed converter factories.
//!
//! # Invariants
//! - Factories only hand out converters for types they know; any other
//!   type is reported as [`ConvertError::NoConverter`].
//! - Converters are stateless between calls.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::SqlRow;
use crate::http::{HttpClient, HttpError};
use crate::model::record::DataGroup;
use crate::xml::ParseError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod place;
pub mod user;

pub use place::{PlaceFromFedoraConverter, PlaceToFedoraConverter, PLACE_STYLESHEET};
pub use user::UserFromRowConverter;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Debug)]
pub enum ConvertError {
    Parse(ParseError),
    Http(HttpError),
    /// Record lacks an element the conversion needs.
    MissingElement(&'static str),
    UnexpectedStatus {
        url: String,
        status: u16,
    },
    NoConverter {
        direction: &'static str,
        record_type: String,
    },
    InvalidRow(String),
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "error converting xml: {err}"),
            Self::Http(err) => write!(f, "{err}"),
            Self::MissingElement(path) => write!(f, "record is missing `{path}`"),
            Self::UnexpectedStatus { url, status } => {
                write!(f, "reading {url} failed, with response code: {status}")
            }
            Self::NoConverter {
                direction,
                record_type,
            } => write!(f, "no {direction} converter implemented for: {record_type}"),
            Self::InvalidRow(message) => write!(f, "invalid database row: {message}"),
        }
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for ConvertError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<HttpError> for ConvertError {
    fn from(value: HttpError) -> Self {
        Self::Http(value)
    }
}

/// Repository XML to record.
pub trait FedoraToRecordConverter {
    fn from_xml(&self, xml: &str) -> ConvertResult<DataGroup>;
}

/// Record to repository XML.
pub trait RecordToFedoraConverter {
    /// Updates the repository's current document for the record.
    fn to_xml(&self, record: &DataGroup) -> ConvertResult<String>;
    /// Builds a document for a record that does not exist yet.
    fn to_new_xml(&self, record: &DataGroup) -> ConvertResult<String>;
}

/// Type-keyed source of Fedora converters.
pub trait FedoraConverterFactory: Send + Sync {
    fn factor_to_record_converter(
        &self,
        record_type: &str,
    ) -> ConvertResult<Box<dyn FedoraToRecordConverter + '_>>;

    fn factor_to_fedora_converter(
        &self,
        record_type: &str,
    ) -> ConvertResult<Box<dyn RecordToFedoraConverter + '_>>;
}

/// Database row to record.
pub trait RowToRecordConverter {
    fn from_row(&self, row: &SqlRow) -> ConvertResult<DataGroup>;
}

/// Type-keyed source of row converters.
pub trait RowConverterFactory: Send + Sync {
    fn factor(&self, record_type: &str) -> ConvertResult<Box<dyn RowToRecordConverter + '_>>;
}

/// Default Fedora converter factory; supports `place`.
pub struct AlvinFedoraConverterFactory {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl AlvinFedoraConverterFactory {
    /// `http` is used by update conversions to fetch the current document.
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl FedoraConverterFactory for AlvinFedoraConverterFactory {
    fn factor_to_record_converter(
        &self,
        record_type: &str,
    ) -> ConvertResult<Box<dyn FedoraToRecordConverter + '_>> {
        match record_type {
            "place" => Ok(Box::new(PlaceFromFedoraConverter)),
            other => Err(ConvertError::NoConverter {
                direction: "to record",
                record_type: other.to_string(),
            }),
        }
    }

    fn factor_to_fedora_converter(
        &self,
        record_type: &str,
    ) -> ConvertResult<Box<dyn RecordToFedoraConverter + '_>> {
        match record_type {
            "place" => Ok(Box::new(PlaceToFedoraConverter::new(
                self.http.as_ref(),
                &self.base_url,
            ))),
            other => Err(ConvertError::NoConverter {
                direction: "to fedora",
                record_type: other.to_string(),
            }),
        }
    }
}

/// Default row converter factory; supports `user`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlvinRowConverterFactory;

impl RowConverterFactory for AlvinRowConverterFactory {
    fn factor(&self, record_type: &str) -> ConvertResult<Box<dyn RowToRecordConverter + '_>> {
        match record_type {
            "user" => Ok(Box::new(UserFromRowConverter)),
            other => Err(ConvertError::NoConverter {
                direction: "from database",
                record_type: other.to_string(),
            }),
        }
    }
}
