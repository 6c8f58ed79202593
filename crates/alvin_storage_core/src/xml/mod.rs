//! XML parsing, XPath evaluation and declarative XML-to-record transforms.
//!
//! # Responsibility
//! - Parse repository XML into a queryable and mutable document.
//! - Interpret declarative stylesheets that map XML into records.
//!
//! # Invariants
//! - Every parse refuses document type declarations and stylesheet
//!   instructions; nothing external is ever resolved.
//! - Parsed documents live only for the duration of one conversion call.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document;
pub mod stylesheet;

pub use document::XPathDocument;
pub use stylesheet::{Presence, Rule, Stylesheet, ValueTransform};

pub type ParseResult<T> = Result<T, ParseError>;

/// Document-level failure: malformed XML, malformed XPath or bad target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MalformedXml(String),
    /// Input declared a DTD or a stylesheet instruction.
    ExternalReference(&'static str),
    MalformedXPath {
        xpath: String,
        message: String,
    },
    InvalidTarget {
        xpath: String,
        message: String,
    },
    Serialize(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedXml(message) => write!(f, "can not read xml: {message}"),
            Self::ExternalReference(kind) => {
                write!(f, "can not read xml: external {kind} resolution is disabled")
            }
            Self::MalformedXPath { xpath, message } => {
                write!(f, "unable to use xpath `{xpath}`: {message}")
            }
            Self::InvalidTarget { xpath, message } => {
                write!(f, "error setting string value on node `{xpath}`: {message}")
            }
            Self::Serialize(message) => write!(f, "error converting document to string: {message}"),
        }
    }
}

impl Error for ParseError {}
