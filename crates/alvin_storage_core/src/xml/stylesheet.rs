//! Declarative XML-to-record stylesheets.
//!
//! # Responsibility
//! - Describe how repository XML maps onto a record as a static rule table.
//! - Interpret rule tables against a parsed [`XPathDocument`].
//!
//! # Invariants
//! - Absent source data never produces empty placeholders: atomics with an
//!   empty value and groups without required children are omitted.
//! - Repeated groups get repeat ids `0..n` in source document order.
//! - Relative selects are resolved against the enclosing repeat item.

use super::document::XPathDocument;
use super::{ParseError, ParseResult};
use crate::model::record::{DataAtomic, DataElement, DataGroup};
use chrono::NaiveDateTime;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new("([a-z0-9])([A-Z])").expect("camel boundary regex is valid"));
static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^A-Za-z0-9]+").expect("separator regex is valid"));

const TIMESTAMP_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
];
const TIMESTAMP_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Post-processing applied to a selected string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    /// Whitespace-trimmed text.
    Text,
    /// Normalized to `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
    Timestamp,
    /// Lower-case, underscore separated ASCII token.
    Token,
}

/// When a [`Rule::Group`] is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Emitted when at least one child rule produced output.
    AnyChild,
    /// Emitted only when every child rule produced output.
    AllChildren,
}

/// One declarative mapping rule.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Atomic {
        name: &'static str,
        select: &'static str,
        transform: ValueTransform,
    },
    Constant {
        name: &'static str,
        value: &'static str,
    },
    Group {
        name: &'static str,
        attributes: &'static [(&'static str, &'static str)],
        presence: Presence,
        children: &'static [Rule],
    },
    /// One group per node selected by `for_each`; when nothing is selected
    /// and `fallback` selects a node, one group is built from the fallback.
    Repeat {
        name: &'static str,
        attributes: &'static [(&'static str, &'static str)],
        for_each: &'static str,
        fallback: Option<&'static str>,
        children: &'static [Rule],
    },
    /// Applies `rules` relative to the first node selected by `select`.
    Within {
        select: &'static str,
        rules: &'static [Rule],
    },
}

/// A complete XML-to-record mapping.
#[derive(Debug, Clone, Copy)]
pub struct Stylesheet {
    /// Name of the produced record root group.
    pub root_name: &'static str,
    pub root_attributes: &'static [(&'static str, &'static str)],
    /// XPath that must select the source root element.
    pub source_root: &'static str,
    pub rules: &'static [Rule],
}

impl Stylesheet {
    /// Parses `xml` and applies this stylesheet to it.
    pub fn transform(&self, xml: &str) -> ParseResult<DataGroup> {
        let document = XPathDocument::parse(xml)?;
        self.apply(&document)
    }

    /// Applies this stylesheet to an already parsed document.
    pub fn apply(&self, document: &XPathDocument) -> ParseResult<DataGroup> {
        if document.count_at(self.source_root)? == 0 {
            return Err(ParseError::MalformedXml(format!(
                "missing `{}` element",
                self.source_root
            )));
        }

        let mut root = with_attributes(DataGroup::new(self.root_name), self.root_attributes);
        for rule in self.rules {
            root.children.extend(apply_rule(document, rule, None)?);
        }
        Ok(root)
    }
}

fn apply_rule(
    document: &XPathDocument,
    rule: &Rule,
    base: Option<&str>,
) -> ParseResult<Vec<DataElement>> {
    match *rule {
        Rule::Atomic {
            name,
            select,
            transform,
        } => {
            let raw = document.string_at(&resolve(base, select))?;
            let value = apply_transform(raw.trim(), transform);
            if value.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![DataAtomic::new(name, value).into()])
        }
        Rule::Constant { name, value } => Ok(vec![DataAtomic::new(name, value).into()]),
        Rule::Group {
            name,
            attributes,
            presence,
            children,
        } => Ok(build_group(document, name, attributes, presence, children, base)?
            .map(DataElement::from)
            .into_iter()
            .collect()),
        Rule::Repeat {
            name,
            attributes,
            for_each,
            fallback,
            children,
        } => {
            let selector = resolve(base, for_each);
            let mut item_bases: Vec<String> = (1..=document.count_at(&selector)?)
                .map(|position| format!("({selector})[{position}]"))
                .collect();
            if item_bases.is_empty() {
                if let Some(fallback) = fallback {
                    let fallback = resolve(base, fallback);
                    if document.count_at(&fallback)? > 0 {
                        item_bases.push(format!("({fallback})[1]"));
                    }
                }
            }

            let mut repeated = Vec::with_capacity(item_bases.len());
            for item_base in &item_bases {
                let item = build_group(
                    document,
                    name,
                    attributes,
                    Presence::AnyChild,
                    children,
                    Some(item_base.as_str()),
                )?;
                if let Some(item) = item {
                    let repeat_id = repeated.len().to_string();
                    repeated.push(item.with_repeat_id(repeat_id).into());
                }
            }
            Ok(repeated)
        }
        Rule::Within { select, rules } => {
            let scope = format!("({})[1]", resolve(base, select));
            let mut produced = Vec::new();
            for rule in rules {
                produced.extend(apply_rule(document, rule, Some(scope.as_str()))?);
            }
            Ok(produced)
        }
    }
}

fn build_group(
    document: &XPathDocument,
    name: &str,
    attributes: &[(&str, &str)],
    presence: Presence,
    children: &[Rule],
    base: Option<&str>,
) -> ParseResult<Option<DataGroup>> {
    let mut group = with_attributes(DataGroup::new(name), attributes);
    let mut produced_rules = 0;
    for child in children {
        let produced = apply_rule(document, child, base)?;
        if !produced.is_empty() {
            produced_rules += 1;
        }
        group.children.extend(produced);
    }

    let keep = match presence {
        Presence::AnyChild => produced_rules > 0,
        Presence::AllChildren => produced_rules == children.len(),
    };
    Ok(keep.then_some(group))
}

fn with_attributes(mut group: DataGroup, attributes: &[(&str, &str)]) -> DataGroup {
    for (name, value) in attributes {
        group.set_attribute(*name, *value);
    }
    group
}

fn resolve(base: Option<&str>, select: &str) -> String {
    match base {
        Some(base) if !select.starts_with('/') => format!("{base}/{select}"),
        _ => select.to_string(),
    }
}

fn apply_transform(value: &str, transform: ValueTransform) -> String {
    match transform {
        ValueTransform::Text => value.to_string(),
        ValueTransform::Timestamp => normalize_timestamp(value),
        ValueTransform::Token => normalize_token(value),
    }
}

/// Normalizes repository timestamps to `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
///
/// Accepts an optional trailing ` UTC`. Unrecognized input is returned
/// trimmed but otherwise unchanged.
pub fn normalize_timestamp(value: &str) -> String {
    let trimmed = value.trim();
    let without_zone = trimmed.strip_suffix(" UTC").unwrap_or(trimmed).trim();
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(without_zone, format).ok())
        .map(|timestamp| timestamp.format(TIMESTAMP_OUTPUT_FORMAT).to_string())
        .unwrap_or_else(|| {
            debug!("event=timestamp_normalize module=xml status=skipped reason=unrecognized_format");
            without_zone.to_string()
        })
}

/// Normalizes free text into a lower-case, underscore separated token.
///
/// Diacritics are stripped and camelCase words are split.
pub fn normalize_token(value: &str) -> String {
    let without_marks: String = value.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let split = CAMEL_BOUNDARY.replace_all(&without_marks, "${1}_${2}");
    let joined = NON_ALPHANUMERIC.replace_all(&split, "_");
    joined.trim_matches('_').to_ascii_lowercase()
}
