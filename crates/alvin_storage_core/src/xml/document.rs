//! XPath document editor.
//!
//! # Responsibility
//! - Parse XML text into a document owned by one conversion call.
//! - Evaluate XPath expressions to strings or node-sets.
//! - Replace the text content of nodes selected by XPath.
//! - Serialize with a fixed output policy: no declaration, UTF-8, no indent.
//!
//! # Invariants
//! - A document type declaration in the prolog, or an `xml-stylesheet`
//!   instruction at document level, refuses the parse. Markup-like text in
//!   comments, CDATA or element content is data and is accepted.
//! - A mutation that selects no node, or a node without text content, fails
//!   with [`ParseError::InvalidTarget`] and leaves the document unchanged.

use super::{ParseError, ParseResult};
use sxd_document::dom::ChildOfRoot;
use sxd_document::{parser, writer, Package};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};

const STYLESHEET_TARGET: &str = "xml-stylesheet";

/// Parsed XML document with XPath query and text mutation.
pub struct XPathDocument {
    package: Package,
    factory: Factory,
}

impl XPathDocument {
    /// Parses `xml`, refusing DTDs and stylesheet instructions.
    ///
    /// # Errors
    /// - [`ParseError::ExternalReference`] when the prolog declares a
    ///   document type or the document carries an `xml-stylesheet`
    ///   instruction.
    /// - [`ParseError::MalformedXml`] when the input is not well-formed.
    pub fn parse(xml: &str) -> ParseResult<Self> {
        if prolog_declares_doctype(xml) {
            return Err(ParseError::ExternalReference("DTD"));
        }
        let package =
            parser::parse(xml).map_err(|err| ParseError::MalformedXml(format!("{err:?}")))?;
        if has_stylesheet_instruction(&package) {
            return Err(ParseError::ExternalReference("stylesheet"));
        }
        Ok(Self {
            package,
            factory: Factory::new(),
        })
    }

    /// Evaluates `xpath` and returns its XPath string value.
    pub fn string_at(&self, xpath: &str) -> ParseResult<String> {
        Ok(self.evaluate(xpath)?.string())
    }

    /// Evaluates `xpath` as a node-set and returns each node's string value
    /// in document order.
    pub fn node_values_at(&self, xpath: &str) -> ParseResult<Vec<String>> {
        match self.evaluate(xpath)? {
            Value::Nodeset(nodes) => Ok(nodes
                .document_order()
                .iter()
                .map(|node| node.string_value())
                .collect()),
            _ => Err(ParseError::MalformedXPath {
                xpath: xpath.to_string(),
                message: "expression does not select a node-set".to_string(),
            }),
        }
    }

    /// Number of nodes selected by `xpath`.
    pub fn count_at(&self, xpath: &str) -> ParseResult<usize> {
        self.node_values_at(xpath).map(|values| values.len())
    }

    /// Sets the text content of every node selected by `xpath`.
    pub fn set_text_at(&mut self, xpath: &str, value: &str) -> ParseResult<()> {
        let invalid_target = |message: &str| ParseError::InvalidTarget {
            xpath: xpath.to_string(),
            message: message.to_string(),
        };

        let nodes = match self.evaluate(xpath)? {
            Value::Nodeset(nodes) => nodes.document_order(),
            _ => return Err(invalid_target("expression does not select a node-set")),
        };
        if nodes.is_empty() {
            return Err(invalid_target("no node matches"));
        }
        if nodes.iter().any(|node| !is_text_target(node)) {
            return Err(invalid_target("selected node can not hold text"));
        }

        for node in nodes {
            match node {
                Node::Element(element) => {
                    element.set_text(value);
                }
                Node::Text(text) => {
                    text.set_text(value);
                }
                Node::Attribute(attribute) => {
                    if let Some(parent) = attribute.parent() {
                        parent.set_attribute_value(attribute.name(), value);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Serializes the document without XML declaration or indentation.
    pub fn to_xml_string(&self) -> ParseResult<String> {
        let document = self.package.as_document();
        let mut output = Vec::new();
        writer::format_document(&document, &mut output)
            .map_err(|err| ParseError::Serialize(err.to_string()))?;
        let text =
            String::from_utf8(output).map_err(|err| ParseError::Serialize(err.to_string()))?;
        Ok(strip_declaration(&text).to_string())
    }

    fn evaluate(&self, xpath: &str) -> ParseResult<Value<'_>> {
        let malformed = |message: String| ParseError::MalformedXPath {
            xpath: xpath.to_string(),
            message,
        };
        let compiled = self
            .factory
            .build(xpath)
            .map_err(|err| malformed(err.to_string()))?
            .ok_or_else(|| malformed("empty xpath".to_string()))?;
        let document = self.package.as_document();
        let context = Context::new();
        compiled
            .evaluate(&context, document.root())
            .map_err(|err| malformed(err.to_string()))
    }
}

fn is_text_target(node: &Node<'_>) -> bool {
    matches!(node, Node::Element(_) | Node::Text(_) | Node::Attribute(_))
}

/// Walks the prolog past the declaration, comments and processing
/// instructions. Stops at the first other markup.
fn prolog_declares_doctype(xml: &str) -> bool {
    let mut rest = xml.trim_start_matches('\u{feff}');
    loop {
        rest = rest.trim_start();
        let skip = if rest.starts_with("<!--") {
            rest.find("-->").map(|end| end + 3)
        } else if rest.starts_with("<?") {
            rest.find("?>").map(|end| end + 2)
        } else {
            return rest.starts_with("<!DOCTYPE");
        };
        match skip {
            Some(end) => rest = &rest[end..],
            None => return false,
        }
    }
}

fn has_stylesheet_instruction(package: &Package) -> bool {
    package
        .as_document()
        .root()
        .children()
        .into_iter()
        .any(|child| match child {
            ChildOfRoot::ProcessingInstruction(pi) => pi.target() == STYLESHEET_TARGET,
            _ => false,
        })
}

fn strip_declaration(text: &str) -> &str {
    let body = if text.starts_with("<?xml ") {
        text.find("?>").map_or(text, |end| &text[end + 2..])
    } else {
        text
    };
    body.trim_start()
}
