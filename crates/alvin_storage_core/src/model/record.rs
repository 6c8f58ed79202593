//! Record tree of named groups and atomic values.
//!
//! # Responsibility
//! - Represent records as ordered trees of groups and atomic leaves.
//! - Offer the small query surface converters need (first-by-name,
//!   all-by-name, by-attribute).
//!
//! # Invariants
//! - Child order is preserved exactly as inserted.
//! - Attribute order is preserved; setting an existing attribute replaces it
//!   in place.
//! - Repeat ids are opaque strings; this module never generates them.

use serde::{Deserialize, Serialize};

/// Name/value attribute attached to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAttribute {
    pub name: String,
    pub value: String,
}

/// Atomic leaf holding a single string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAtomic {
    pub name_in_data: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_id: Option<String>,
}

impl DataAtomic {
    pub fn new(name_in_data: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name_in_data: name_in_data.into(),
            value: value.into(),
            repeat_id: None,
        }
    }

    pub fn with_repeat_id(mut self, repeat_id: impl Into<String>) -> Self {
        self.repeat_id = Some(repeat_id.into());
        self
    }
}

/// One child node of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataElement {
    Group(DataGroup),
    Atomic(DataAtomic),
}

impl DataElement {
    pub fn name_in_data(&self) -> &str {
        match self {
            Self::Group(group) => &group.name_in_data,
            Self::Atomic(atomic) => &atomic.name_in_data,
        }
    }
}

impl From<DataGroup> for DataElement {
    fn from(value: DataGroup) -> Self {
        Self::Group(value)
    }
}

impl From<DataAtomic> for DataElement {
    fn from(value: DataAtomic) -> Self {
        Self::Atomic(value)
    }
}

/// Group node: ordered children plus optional attributes and repeat id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataGroup {
    pub name_in_data: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<DataAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_id: Option<String>,
    #[serde(default)]
    pub children: Vec<DataElement>,
}

impl DataGroup {
    pub fn new(name_in_data: impl Into<String>) -> Self {
        Self {
            name_in_data: name_in_data.into(),
            ..Self::default()
        }
    }

    /// Builds a record link group (`linkedRecordType` + `linkedRecordId`).
    pub fn link(
        name_in_data: impl Into<String>,
        linked_record_type: impl Into<String>,
        linked_record_id: impl Into<String>,
    ) -> Self {
        Self::new(name_in_data)
            .with_atomic("linkedRecordType", linked_record_type)
            .with_atomic("linkedRecordId", linked_record_id)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_repeat_id(mut self, repeat_id: impl Into<String>) -> Self {
        self.repeat_id = Some(repeat_id.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<DataElement>) -> Self {
        self.add_child(child);
        self
    }

    pub fn with_atomic(self, name_in_data: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_child(DataAtomic::new(name_in_data, value))
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(DataAttribute { name, value }),
        }
    }

    pub fn add_child(&mut self, child: impl Into<DataElement>) {
        self.children.push(child.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn contains_child_with_name(&self, name_in_data: &str) -> bool {
        self.children
            .iter()
            .any(|child| child.name_in_data() == name_in_data)
    }

    pub fn first_group(&self, name_in_data: &str) -> Option<&DataGroup> {
        self.children.iter().find_map(|child| match child {
            DataElement::Group(group) if group.name_in_data == name_in_data => Some(group),
            _ => None,
        })
    }

    pub fn first_atomic(&self, name_in_data: &str) -> Option<&DataAtomic> {
        self.children.iter().find_map(|child| match child {
            DataElement::Atomic(atomic) if atomic.name_in_data == name_in_data => Some(atomic),
            _ => None,
        })
    }

    pub fn first_atomic_value(&self, name_in_data: &str) -> Option<&str> {
        self.first_atomic(name_in_data)
            .map(|atomic| atomic.value.as_str())
    }

    pub fn groups_with_name<'a>(
        &'a self,
        name_in_data: &'a str,
    ) -> impl Iterator<Item = &'a DataGroup> + 'a {
        self.children.iter().filter_map(move |child| match child {
            DataElement::Group(group) if group.name_in_data == name_in_data => Some(group),
            _ => None,
        })
    }

    /// Returns child groups matching both name and one attribute pair.
    pub fn groups_with_name_and_attribute<'a>(
        &'a self,
        name_in_data: &'a str,
        attribute_name: &'a str,
        attribute_value: &'a str,
    ) -> impl Iterator<Item = &'a DataGroup> + 'a {
        self.groups_with_name(name_in_data)
            .filter(move |group| group.attribute(attribute_name) == Some(attribute_value))
    }
}
