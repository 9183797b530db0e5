//! In-memory element tree.

use crate::qname::QName;
use serde::{Deserialize, Serialize};

/// A node in the markup tree.
///
/// Attributes keep document order; children keep document order. Equality is
/// structural, so two trees that differ only in source formatting compare
/// equal once materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element name.
    pub name: QName,

    /// Attributes in document order.
    pub attributes: Vec<(QName, String)>,

    /// Direct text content.
    pub text: String,

    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element with the given name.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Create an element holding only text.
    pub fn with_text(name: QName, text: impl Into<String>) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Append a child element.
    pub fn add_child(&mut self, child: Element) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Append an attribute.
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) -> &mut Self {
        self.attributes.push((name, value.into()));
        self
    }

    /// Find the first child with the given name.
    pub fn find_child(&self, name: &QName) -> Option<&Element> {
        self.children.iter().find(|c| &c.name == name)
    }

    /// Find all children with the given name.
    pub fn find_children(&self, name: &QName) -> Vec<&Element> {
        self.children.iter().filter(|c| &c.name == name).collect()
    }

    /// Look up an attribute value by name.
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
