//! Namespace-qualified names used to match markup identity to bindings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A namespace-qualified element or attribute name.
///
/// Two names are equal when both the namespace URI and the local part match;
/// a missing namespace only matches another missing namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI, if the name is namespaced.
    pub namespace: Option<String>,

    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Create a name without a namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Create a name qualified by a namespace URI.
    pub fn namespaced(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}
