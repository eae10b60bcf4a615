//! JSON Resource Descriptor (RFC 7033 §4.4) types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resolver::relation::Relation;

/// A single link in a WebFinger document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(relation: Relation, href: impl Into<String>) -> Self {
        Self {
            rel: relation.uri().to_string(),
            href: href.into(),
        }
    }
}

/// The body returned for a resolved resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebFingerDocument {
    pub subject: String,

    pub links: Vec<Link>,

    /// Attributes without a known relation, passed through as-is.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl WebFingerDocument {
    /// Find the `href` of the first link with the given relation.
    pub fn href(&self, relation: Relation) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == relation.uri())
            .map(|link| link.href.as_str())
    }
}
