//! Query resolution.
//!
//! # Responsibilities
//! - Normalize the requested resource (default subject, `acct:` prefix)
//! - Look it up in the active snapshot
//! - Build the full, single-relation, or issuer response
//!
//! # Design Decisions
//! - Resolution is a pure function of (snapshot, query); the engine only
//!   picks the snapshot, so fixtures can drive it directly
//! - Each request reads one snapshot and uses it throughout
//! - No partial documents: every outcome is complete or an error

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::config::store::{AttributeSet, ConfigStore, Snapshot};
use crate::resolver::document::{Link, WebFingerDocument};
use crate::resolver::relation::Relation;

const ACCT_PREFIX: &str = "acct:";

/// An inbound lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Requested resource, with or without `acct:`.
    pub resource: Option<String>,
    /// Relation filter.
    pub rel: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }
}

/// Successful outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A full or relation-filtered document.
    Document(WebFingerDocument),
    /// OpenID issuer discovery: no body, the issuer host is announced instead.
    Issuer { host: String },
}

/// Every way a lookup can come up empty. All of them are "not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("No default user specified")]
    NoDefaultSubject,

    #[error("Resource not found")]
    UnknownResource(String),

    #[error("Requested rel not found")]
    RelationUnavailable(String),
}

/// Resolves queries against whatever snapshot the store currently holds.
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    store: Arc<ConfigStore>,
}

impl ResolutionEngine {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn resolve(&self, query: &Query) -> Result<Resolution, ResolutionError> {
        let snapshot = self.store.current();
        resolve(&snapshot, query)
    }
}

/// Resolve a query against a fixed snapshot.
pub fn resolve(snapshot: &Snapshot, query: &Query) -> Result<Resolution, ResolutionError> {
    let id = normalize(snapshot, query.resource.as_deref())?;
    let attrs = snapshot
        .lookup(id)
        .ok_or_else(|| ResolutionError::UnknownResource(id.to_string()))?;

    match query.rel.as_deref().filter(|rel| !rel.is_empty()) {
        None => Ok(Resolution::Document(full_document(id, attrs))),
        Some(rel) => match Relation::from_uri(rel) {
            Some(Relation::OpenIdIssuer) => issuer_host(attrs)
                .map(|host| Resolution::Issuer { host })
                .ok_or_else(|| ResolutionError::RelationUnavailable(rel.to_string())),
            Some(relation) => attrs
                .get(relation.attribute())
                .map(|href| {
                    Resolution::Document(WebFingerDocument {
                        subject: subject(id),
                        links: vec![Link::new(relation, href)],
                        properties: BTreeMap::new(),
                    })
                })
                .ok_or_else(|| ResolutionError::RelationUnavailable(rel.to_string())),
            None => Err(ResolutionError::RelationUnavailable(rel.to_string())),
        },
    }
}

/// Pick the identifier to look up: the query's resource, or the default
/// subject when none was given, with a leading `acct:` removed.
fn normalize<'a>(
    snapshot: &'a Snapshot,
    resource: Option<&'a str>,
) -> Result<&'a str, ResolutionError> {
    let raw = match resource.filter(|r| !r.is_empty()) {
        Some(r) => r,
        None => snapshot
            .default_subject()
            .ok_or(ResolutionError::NoDefaultSubject)?,
    };
    Ok(raw.strip_prefix(ACCT_PREFIX).unwrap_or(raw))
}

fn subject(id: &str) -> String {
    format!("{ACCT_PREFIX}{id}")
}

fn full_document(id: &str, attrs: &AttributeSet) -> WebFingerDocument {
    let links = Relation::ALL
        .into_iter()
        .filter_map(|relation| {
            attrs
                .get(relation.attribute())
                .map(|href| Link::new(relation, href))
        })
        .collect();

    let properties = attrs
        .iter()
        .filter(|(name, _)| Relation::from_attribute(name).is_none())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    WebFingerDocument {
        subject: subject(id),
        links,
        properties,
    }
}

/// Host (with port, if one is written) of the `openid` attribute.
fn issuer_host(attrs: &AttributeSet) -> Option<String> {
    let url = Url::parse(attrs.get(Relation::OpenIdIssuer.attribute())?).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
