//! Request handling.
//!
//! # Responsibilities
//! - Reduce the raw query string to the parameters WebFinger cares about
//! - Generate a request ID (UUID v4) when the client did not send one

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::resolver::Query;

pub const X_REQUEST_ID: &str = "x-request-id";

/// WebFinger query parameters.
///
/// `rel` may legally repeat; only the first value of each parameter is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebFingerParams {
    pub resource: Option<String>,
    pub rel: Option<String>,
}

impl WebFingerParams {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "resource" => &mut params.resource,
                "rel" => &mut params.rel,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// True when a non-empty `resource` was supplied.
    pub fn has_resource(&self) -> bool {
        self.resource.as_deref().is_some_and(|r| !r.is_empty())
    }
}

impl From<WebFingerParams> for Query {
    fn from(params: WebFingerParams) -> Self {
        Query {
            resource: params.resource,
            rel: params.rel,
        }
    }
}

/// Request ID generator backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
