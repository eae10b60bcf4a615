//! Mapping resolution outcomes to HTTP responses.
//!
//! - Document → 200 `application/json`
//! - Issuer → 204, empty body, issuer host in the `Host` header
//! - Any ResolutionError → 404 with a plain-text body

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::resolver::{Relation, Resolution, ResolutionError};

impl IntoResponse for Resolution {
    fn into_response(self) -> Response {
        match self {
            Resolution::Document(doc) => (StatusCode::OK, Json(doc)).into_response(),
            Resolution::Issuer { host } => match issuer_header(&host) {
                Ok(value) => (StatusCode::NO_CONTENT, [(header::HOST, value)]).into_response(),
                Err(err) => err.into_response(),
            },
        }
    }
}

/// A host that cannot be sent as a header counts as a missing issuer.
fn issuer_header(host: &str) -> Result<HeaderValue, ResolutionError> {
    HeaderValue::from_str(host).map_err(|_| {
        ResolutionError::RelationUnavailable(Relation::OpenIdIssuer.uri().to_string())
    })
}

impl IntoResponse for ResolutionError {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, self.to_string()).into_response()
    }
}

/// Metrics label for a successful resolution.
pub fn outcome_label(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Document(_) => "document",
        Resolution::Issuer { .. } => "issuer",
    }
}
