//! End-to-end behaviour of the WebFinger endpoint, driven through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use webfinger_server::config::ServerConfig;
use webfinger_server::http::{HttpServer, X_REQUEST_ID};

mod common;

fn server(content: &str, config: ServerConfig) -> (tempfile::TempDir, HttpServer) {
    let (dir, path) = common::resource_dir(content);
    let engine = common::engine_for(&path);
    (dir, HttpServer::new(config, engine))
}

async fn get(server: &HttpServer, uri: &str) -> Response {
    server
        .router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_full_document() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(&server, "/.well-known/webfinger?resource=acct:alice@example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");

    assert_eq!(
        body_json(res).await,
        json!({
            "subject": "acct:alice@example.com",
            "links": [
                { "rel": "http://webfinger.net/rel/profile-page", "href": "https://example.com/alice" },
                { "rel": "http://openid.net/specs/connect/1.0/issuer", "href": "https://idp.example.com/issuer" },
                { "rel": "https://github.com", "href": "https://github.com/alice" }
            ],
            "properties": { "pronouns": "they/them" }
        })
    );
}

#[tokio::test]
async fn test_prefix_is_optional() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let bare = get(&server, "/.well-known/webfinger?resource=bob@example.com").await;
    let prefixed = get(&server, "/.well-known/webfinger?resource=acct%3Abob%40example.com").await;
    let (bare, prefixed) = (body_json(bare).await, body_json(prefixed).await);
    assert_eq!(bare, prefixed);
    assert_eq!(bare["subject"], "acct:bob@example.com");
}

#[tokio::test]
async fn test_missing_resource_uses_default() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(&server, "/.well-known/webfinger").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["subject"], "acct:alice@example.com");
}

#[tokio::test]
async fn test_missing_resource_without_default() {
    let (_dir, server) = server(
        "alice:\n  profile: https://example.com/alice\n",
        ServerConfig::default(),
    );

    let res = get(&server, "/.well-known/webfinger").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, "No default user specified");
}

#[tokio::test]
async fn test_require_resource_rejects_missing() {
    let mut config = ServerConfig::default();
    config.http.require_resource = true;
    let (_dir, server) = server(common::SAMPLE_CONFIG, config);

    let res = get(&server, "/.well-known/webfinger?resource=").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = get(&server, "/.well-known/webfinger?resource=alice@example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_resource() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(&server, "/.well-known/webfinger?resource=acct:mallory@example.com").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, "Resource not found");
}

#[tokio::test]
async fn test_single_relation() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(
        &server,
        "/.well-known/webfinger?resource=acct:bob@example.com&rel=https://tailscale.com/rel",
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await,
        json!({
            "subject": "acct:bob@example.com",
            "links": [
                { "rel": "https://tailscale.com/rel", "href": "https://login.tailscale.com/bob" }
            ]
        })
    );
}

#[tokio::test]
async fn test_first_rel_is_used() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(
        &server,
        "/.well-known/webfinger?resource=alice@example.com&rel=https://github.com&rel=http://webfinger.net/rel/profile-page",
    )
    .await;
    let doc = body_json(res).await;
    assert_eq!(doc["links"].as_array().unwrap().len(), 1);
    assert_eq!(doc["links"][0]["rel"], "https://github.com");
}

#[tokio::test]
async fn test_empty_attribute_relation_is_not_found() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(
        &server,
        "/.well-known/webfinger?resource=alice@example.com&rel=http://webfinger.net/rel/avatar",
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, "Requested rel not found");
}

#[tokio::test]
async fn test_relation_outside_table_is_not_found() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(
        &server,
        "/.well-known/webfinger?resource=bob@example.com&rel=http://joinmastodon.org/",
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openid_issuer() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(
        &server,
        "/.well-known/webfinger?resource=alice@example.com&rel=http://openid.net/specs/connect/1.0/issuer",
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers().get(header::HOST).unwrap(), "idp.example.com");
    assert!(body_text(res).await.is_empty());

    let res = get(
        &server,
        "/.well-known/webfinger?resource=bob@example.com&rel=http://openid.net/specs/connect/1.0/issuer",
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_and_cors_toggle() {
    let mut config = ServerConfig::default();
    config.http.cors = false;
    let (_dir, server) = server(common::SAMPLE_CONFIG, config);

    let res = get(&server, "/.well-known/webfinger?resource=bob@example.com").await;
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(res.headers().get(X_REQUEST_ID).is_some());

    let res = server
        .router()
        .oneshot(
            Request::builder()
                .uri("/.well-known/webfinger?resource=bob@example.com")
                .header(X_REQUEST_ID, "client-supplied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers().get(X_REQUEST_ID).unwrap(), "client-supplied");
}

#[tokio::test]
async fn test_other_paths_are_not_found() {
    let (_dir, server) = server(common::SAMPLE_CONFIG, ServerConfig::default());

    let res = get(&server, "/webfinger?resource=bob@example.com").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
