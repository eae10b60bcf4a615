//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use webfinger_server::config::{ConfigStore, FileSource, ServerConfig};
use webfinger_server::http::HttpServer;
use webfinger_server::lifecycle::Shutdown;
use webfinger_server::resolver::ResolutionEngine;

pub const SAMPLE_CONFIG: &str = r#"
default:
  user: alice@example.com

alice@example.com:
  profile: https://example.com/alice
  avatar: ""
  openid: https://idp.example.com/issuer
  github: https://github.com/alice
  pronouns: they/them

bob@example.com:
  mastodon: https://mastodon.social/@bob
  tailscale: https://login.tailscale.com/bob
"#;

/// Write (or atomically replace) a resource file.
pub fn write_resources(path: &Path, content: &str) {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// A temp dir holding `config.yaml` with the given content.
pub fn resource_dir(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    write_resources(&path, content);
    (dir, path)
}

/// Build an engine over a resource file.
pub fn engine_for(path: &Path) -> Arc<ResolutionEngine> {
    let store = ConfigStore::open(FileSource::new(path)).unwrap();
    Arc::new(ResolutionEngine::new(Arc::new(store)))
}

/// Start a real server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(
    config: ServerConfig,
    engine: Arc<ResolutionEngine>,
    shutdown: &Shutdown,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, engine);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// HTTP client that never reuses connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
