//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;
use weathercast::config::schema::{AppConfig, SinkConfig, SinkKind};
use weathercast::http::HttpServer;
use weathercast::logging::{Router, RouterHandle};

/// Unique temp directory for one test's log output.
#[allow(dead_code)]
pub fn temp_log_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("weathercast-test-{}-{}", tag, uuid::Uuid::new_v4()))
}

/// A file sink writing JSON lines into `dir`.
#[allow(dead_code)]
pub fn file_sink(dir: &Path) -> SinkConfig {
    SinkConfig {
        name: "file".to_string(),
        kind: SinkKind::File,
        directory: Some(dir.to_path_buf()),
        ..SinkConfig::default()
    }
}

/// Read back today's JSON-lines log file written by `file_sink`.
#[allow(dead_code)]
pub fn read_log_lines(dir: &Path) -> Vec<serde_json::Value> {
    let name = format!("weathercast-{}.log", chrono::Utc::now().date_naive().format("%Y-%m-%d"));
    let content = std::fs::read_to_string(dir.join(name)).unwrap_or_default();
    content
        .lines()
        .map(|line| serde_json::from_str(line).expect("log line is valid JSON"))
        .collect()
}

/// Start the real server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(config: AppConfig) -> (SocketAddr, RouterHandle) {
    let log = Router::configure(&config.logging)
        .await
        .expect("router configures");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config, log.clone());
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    (addr, log)
}
