//! Shared utilities for integration and load testing.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use mock_api::config::MockConfig;
use mock_api::lifecycle::{self, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A running server backed by a temporary mapping directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Write (or overwrite) a mapping file inside the mapping directory.
    #[allow(dead_code)]
    pub fn write_mapping(&self, name: &str, contents: &str) {
        write_mapping(self.dir.path(), name, contents);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn write_mapping(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Start a server on an ephemeral port serving the given mapping files.
pub async fn start_server(files: &[(&str, &str)]) -> TestServer {
    start_server_with(files, |_| {}).await
}

/// Like `start_server`, with a hook to adjust the config before startup.
pub async fn start_server_with<F>(files: &[(&str, &str)], configure: F) -> TestServer
where
    F: FnOnce(&mut MockConfig),
{
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        write_mapping(dir.path(), name, contents);
    }

    let mut config = MockConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.mappings.dir = dir.path().to_path_buf();
    configure(&mut config);

    let server = lifecycle::bootstrap(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    // Let the accept loop start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer { addr, dir, shutdown }
}
