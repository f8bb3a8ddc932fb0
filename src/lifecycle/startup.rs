//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Perform the initial mapping load
//! - Build the server and bind its listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, the process never serves an empty table
//!   because the mappings were unreadable

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{ReloadError, Reloader};
use crate::config::{validate_config, ConfigError, ListenerConfig, MockConfig};
use crate::http::MockServer;
use crate::mapping::DirectorySource;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("initial mapping load failed: {0}")]
    InitialLoad(#[from] ReloadError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Validate `config`, load the mappings it names and build the server.
pub fn bootstrap(config: MockConfig) -> Result<MockServer, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let source = Arc::new(DirectorySource::new(&config.mappings.dir));
    let reloader = Reloader::bootstrap(source, config.mappings.prefix.clone())?;

    tracing::info!(
        dir = %config.mappings.dir.display(),
        prefix = %config.mappings.prefix,
        watch = config.mappings.watch,
        "Mappings ready"
    );

    Ok(MockServer::new(config, Arc::new(reloader)))
}

/// Bind the configured listener address.
pub async fn bind(listener: &ListenerConfig) -> Result<TcpListener, StartupError> {
    TcpListener::bind(&listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            addr: listener.bind_address.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_mapping_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MockConfig::default();
        config.mappings.dir = dir.path().join("absent");

        let err = bootstrap(config).err().unwrap();
        assert!(matches!(err, StartupError::InitialLoad(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = MockConfig::default();
        config.mappings.prefix = "mock".into();

        let err = bootstrap(config).err().unwrap();
        assert!(matches!(err, StartupError::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_dir_serves_admin_routes_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MockConfig::default();
        config.mappings.dir = dir.path().to_path_buf();

        let server = bootstrap(config).unwrap();
        let table = server.reloader().router().snapshot();
        assert_eq!(table.mapped_routes(), 0);
        assert_eq!(table.len(), 2);
    }
}
