//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, external
//! command execution) and the XNAT connector into the ingest coordinator.
//! Command-line hosts call [`bootstrap_desktop`]; tests and embedders can
//! assemble [`IngestDependencies`] by hand.

pub mod error;

pub use error::{Result, ServiceError};

use std::sync::Arc;

use bridge_desktop::{HttpClientOptions, ReqwestHttpClient, TokioCommandRunner};
use bridge_traits::{catalog::RemoteCatalog, process::CommandRunner};
use core_runtime::config::IngestConfig;
use core_sync::{IngestCoordinator, IngestRun};
use provider_xnat::XnatConnector;
use tracing::{debug, info};

/// Aggregated handle to the bridge dependencies an ingest run requires.
pub struct IngestDependencies {
    pub catalog: Arc<dyn RemoteCatalog>,
    pub command_runner: Arc<dyn CommandRunner>,
}

impl IngestDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(catalog: Arc<dyn RemoteCatalog>, command_runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            catalog,
            command_runner,
        }
    }
}

/// Primary façade exposed to host applications.
pub struct IngestService {
    config: IngestConfig,
    coordinator: IngestCoordinator,
}

impl IngestService {
    /// Create a new service from a validated configuration and its dependencies.
    pub fn new(config: IngestConfig, deps: IngestDependencies) -> Self {
        let coordinator = IngestCoordinator::new(deps.catalog, deps.command_runner, &config);
        Self {
            config,
            coordinator,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run one ingest pass over the configured input tree.
    ///
    /// The scratch directory is created if needed. Per-scan failures are
    /// part of the returned report; only fatal conditions are errors.
    pub async fn run(&self) -> Result<IngestRun> {
        let scratch = &self.config.scratch_dir;
        tokio::fs::create_dir_all(scratch)
            .await
            .map_err(|source| ServiceError::Scratch {
                path: scratch.clone(),
                source,
            })?;

        info!(
            server = %self.config.server_url,
            project = %self.config.project,
            input = %self.coordinator.data_root().display(),
            "Starting ingestion"
        );
        Ok(self.coordinator.run().await?)
    }
}

/// Build a service backed by `reqwest`, `tokio::process` and the XNAT REST API.
pub fn bootstrap_desktop(config: IngestConfig) -> Result<IngestService> {
    config.validate()?;

    let http_client = ReqwestHttpClient::new(HttpClientOptions {
        timeout: config.http_timeout,
        accept_invalid_certs: config.accept_invalid_certs,
        ..HttpClientOptions::default()
    })
    .map_err(|e| ServiceError::InitializationFailed(e.to_string()))?;

    let connector = XnatConnector::new(
        Arc::new(http_client),
        &config.server_url,
        &config.username,
        &config.password,
    )
    .with_request_timeout(config.http_timeout);
    debug!(base_url = connector.base_url(), "XNAT connector ready");

    let deps = IngestDependencies::new(Arc::new(connector), Arc::new(TokioCommandRunner::new()));
    Ok(IngestService::new(config, deps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_sync::SyncError;
    use tempfile::TempDir;

    fn config(input: &std::path::Path, scratch: &std::path::Path) -> IngestConfig {
        IngestConfig::builder()
            // nothing listens here; discovery fails before any request
            .server_url("http://127.0.0.1:9")
            .credentials("admin", "secret")
            .input_path(input)
            .scratch_dir(scratch)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_input_fails_without_network() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("scratch");
        let service = bootstrap_desktop(config(dir.path(), &scratch)).unwrap();

        let result = service.run().await;

        assert!(matches!(
            result,
            Err(ServiceError::Sync(SyncError::NoVolumes { .. }))
        ));
        assert!(scratch.is_dir());
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path(), dir.path());
        config.server_url = "xnat.example.org".to_string();

        assert!(matches!(
            bootstrap_desktop(config),
            Err(ServiceError::Config(_))
        ));
    }
}
