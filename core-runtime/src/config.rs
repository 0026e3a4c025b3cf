//! # Ingest Configuration Module
//!
//! Configuration for one ingestion run.
//!
//! ## Overview
//!
//! The configuration uses a builder to construct an [`IngestConfig`] holding
//! the remote endpoint, credentials, the target project, the local input tree,
//! the scratch directory for snapshot rendering and the external tool
//! settings. The builder validates eagerly so a misconfigured run fails
//! before touching the remote catalog.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::config::IngestConfig;
//!
//! let config = IngestConfig::builder()
//!     .server_url("https://xnat.example.org/")
//!     .credentials("admin", "secret")
//!     .input_path("/data/exports")
//!     .project("ADNI")
//!     .build()
//!     .expect("invalid configuration");
//!
//! assert_eq!(config.server_url, "https://xnat.example.org");
//! ```

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default target project
pub const DEFAULT_PROJECT: &str = "ADNI";

/// Default reorientation tool
pub const DEFAULT_REORIENT_COMMAND: &str = "fsl5.0-fslswapdim";

/// Default montage tool
pub const DEFAULT_SLICER_COMMAND: &str = "fsl5.0-slicer";

/// Default wall-clock limit for one external tool invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Default HTTP request timeout (uploads of large volumes included)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Longest side of the generated thumbnail, in pixels
pub const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 300;

/// External image-processing tool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Command that reorders volume axes (`<cmd> <in> LR PA IS <out>`)
    pub reorient_command: String,
    /// Command that renders a mid-slice montage (`<cmd> <in> -a <out.png>`)
    pub slicer_command: String,
    /// Time limit per command
    pub command_timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            reorient_command: DEFAULT_REORIENT_COMMAND.to_string(),
            slicer_command: DEFAULT_SLICER_COMMAND.to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Configuration of one ingestion run.
///
/// Use [`IngestConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct IngestConfig {
    /// Base URL of the remote catalog, without trailing slash
    pub server_url: String,

    pub username: String,

    pub password: String,

    /// Remote project receiving the data
    pub project: String,

    /// Local root; study exports are expected under `<input_path>/ADNI`
    pub input_path: PathBuf,

    /// Directory for per-scan temporary snapshot files
    pub scratch_dir: PathBuf,

    pub tools: ToolConfig,

    /// Longest side of snapshot thumbnails in pixels
    pub thumbnail_max_dimension: u32,

    pub http_timeout: Duration,

    /// Accept invalid TLS certificates from the remote catalog
    pub accept_invalid_certs: bool,
}

impl std::fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("project", &self.project)
            .field("input_path", &self.input_path)
            .field("scratch_dir", &self.scratch_dir)
            .field("tools", &self.tools)
            .field("thumbnail_max_dimension", &self.thumbnail_max_dimension)
            .field("http_timeout", &self.http_timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl IngestConfig {
    /// Creates a new builder for constructing an `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Directory holding the study export (`<input_path>/ADNI`)
    pub fn data_root(&self) -> PathBuf {
        self.input_path.join("ADNI")
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The server URL is an http(s) URL
    /// - Username and project are not empty
    /// - The input path is an existing directory
    /// - Timeouts and thumbnail size are non-zero
    pub fn validate(&self) -> Result<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Server URL must start with http:// or https://, got '{}'",
                self.server_url
            )));
        }

        if self.username.trim().is_empty() {
            return Err(Error::Config("Username cannot be empty".to_string()));
        }

        if self.project.trim().is_empty() {
            return Err(Error::Config("Project cannot be empty".to_string()));
        }

        if !self.input_path.is_dir() {
            return Err(Error::Config(format!(
                "Input path {} is not a directory",
                self.input_path.display()
            )));
        }

        if self.scratch_dir.as_os_str().is_empty() {
            return Err(Error::Config("Scratch directory cannot be empty".to_string()));
        }

        if self.tools.reorient_command.trim().is_empty()
            || self.tools.slicer_command.trim().is_empty()
        {
            return Err(Error::Config(
                "External tool commands cannot be empty".to_string(),
            ));
        }

        if self.tools.command_timeout.is_zero() {
            return Err(Error::Config(
                "Command timeout must be greater than zero".to_string(),
            ));
        }

        if self.http_timeout.is_zero() {
            return Err(Error::Config(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }

        if self.thumbnail_max_dimension == 0 {
            return Err(Error::Config(
                "Thumbnail dimension must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`IngestConfig`] instances.
#[derive(Default)]
pub struct IngestConfigBuilder {
    server_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    project: Option<String>,
    input_path: Option<PathBuf>,
    scratch_dir: Option<PathBuf>,
    reorient_command: Option<String>,
    slicer_command: Option<String>,
    command_timeout: Option<Duration>,
    http_timeout: Option<Duration>,
    thumbnail_max_dimension: Option<u32>,
    accept_invalid_certs: bool,
}

impl IngestConfigBuilder {
    /// Sets the remote catalog base URL. A trailing `/` is removed.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the target project. Default: `ADNI`
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Sets the scratch directory. Default: the system temp directory
    pub fn scratch_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(path.into());
        self
    }

    pub fn reorient_command(mut self, command: impl Into<String>) -> Self {
        self.reorient_command = Some(command.into());
        self
    }

    pub fn slicer_command(mut self, command: impl Into<String>) -> Self {
        self.slicer_command = Some(command.into());
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn thumbnail_max_dimension(mut self, pixels: u32) -> Self {
        self.thumbnail_max_dimension = Some(pixels);
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required value is missing or
    /// [`IngestConfig::validate`] rejects the result.
    pub fn build(self) -> Result<IngestConfig> {
        let server_url = self
            .server_url
            .ok_or_else(|| Error::Config("Server URL is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let username = self
            .username
            .ok_or_else(|| Error::Config("Credentials are required".to_string()))?;
        let password = self.password.unwrap_or_default();

        let input_path = self
            .input_path
            .ok_or_else(|| Error::Config("Input path is required".to_string()))?;

        let defaults = ToolConfig::default();
        let config = IngestConfig {
            server_url,
            username,
            password,
            project: self.project.unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            input_path,
            scratch_dir: self.scratch_dir.unwrap_or_else(std::env::temp_dir),
            tools: ToolConfig {
                reorient_command: self.reorient_command.unwrap_or(defaults.reorient_command),
                slicer_command: self.slicer_command.unwrap_or(defaults.slicer_command),
                command_timeout: self.command_timeout.unwrap_or(defaults.command_timeout),
            },
            thumbnail_max_dimension: self
                .thumbnail_max_dimension
                .unwrap_or(DEFAULT_THUMBNAIL_MAX_DIMENSION),
            http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            accept_invalid_certs: self.accept_invalid_certs,
        };

        config.validate()?;
        Ok(config)
    }
}
