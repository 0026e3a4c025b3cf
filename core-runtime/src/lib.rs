//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the ingestion crates:
//! - Configuration management (`config`)
//! - Logging and tracing setup (`logging`)
//!
//! Nothing in here talks to the remote catalog; it only shapes how the rest of
//! the workspace is configured and how it reports what it does.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{IngestConfig, IngestConfigBuilder, ToolConfig};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
