//! # XNAT Provider
//!
//! Implements the `RemoteCatalog` trait for an XNAT server.
//!
//! ## Overview
//!
//! This module provides:
//! - HTTP basic authentication on every request
//! - Existence checks, entity creation and batched attribute updates
//! - File uploads into scan resource collections with format/content tags
//! - Mapping of REST failures to typed errors

pub mod connector;
pub mod error;

pub use connector::XnatConnector;
pub use error::{Result, XnatError};
