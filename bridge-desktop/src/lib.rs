//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `CommandRunner` using `tokio::process`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HttpClientOptions, ReqwestHttpClient, TokioCommandRunner};
//!
//! let http_client = ReqwestHttpClient::new(HttpClientOptions::default())?;
//! let runner = TokioCommandRunner::new();
//! ```

mod http;
mod process;

pub use http::{HttpClientOptions, ReqwestHttpClient};
pub use process::TokioCommandRunner;
