//! # Host Bridge Traits
//!
//! Capability traits that the ingestion core consumes and that platform
//! adapters implement.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP with transport retry policy
//! - [`RemoteCatalog`](catalog::RemoteCatalog) - Existence, create, attribute-set
//!   and upload against the remote research-data repository
//! - [`CommandRunner`](process::CommandRunner) - Opaque external tool invocation
//!
//! ## Implementations
//!
//! | Capability      | Implementation                          |
//! |-----------------|-----------------------------------------|
//! | `HttpClient`    | `bridge-desktop::ReqwestHttpClient`     |
//! | `RemoteCatalog` | `provider-xnat::XnatConnector`          |
//! | `CommandRunner` | `bridge-desktop::TokioCommandRunner`    |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert their own errors into it with enough context (URL, entity
//! path, command line) to diagnose a failure from the log alone.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared as
//! `Arc<dyn Trait>`.

pub mod catalog;
pub mod error;
pub mod http;
pub mod process;

pub use error::BridgeError;

pub use catalog::{AttributeMap, EntityKind, EntityPath, FileTags, RemoteCatalog};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use process::{CommandOutput, CommandRunner, CommandSpec};
