//! XNAT REST connector
//!
//! Implements the `RemoteCatalog` trait over the XNAT REST API.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::catalog::{AttributeMap, EntityKind, EntityPath, FileTags, RemoteCatalog};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::XnatError;

/// Default per-request timeout
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// XNAT REST connector
///
/// Every request carries HTTP basic authentication. Existence checks are
/// idempotent reads and go through the read retry policy; creates,
/// attribute-sets and uploads are issued exactly once.
///
/// # Example
///
/// ```ignore
/// use provider_xnat::XnatConnector;
/// use bridge_traits::catalog::{EntityPath, RemoteCatalog};
///
/// let connector = XnatConnector::new(http_client, "https://xnat.example.org/", "user", "secret");
/// let exists = connector.exists(&EntityPath::subject("ADNI", "002_S_0295")).await?;
/// ```
pub struct XnatConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Server URL without a trailing slash
    base_url: String,

    /// Precomputed `Authorization` header value
    authorization: String,

    request_timeout: Duration,

    /// Retry policy for existence checks
    read_retry: RetryPolicy,
}

impl XnatConnector {
    /// Create a new connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `server_url` - XNAT base URL; a trailing `/` is stripped
    /// * `username` / `password` - basic-auth credentials
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", username, password));
        Self {
            http_client,
            base_url: server_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", credentials),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            read_retry: RetryPolicy::default(),
        }
    }

    /// Override the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the retry policy used for existence checks
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an entity, an optional sub-path and query parameters
    fn url<'a>(
        &self,
        path: &EntityPath,
        suffix: &str,
        query: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> String {
        let mut url = format!("{}{}{}", self.base_url, rest_path(path), suffix);
        let query = encode_query(query);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("Authorization", self.authorization.clone())
            .timeout(self.request_timeout)
    }

    /// Send once and map non-2xx responses to errors
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, XnatError> {
        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::single_attempt())
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(XnatError::from_status(
                response.status,
                &String::from_utf8_lossy(&response.body),
            ))
        }
    }
}

/// REST path of an entity with every label percent-encoded
fn rest_path(path: &EntityPath) -> String {
    let mut rest = format!("/data/projects/{}", urlencoding::encode(path.project()));
    for kind in EntityKind::LEVELS {
        let Some(label) = path.label_of(kind) else {
            break;
        };
        rest.push('/');
        rest.push_str(kind.collection());
        rest.push('/');
        rest.push_str(&urlencoding::encode(label));
    }
    rest
}

/// XSI type used when creating an entity of the given level
fn xsi_type(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Subject => Some("xnat:subjectData"),
        EntityKind::Session => Some("xnat:mrSessionData"),
        EntityKind::Scan => Some("xnat:mrScanData"),
        EntityKind::Resource => None,
    }
}

/// Percent-encoded `key=value&...` query string
fn encode_query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn attribute_pairs(fields: &AttributeMap) -> impl Iterator<Item = (&str, &str)> {
    fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

#[async_trait]
impl RemoteCatalog for XnatConnector {
    #[instrument(skip(self), fields(path = %path))]
    async fn exists(&self, path: &EntityPath) -> Result<bool> {
        let url = self.url(path, "", [("format", "json")]);
        let request = self
            .request(HttpMethod::Get, url)
            .header("Accept", "application/json");

        let response = self
            .http_client
            .execute_with_retry(request, self.read_retry.clone())
            .await?;

        let found = match response.status {
            200..=299 => true,
            404 => false,
            status => {
                return Err(
                    XnatError::from_status(status, &String::from_utf8_lossy(&response.body))
                        .into(),
                )
            }
        };

        debug!(kind = %path.kind(), found, "Existence check");
        Ok(found)
    }

    #[instrument(skip(self, core_fields), fields(path = %path, fields = core_fields.len()))]
    async fn create(&self, path: &EntityPath, core_fields: &AttributeMap) -> Result<()> {
        let type_param = xsi_type(path.kind()).map(|xsi| ("xsiType", xsi));
        let url = self.url(
            path,
            "",
            type_param.into_iter().chain(attribute_pairs(core_fields)),
        );

        self.send(self.request(HttpMethod::Put, url)).await?;

        info!(kind = %path.kind(), label = %path.label(), "Created remote entity");
        Ok(())
    }

    #[instrument(skip(self, fields), fields(path = %path, fields = fields.len()))]
    async fn set_attributes(&self, path: &EntityPath, fields: &AttributeMap) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let url = self.url(path, "", attribute_pairs(fields));
        self.send(self.request(HttpMethod::Put, url)).await?;

        debug!(kind = %path.kind(), "Set entity attributes");
        Ok(())
    }

    #[instrument(skip(self, local_path, tags), fields(resource = %resource, format = %tags.format))]
    async fn upload_file(
        &self,
        resource: &EntityPath,
        local_path: &Path,
        tags: &FileTags,
    ) -> Result<()> {
        let file_name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| XnatError::LocalFile {
                path: local_path.display().to_string(),
                message: "path has no valid file name".to_string(),
            })?;

        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| XnatError::LocalFile {
                path: local_path.display().to_string(),
                message: e.to_string(),
            })?;
        let size = data.len();

        let mut query = vec![("format", tags.format.as_str())];
        if let Some(content) = tags.content.as_deref() {
            query.push(("content", content));
        }
        query.push(("inbody", "true"));

        let suffix = format!("/files/{}", urlencoding::encode(file_name));
        let url = self.url(resource, &suffix, query);
        let request = self
            .request(HttpMethod::Put, url)
            .header("Content-Type", "application/octet-stream")
            .body(Bytes::from(data));

        self.send(request).await?;

        info!(file = %file_name, bytes = size, "Uploaded file");
        Ok(())
    }
}
