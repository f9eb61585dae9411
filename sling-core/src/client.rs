use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::io::ReaderStream;
use url::Url;

use crate::endpoint::{Endpoint, ImportOptions};
use crate::properties::{PropertyBag, form_fields, namespaced};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request limiter is closed")]
    LimiterClosed,
}

/// Error descriptor the servlet embeds in failed responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteError {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The parts of the servlet's JSON response the tools look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostBody {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "status.message")]
    pub status_message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub error: Option<RemoteError>,
}

impl PostBody {
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    pub status: StatusCode,
    pub body: PostBody,
}

impl PostOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// The three write operations of the POST servlet.
///
/// Implementations report transport problems as errors and hand every HTTP
/// response back as a [`PostOutcome`], whatever its status.
#[allow(async_fn_in_trait)]
pub trait ContentClient {
    /// Creates or updates the node at `path` from `properties`.
    async fn create_node(
        &self,
        path: &str,
        properties: &PropertyBag,
    ) -> Result<PostOutcome, ClientError>;

    /// Uploads `file` as a child of `parent`, attaching `properties` to the
    /// new file node.
    async fn create_file(
        &self,
        parent: &str,
        file: &Path,
        properties: &PropertyBag,
    ) -> Result<PostOutcome, ClientError>;

    /// Imports an archive or serialized tree as `parent/name`.
    async fn import_content(
        &self,
        parent: &str,
        name: &str,
        file: &Path,
        import_type: &str,
        options: &ImportOptions,
    ) -> Result<PostOutcome, ClientError>;
}

#[derive(Clone)]
pub struct SlingClient {
    http: Client,
    base_url: Url,
    user: String,
    password: String,
    request_limit: Option<Arc<Semaphore>>,
}

impl SlingClient {
    pub fn new(endpoint: &Endpoint) -> Result<Self, ClientError> {
        Self::with_base_url(&endpoint.base_url(), &endpoint.user, &endpoint.password)
    }

    pub fn with_base_url(
        base_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            user: user.into(),
            password: password.into(),
            request_limit: None,
        })
    }

    /// Caps the number of requests in flight. `None` lifts the cap.
    pub fn with_request_limit(mut self, limit: Option<usize>) -> Self {
        self.request_limit = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
        self
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
        url
    }

    async fn permit(&self) -> Result<Option<OwnedSemaphorePermit>, ClientError> {
        match &self.request_limit {
            Some(limit) => Ok(Some(
                limit
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| ClientError::LimiterClosed)?,
            )),
            None => Ok(None),
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(remove_trailing_slash(path));
        log::debug!("POST {url}");
        self.http
            .post(url)
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, "application/json")
    }

    async fn send(request: RequestBuilder) -> Result<PostOutcome, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok(PostOutcome {
            status,
            body: PostBody::parse(&text)?,
        })
    }
}

impl ContentClient for SlingClient {
    async fn create_node(
        &self,
        path: &str,
        properties: &PropertyBag,
    ) -> Result<PostOutcome, ClientError> {
        let _permit = self.permit().await?;
        let fields = form_fields(properties);
        let mut request = self.post(path);
        if !fields.is_empty() {
            request = request.form(&fields);
        }
        Self::send(request).await
    }

    async fn create_file(
        &self,
        parent: &str,
        file: &Path,
        properties: &PropertyBag,
    ) -> Result<PostOutcome, ClientError> {
        let _permit = self.permit().await?;
        let (file_name, part) = file_part(file).await?;
        let mut form = Form::new()
            .percent_encode_noop()
            .part(format!("./{file_name}"), part);
        for (name, value) in form_fields(&namespaced(&file_name, properties)) {
            form = form.text(name, value);
        }
        Self::send(self.post(parent).multipart(form)).await
    }

    async fn import_content(
        &self,
        parent: &str,
        name: &str,
        file: &Path,
        import_type: &str,
        options: &ImportOptions,
    ) -> Result<PostOutcome, ClientError> {
        let _permit = self.permit().await?;
        let (_, part) = file_part(file).await?;
        let mut form = Form::new()
            .percent_encode_noop()
            .text(":operation", "import")
            .text(":name", name.to_string())
            .part(":contentFile", part)
            .text(":contentType", import_type.to_string());
        for field in options.enabled_fields() {
            form = form.text(field, "true");
        }
        Self::send(self.post(parent).multipart(form)).await
    }
}

/// Drops one trailing slash, except from the root path.
pub fn remove_trailing_slash(path: &str) -> &str {
    if path == "/" {
        return path;
    }
    path.strip_suffix('/').unwrap_or(path)
}

async fn file_part(file: &Path) -> Result<(String, Part), ClientError> {
    let io_error = |source| ClientError::Io {
        path: file.to_path_buf(),
        source,
    };
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let handle = tokio::fs::File::open(file).await.map_err(io_error)?;
    let length = handle.metadata().await.map_err(io_error)?.len();
    let body = Body::wrap_stream(ReaderStream::new(handle));
    let part = Part::stream_with_length(body, length).file_name(file_name.clone());
    Ok((file_name, part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_removed_except_for_root() {
        assert_eq!(remove_trailing_slash("/content/"), "/content");
        assert_eq!(remove_trailing_slash("/content"), "/content");
        assert_eq!(remove_trailing_slash("/"), "/");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = SlingClient::with_base_url("http://host:4502/sling/", "u", "p").unwrap();
        assert_eq!(
            client.endpoint("/content/a b").as_str(),
            "http://host:4502/sling/content/a%20b"
        );
        assert_eq!(client.endpoint("/").as_str(), "http://host:4502/sling/");
    }

    #[test]
    fn empty_body_parses_to_default() {
        assert_eq!(PostBody::parse("  ").unwrap(), PostBody::default());
    }

    #[test]
    fn error_body_exposes_class_and_message() {
        let body = PostBody::parse(
            r#"{"path": "/content/x", "status.code": 500, "status.message": "boom",
                "error": {"class": "javax.jcr.RepositoryException", "message": "bad"}}"#,
        )
        .unwrap();
        assert_eq!(body.path.as_deref(), Some("/content/x"));
        assert_eq!(body.status_message.as_deref(), Some("boom"));
        let error = body.error.unwrap();
        assert_eq!(error.class.as_deref(), Some("javax.jcr.RepositoryException"));
        assert_eq!(error.message.as_deref(), Some("bad"));
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        assert!(matches!(
            PostBody::parse("<html>oops</html>"),
            Err(ClientError::Decode(_))
        ));
    }
}
