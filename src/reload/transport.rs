// src/reload/transport.rs

use std::time::Duration;

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::errors::{PlugwatchError, Result};
use crate::reload::request::ReloadRequest;
use crate::types::BoxFuture;

/// Longest response body kept in a rejection error.
const MAX_ERROR_BODY: usize = 512;

/// Why a single reload attempt failed.
#[derive(Debug)]
pub enum AttemptError {
    /// The service answered with a non-success status. Never retried.
    Rejected { status: u16, body: String },
    /// Connection refused, timed out, reset... Worth retrying.
    Unreachable(String),
    /// Local failure (artifact unreadable, bad URL). Not retried.
    Fatal(PlugwatchError),
}

/// Sends one reload attempt to the service.
///
/// Production uses [`HttpReloadTransport`]; tests script outcomes with a fake.
pub trait ReloadTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a ReloadRequest,
    ) -> BoxFuture<'a, std::result::Result<(), AttemptError>>;
}

/// HTTP transport: `PUT {host}{endpoint}` with basic auth and the artifact as
/// a multipart `file` part.
#[derive(Debug, Clone)]
pub struct HttpReloadTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReloadTransport {
    /// `endpoint` is a path template; `{name}` is replaced by the plugin name.
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("plugwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .context("building reload http client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn url_for(&self, request: &ReloadRequest) -> String {
        format!(
            "{}{}",
            request.target_host.trim_end_matches('/'),
            self.endpoint.replace("{name}", &request.plugin_name)
        )
    }

    async fn send_inner(&self, request: &ReloadRequest) -> std::result::Result<(), AttemptError> {
        let bytes = tokio::fs::read(&request.artifact)
            .await
            .map_err(|e| AttemptError::Fatal(PlugwatchError::IoError(e)))?;

        let file_name = request
            .artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.jar", request.plugin_name));
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let url = self.url_for(request);
        debug!(%url, plugin = %request.plugin_name, "sending reload request");

        let response = self
            .client
            .put(&url)
            .basic_auth(&request.credentials.username, Some(&request.credentials.password))
            .multipart(form)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(AttemptError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify_error(err: reqwest::Error) -> AttemptError {
    if err.is_builder() {
        return AttemptError::Fatal(PlugwatchError::ConfigError(format!(
            "invalid reload request: {err}"
        )));
    }
    AttemptError::Unreachable(err.to_string())
}

impl ReloadTransport for HttpReloadTransport {
    fn send<'a>(
        &'a self,
        request: &'a ReloadRequest,
    ) -> BoxFuture<'a, std::result::Result<(), AttemptError>> {
        Box::pin(self.send_inner(request))
    }
}
