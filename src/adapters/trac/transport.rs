//! XML-RPC transport
//!
//! The [`RpcTransport`] trait is the seam between the typed Trac client and
//! the network. [`XmlRpcTransport`] implements it with reqwest; tests plug in
//! in-memory transports.

use super::codec::{decode_response, encode_call};
use super::value::RpcValue;
use crate::config::TracConfig;
use crate::domain::{Result, TracError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Executes one remote procedure call
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Calls `method` with positional `params` and returns the decoded result
    ///
    /// # Errors
    ///
    /// Transport failures, HTTP errors and XML-RPC faults are reported as
    /// [`TracError`] wrapped in `MigrationError::Trac`.
    async fn call(&self, method: &str, params: Vec<RpcValue>) -> Result<RpcValue>;
}

/// HTTP transport posting `text/xml` method calls to the Trac endpoint
pub struct XmlRpcTransport {
    endpoint: String,
    client: Client,
    credentials: Option<(String, String)>,
}

impl XmlRpcTransport {
    /// Create a transport for the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TracConfig) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("trac2gitlab/", env!("CARGO_PKG_VERSION")));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for the Trac endpoint");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| TracError::ConnectionFailed(format!("Failed to build HTTP client: {e}")))?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => {
                Some((user.clone(), password.expose_secret().as_ref().to_string()))
            }
            _ => None,
        };

        Ok(Self {
            endpoint: config.rpc_url(),
            client,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for XmlRpcTransport {
    async fn call(&self, method: &str, params: Vec<RpcValue>) -> Result<RpcValue> {
        let body = encode_call(method, &params);
        tracing::trace!(method, "XML-RPC call");

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body);

        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TracError::Timeout(format!("{method}: {e}"))
            } else {
                TracError::ConnectionFailed(format!("{method}: {e}"))
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TracError::AuthenticationFailed(format!(
                "{method}: server returned {status}"
            ))
            .into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| TracError::InvalidResponse(format!("{method}: {e}")))?;

        if status.is_server_error() {
            return Err(TracError::ServerError {
                status: status.as_u16(),
                message: truncate(&text),
            }
            .into());
        }
        if status.is_client_error() {
            return Err(TracError::ClientError {
                status: status.as_u16(),
                message: truncate(&text),
            }
            .into());
        }

        Ok(decode_response(&text)?)
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
