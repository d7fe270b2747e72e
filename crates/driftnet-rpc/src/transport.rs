//! HTTP transport for the Transmission RPC protocol.
//!
//! This module provides the [`Transport`] trait which abstracts request
//! sending, enabling mocking in tests, and [`HttpTransport`], the reqwest
//! implementation handling authentication and session id negotiation.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use driftnet_types::RpcError;

/// Header carrying the CSRF token the daemon hands out on 409.
const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Narrow request/response interface consumed by the method wrappers.
///
/// A call sends one `{method, arguments}` envelope and yields the response
/// arguments after the `result` field has been checked.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one RPC request and returns the response arguments, if any.
    async fn call(&self, method: &str, arguments: Option<Value>)
    -> Result<Option<Value>, RpcError>;
}

/// Transport speaking Transmission's JSON-over-HTTP protocol.
///
/// Requests are POSTed to the RPC endpoint with HTTP basic auth when
/// credentials are configured. The daemon's 409 session id challenge is
/// answered transparently by retrying the request once with the token from
/// the response header.
#[derive(Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    url: Url,
    credentials: Option<(String, String)>,
    session_id: Mutex<Option<String>>,
}

impl HttpTransport {
    /// Creates an unauthenticated transport for `url`.
    pub fn new(url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            credentials: None,
            session_id: Mutex::new(None),
        }
    }

    /// Creates a transport sending HTTP basic auth with every request.
    pub fn with_basic_auth(
        url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Some((username.into(), password.into())),
            ..Self::new(url)
        }
    }

    async fn post(&self, body: &Value) -> Result<RawResponse, RpcError> {
        let mut request = self.http.post(self.url.clone()).json(body);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        let session_id = self
            .session_id
            .lock()
            .expect("session id lock poisoned")
            .clone();
        if let Some(session_id) = session_id {
            request = request.header(SESSION_ID_HEADER, session_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RpcError::Network(e.to_string()))?;
        let status = response.status();
        let session_id = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| RpcError::Network(e.to_string()))?;

        Ok(RawResponse {
            status,
            session_id,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        method: &str,
        arguments: Option<Value>,
    ) -> Result<Option<Value>, RpcError> {
        let mut body = serde_json::Map::new();
        body.insert("method".into(), Value::String(method.to_owned()));
        if let Some(arguments) = arguments {
            body.insert("arguments".into(), arguments);
        }
        let body = Value::Object(body);

        // A 409 only means the session id must be renewed, so the request is
        // retried once with the token the daemon handed back.
        for _ in 0..2 {
            let response = self.post(&body).await?;
            if response.status == StatusCode::CONFLICT {
                let renewed = response.session_id.ok_or_else(|| {
                    RpcError::Server("409 response carried no session id header".into())
                })?;
                debug!("renewed Transmission session id");
                *self.session_id.lock().expect("session id lock poisoned") = Some(renewed);
                continue;
            }
            return decode(response);
        }

        Err(RpcError::Server(
            "session id rejected twice in a row".into(),
        ))
    }
}

/// One HTTP exchange, reduced to the parts the protocol cares about.
struct RawResponse {
    status: StatusCode,
    session_id: Option<String>,
    body: String,
}

/// Response envelope common to every RPC method.
#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: String,
    arguments: Option<Value>,
}

fn decode(response: RawResponse) -> Result<Option<Value>, RpcError> {
    match response.status {
        StatusCode::UNAUTHORIZED => return Err(RpcError::Unauthorized),
        status if !status.is_success() => {
            return Err(RpcError::Server(format!("unexpected HTTP status {status}")));
        }
        _ => {}
    }

    let envelope: RpcEnvelope = serde_json::from_str(&response.body)
        .map_err(|e| RpcError::MalformedPayload(e.to_string()))?;
    if envelope.result != "success" {
        return Err(RpcError::Server(envelope.result));
    }
    Ok(envelope.arguments)
}
