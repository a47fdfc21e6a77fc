//! HTTP plumbing shared by every resource client.
//!
//! `ApiClient::request` attaches the session credentials (bearer token and
//! API key) to the outgoing request and hands back the raw status and body.
//! Status interpretation is each caller's responsibility: the client never
//! inspects the response status itself, never retries, and has no token
//! refresh flow. Only transport-level errors propagate from here.

pub mod auth;
pub mod listings;
pub mod profile;

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::session::SessionStore;

/// A fully described outgoing request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: String,
    pub url: String,
    /// Query parameters, appended (and URL-encoded) by the transport.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Raw response: HTTP status plus the parsed JSON body.
///
/// Bodies that are not JSON (or are empty) read as `Value::Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort extraction of the server-provided error message.
    pub fn server_message(&self) -> String {
        if let Some(message) = self.body["errors"][0]["message"].as_str() {
            return message.to_string();
        }
        if let Some(message) = self.body["message"].as_str() {
            return message.to_string();
        }
        format!("HTTP status {}", self.status)
    }
}

/// Trait for the HTTP transport to allow mocking and abstraction
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Production transport backed by a ureq agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut req = self.agent.request(&request.method, &request.url);
        for (name, value) in &request.query {
            req = req.query(name, value);
        }
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }

        let resp = match &request.body {
            Some(body) => req.send_json(body.clone()),
            None => req.call(),
        };

        match resp {
            Ok(r) => {
                let status = r.status();
                let body = r.into_json().unwrap_or(Value::Null);
                Ok(ApiResponse { status, body })
            }
            // Non-2xx statuses are still responses; callers interpret them.
            Err(ureq::Error::Status(status, r)) => {
                let text = r.into_string().unwrap_or_default();
                let body = serde_json::from_str(&text).unwrap_or(Value::Null);
                Ok(ApiResponse { status, body })
            }
            Err(e) => Err(anyhow!("Request failed: {}", e)),
        }
    }
}

/// Client for the remote auction API, bound to a session store.
pub struct ApiClient<'a> {
    base_url: String,
    store: &'a dyn SessionStore,
    transport: &'a dyn Transport,
}

impl<'a> ApiClient<'a> {
    pub fn new(base_url: &str, store: &'a dyn SessionStore, transport: &'a dyn Transport) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            transport,
        }
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers attached to every authenticated request. Credentials are read
    /// from the session store at call time; absent values render as empty,
    /// leaving the server to reject the request.
    pub fn build_headers(&self) -> Vec<(String, String)> {
        let token = self.store.token().unwrap_or_default();
        let api_key = self.store.api_key().unwrap_or_default();
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), format!("Bearer {}", token)),
            ("X-Noroff-API-Key".to_string(), api_key),
        ]
    }

    /// Perform an authenticated request. Caller-supplied headers win over
    /// the built ones on a (case-insensitive) name conflict.
    pub fn request(&self, path: &str, options: RequestOptions) -> Result<ApiResponse> {
        let mut headers = self.build_headers();
        for (name, value) in options.headers {
            match headers
                .iter_mut()
                .find(|(n, _)| n.eq_ignore_ascii_case(&name))
            {
                Some(slot) => slot.1 = value,
                None => headers.push((name, value)),
            }
        }

        self.transport.send(&ApiRequest {
            method: options.method,
            url: self.url(path),
            query: options.query,
            headers,
            body: options.body,
        })
    }

    /// Perform a request without session credentials (login, register).
    pub fn request_public(&self, path: &str, options: RequestOptions) -> Result<ApiResponse> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        headers.extend(options.headers);

        self.transport.send(&ApiRequest {
            method: options.method,
            url: self.url(path),
            query: options.query,
            headers,
            body: options.body,
        })
    }
}

/// Caller-side request options: method, extra headers, query, body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: "PUT".to_string(),
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}
