use async_trait::async_trait;
use url::Url;

use crate::errors::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A request to the simulation service. Bodies are always JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            body: None,
        }
    }

    pub fn post(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            body: Some(body),
        }
    }
}

/// Any response that came back, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam under the remote gateway.
///
/// Implementations return `Ok` for every response received, including
/// error statuses; `Err` means no response at all. The gateway decides what
/// a status means, so swapping the HTTP stack (or scripting responses in
/// tests) never touches the protocol logic.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Transport: Send + Sync {
    /// Human-readable name of this transport (for logs).
    fn name(&self) -> &str;

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
