use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::traits::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::errors::TransportError;

/// `reqwest`-backed transport used outside of tests.
///
/// On native targets every request is bounded by the configured timeout and
/// an expired timeout is reported as [`TransportError::Timeout`]. The browser
/// `fetch` backend used on wasm32 has no per-client timeout.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(timeout);
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Transport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(request.url),
            HttpMethod::Post => self.client.post(request.url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;

        Ok(HttpResponse { status, body })
    }
}
