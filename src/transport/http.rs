//! reqwest-backed transport

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use serde_json::Value;
use tracing::{debug, error};

use super::{RawResponse, Transport};
use crate::config::ProxyConfig;
use crate::error::{Error, Result};

/// Transport that talks to a real ESM over HTTPS
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client honouring TLS verification and proxy settings
    pub fn new(verify: bool, proxies: &ProxyConfig) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!verify);

        if let Some(http) = &proxies.http {
            let proxy = Proxy::http(http)
                .map_err(|e| Error::Configuration(format!("invalid http proxy '{}': {}", http, e)))?;
            builder = builder.proxy(proxy);
        }
        if let Some(https) = &proxies.https {
            let proxy = Proxy::https(https)
                .map_err(|e| Error::Configuration(format!("invalid https proxy '{}': {}", https, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: &Value) -> Result<RawResponse> {
        debug!("POST {}", url);

        let response = match self.client.post(url).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                error!("ArcSight HTTP error: {}", e);
                return Err(Error::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
