//! HTTP probe against the monitored platform.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use vigil_domain::{PlatformConfig, ProbeMethod, ProbeOutcome, ProbeRequest};
use vigil_ports::ProbePort;

pub const INTERNAL_API_KEY_HEADER: &str = "X-Internal-API-Key";

#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpProbe {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            bail!("platform url is empty");
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build probe http client")?;
        Ok(Self {
            client,
            base_url,
            api_key: config
                .internal_api_key
                .clone()
                .filter(|key| !key.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl ProbePort for HttpProbe {
    async fn probe(&self, request: ProbeRequest) -> ProbeOutcome {
        let url = self.url(request.path);
        let mut builder = match request.method {
            ProbeMethod::Get => self.client.get(&url),
            ProbeMethod::Head => self.client.head(&url),
        };
        if let Some(key) = &self.api_key {
            builder = builder.header(INTERNAL_API_KEY_HEADER, key);
        }

        let start = Instant::now();
        let result = builder.send().await;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let body = match request.method {
                    ProbeMethod::Get => response.json::<Value>().await.ok(),
                    ProbeMethod::Head => None,
                };
                debug!(%url, status_code, elapsed_ms, "probe answered");
                ProbeOutcome::Response {
                    status_code,
                    elapsed_ms,
                    body,
                }
            }
            Err(e) => {
                debug!(%url, elapsed_ms, "probe failed: {e}");
                ProbeOutcome::Failed {
                    elapsed_ms,
                    error: e.to_string(),
                }
            }
        }
    }
}
