use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::traits::{FetchedResource, Fetcher};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Optional rendering service for pages whose gallery is built by JavaScript
#[derive(Debug, Clone)]
pub struct RenderEndpoint {
    pub base_url: String,
    pub token: Option<String>,
}

/// HTTP access for product pages and image bytes
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    render: Option<RenderEndpoint>,
}

impl HttpClient {
    pub fn new(timeout: Duration, render: Option<RenderEndpoint>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, render })
    }

    /// Fetch the HTML of a product page, rendered when an endpoint is configured
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = match &self.render {
            Some(render) => {
                let mut endpoint = format!("{}/content", render.base_url.trim_end_matches('/'));
                if let Some(token) = &render.token {
                    endpoint.push_str(&format!("?token={}", urlencoding::encode(token)));
                }
                info!("Rendering {} through {}", url, render.base_url);

                self.client
                    .post(&endpoint)
                    .json(&serde_json::json!({ "url": url }))
                    .send()
                    .await?
            }
            None => {
                info!("Fetching {}", url);
                self.client.get(url).send().await?
            }
        };

        if !response.status().is_success() {
            return Err(HarvestError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchedResource> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(HarvestError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        debug!("Fetched {} bytes from {}", bytes.len(), url);

        Ok(FetchedResource {
            bytes,
            content_type,
        })
    }
}
