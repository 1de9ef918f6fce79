//! Per-gene data endpoints.
//!
//! Endpoints used:
//!   boxplot:   GET {base}/boxplot/{gene}   → `{data, layout}` or `{error}`
//!   gene info: GET {base}/gene_info/{gene} → `{publications: [...]}` or `{error}`
//!
//! Route templates come from `[routes]` in genescope.toml.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use genescope_common::config::{Config, RoutesConfig, GENE_PLACEHOLDER};
use genescope_common::error::{GenescopeError, Result};
use genescope_common::models::{BoxplotResponse, GeneInfoResponse};

/// Common interface for anything that serves per-gene data.
#[async_trait]
pub trait GeneDataSource: Send + Sync {
    /// Boxplot series for a gene. A non-success status is an error.
    async fn boxplot(&self, gene: &str) -> Result<BoxplotResponse>;

    /// Publications linked to a gene. A non-success status is an error.
    async fn gene_info(&self, gene: &str) -> Result<GeneInfoResponse>;
}

// ── HTTP implementation ─────────────────────────────────────────────────────

pub struct HttpDataSource {
    client: Client,
    base_url: Url,
    routes: RoutesConfig,
}

impl HttpDataSource {
    pub fn new(base_url: Url, routes: RoutesConfig) -> Result<Self> {
        Self::with_client(ClientBuilder::new(), base_url, routes)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut builder = ClientBuilder::new();
        if let Some(secs) = config.server.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self::with_client(builder, config.base_url()?, config.routes.clone())
    }

    fn with_client(builder: ClientBuilder, base_url: Url, routes: RoutesConfig) -> Result<Self> {
        let client = builder
            .user_agent(concat!("genescope/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url, routes })
    }

    /// Resolve a route template against the base URL. `{gene}` becomes a
    /// single percent-encoded path segment.
    pub fn endpoint(&self, route: &str, gene: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GenescopeError::Config(format!("base URL cannot carry paths: {}", self.base_url))
            })?;
            segments.pop_if_empty();
            let parts: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
            for part in &parts {
                match (*part, gene) {
                    // `.` and `..` would be dropped as path segments
                    (GENE_PLACEHOLDER, Some(gene)) if matches!(gene, "." | "..") => {
                        return Err(GenescopeError::InvalidGene(gene.to_string()));
                    }
                    (GENE_PLACEHOLDER, Some(gene)) => segments.push(gene),
                    (GENE_PLACEHOLDER, None) => {
                        return Err(GenescopeError::Config(format!("route {} needs a gene", route)));
                    }
                    (part, _) => segments.push(part),
                };
            }
            if route.ends_with('/') || parts.is_empty() {
                segments.push("");
            }
        }
        Ok(url)
    }

    #[instrument(skip(self, url), fields(url = %url))]
    async fn get_json<T: DeserializeOwned + Send>(&self, url: Url) -> Result<T> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GenescopeError::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }
        let body = resp.text().await?;
        debug!(bytes = body.len(), "Response received");
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the page document at `path` (the configured index route).
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path, None)?;
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GenescopeError::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl GeneDataSource for HttpDataSource {
    async fn boxplot(&self, gene: &str) -> Result<BoxplotResponse> {
        let url = self.endpoint(&self.routes.boxplot, Some(gene))?;
        self.get_json(url).await
    }

    async fn gene_info(&self, gene: &str) -> Result<GeneInfoResponse> {
        let url = self.endpoint(&self.routes.gene_info, Some(gene))?;
        self.get_json(url).await
    }
}

// ── Mock implementation for testing ─────────────────────────────────────────

#[derive(Debug, Clone)]
enum MockReply<T> {
    Body(T),
    Status(u16),
}

/// Canned per-gene replies. Genes without a reply answer 404.
#[derive(Debug, Default)]
pub struct MockGeneDataSource {
    boxplots: HashMap<String, MockReply<BoxplotResponse>>,
    gene_infos: HashMap<String, MockReply<GeneInfoResponse>>,
    latency: HashMap<String, Duration>,
    requests: Mutex<Vec<String>>,
}

impl MockGeneDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boxplot(mut self, gene: &str, resp: BoxplotResponse) -> Self {
        self.boxplots.insert(gene.to_string(), MockReply::Body(resp));
        self
    }

    pub fn with_boxplot_status(mut self, gene: &str, status: u16) -> Self {
        self.boxplots.insert(gene.to_string(), MockReply::Status(status));
        self
    }

    pub fn with_gene_info(mut self, gene: &str, resp: GeneInfoResponse) -> Self {
        self.gene_infos.insert(gene.to_string(), MockReply::Body(resp));
        self
    }

    pub fn with_gene_info_status(mut self, gene: &str, status: u16) -> Self {
        self.gene_infos.insert(gene.to_string(), MockReply::Status(status));
        self
    }

    /// Delay every reply for `gene`.
    pub fn with_latency(mut self, gene: &str, delay: Duration) -> Self {
        self.latency.insert(gene.to_string(), delay);
        self
    }

    /// Request paths seen so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn reply<T: Clone>(
        &self,
        path: String,
        gene: &str,
        replies: &HashMap<String, MockReply<T>>,
    ) -> Result<T> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(path.clone());
        if let Some(delay) = self.latency.get(gene) {
            tokio::time::sleep(*delay).await;
        }
        match replies.get(gene) {
            Some(MockReply::Body(body)) => Ok(body.clone()),
            Some(MockReply::Status(status)) => Err(GenescopeError::HttpStatus { url: path, status: *status }),
            None => Err(GenescopeError::HttpStatus { url: path, status: 404 }),
        }
    }
}

#[async_trait]
impl GeneDataSource for MockGeneDataSource {
    async fn boxplot(&self, gene: &str) -> Result<BoxplotResponse> {
        self.reply(format!("/boxplot/{}", gene), gene, &self.boxplots).await
    }

    async fn gene_info(&self, gene: &str) -> Result<GeneInfoResponse> {
        self.reply(format!("/gene_info/{}", gene), gene, &self.gene_infos).await
    }
}
