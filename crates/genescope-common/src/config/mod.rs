//! Configuration loading for Genescope.
//! Reads genescope.toml from the current directory or path in GENESCOPE_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::{GenescopeError, Result};
use crate::models::PlotOptions;

/// Placeholder substituted with the selected gene in route templates.
pub const GENE_PLACEHOLDER: &str = "{gene}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unset leaves request timeouts to the transport.
    pub timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), timeout_secs: None }
    }
}

fn default_base_url() -> String { "http://127.0.0.1:5000".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_boxplot_route")]
    pub boxplot: String,
    #[serde(default = "default_gene_info_route")]
    pub gene_info: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self { boxplot: default_boxplot_route(), gene_info: default_gene_info_route() }
    }
}

fn default_boxplot_route()   -> String { "/boxplot/{gene}".to_string() }
fn default_gene_info_route() -> String { "/gene_info/{gene}".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_payload_element")]
    pub payload_element_id: String,
    #[serde(default = "default_volcano_container")]
    pub volcano_container: String,
    #[serde(default = "default_boxplot_container")]
    pub boxplot_container: String,
    #[serde(default = "default_publications_container")]
    pub publications_container: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            payload_element_id: default_payload_element(),
            volcano_container: default_volcano_container(),
            boxplot_container: default_boxplot_container(),
            publications_container: default_publications_container(),
            index_path: default_index_path(),
        }
    }
}

fn default_payload_element()        -> String { "volcano-data".to_string() }
fn default_volcano_container()      -> String { "volcano".to_string() }
fn default_boxplot_container()      -> String { "boxplot".to_string() }
fn default_publications_container() -> String { "publications-content".to_string() }
fn default_index_path()             -> String { "/".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "bool_true")]
    pub responsive: bool,
    #[serde(default = "bool_true")]
    pub display_mode_bar: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self { responsive: true, display_mode_bar: true }
    }
}

impl PlotConfig {
    /// Options for the volcano plot.
    pub fn volcano_options(&self) -> PlotOptions {
        PlotOptions { responsive: self.responsive, display_mode_bar: Some(self.display_mode_bar) }
    }
}

fn bool_true() -> bool { true }


impl Config {
    /// Load configuration from genescope.toml.
    /// Checks GENESCOPE_CONFIG env var first, then current directory. A
    /// missing default file yields the built-in configuration.
    pub fn load() -> Result<Self> {
        match std::env::var("GENESCOPE_CONFIG") {
            Ok(path) => {
                if !Path::new(&path).exists() {
                    return Err(GenescopeError::Config(format!("Config file not found: {}", path)));
                }
                Self::from_file(&path)
            }
            Err(_) if Path::new("genescope.toml").exists() => Self::from_file("genescope.toml"),
            Err(_) => {
                tracing::debug!("No genescope.toml found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| GenescopeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        for (name, route) in [("boxplot", &self.routes.boxplot), ("gene_info", &self.routes.gene_info)] {
            if !route.contains(GENE_PLACEHOLDER) {
                return Err(GenescopeError::Config(format!(
                    "routes.{} must contain {}: {}",
                    name, GENE_PLACEHOLDER, route
                )));
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.server.base_url)
            .map_err(|e| GenescopeError::Config(format!("invalid server.base_url {}: {}", self.server.base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(GenescopeError::Config(format!(
                "server.base_url cannot carry paths: {}",
                self.server.base_url
            )));
        }
        Ok(url)
    }
}
