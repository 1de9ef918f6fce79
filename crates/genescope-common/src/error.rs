use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenescopeError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error! Status: {status} ({url})")]
    HttpStatus { url: String, status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid gene label: {0:?}")]
    InvalidGene(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GenescopeError>;
