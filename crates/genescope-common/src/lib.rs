//! genescope-common — Shared error type, wire models and configuration
//! used by the Genescope crates.

pub mod error;
pub mod models;
pub mod config;

// Re-export commonly used types
pub use config::Config;
pub use error::{GenescopeError, Result};
pub use models::{
    BoxplotResponse, ClickNotification, GeneInfoResponse, PlotClick, PlotOptions, PlotPayload,
    PlotPoint, Publication,
};
