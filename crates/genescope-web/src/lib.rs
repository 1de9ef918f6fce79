//! genescope-web — Volcano plot page controller.
//! Provides:
//!   - Embedded payload reading and the initial volcano render
//!   - Point selection handling with independent boxplot and publication loads
//!   - Container, renderer and data source seams with in-memory implementations
//!   - HTML fragments and page snapshots

pub mod container;
pub mod controller;
pub mod fragments;
pub mod payload;
pub mod renderer;
pub mod source;

pub use container::{Container, ContainerHandle, MemoryContainer, PageContainers};
pub use controller::{
    BoxplotOutcome, GeneInfoOutcome, InitOutcome, PageController, SelectionListener, SelectionOutcome,
};
pub use fragments::Fragments;
pub use payload::embedded_payload;
pub use renderer::{ClickBus, PlotRenderer, PlotlySnippetRenderer, RecordingRenderer, RenderCall};
pub use source::{GeneDataSource, HttpDataSource, MockGeneDataSource};
