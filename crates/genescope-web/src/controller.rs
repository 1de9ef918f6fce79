//! Page controller: initial volcano render and per-gene selection handling.
//!
//! Every failure is caught at the boundary where it happens and turned into
//! either a log line or a container-local message; nothing propagates out of
//! the controller.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use genescope_common::error::Result;
use genescope_common::models::{BoxplotResponse, GeneInfoResponse, PlotClick, PlotOptions, PlotPayload};

use crate::container::{Container, PageContainers};
use crate::fragments::{
    Fragments, BOXPLOT_LOAD_ERROR, BOXPLOT_RENDER_ERROR, LOADING_BOXPLOT, LOADING_PUBLICATIONS,
    PUBLICATIONS_LOAD_ERROR, VOLCANO_PARSE_ERROR,
};
use crate::renderer::PlotRenderer;
use crate::source::GeneDataSource;

/// How page initialization ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// No payload element on the page; nothing was touched.
    MissingElement,
    /// Payload text was not valid; the volcano container shows an error.
    ParseFailed,
    Rendered,
    /// The renderer failed; logged only.
    RenderFailed,
}

impl InitOutcome {
    /// Whether the payload parsed and the click handler should be attached.
    pub fn accepts_clicks(self) -> bool {
        matches!(self, InitOutcome::Rendered | InitOutcome::RenderFailed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxplotOutcome {
    Rendered,
    /// The endpoint answered with an `error` field.
    ServerError(String),
    /// Non-success status, transport or decoding failure.
    LoadFailed,
    RenderFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneInfoOutcome {
    Publications(usize),
    NoPublications,
    ServerError(String),
    LoadFailed,
}

/// Terminal states of one selection. The two halves are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub gene: String,
    pub boxplot: BoxplotOutcome,
    pub gene_info: GeneInfoOutcome,
}

/// Drives the volcano, boxplot and publications containers of one page.
#[derive(Clone)]
pub struct PageController {
    containers: PageContainers,
    renderer: Arc<dyn PlotRenderer>,
    source: Arc<dyn GeneDataSource>,
    fragments: Arc<Fragments>,
    volcano_options: PlotOptions,
}

impl PageController {
    pub fn new(
        containers: PageContainers,
        renderer: Arc<dyn PlotRenderer>,
        source: Arc<dyn GeneDataSource>,
    ) -> Result<Self> {
        Ok(Self {
            containers,
            renderer,
            source,
            fragments: Arc::new(Fragments::new()?),
            volcano_options: PlotOptions::responsive().with_mode_bar(true),
        })
    }

    pub fn with_volcano_options(mut self, options: PlotOptions) -> Self {
        self.volcano_options = options;
        self
    }

    pub fn containers(&self) -> &PageContainers {
        &self.containers
    }

    pub fn fragments(&self) -> &Fragments {
        &self.fragments
    }

    /// Write a fragment into a container, logging instead if it failed to render.
    fn show(&self, target: &dyn Container, fragment: Result<String>) {
        match fragment {
            Ok(html) => target.set_html(html),
            Err(e) => error!(container = target.id(), "Failed to build fragment: {}", e),
        }
    }

    // ── Initialization ──────────────────────────────────────────────────────

    /// Parse the embedded payload text and render the volcano plot.
    pub async fn initialize(&self, payload_text: Option<&str>) -> InitOutcome {
        let Some(text) = payload_text else {
            error!("Could not find volcano-data element");
            return InitOutcome::MissingElement;
        };

        let payload = match PlotPayload::parse(text) {
            Ok(p) => p,
            Err(e) => {
                error!("Error parsing volcano data: {}", e);
                let volcano = self.containers.volcano.as_ref();
                self.show(volcano, self.fragments.error(VOLCANO_PARSE_ERROR));
                return InitOutcome::ParseFailed;
            }
        };
        debug!(payload = %payload.data, "Volcano data loaded");

        match payload.first_series_len() {
            Some(n) if n > 0 => info!("Found {} data points", n),
            _ => error!("No data points found in the volcano data"),
        }

        let result = self
            .renderer
            .new_plot(self.containers.volcano.as_ref(), &payload.data, &payload.layout, self.volcano_options)
            .await;
        match result {
            Ok(()) => {
                info!("Volcano plot rendered successfully");
                InitOutcome::Rendered
            }
            Err(e) => {
                error!("Error rendering volcano plot: {}", e);
                InitOutcome::RenderFailed
            }
        }
    }

    /// Initialize, then attach the click listener when the payload parsed.
    pub async fn mount(&self, payload_text: Option<&str>) -> (InitOutcome, Option<SelectionListener>) {
        let outcome = self.initialize(payload_text).await;
        let listener = outcome.accepts_clicks().then(|| self.listen());
        (outcome, listener)
    }

    // ── Selection ───────────────────────────────────────────────────────────

    /// Subscribe to renderer clicks on the volcano container. Each click is
    /// handled in its own task; a new click never cancels earlier ones.
    pub fn listen(&self) -> SelectionListener {
        let mut clicks = self.renderer.subscribe_clicks();
        let (tx, outcomes) = mpsc::unbounded_channel();
        let controller = self.clone();

        let task = tokio::spawn(async move {
            let volcano_id = controller.containers.volcano.id().to_string();
            loop {
                match clicks.recv().await {
                    Ok(note) if note.container == volcano_id => {
                        let controller = controller.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            if let Some(outcome) = controller.handle_click(&note.event).await {
                                let _ = tx.send(outcome);
                            }
                        });
                    }
                    Ok(note) => debug!(container = %note.container, "Ignoring click outside volcano plot"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Click listener fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        SelectionListener { task, outcomes }
    }

    /// Handle `event` in a background task.
    pub fn select(&self, event: PlotClick) -> JoinHandle<Option<SelectionOutcome>> {
        let controller = self.clone();
        tokio::spawn(async move { controller.handle_click(&event).await })
    }

    /// Handle one point click. Returns `None` when the event carries no
    /// usable point, in which case nothing was fetched or mutated.
    pub async fn handle_click(&self, event: &PlotClick) -> Option<SelectionOutcome> {
        let Some(point) = event.first_point() else {
            error!("No point data available in click event");
            return None;
        };
        let Some(gene) = point.label() else {
            error!(?point, "Clicked point carries no gene label");
            return None;
        };
        info!("Selected gene: {}", gene);

        self.show(self.containers.boxplot.as_ref(), self.fragments.message(LOADING_BOXPLOT));
        self.show(self.containers.publications.as_ref(), self.fragments.message(LOADING_PUBLICATIONS));

        let (boxplot, gene_info) = tokio::join!(self.load_boxplot(&gene), self.load_gene_info(&gene));
        Some(SelectionOutcome { gene, boxplot, gene_info })
    }

    async fn load_boxplot(&self, gene: &str) -> BoxplotOutcome {
        let target = self.containers.boxplot.as_ref();

        let (data, layout) = match self.source.boxplot(gene).await {
            Ok(BoxplotResponse::Plot { data, layout }) => (data, layout),
            Ok(BoxplotResponse::Error(message)) => {
                warn!(gene, "Boxplot endpoint reported: {}", message);
                self.show(target, self.fragments.error(&message));
                return BoxplotOutcome::ServerError(message);
            }
            Err(e) => {
                error!(gene, "Error loading boxplot: {}", e);
                self.show(target, self.fragments.error(BOXPLOT_LOAD_ERROR));
                return BoxplotOutcome::LoadFailed;
            }
        };
        debug!(gene, "Boxplot data received");

        match self.renderer.new_plot(target, &data, &layout, PlotOptions::responsive()).await {
            Ok(()) => BoxplotOutcome::Rendered,
            Err(e) => {
                error!(gene, "Error rendering boxplot: {}", e);
                self.show(target, self.fragments.error(BOXPLOT_RENDER_ERROR));
                BoxplotOutcome::RenderFailed
            }
        }
    }

    async fn load_gene_info(&self, gene: &str) -> GeneInfoOutcome {
        let target = self.containers.publications.as_ref();

        match self.source.gene_info(gene).await {
            Ok(GeneInfoResponse::Info { publications }) if publications.is_empty() => {
                self.show(target, self.fragments.no_publications(gene));
                GeneInfoOutcome::NoPublications
            }
            Ok(GeneInfoResponse::Info { publications }) => {
                debug!(gene, count = publications.len(), "Publication data received");
                self.show(target, self.fragments.publications(gene, &publications));
                GeneInfoOutcome::Publications(publications.len())
            }
            Ok(GeneInfoResponse::Error(message)) => {
                warn!(gene, "Gene info endpoint reported: {}", message);
                self.show(target, self.fragments.error(&message));
                GeneInfoOutcome::ServerError(message)
            }
            Err(e) => {
                error!(gene, "Error loading gene information: {}", e);
                self.show(target, self.fragments.error(PUBLICATIONS_LOAD_ERROR));
                GeneInfoOutcome::LoadFailed
            }
        }
    }
}

/// Background click listener attached by [`PageController::mount`].
pub struct SelectionListener {
    task: JoinHandle<()>,
    outcomes: mpsc::UnboundedReceiver<SelectionOutcome>,
}

impl SelectionListener {
    /// Next finished selection, in completion order.
    pub async fn next_outcome(&mut self) -> Option<SelectionOutcome> {
        self.outcomes.recv().await
    }

    /// Detach from the renderer. Selections already in flight still finish.
    pub fn stop(self) {
        self.task.abort();
    }
}
