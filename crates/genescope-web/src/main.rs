//! Genescope headless page driver.
//!
//! Loads the volcano page, replays gene selections against the data
//! endpoints and writes a snapshot of the resulting containers.
//!
//! Run with: cargo run -p genescope-web -- --page index.html --select TP53

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use genescope_common::models::PlotClick;
use genescope_common::Config;
use genescope_web::{embedded_payload, HttpDataSource, PageContainers, PageController, PlotlySnippetRenderer};

const CLICK_BATCH: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "genescope", version, about = "Render a volcano page and replay gene selections")]
struct Cli {
    /// Page HTML to load instead of fetching the index route from the server
    #[arg(long, value_name = "FILE")]
    page: Option<PathBuf>,

    /// Gene to select on the volcano plot (repeatable)
    #[arg(long = "select", value_name = "GENE")]
    select: Vec<String>,

    /// Write the snapshot here instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Override server.base_url
    #[arg(long)]
    base_url: Option<String>,

    /// Config file (defaults to GENESCOPE_CONFIG or ./genescope.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("genescope=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }
    config.validate()?;
    info!("Data endpoints at {}", config.server.base_url);

    let source = Arc::new(HttpDataSource::from_config(&config)?);

    let html = match &cli.page {
        Some(path) => std::fs::read_to_string(path)?,
        None => source.fetch_page(&config.page.index_path).await?,
    };
    let payload = embedded_payload(&html, &config.page.payload_element_id);

    let (containers, _) = PageContainers::in_memory(&config.page);
    let renderer = Arc::new(PlotlySnippetRenderer::new());
    let controller = PageController::new(containers, renderer.clone(), source)?
        .with_volcano_options(config.plot.volcano_options());

    let (outcome, listener) = controller.mount(payload.as_deref()).await;
    info!(?outcome, "Page initialized");

    // Blank labels never produce a selection outcome
    let genes: Vec<&str> = cli.select.iter().map(|g| g.trim()).filter(|g| !g.is_empty()).collect();

    match listener {
        Some(mut listener) => {
            let volcano = &config.page.volcano_container;
            // Batches stay well under the click bus capacity
            for batch in genes.chunks(CLICK_BATCH) {
                for gene in batch {
                    renderer.click(volcano, PlotClick::for_gene(gene));
                }
                for _ in 0..batch.len() {
                    match listener.next_outcome().await {
                        Some(done) => info!(
                            gene = %done.gene,
                            boxplot = ?done.boxplot,
                            gene_info = ?done.gene_info,
                            "Selection finished"
                        ),
                        None => break,
                    }
                }
            }
            listener.stop();
        }
        None if !genes.is_empty() => {
            warn!("Volcano plot not initialized; ignoring {} selection(s)", genes.len());
        }
        None => {}
    }

    let title = match genes.last() {
        Some(gene) => format!("Genescope: {}", gene),
        None => "Genescope".to_string(),
    };
    let snapshot = controller
        .fragments()
        .snapshot(&title, &controller.containers().all())?;

    match &cli.out {
        Some(path) => {
            std::fs::write(path, snapshot)?;
            info!("Snapshot written to {}", path.display());
        }
        None => println!("{}", snapshot),
    }

    Ok(())
}
