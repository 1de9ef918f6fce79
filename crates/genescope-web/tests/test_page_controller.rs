//! Page controller behaviour against the recording renderer and mock data source.
//!
//! Run with: cargo test --package genescope-web --test test_page_controller

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use genescope_common::config::PageConfig;
use genescope_common::models::{BoxplotResponse, GeneInfoResponse, PlotClick, PlotOptions, PlotPayload, PlotPoint};
use genescope_test_utils::{boxplot_for, publications, sample_payload, volcano_payload};
use genescope_web::fragments::{
    BOXPLOT_LOAD_ERROR, BOXPLOT_RENDER_ERROR, LOADING_BOXPLOT, LOADING_PUBLICATIONS, PUBLICATIONS_LOAD_ERROR,
    VOLCANO_PARSE_ERROR,
};
use genescope_web::{
    BoxplotOutcome, Container, GeneInfoOutcome, InitOutcome, MemoryContainer, MockGeneDataSource, PageContainers,
    PageController, RecordingRenderer,
};

struct Page {
    controller: PageController,
    renderer: Arc<RecordingRenderer>,
    source: Arc<MockGeneDataSource>,
    volcano: Arc<MemoryContainer>,
    boxplot: Arc<MemoryContainer>,
    publications: Arc<MemoryContainer>,
}

fn page(renderer: RecordingRenderer, source: MockGeneDataSource) -> Page {
    let (containers, [volcano, boxplot, publications]) = PageContainers::in_memory(&PageConfig::default());
    let renderer = Arc::new(renderer);
    let source = Arc::new(source);
    let controller = PageController::new(containers, renderer.clone(), source.clone()).unwrap();
    Page { controller, renderer, source, volcano, boxplot, publications }
}

fn error_html(message: &str) -> String {
    format!(r#"<p class="error">{}</p>"#, message)
}

fn message_html(message: &str) -> String {
    format!("<p>{}</p>", message)
}

// === Initialization ===

#[tokio::test]
async fn test_payload_rendered_with_exact_data_and_layout() {
    let p = page(RecordingRenderer::new(), MockGeneDataSource::new());
    let text = sample_payload();
    let expected = PlotPayload::parse(&text).unwrap();

    let (outcome, listener) = p.controller.mount(Some(&text)).await;

    assert_eq!(outcome, InitOutcome::Rendered);
    assert!(listener.is_some());
    let calls = p.renderer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].container, "volcano");
    assert_eq!(calls[0].data, expected.data);
    assert_eq!(calls[0].layout, expected.layout);
    assert_eq!(calls[0].options, PlotOptions::responsive().with_mode_bar(true));
}

#[tokio::test]
async fn test_malformed_payload_shows_parse_error_without_render() {
    let p = page(RecordingRenderer::new(), MockGeneDataSource::new());

    let (outcome, listener) = p.controller.mount(Some("{\"data\": [")).await;

    assert_eq!(outcome, InitOutcome::ParseFailed);
    assert!(listener.is_none());
    assert_eq!(p.volcano.html(), error_html(VOLCANO_PARSE_ERROR));
    assert!(p.renderer.calls().is_empty());
}

#[tokio::test]
async fn test_missing_payload_element_aborts_silently() {
    let p = page(RecordingRenderer::new(), MockGeneDataSource::new());

    let (outcome, listener) = p.controller.mount(None).await;

    assert_eq!(outcome, InitOutcome::MissingElement);
    assert!(listener.is_none());
    assert!(p.renderer.calls().is_empty());
    for container in [&p.volcano, &p.boxplot, &p.publications] {
        assert_eq!(container.writes(), 0);
    }
}

#[tokio::test]
async fn test_empty_series_still_rendered() {
    let p = page(RecordingRenderer::new(), MockGeneDataSource::new());

    let outcome = p.controller.initialize(Some(&volcano_payload(&[]))).await;

    assert_eq!(outcome, InitOutcome::Rendered);
    assert_eq!(p.renderer.calls().len(), 1);
}

#[tokio::test]
async fn test_volcano_render_failure_is_logged_only() {
    let p = page(RecordingRenderer::new().failing_on("volcano"), MockGeneDataSource::new());

    let (outcome, listener) = p.controller.mount(Some(&sample_payload())).await;

    assert_eq!(outcome, InitOutcome::RenderFailed);
    assert!(listener.is_some(), "click handler is attached even when rendering failed");
    assert_eq!(p.volcano.writes(), 0);
}

// === Selection ===

#[tokio::test]
async fn test_click_without_points_does_nothing() {
    let p = page(RecordingRenderer::new(), MockGeneDataSource::new());

    assert_eq!(p.controller.handle_click(&PlotClick::default()).await, None);

    assert!(p.source.requests().is_empty());
    assert_eq!(p.boxplot.writes(), 0);
    assert_eq!(p.publications.writes(), 0);
}

#[tokio::test]
async fn test_point_without_label_does_nothing() {
    let p = page(RecordingRenderer::new(), MockGeneDataSource::new());
    let click = PlotClick { points: vec![PlotPoint { x: json!(1.0), y: json!(2.0), ..Default::default() }] };

    assert_eq!(p.controller.handle_click(&click).await, None);
    assert!(p.source.requests().is_empty());
    assert_eq!(p.boxplot.writes(), 0);
}

#[tokio::test]
async fn test_click_issues_one_request_per_endpoint() {
    let source = MockGeneDataSource::new()
        .with_boxplot("TP53", boxplot_for("TP53"))
        .with_gene_info("TP53", publications(&["123"]));
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("TP53")).await.unwrap();

    let mut requests = p.source.requests();
    requests.sort();
    assert_eq!(requests, vec!["/boxplot/TP53", "/gene_info/TP53"]);
    assert_eq!(outcome.gene, "TP53");
    assert_eq!(outcome.boxplot, BoxplotOutcome::Rendered);
    assert_eq!(outcome.gene_info, GeneInfoOutcome::Publications(1));

    let BoxplotResponse::Plot { data, layout } = boxplot_for("TP53") else { unreachable!() };
    let calls = p.renderer.calls_for("boxplot");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].data, data);
    assert_eq!(calls[0].layout, layout);
    assert_eq!(calls[0].options, PlotOptions::responsive());
}

#[tokio::test(start_paused = true)]
async fn test_loading_placeholders_shown_while_in_flight() {
    let source = MockGeneDataSource::new()
        .with_boxplot("EGFR", boxplot_for("EGFR"))
        .with_gene_info("EGFR", publications(&[]))
        .with_latency("EGFR", Duration::from_millis(200));
    let p = page(RecordingRenderer::new(), source);

    let handle = p.controller.select(PlotClick::for_gene("EGFR"));
    tokio::task::yield_now().await;

    assert_eq!(p.boxplot.html(), message_html(LOADING_BOXPLOT));
    assert_eq!(p.publications.html(), message_html(LOADING_PUBLICATIONS));

    handle.await.unwrap().unwrap();
    assert_ne!(p.boxplot.html(), message_html(LOADING_BOXPLOT));
    assert_eq!(p.publications.html(), message_html("No publications found for EGFR."));
}

#[tokio::test]
async fn test_boxplot_error_field_rendered_without_plot() {
    let source = MockGeneDataSource::new()
        .with_boxplot("TP53", BoxplotResponse::Error("x".to_string()))
        .with_gene_info("TP53", publications(&["1"]));
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("TP53")).await.unwrap();

    assert_eq!(outcome.boxplot, BoxplotOutcome::ServerError("x".to_string()));
    assert_eq!(p.boxplot.html(), error_html("x"));
    assert!(p.renderer.calls_for("boxplot").is_empty());
}

#[tokio::test]
async fn test_empty_error_field_still_renders_and_lists() {
    let boxplot: BoxplotResponse =
        serde_json::from_value(json!({"error": "", "data": [{"y": [1]}], "layout": {}})).unwrap();
    let info: GeneInfoResponse = serde_json::from_value(json!({
        "error": "",
        "publications": [{"pubmed_id": "1", "url": "https://pubmed.ncbi.nlm.nih.gov/1/"}, {"pubmed_id": "2"}],
    }))
    .unwrap();
    let source = MockGeneDataSource::new().with_boxplot("TP53", boxplot).with_gene_info("TP53", info);
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("TP53")).await.unwrap();

    assert_eq!(outcome.boxplot, BoxplotOutcome::Rendered);
    assert_eq!(p.renderer.calls_for("boxplot").len(), 1);
    assert_eq!(p.boxplot.html(), r#"<div class="plot" data-traces="1"></div>"#);
    assert_eq!(outcome.gene_info, GeneInfoOutcome::Publications(2));
    let html = p.publications.html();
    assert_eq!(html.matches("<li ").count(), 2);
    assert!(html.contains("<span>PubMed ID: 2</span>"));
}

#[tokio::test]
async fn test_empty_publications_names_gene() {
    let source = MockGeneDataSource::new()
        .with_boxplot("TP53", boxplot_for("TP53"))
        .with_gene_info("TP53", publications(&[]));
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("TP53")).await.unwrap();

    assert_eq!(outcome.gene_info, GeneInfoOutcome::NoPublications);
    assert_eq!(p.publications.html(), message_html("No publications found for TP53."));
}

#[tokio::test]
async fn test_two_publications_become_two_links() {
    let source = MockGeneDataSource::new()
        .with_boxplot("BRCA1", boxplot_for("BRCA1"))
        .with_gene_info("BRCA1", publications(&["20301425", "31234567"]));
    let p = page(RecordingRenderer::new(), source);

    p.controller.handle_click(&PlotClick::for_gene("BRCA1")).await.unwrap();

    let html = p.publications.html();
    assert!(html.starts_with("<h3>Publications for BRCA1</h3>"));
    assert_eq!(html.matches("<li ").count(), 2);
    for id in ["20301425", "31234567"] {
        assert!(html.contains(&format!(
            r#"<a href="https://pubmed.ncbi.nlm.nih.gov/{}/" target="_blank" rel="noopener noreferrer">PubMed ID: {}</a>"#,
            id, id
        )));
    }
}

#[tokio::test]
async fn test_boxplot_failure_does_not_affect_publications() {
    let source = MockGeneDataSource::new()
        .with_boxplot_status("KRAS", 500)
        .with_gene_info("KRAS", publications(&["42"]));
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("KRAS")).await.unwrap();

    assert_eq!(outcome.boxplot, BoxplotOutcome::LoadFailed);
    assert_eq!(outcome.gene_info, GeneInfoOutcome::Publications(1));
    assert_eq!(p.boxplot.html(), error_html(BOXPLOT_LOAD_ERROR));
    assert!(p.publications.html().contains("PubMed ID: 42"));
}

#[tokio::test]
async fn test_gene_info_failure_does_not_affect_boxplot() {
    let source = MockGeneDataSource::new()
        .with_boxplot("KRAS", boxplot_for("KRAS"))
        .with_gene_info_status("KRAS", 503);
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("KRAS")).await.unwrap();

    assert_eq!(outcome.boxplot, BoxplotOutcome::Rendered);
    assert_eq!(outcome.gene_info, GeneInfoOutcome::LoadFailed);
    assert_eq!(p.publications.html(), error_html(PUBLICATIONS_LOAD_ERROR));
    assert_eq!(p.boxplot.html(), r#"<div class="plot" data-traces="2"></div>"#);
}

#[tokio::test]
async fn test_gene_info_error_field() {
    let source = MockGeneDataSource::new()
        .with_boxplot("MYC", boxplot_for("MYC"))
        .with_gene_info("MYC", GeneInfoResponse::Error("Gene not found".to_string()));
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("MYC")).await.unwrap();

    assert_eq!(outcome.gene_info, GeneInfoOutcome::ServerError("Gene not found".to_string()));
    assert_eq!(p.publications.html(), error_html("Gene not found"));
}

#[tokio::test]
async fn test_boxplot_render_failure_shows_generic_error() {
    let source = MockGeneDataSource::new()
        .with_boxplot("TP53", boxplot_for("TP53"))
        .with_gene_info("TP53", publications(&[]));
    let p = page(RecordingRenderer::new().failing_on("boxplot"), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("TP53")).await.unwrap();

    assert_eq!(outcome.boxplot, BoxplotOutcome::RenderFailed);
    assert_eq!(p.boxplot.html(), error_html(BOXPLOT_RENDER_ERROR));
}

#[tokio::test]
async fn test_boxplot_without_trace_array_is_a_render_failure() {
    let source = MockGeneDataSource::new()
        .with_boxplot("TP53", BoxplotResponse::Plot { data: json!({"young": [1.0], "old": [2.0]}), layout: json!({}) })
        .with_gene_info("TP53", publications(&[]));
    let p = page(RecordingRenderer::new(), source);

    let outcome = p.controller.handle_click(&PlotClick::for_gene("TP53")).await.unwrap();

    assert_eq!(outcome.boxplot, BoxplotOutcome::RenderFailed);
    assert_eq!(p.boxplot.html(), error_html(BOXPLOT_RENDER_ERROR));
}

#[tokio::test]
async fn test_gene_label_is_escaped() {
    let gene = "<script>x</script>";
    let source = MockGeneDataSource::new().with_gene_info(gene, publications(&[]));
    let p = page(RecordingRenderer::new(), source);

    p.controller.handle_click(&PlotClick::for_gene(gene)).await.unwrap();

    assert!(!p.publications.html().contains("<script>"));
    assert!(p.publications.html().contains("&lt;script&gt;"));
}

// === Click subscription ===

#[tokio::test(start_paused = true)]
async fn test_listener_ignores_clicks_on_other_containers() {
    let source = MockGeneDataSource::new()
        .with_boxplot("TP53", boxplot_for("TP53"))
        .with_gene_info("TP53", publications(&["1"]));
    let p = page(RecordingRenderer::new(), source);
    let (_, listener) = p.controller.mount(Some(&sample_payload())).await;
    let mut listener = listener.unwrap();

    p.renderer.click("boxplot", PlotClick::for_gene("TP53"));
    p.renderer.click("volcano", PlotClick::default());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(p.source.requests().is_empty());

    p.renderer.click("volcano", PlotClick::for_gene("TP53"));
    let outcome = listener.next_outcome().await.unwrap();
    assert_eq!(outcome.gene, "TP53");
    assert_eq!(p.source.requests().len(), 2);
    listener.stop();
}

#[tokio::test(start_paused = true)]
async fn test_new_selection_does_not_cancel_previous() {
    let source = MockGeneDataSource::new()
        .with_boxplot("SLOW", boxplot_for("SLOW"))
        .with_gene_info("SLOW", publications(&["1"]))
        .with_latency("SLOW", Duration::from_millis(500))
        .with_boxplot("FAST", boxplot_for("FAST"))
        .with_gene_info("FAST", publications(&[]))
        .with_latency("FAST", Duration::from_millis(50));
    let p = page(RecordingRenderer::new(), source);
    let (_, listener) = p.controller.mount(Some(&sample_payload())).await;
    let mut listener = listener.unwrap();

    p.renderer.click("volcano", PlotClick::for_gene("SLOW"));
    p.renderer.click("volcano", PlotClick::for_gene("FAST"));

    let first = listener.next_outcome().await.unwrap();
    let second = listener.next_outcome().await.unwrap();
    assert_eq!(first.gene, "FAST");
    assert_eq!(second.gene, "SLOW");

    // The slower, earlier selection lands last and wins the containers
    let boxplots = p.renderer.calls_for("boxplot");
    assert_eq!(boxplots.len(), 2);
    assert_eq!(boxplots[1].layout["title"], "SLOW expression");
    assert!(p.publications.html().contains("Publications for SLOW"));
    listener.stop();
}
