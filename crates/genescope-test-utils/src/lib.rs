//! Fixtures shared by Genescope tests.

use genescope_common::models::{BoxplotResponse, GeneInfoResponse, Publication};
use serde_json::{json, Value};

/// Volcano payload text with one marker series over `(gene, log_fc, -log10 p)`.
pub fn volcano_payload(points: &[(&str, f64, f64)]) -> String {
    let x: Vec<f64> = points.iter().map(|p| p.1).collect();
    let y: Vec<f64> = points.iter().map(|p| p.2).collect();
    let text: Vec<&str> = points.iter().map(|p| p.0).collect();
    json!({
        "data": [{
            "type": "scatter",
            "mode": "markers",
            "x": x,
            "y": y,
            "text": text,
        }],
        "layout": {
            "title": "Volcano Plot",
            "xaxis": {"title": "log2 Fold Change"},
            "yaxis": {"title": "-log10(adj. p-value)"},
        },
    })
    .to_string()
}

/// A small default payload.
pub fn sample_payload() -> String {
    volcano_payload(&[("TP53", 1.8, 6.2), ("BRCA1", -0.7, 1.1), ("KRAS", 2.4, 9.5)])
}

/// Page document embedding `payload` in the `volcano-data` script node.
pub fn page_with_payload(payload: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Volcano</title></head>
<body>
  <div id="volcano"></div>
  <div id="boxplot"></div>
  <div id="publications-content"></div>
  <script id="volcano-data" type="application/json">{}</script>
</body>
</html>"#,
        payload
    )
}

/// Young vs. old donor boxplot for `gene`.
pub fn boxplot_for(gene: &str) -> BoxplotResponse {
    BoxplotResponse::Plot {
        data: json!([
            {"type": "box", "name": "Young", "y": [10.2, 11.0, 9.8, 10.5]},
            {"type": "box", "name": "Old", "y": [12.1, 12.9, 11.7, 13.0]},
        ]),
        layout: layout_titled(&format!("{} expression", gene)),
    }
}

fn layout_titled(title: &str) -> Value {
    json!({"title": title, "yaxis": {"title": "RFU"}})
}

/// Gene info listing PubMed entries for `pmids`.
pub fn publications(pmids: &[&str]) -> GeneInfoResponse {
    GeneInfoResponse::Info {
        publications: pmids.iter().map(|id| Publication::pubmed(id)).collect(),
    }
}
