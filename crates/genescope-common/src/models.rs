//! Wire types exchanged with the plotting collaborator and the data endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// === Plot payloads ===

/// Initial volcano plot payload embedded in the page.
///
/// Both members are passed through to the renderer untouched; only their
/// presence is inspected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPayload {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub layout: Value,
}

impl PlotPayload {
    /// Parse the embedded payload text. Anything other than a JSON object is
    /// rejected.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            value @ Value::Object(_) => serde_json::from_value(value),
            other => Err(serde::de::Error::custom(format!("expected a JSON object, got {}", other))),
        }
    }

    /// Number of points in the first series' `x` array, if it has one.
    pub fn first_series_len(&self) -> Option<usize> {
        self.data.as_array()?.first()?.get("x")?.as_array().map(Vec::len)
    }
}

/// Renderer options, serialized the way Plotly expects its config object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotOptions {
    pub responsive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_mode_bar: Option<bool>,
}

impl PlotOptions {
    pub fn responsive() -> Self {
        Self { responsive: true, display_mode_bar: None }
    }

    pub fn with_mode_bar(mut self, shown: bool) -> Self {
        self.display_mode_bar = Some(shown);
        self
    }
}

// === Endpoint responses ===

/// An empty `error` string carries no error.
fn non_empty(error: Option<String>) -> Option<String> {
    error.filter(|message| !message.is_empty())
}

/// Body of `GET /boxplot/{gene}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBoxplotResponse", into = "RawBoxplotResponse")]
pub enum BoxplotResponse {
    Plot { data: Value, layout: Value },
    Error(String),
}

#[derive(Serialize, Deserialize)]
struct RawBoxplotResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    layout: Value,
}

impl From<RawBoxplotResponse> for BoxplotResponse {
    fn from(raw: RawBoxplotResponse) -> Self {
        match non_empty(raw.error) {
            Some(message) => BoxplotResponse::Error(message),
            None => BoxplotResponse::Plot { data: raw.data, layout: raw.layout },
        }
    }
}

impl From<BoxplotResponse> for RawBoxplotResponse {
    fn from(resp: BoxplotResponse) -> Self {
        match resp {
            BoxplotResponse::Plot { data, layout } => Self { error: None, data, layout },
            BoxplotResponse::Error(message) => Self {
                error: Some(message),
                data: Value::Null,
                layout: Value::Null,
            },
        }
    }
}

/// Body of `GET /gene_info/{gene}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawGeneInfoResponse", into = "RawGeneInfoResponse")]
pub enum GeneInfoResponse {
    Info { publications: Vec<Publication> },
    Error(String),
}

#[derive(Serialize, Deserialize)]
struct RawGeneInfoResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    publications: Option<Vec<Publication>>,
}

impl From<RawGeneInfoResponse> for GeneInfoResponse {
    fn from(raw: RawGeneInfoResponse) -> Self {
        match non_empty(raw.error) {
            Some(message) => GeneInfoResponse::Error(message),
            None => GeneInfoResponse::Info { publications: raw.publications.unwrap_or_default() },
        }
    }
}

impl From<GeneInfoResponse> for RawGeneInfoResponse {
    fn from(resp: GeneInfoResponse) -> Self {
        match resp {
            GeneInfoResponse::Info { publications } => Self { error: None, publications: Some(publications) },
            GeneInfoResponse::Error(message) => Self { error: Some(message), publications: None },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(deserialize_with = "string_or_number")]
    pub pubmed_id: String,
    #[serde(default)]
    pub url: String,
}

impl Publication {
    /// Entry pointing at the canonical PubMed page for `pmid`.
    pub fn pubmed(pmid: &str) -> Self {
        Self {
            pubmed_id: pmid.to_string(),
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid),
        }
    }
}

/// PubMed IDs arrive as strings or bare integers depending on the provider.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected PubMed ID, got {}", other))),
    }
}

// === Click events ===

/// A point-click notification as emitted by the plotting library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotClick {
    #[serde(default)]
    pub points: Vec<PlotPoint>,
}

impl PlotClick {
    /// Click on a single point labelled with `gene`.
    pub fn for_gene(gene: &str) -> Self {
        Self {
            points: vec![PlotPoint { text: Value::String(gene.to_string()), ..Default::default() }],
        }
    }

    pub fn first_point(&self) -> Option<&PlotPoint> {
        self.points.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub text: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub x: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub y: Value,
    #[serde(rename = "curveNumber", default, skip_serializing_if = "Option::is_none")]
    pub curve_number: Option<usize>,
    #[serde(rename = "pointNumber", default, skip_serializing_if = "Option::is_none")]
    pub point_number: Option<usize>,
}

impl PlotPoint {
    /// The gene label carried in the point's hover text.
    pub fn label(&self) -> Option<String> {
        match &self.text {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A click routed through a renderer, tagged with the container it hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickNotification {
    pub container: String,
    pub event: PlotClick,
}
