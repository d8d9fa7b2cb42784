use crate::data::Value;
use crate::filter::FilterSpec;
use crate::smooth::SmoothingConfig;
use crate::EngineOptions;
use serde::{Deserialize, Serialize};

// =============================================================================
// Phase 1: Request
// =============================================================================

/// Everything the UI collaborator sends for one figure
#[derive(Debug, Clone, Deserialize)]
pub struct PlotRequest {
    pub xs: Vec<String>,
    pub ys: Vec<String>,
    #[serde(flatten)]
    pub legend: LegendSpec,
    #[serde(default)]
    pub cartesian: bool,
    #[serde(default)]
    pub smoother: SmoothingConfig,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub options: EngineOptions,
}

impl PlotRequest {
    pub fn new(xs: Vec<String>, ys: Vec<String>) -> Self {
        Self {
            xs,
            ys,
            legend: LegendSpec::default(),
            cartesian: false,
            smoother: SmoothingConfig::default(),
            filters: Vec::new(),
            options: EngineOptions::default(),
        }
    }

    /// Every column the request refers to, in request order
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.xs
            .iter()
            .chain(self.ys.iter())
            .chain(self.legend.size.iter())
            .chain(self.legend.color.iter())
            .chain(self.legend.symbol.iter())
            .chain(self.legend.hover.iter())
            .map(String::as_str)
    }
}

/// Optional legend mappings (data columns → marker properties)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegendSpec {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub hover: Vec<String>,
}

// =============================================================================
// Phase 2: Plot specification
// =============================================================================

/// The renderable figure. Built once per request and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct PlotSpecification {
    pub rows: usize,
    pub cols: usize,
    pub shared_x_axes: bool,
    pub shared_y_axes: bool,
    pub cells: Vec<CellSpec>,
}

impl PlotSpecification {
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellSpec> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

/// One subplot
#[derive(Debug, Clone, Serialize)]
pub struct CellSpec {
    pub row: usize,
    pub col: usize,
    pub x_title: String,
    pub y_title: String,
    pub traces: Vec<Trace>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceMode {
    #[serde(rename = "markers")]
    Points,
    #[serde(rename = "lines")]
    Trend,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub name: String,
    /// Legend group label (color and symbol categories)
    pub group: String,
    pub mode: TraceMode,
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_text: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
}
