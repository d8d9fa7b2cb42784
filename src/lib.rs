// Library exports for plotgrid

pub mod data;
pub mod discretize;
pub mod error;
pub mod filter;
pub mod ir;
pub mod layout;
pub mod palette;
pub mod parser;
pub mod runtime;
pub mod smooth;
pub mod transform;

pub use data::{ColumnKind, Dataset, ElementType, Value};
pub use error::{EngineError, Result};
pub use ir::{PlotRequest, PlotSpecification};
pub use runtime::{compose, ComposedPlot};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineOptions {
    /// Marker size given to the largest `size` value
    #[serde(default = "default_max_marker_size")]
    pub max_marker_size: f64,
    /// Quantile cut points used when bucketing continuous legend columns
    #[serde(default = "default_bucket_count")]
    pub bucket_count: usize,
}

fn default_max_marker_size() -> f64 { 35.0 }
fn default_bucket_count() -> usize { 5 }

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_marker_size: default_max_marker_size(),
            bucket_count: default_bucket_count(),
        }
    }
}
