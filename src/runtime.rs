// Request executor: filter, slice, lay out, build traces

use crate::data::Dataset;
use crate::error::Result;
use crate::filter::{apply_filters, AuditRecord};
use crate::ir::{PlotRequest, PlotSpecification};
use crate::layout::resolve;
use crate::transform::build_traces;
use serde::Serialize;
use tracing::info;

/// Everything produced for one request
#[derive(Debug, Clone, Serialize)]
pub struct ComposedPlot {
    pub plot: PlotSpecification,
    pub mask: Vec<bool>,
    pub filter_log: Vec<AuditRecord>,
}

impl ComposedPlot {
    pub fn rows_kept(&self) -> usize {
        self.mask.iter().filter(|&&b| b).count()
    }
}

/// Compose a plot specification for `request` against a read-only dataset
pub fn compose(data: &Dataset, request: &PlotRequest) -> Result<ComposedPlot> {
    // Structural validation aborts before any data is scanned
    request.smoother.validate()?;
    let layout = resolve(&request.xs, &request.ys, request.cartesian)?;
    for name in request.referenced_columns() {
        data.column(name)?;
    }

    let filtered = apply_filters(data, &request.filters)?;
    let sliced = data.take(&filtered.mask);

    let cells = build_traces(
        &sliced,
        &request.legend,
        &layout,
        &request.smoother,
        &request.options,
    )?;

    let plot = PlotSpecification {
        rows: layout.rows,
        cols: layout.cols,
        shared_x_axes: layout.shared_x_axes,
        shared_y_axes: layout.shared_y_axes,
        cells,
    };
    info!(
        rows = plot.rows,
        cols = plot.cols,
        traces = plot.cells.iter().map(|c| c.traces.len()).sum::<usize>(),
        kept = sliced.n_rows(),
        "composed plot"
    );

    Ok(ComposedPlot {
        plot,
        mask: filtered.mask,
        filter_log: filtered.records,
    })
}
