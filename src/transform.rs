// Group & trace builder: legend encodings, row groups, points and trend traces

use crate::data::{Column, ColumnKind, Dataset, Value};
use crate::discretize::{to_continuous, to_discrete};
use crate::error::{EngineError, Result};
use crate::ir::{CellSpec, LegendSpec, Marker, Trace, TraceMode};
use crate::layout::{CellAssignment, LayoutResult};
use crate::palette::ColorPalette;
use crate::smooth::SmoothingConfig;
use crate::EngineOptions;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Groups with fewer rows than this are not plotted
const MIN_GROUP_ROWS: usize = 2;

/// Main entry point: build the per-cell traces for already filtered data
pub fn build_traces(
    data: &Dataset,
    legend: &LegendSpec,
    layout: &LayoutResult,
    smoothing: &SmoothingConfig,
    options: &EngineOptions,
) -> Result<Vec<CellSpec>> {
    // 1. Legend encodings
    let color = grouping_key(data, legend.color.as_deref(), options.bucket_count)?;
    let symbol = grouping_key(data, legend.symbol.as_deref(), options.bucket_count)?;
    let sizes = marker_sizes(data, legend.size.as_deref(), options.max_marker_size)?;
    let hover = hover_text(data, &legend.hover)?;

    // 2. Partition rows into color x symbol groups
    let groups = partition_groups(data.n_rows(), color.as_ref(), symbol.as_ref());

    // 3. One points trace (and maybe a trend trace) per group per cell
    let palette = ColorPalette::plotly();
    let mut cells: Vec<CellSpec> = layout
        .cells
        .iter()
        .map(|c| CellSpec {
            row: c.row,
            col: c.col,
            x_title: c.x.clone(),
            y_title: c.y.clone(),
            traces: Vec::new(),
        })
        .collect();

    for group in &groups {
        let color_hex = palette.color(group.color_ordinal).to_string();
        for (assignment, cell) in layout.cells.iter().zip(cells.iter_mut()) {
            let x_col = data.column(&assignment.x)?;
            let y_col = data.column(&assignment.y)?;

            cell.traces.push(Trace {
                name: format!("{}-{}-{}", group.label, assignment.x, assignment.y),
                group: group.label.clone(),
                mode: TraceMode::Points,
                x: group.rows.iter().map(|&r| x_col.value(r)).collect(),
                y: group.rows.iter().map(|&r| y_col.value(r)).collect(),
                marker: Marker {
                    color: color_hex.clone(),
                    symbol: Some(group.symbol_ordinal),
                    size: sizes
                        .as_ref()
                        .map(|s| group.rows.iter().map(|&r| s[r]).collect()),
                },
                hover_text: hover
                    .as_ref()
                    .map(|h| group.rows.iter().map(|&r| h[r].clone()).collect()),
            });

            if let Some(trend) =
                trend_trace(group, assignment, x_col, y_col, smoothing, &color_hex)?
            {
                cell.traces.push(trend);
            }
        }
    }

    Ok(cells)
}

#[derive(Debug, Clone)]
struct Group {
    label: String,
    color_ordinal: usize,
    symbol_ordinal: usize,
    rows: Vec<usize>,
}

/// Per-row category labels with their distinct levels in first-occurrence order
#[derive(Debug, Clone)]
struct Encoding {
    codes: Vec<usize>,
    levels: Vec<String>,
}

impl Encoding {
    fn from_labels(labels: Vec<String>) -> Self {
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut levels = Vec::new();
        let codes = labels
            .into_iter()
            .map(|label| {
                *lookup.entry(label).or_insert_with_key(|l| {
                    levels.push(l.clone());
                    levels.len() - 1
                })
            })
            .collect();
        Self { codes, levels }
    }
}

/// Continuous columns are bucketed, discrete columns used as-is
fn grouping_key(
    data: &Dataset,
    column: Option<&str>,
    bucket_count: usize,
) -> Result<Option<Encoding>> {
    let Some(name) = column else {
        return Ok(None);
    };
    let col = data.column(name)?;
    let labels = match data.kind(name)? {
        ColumnKind::Continuous => to_discrete(col, bucket_count)?,
        ColumnKind::Discrete => (0..col.len()).map(|r| col.label(r)).collect(),
    };
    Ok(Some(Encoding::from_labels(labels)))
}

fn partition_groups(
    n_rows: usize,
    color: Option<&Encoding>,
    symbol: Option<&Encoding>,
) -> Vec<Group> {
    let mut buckets: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for row in 0..n_rows {
        let c = color.map_or(0, |e| e.codes[row]);
        let s = symbol.map_or(0, |e| e.codes[row]);
        buckets.entry((c, s)).or_default().push(row);
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for ((c, s), rows) in buckets {
        let mut label = color.map(|e| e.levels[c].clone()).unwrap_or_default();
        if let Some(e) = symbol {
            label.push('-');
            label.push_str(&e.levels[s]);
        }
        if rows.len() < MIN_GROUP_ROWS {
            debug!(group = %label, rows = rows.len(), "dropping group with too few rows");
            continue;
        }
        groups.push(Group {
            label,
            color_ordinal: c,
            symbol_ordinal: s,
            rows,
        });
    }
    groups
}

/// Per-row marker sizes scaled into `[0, max_size]`
fn marker_sizes(data: &Dataset, column: Option<&str>, max_size: f64) -> Result<Option<Vec<f64>>> {
    let Some(name) = column else {
        return Ok(None);
    };
    let col = data.column(name)?;
    let scaled = match (data.kind(name)?, col.numeric_values()) {
        (ColumnKind::Continuous, Some(values)) => {
            let max = values
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .fold(f64::NEG_INFINITY, f64::max);
            values.into_iter().map(|v| v / max).collect::<Vec<_>>()
        }
        _ => to_continuous(col),
    };
    Ok(Some(
        scaled
            .into_iter()
            .map(|v| {
                let size = v * max_size;
                if size.is_finite() { size } else { 0.0 }
            })
            .collect(),
    ))
}

/// "column: value" lines per row, separated by a blank line
fn hover_text(data: &Dataset, columns: &[String]) -> Result<Option<Vec<String>>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let cols = columns
        .iter()
        .map(|c| data.column(c))
        .collect::<Result<Vec<&Column>>>()?;

    Ok(Some(
        (0..data.n_rows())
            .map(|row| {
                cols.iter()
                    .map(|c| format!("{}: {}", c.name, c.label(row)))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
            .collect(),
    ))
}

/// Smoothed line over the group's rows ordered by the cell's X variable
fn trend_trace(
    group: &Group,
    assignment: &CellAssignment,
    x_col: &Column,
    y_col: &Column,
    smoothing: &SmoothingConfig,
    color: &str,
) -> Result<Option<Trace>> {
    let mut points: Vec<(Value, f64)> = Vec::with_capacity(group.rows.len());
    for &r in &group.rows {
        let Some(y) = y_col.numeric(r) else {
            warn!(column = %y_col.name, "cannot smooth a discrete y variable");
            return Ok(None);
        };
        points.push((x_col.value(r), y));
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let y: Vec<f64> = points.iter().map(|p| p.1).collect();
    let smoothed = match smoothing.apply(&y) {
        Ok(Some(z)) => z,
        Ok(None) => return Ok(None),
        Err(EngineError::SingularSmoothingSystem { points }) => {
            warn!(group = %group.label, points, "smoothing system singular, keeping points only");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    Ok(Some(Trace {
        name: format!("{}-{}-{}-smooth", group.label, assignment.x, assignment.y),
        group: group.label.clone(),
        mode: TraceMode::Trend,
        x: points.into_iter().map(|p| p.0).collect(),
        y: smoothed
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Float))
            .collect(),
        marker: Marker {
            color: color.to_string(),
            symbol: None,
            size: None,
        },
        hover_text: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::resolve;
    use crate::smooth::SmootherKind;
    use approx::assert_relative_eq;

    fn make_data() -> Dataset {
        let csv = "x,y,geoId,pop,size_cat\n\
                   3,30,US,100,small\n\
                   1,10,US,200,large\n\
                   2,20,US,50,small\n\
                   1,11,BR,400,large\n\
                   2,21,BR,100,small\n\
                   5,50,IN,300,large\n";
        Dataset::from_csv_reader(csv.as_bytes()).unwrap()
    }

    fn single_layout() -> LayoutResult {
        resolve(&["x".to_string()], &["y".to_string()], false).unwrap()
    }

    fn legend(color: Option<&str>) -> LegendSpec {
        LegendSpec {
            color: color.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_synthetic_group() {
        let data = make_data();
        let cells = build_traces(
            &data,
            &LegendSpec::default(),
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].traces.len(), 1);
        let trace = &cells[0].traces[0];
        assert_eq!(trace.name, "-x-y");
        assert_eq!(trace.x.len(), 6);
        assert_eq!(trace.marker.color, "#636EFA");
        assert!(trace.marker.size.is_none());
        assert!(trace.hover_text.is_none());
    }

    #[test]
    fn test_color_groups_drop_singletons() {
        let data = make_data();
        let cells = build_traces(
            &data,
            &legend(Some("geoId")),
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        let names: Vec<&str> = cells[0].traces.iter().map(|t| t.name.as_str()).collect();
        // IN has a single row and is omitted
        assert_eq!(names, vec!["US-x-y", "BR-x-y"]);
        assert_eq!(cells[0].traces[1].marker.color, "#EF553B");
    }

    #[test]
    fn test_points_keep_row_order() {
        let data = make_data();
        let cells = build_traces(
            &data,
            &legend(Some("geoId")),
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        let us = &cells[0].traces[0];
        assert_eq!(us.x, vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_color_and_symbol_cross_product() {
        let data = make_data();
        let spec = LegendSpec {
            color: Some("geoId".to_string()),
            symbol: Some("size_cat".to_string()),
            ..Default::default()
        };
        let cells = build_traces(
            &data,
            &spec,
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        // Only US-small has two rows
        assert_eq!(cells[0].traces.len(), 1);
        assert_eq!(cells[0].traces[0].group, "US-small");
        assert_eq!(cells[0].traces[0].marker.symbol, Some(0));
    }

    #[test]
    fn test_continuous_color_is_bucketed() {
        let data = make_data();
        let cells = build_traces(
            &data,
            &legend(Some("pop")),
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        // 50 is the minimum and 200 sits alone in its bucket; both are dropped
        let groups: Vec<&str> = cells[0].traces.iter().map(|t| t.group.as_str()).collect();
        assert_eq!(groups, vec!["(50.0, 100.0]", "(275.0, 400.0]"]);
    }

    #[test]
    fn test_marker_sizes() {
        let data = make_data();
        let spec = LegendSpec {
            size: Some("pop".to_string()),
            ..Default::default()
        };
        let cells = build_traces(
            &data,
            &spec,
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        let sizes = cells[0].traces[0].marker.size.clone().unwrap();
        assert_relative_eq!(sizes[0], 100.0 * 35.0 / 400.0);
        assert_relative_eq!(sizes[3], 35.0);

        let spec = LegendSpec {
            size: Some("size_cat".to_string()),
            ..Default::default()
        };
        let cells = build_traces(
            &data,
            &spec,
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        let sizes = cells[0].traces[0].marker.size.clone().unwrap();
        assert_eq!(sizes, vec![0.0, 35.0, 0.0, 35.0, 0.0, 35.0]);
    }

    #[test]
    fn test_hover_text() {
        let data = make_data();
        let spec = LegendSpec {
            hover: vec!["geoId".to_string(), "pop".to_string()],
            ..Default::default()
        };
        let cells = build_traces(
            &data,
            &spec,
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        let hover = cells[0].traces[0].hover_text.clone().unwrap();
        assert_eq!(hover[0], "geoId: US\n\npop: 100");
    }

    #[test]
    fn test_trend_trace_sorted_by_x() {
        let data = make_data();
        let smoothing = SmoothingConfig::new(SmootherKind::MovingAverage, Some(2.0));
        let cells = build_traces(
            &data,
            &legend(Some("geoId")),
            &single_layout(),
            &smoothing,
            &EngineOptions::default(),
        )
        .unwrap();
        let names: Vec<&str> = cells[0].traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["US-x-y", "US-x-y-smooth", "BR-x-y", "BR-x-y-smooth"]);

        let trend = &cells[0].traces[1];
        assert_eq!(trend.mode, TraceMode::Trend);
        assert_eq!(trend.x, vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        assert_eq!(trend.y, vec![Value::Null, Value::Float(15.0), Value::Float(25.0)]);
        assert_eq!(trend.marker.color, cells[0].traces[0].marker.color);
    }

    #[test]
    fn test_singular_smoothing_degrades_per_group() {
        let data = make_data();
        let smoothing = SmoothingConfig::new(SmootherKind::Whittaker, Some(1.0));
        let cells = build_traces(
            &data,
            &legend(Some("geoId")),
            &single_layout(),
            &smoothing,
            &EngineOptions::default(),
        )
        .unwrap();
        // US has 3 rows and gets a trend; BR has 2 and keeps only its points
        let names: Vec<&str> = cells[0].traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["US-x-y", "US-x-y-smooth", "BR-x-y"]);
    }

    #[test]
    fn test_traces_land_in_every_cell() {
        let data = make_data();
        let layout = resolve(
            &["x".to_string(), "pop".to_string()],
            &["y".to_string()],
            false,
        )
        .unwrap();
        let cells = build_traces(
            &data,
            &legend(Some("geoId")),
            &layout,
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        )
        .unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].x_title, "pop");
        assert_eq!(cells[1].traces[0].name, "US-pop-y");
    }

    #[test]
    fn test_unknown_legend_column() {
        let data = make_data();
        let result = build_traces(
            &data,
            &legend(Some("nope")),
            &single_layout(),
            &SmoothingConfig::default(),
            &EngineOptions::default(),
        );
        assert!(matches!(result, Err(EngineError::UnknownColumn(_))));
    }
}
