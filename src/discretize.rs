// Conversions between continuous and discrete column representations

use crate::data::{Column, ElementType};
use crate::error::{EngineError, Result};
use crate::parser::format_timestamp;
use std::collections::HashMap;

/// Label for rows that fall outside every interval (NaN values and the
/// column minimum, which no left-open interval contains)
pub const OUTSIDE_LABEL: &str = "nan";

/// Bucket a continuous column into quantile intervals.
///
/// `bucket_count` quantiles are taken at evenly spaced probabilities over
/// `[0, 1]`; duplicate cut points collapse, so fewer intervals may result.
/// Intervals are left-open `(lo, hi]`, so the lowest cut point itself falls
/// outside every interval.
pub fn to_discrete(column: &Column, bucket_count: usize) -> Result<Vec<String>> {
    let values = column.numeric_values().ok_or_else(|| {
        EngineError::Data(format!("Column '{}' is not continuous", column.name))
    })?;

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut cuts: Vec<f64> = linspace(bucket_count)
        .into_iter()
        .map(|p| percentile(&sorted, p))
        .collect();
    cuts.dedup();

    let is_time = column.element_type() == ElementType::Timestamp;
    let labels: Vec<String> = cuts
        .windows(2)
        .map(|w| interval_label(w[0], w[1], is_time))
        .collect();

    Ok(values
        .iter()
        .map(|&v| match interval_index(&cuts, v) {
            Some(i) => labels[i].clone(),
            None => OUTSIDE_LABEL.to_string(),
        })
        .collect())
}

/// Map each distinct value (first-occurrence order) onto an evenly spaced
/// scale over `[0, 1]`. A single distinct value maps to 0.
pub fn to_continuous(column: &Column) -> Vec<f64> {
    let mut order: HashMap<String, usize> = HashMap::new();
    let codes: Vec<usize> = (0..column.len())
        .map(|row| {
            let next = order.len();
            *order.entry(column.label(row)).or_insert(next)
        })
        .collect();

    let scale = linspace(order.len());
    codes.into_iter().map(|c| scale[c]).collect()
}

/// `n` evenly spaced points over `[0, 1]`
fn linspace(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

/// Linear-interpolated percentile over sorted data
fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return f64::NAN; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

fn interval_index(cuts: &[f64], v: f64) -> Option<usize> {
    if cuts.len() < 2 || v.is_nan() {
        return None;
    }
    // First cut point >= v
    let idx = cuts.partition_point(|&c| c < v);
    match idx {
        0 => None,
        i if i == cuts.len() => None,
        i => Some(i - 1),
    }
}

fn interval_label(lo: f64, hi: f64, is_time: bool) -> String {
    if is_time {
        format!(
            "({}, {}]",
            format_timestamp(lo.round() as i64),
            format_timestamp(hi.round() as i64)
        )
    } else {
        format!("({:?}, {:?}]", lo, hi)
    }
}
