// Row filter engine: per-column predicates combined into a single mask

use crate::data::{Column, ColumnKind, Dataset, ElementType};
use crate::error::{EngineError, Result};
use crate::parser::{parse_timestamp, parse_value_set};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A filter row as supplied by the caller, before its column kind is known
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    #[serde(deserialize_with = "bound")]
    pub lower: String,
    #[serde(default, deserialize_with = "optional_bound")]
    pub upper: Option<String>,
}

/// Bounds arrive as text from the CLI but may be plain numbers in a request file
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBound {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<RawBound> for String {
    fn from(raw: RawBound) -> Self {
        match raw {
            RawBound::Text(s) => s,
            RawBound::Integer(v) => v.to_string(),
            RawBound::Float(v) => v.to_string(),
        }
    }
}

fn bound<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    RawBound::deserialize(deserializer).map(String::from)
}

fn optional_bound<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Option::<RawBound>::deserialize(deserializer).map(|b| b.map(String::from))
}

/// A filter predicate, tagged once from the column kind
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    /// Continuous field: `lower < value < upper`
    Range { field: String, lower: f64, upper: f64 },
    /// Discrete field: value is a member of the set
    Set { field: String, values: HashSet<String> },
}

impl FilterPredicate {
    pub fn from_spec(spec: &FilterSpec, data: &Dataset) -> Result<Self> {
        let column = data.column(&spec.field)?;
        match data.kind(&spec.field)? {
            ColumnKind::Continuous => {
                let lower = parse_bound(column, &spec.field, &spec.lower)?;
                let upper_raw = spec.upper.as_deref().ok_or_else(|| EngineError::InvalidBound {
                    field: spec.field.clone(),
                    bound: "missing upper bound".to_string(),
                })?;
                let upper = parse_bound(column, &spec.field, upper_raw)?;
                if lower > upper {
                    return Err(EngineError::InvalidBound {
                        field: spec.field.clone(),
                        bound: format!("lower {} exceeds upper {}", spec.lower, upper_raw),
                    });
                }
                Ok(FilterPredicate::Range {
                    field: spec.field.clone(),
                    lower,
                    upper,
                })
            }
            ColumnKind::Discrete => Ok(FilterPredicate::Set {
                field: spec.field.clone(),
                values: parse_value_set(&spec.lower).into_iter().collect(),
            }),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            FilterPredicate::Range { field, .. } | FilterPredicate::Set { field, .. } => field,
        }
    }

    /// Whether `row` of `column` passes this predicate
    pub fn matches(&self, column: &Column, row: usize) -> bool {
        match self {
            // NaN fails both comparisons
            FilterPredicate::Range { lower, upper, .. } => column
                .numeric(row)
                .map_or(false, |v| *lower < v && v < *upper),
            FilterPredicate::Set { values, .. } => values.contains(&column.label(row)),
        }
    }
}

// Timestamp columns also accept date literals as bounds
fn parse_bound(column: &Column, field: &str, raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<f64>() {
        if !v.is_nan() {
            return Ok(v);
        }
    }
    if column.element_type() == ElementType::Timestamp {
        if let Some(secs) = parse_timestamp(raw) {
            return Ok(secs as f64);
        }
    }
    Err(EngineError::InvalidBound {
        field: field.to_string(),
        bound: raw.to_string(),
    })
}

/// One line of the filter audit trail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub index: usize,
    pub field: String,
    pub lower: String,
    pub upper: Option<String>,
}

impl AuditRecord {
    pub fn render(&self) -> String {
        format!(
            "{} {} {} {}",
            self.index,
            self.field,
            self.lower,
            self.upper.as_deref().unwrap_or("-")
        )
    }
}

/// Result of evaluating a predicate set
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub mask: Vec<bool>,
    pub records: Vec<AuditRecord>,
}

impl FilterOutcome {
    pub fn kept(&self) -> usize {
        self.mask.iter().filter(|&&b| b).count()
    }
}

/// Evaluate all predicates conjunctively.
///
/// Every predicate is validated before any row is scanned, so a bad bound
/// aborts without partial work. No predicates yields an all-true mask.
pub fn apply_filters(data: &Dataset, specs: &[FilterSpec]) -> Result<FilterOutcome> {
    let predicates = specs
        .iter()
        .map(|s| FilterPredicate::from_spec(s, data))
        .collect::<Result<Vec<_>>>()?;

    let mut mask = vec![true; data.n_rows()];
    for predicate in &predicates {
        let column = data.column(predicate.field())?;
        for (row, keep) in mask.iter_mut().enumerate() {
            if *keep && !predicate.matches(column, row) {
                *keep = false;
            }
        }
    }

    let records = specs
        .iter()
        .enumerate()
        .map(|(index, s)| AuditRecord {
            index,
            field: s.field.clone(),
            lower: s.lower.clone(),
            upper: s.upper.clone(),
        })
        .collect();

    let outcome = FilterOutcome { mask, records };
    debug!(
        predicates = predicates.len(),
        kept = outcome.kept(),
        total = data.n_rows(),
        "applied row filters"
    );
    Ok(outcome)
}

/// Append-only history of every predicate evaluated, across recomputes
#[derive(Debug, Clone, Default)]
pub struct FilterLog {
    records: Vec<AuditRecord>,
}

impl FilterLog {
    pub fn extend(&mut self, records: &[AuditRecord]) {
        self.records.extend_from_slice(records);
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("{}\n", r.render()))
            .collect()
    }
}
