use crate::error::{EngineError, Result};
use crate::parser::{format_timestamp, parse_timestamp};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use tracing::debug;

/// Declared element type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Integer,
    Float,
    Timestamp,
    Categorical,
}

/// How a column participates in legending, sizing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Continuous,
    Discrete,
}

impl ElementType {
    pub fn kind(self) -> ColumnKind {
        match self {
            ElementType::Integer | ElementType::Float | ElementType::Timestamp => {
                ColumnKind::Continuous
            }
            ElementType::Categorical => ColumnKind::Discrete,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    /// Seconds since the Unix epoch
    Timestamp(Vec<i64>),
    Categorical(Vec<String>),
}

/// A single cell value, as carried into plot traces
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Timestamp(i64),
    Text(String),
    /// Absent result (e.g. a moving average whose window is not yet full)
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) | Value::Timestamp(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) | Value::Null => None,
        }
    }

    /// Total order used when sorting a group by its X variable.
    /// Numbers compare numerically, text lexically; nulls sort last.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) if v.is_nan() => write!(f, "nan"),
            Value::Float(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", format_timestamp(*v)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Integer(v) => serializer.serialize_i64(*v),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float(_) | Value::Null => serializer.serialize_none(),
            Value::Timestamp(v) => serializer.serialize_str(&format_timestamp(*v)),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Integer(v) | ColumnData::Timestamp(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match &self.data {
            ColumnData::Integer(_) => ElementType::Integer,
            ColumnData::Float(_) => ElementType::Float,
            ColumnData::Timestamp(_) => ElementType::Timestamp,
            ColumnData::Categorical(_) => ElementType::Categorical,
        }
    }

    pub fn value(&self, row: usize) -> Value {
        match &self.data {
            ColumnData::Integer(v) => Value::Integer(v[row]),
            ColumnData::Float(v) => Value::Float(v[row]),
            ColumnData::Timestamp(v) => Value::Timestamp(v[row]),
            ColumnData::Categorical(v) => Value::Text(v[row].clone()),
        }
    }

    /// Numeric view of a cell; `None` for categorical columns
    pub fn numeric(&self, row: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Integer(v) | ColumnData::Timestamp(v) => Some(v[row] as f64),
            ColumnData::Float(v) => Some(v[row]),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Whole column as floats; `None` for categorical columns
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match &self.data {
            ColumnData::Integer(v) | ColumnData::Timestamp(v) => {
                Some(v.iter().map(|&x| x as f64).collect())
            }
            ColumnData::Float(v) => Some(v.clone()),
            ColumnData::Categorical(_) => None,
        }
    }

    /// String form of a cell, used for grouping keys and hover text
    pub fn label(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Categorical(v) => v[row].clone(),
            _ => self.value(row).to_string(),
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        let data = match &self.data {
            ColumnData::Integer(v) => ColumnData::Integer(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Float(v) => ColumnData::Float(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Timestamp(v) => {
                ColumnData::Timestamp(rows.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        };
        Column::new(self.name.clone(), data)
    }

    /// Infer the declared type of a raw text column
    pub fn infer(name: impl Into<String>, cells: Vec<String>) -> Column {
        let name = name.into();
        if cells.is_empty() || cells.iter().all(|c| c.trim().is_empty()) {
            return Column::new(name, ColumnData::Categorical(cells));
        }

        let ints: Option<Vec<i64>> = cells.iter().map(|c| c.trim().parse::<i64>().ok()).collect();
        if let Some(ints) = ints {
            return Column::new(name, ColumnData::Integer(ints));
        }

        let floats: Option<Vec<f64>> = cells
            .iter()
            .map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    Some(f64::NAN)
                } else {
                    c.parse::<f64>().ok()
                }
            })
            .collect();
        if let Some(floats) = floats {
            return Column::new(name, ColumnData::Float(floats));
        }

        let stamps: Option<Vec<i64>> = cells.iter().map(|c| parse_timestamp(c)).collect();
        if let Some(stamps) = stamps {
            return Column::new(name, ColumnData::Timestamp(stamps));
        }

        Column::new(name, ColumnData::Categorical(cells))
    }
}

/// Immutable, column-oriented table
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    kinds: Vec<ColumnKind>,
    index: HashMap<String, usize>,
    n_rows: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if col.len() != n_rows {
                return Err(EngineError::Data(format!(
                    "Column '{}' has {} rows, expected {}",
                    col.name,
                    col.len(),
                    n_rows
                )));
            }
            if index.insert(col.name.clone(), i).is_some() {
                return Err(EngineError::Data(format!("Duplicate column '{}'", col.name)));
            }
        }
        let kinds = columns.iter().map(|c| c.element_type().kind()).collect();

        Ok(Self {
            columns,
            kinds,
            index,
            n_rows,
        })
    }

    /// Read a headered CSV document and infer column types
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| EngineError::Data(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() {
            return Err(EngineError::Data("CSV has no header row".to_string()));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (line, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| EngineError::Data(format!("Failed to read CSV row {}: {}", line + 1, e)))?;
            for (col, cell) in cells.iter_mut().enumerate() {
                col_push(cell, record.get(col));
            }
        }

        let columns: Vec<Column> = headers
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::infer(name, cells))
            .collect();
        for col in &columns {
            debug!(column = %col.name, element_type = ?col.element_type(), "inferred column type");
        }

        Dataset::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.index
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| EngineError::UnknownColumn(name.to_string()))
    }

    pub fn kind(&self, name: &str) -> Result<ColumnKind> {
        self.index
            .get(name)
            .map(|&i| self.kinds[i])
            .ok_or_else(|| EngineError::UnknownColumn(name.to_string()))
    }

    /// New snapshot holding only the rows whose mask entry is true
    pub fn take(&self, mask: &[bool]) -> Dataset {
        let rows: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();

        Dataset {
            columns: self.columns.iter().map(|c| c.take(&rows)).collect(),
            kinds: self.kinds.clone(),
            index: self.index.clone(),
            n_rows: rows.len(),
        }
    }

    /// New snapshot with `alias` carrying a copy of column `name`.
    /// An existing column called `alias` is replaced.
    pub fn with_alias(&self, name: &str, alias: &str) -> Result<Dataset> {
        let source = self.column(name)?;
        let derived = Column::new(alias, source.data.clone());

        let mut columns = self.columns.clone();
        match self.index.get(alias) {
            Some(&i) => columns[i] = derived,
            None => columns.push(derived),
        }
        Dataset::new(columns)
    }
}

// Short rows are padded with empty cells
fn col_push(cells: &mut Vec<String>, cell: Option<&str>) {
    cells.push(cell.unwrap_or("").to_string());
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasRecord {
    pub name: String,
    pub alias: String,
    pub sequence: usize,
}

/// Ordered history of applied aliases
#[derive(Debug, Clone, Default)]
pub struct AliasLog {
    records: Vec<AliasRecord>,
}

impl AliasLog {
    pub fn push(&mut self, name: &str, alias: &str) {
        let sequence = self.records.len() + 1;
        self.records.push(AliasRecord {
            name: name.to_string(),
            alias: alias.to_string(),
            sequence,
        });
    }

    pub fn records(&self) -> &[AliasRecord] {
        &self.records
    }

    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("{}\t{}\t{}", r.name, r.alias, r.sequence))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
