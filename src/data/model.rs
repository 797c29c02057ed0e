use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the common DataFrame dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Cell contents read as missing data.
const NA_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

impl Value {
    /// Guess the type of a raw text cell.
    pub fn guess(s: &str) -> Value {
        let t = s.trim();
        if t.is_empty() || NA_MARKERS.contains(&t) {
            return Value::Null;
        }
        if let Ok(i) = t.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = t.parse::<f64>() {
            return Value::Float(f);
        }
        match t {
            "true" | "True" | "TRUE" => Value::Bool(true),
            "false" | "False" | "FALSE" => Value::Bool(false),
            _ => Value::String(s.to_string()),
        }
    }

    /// Numeric view of the value; `None` for anything that is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NaN"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// The column as floats (nulls become NaN), or `None` when any
    /// non-null cell is not a number.
    pub fn numeric(&self) -> Option<Vec<f64>> {
        self.values
            .iter()
            .map(|v| match v {
                Value::Null => Some(f64::NAN),
                other => other.as_f64(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Rows × named columns, with optional row labels.
///
/// Every column, and the index when present, holds the same number of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Row labels; `None` means rows are labelled by position.
    pub index: Option<Column>,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(index: Option<Column>, columns: Vec<Column>) -> Self {
        let table = Table { index, columns };
        debug_assert!(
            table.is_rectangular(),
            "table columns have different row counts"
        );
        table
    }

    fn is_rectangular(&self) -> bool {
        let n = self.n_rows();
        self.columns.iter().all(|c| c.values.len() == n)
            && self.index.as_ref().map_or(true, |c| c.values.len() == n)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns
            .first()
            .or(self.index.as_ref())
            .map_or(0, |c| c.values.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
