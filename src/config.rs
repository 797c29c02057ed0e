use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;

use crate::data::loader::LoadOptions;
use crate::error::{PlotError, Result};

// ---------------------------------------------------------------------------
// Column references
// ---------------------------------------------------------------------------

/// A user-supplied token naming a column, either by zero-based position or
/// by its literal header name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    pub fn parse(s: &str) -> ColumnRef {
        match s.parse::<usize>() {
            Ok(i) => ColumnRef::Index(i),
            Err(_) => ColumnRef::Name(s.to_string()),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ColumnRef::parse(s))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "{i}"),
            ColumnRef::Name(n) => write!(f, "{n}"),
        }
    }
}

/// Split a comma-separated answer like `"0, price"` into references.
/// Blank entries are dropped; an all-blank answer yields `None`.
pub fn parse_column_list(s: &str) -> Option<Vec<ColumnRef>> {
    let refs: Vec<ColumnRef> = s
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ColumnRef::parse)
        .collect();
    if refs.is_empty() {
        None
    } else {
        Some(refs)
    }
}

// ---------------------------------------------------------------------------
// Chart kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    #[value(name = "barh")]
    HorizontalBar,
    #[value(name = "hist")]
    Histogram,
    #[value(name = "box")]
    BoxPlot,
    Area,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(v) => write!(f, "{}", v.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Delimiter
// ---------------------------------------------------------------------------

/// Turn the textual delimiter into the single byte the csv reader wants.
/// `\t` and `tab` are accepted for a tab character.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    if matches!(s, "\\t" | "tab") {
        return Ok(b'\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(PlotError::InvalidDelimiter(s.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything one run needs, built once from the flags or the prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub path: PathBuf,
    pub delimiter: u8,
    pub has_headers: bool,
    pub index_column: Option<ColumnRef>,
    /// `None` plots every column.
    pub columns: Option<Vec<ColumnRef>>,
    pub kind: ChartKind,
    pub output: Option<PathBuf>,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Open the chart window after exporting.
    pub show: bool,
}

impl Configuration {
    /// A configuration with every option at its default.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            has_headers: true,
            index_column: None,
            columns: None,
            kind: ChartKind::default(),
            output: None,
            title: None,
            x_label: None,
            y_label: None,
            show: true,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.delimiter,
            has_headers: self.has_headers,
            index_column: self.index_column.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_become_positions_and_everything_else_names() {
        assert_eq!(ColumnRef::parse("2"), ColumnRef::Index(2));
        assert_eq!(ColumnRef::parse("price"), ColumnRef::Name("price".into()));
        assert_eq!(ColumnRef::parse("-1"), ColumnRef::Name("-1".into()));
        assert_eq!(ColumnRef::parse("1.5"), ColumnRef::Name("1.5".into()));
    }

    #[test]
    fn column_lists_are_trimmed_and_blank_means_all() {
        assert_eq!(
            parse_column_list(" 0, c ,,"),
            Some(vec![ColumnRef::Index(0), ColumnRef::Name("c".into())])
        );
        assert_eq!(parse_column_list("  "), None);
        assert_eq!(parse_column_list(""), None);
    }

    #[test]
    fn delimiters() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(matches!(
            parse_delimiter(";;"),
            Err(PlotError::InvalidDelimiter(_))
        ));
        assert!(matches!(
            parse_delimiter(""),
            Err(PlotError::InvalidDelimiter(_))
        ));
        assert!(matches!(
            parse_delimiter("é"),
            Err(PlotError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn chart_kind_names() {
        assert_eq!(ChartKind::HorizontalBar.to_string(), "barh");
        assert_eq!(ChartKind::Histogram.to_string(), "hist");
        assert_eq!(ChartKind::BoxPlot.to_string(), "box");
        assert_eq!(
            <ChartKind as ValueEnum>::from_str("area", true).unwrap(),
            ChartKind::Area
        );
        assert!(<ChartKind as ValueEnum>::from_str("pie", true).is_err());
    }
}
