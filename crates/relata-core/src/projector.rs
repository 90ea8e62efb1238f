//! # Projector Module
//!
//! Column-oriented projection of records for tabular display.
//!
//! Column specifiers:
//! - `resourceTitle` - a direct index field
//! - `cl_status.key` - a dotted path into nested fields
//! - `link/OGC` - the record's online resources whose protocol mentions `OGC`
//!
//! Rows are sorted by the first column with `collate::locale_compare`. That
//! column must hold a string in every row.

use crate::collate::locale_compare;
use crate::{Link, RelataError, Record};
use serde_json::Value;

const LINK_PREFIX: &str = "link/";

/// A parsed column specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Field(String),
    Path(String),
    LinksByType(String),
}

impl Column {
    /// Parse one specifier.
    #[must_use]
    pub fn parse(column: &str) -> Self {
        let column = column.trim();
        if let Some(link_type) = column.strip_prefix(LINK_PREFIX) {
            Self::LinksByType(link_type.to_string())
        } else if column.contains('.') {
            Self::Path(column.to_string())
        } else {
            Self::Field(column.to_string())
        }
    }

    /// Default header: the link type for link columns, the column text otherwise.
    #[must_use]
    pub fn header(&self) -> &str {
        match self {
            Self::Field(name) | Self::Path(name) | Self::LinksByType(name) => name,
        }
    }

    fn cell(&self, record: &Record) -> Cell {
        match self {
            Self::Field(name) | Self::Path(name) => {
                record.value(name).map(Cell::Value).unwrap_or(Cell::Missing)
            }
            Self::LinksByType(link_type) => Cell::Links(record.links_by_type(link_type)),
        }
    }
}

/// Parse a comma-separated column list.
#[must_use]
pub fn parse_columns(columns: &str) -> Vec<Column> {
    columns
        .split(',')
        .filter(|c| !c.trim().is_empty())
        .map(Column::parse)
        .collect()
}

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    Links(Vec<Link>),
    Missing,
}

impl Cell {
    /// The cell as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// A projected row with a back-reference to its record.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    pub cells: Vec<Cell>,
    pub record: &'a Record,
}

/// Project `records` onto `columns` and sort by the first column.
pub fn project<'a>(records: &'a [Record], columns: &[Column]) -> Result<Vec<Row<'a>>, RelataError> {
    let mut rows: Vec<Row<'a>> = records
        .iter()
        .map(|record| Row {
            cells: columns.iter().map(|c| c.cell(record)).collect(),
            record,
        })
        .collect();

    let Some(sort_column) = columns.first() else {
        return Ok(rows);
    };

    if let Some(row) = rows
        .iter()
        .position(|r| r.cells.first().and_then(Cell::as_str).is_none())
    {
        return Err(RelataError::ProjectionSort {
            column: sort_column.header().to_string(),
            row,
        });
    }

    rows.sort_by(|a, b| {
        let left = a.cells.first().and_then(Cell::as_str).unwrap_or_default();
        let right = b.cells.first().and_then(Cell::as_str).unwrap_or_default();
        locale_compare(left, right)
    });
    Ok(rows)
}

/// Table headers: explicit labels, or derived from the columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeaders(pub Vec<String>);

impl TableHeaders {
    /// Use comma-separated `labels` when given, column headers otherwise.
    #[must_use]
    pub fn from_columns(columns: &[Column], labels: Option<&str>) -> Self {
        match labels.filter(|l| !l.trim().is_empty()) {
            Some(labels) => Self(labels.split(',').map(|l| l.trim().to_string()).collect()),
            None => Self(columns.iter().map(|c| c.header().to_string()).collect()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
