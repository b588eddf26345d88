//! Row-oriented tables produced by the flatteners.
//!
//! A [`Table`] has a fixed column list and rows of [`Cell`]s, one cell per
//! column. A [`GeoTable`] pairs a table with one optional geometry per row
//! and the spatial reference they are expressed in. [`Frame`] is whichever
//! of the two an operation returned.

use std::fmt;

use geo_types::Geometry;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// Converts a scalar JSON value. Objects and arrays are kept as their
    /// compact JSON text.
    pub fn from_json(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Cell::Int)
                .or_else(|| n.as_f64().map(Cell::Float))
                .unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; numeric text counts too since some endpoints quote
    /// coordinates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Bool(b) => Value::Bool(*b),
        }
    }
}

/// Null renders as the empty string, which is also how it lands in CSV.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row.
    ///
    /// # Panics
    ///
    /// Panics if the row width differs from the column count; every
    /// flattener builds rows against its own column list, so a mismatch is a
    /// bug in that flattener.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row width does not match columns {:?}",
            self.columns
        );
        self.rows.push(row);
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Cell>> {
        let idx = self.column(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Removes a column and returns its cells.
    pub fn take_column(&mut self, column: &str) -> Option<Vec<Cell>> {
        let idx = self.column(column)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|r| r.remove(idx)).collect())
    }

    /// Appends all rows of `other`, which must have the same columns.
    ///
    /// # Panics
    ///
    /// Panics if the column lists differ.
    pub fn extend(&mut self, other: Table) {
        assert_eq!(self.columns, other.columns, "cannot concatenate tables with different columns");
        self.rows.extend(other.rows);
    }

    /// Drops every column whose cells are all null and returns the dropped
    /// names. A table without rows keeps its columns.
    pub fn drop_empty_columns(&mut self) -> Vec<String> {
        if self.rows.is_empty() {
            return Vec::new();
        }
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|idx| self.rows.iter().any(|r| !r[idx].is_null()))
            .collect();

        let dropped = self
            .columns
            .iter()
            .zip(&keep)
            .filter(|(_, k)| !**k)
            .map(|(c, _)| c.clone())
            .collect();

        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
        dropped
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(item, _)| item)
        .collect()
}

const WGS84_ESRI_WKT: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crs {
    pub epsg: u32,
}

impl Crs {
    /// WGS84 longitude/latitude, the only reference the platform publishes.
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// ESRI WKT for the `.prj` sidecar of a shapefile, when known.
    pub fn esri_wkt(&self) -> Option<&'static str> {
        match self.epsg {
            4326 => Some(WGS84_ESRI_WKT),
            _ => None,
        }
    }

    /// OGC URN form used in GeoJSON `crs` members.
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }
}

/// A table whose rows each carry an optional geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable {
    pub table: Table,
    pub geometry: Vec<Option<Geometry<f64>>>,
    pub crs: Crs,
}

impl GeoTable {
    /// # Panics
    ///
    /// Panics if the geometry count differs from the row count.
    pub fn new(table: Table, geometry: Vec<Option<Geometry<f64>>>) -> Self {
        assert_eq!(table.len(), geometry.len(), "one geometry per row");
        Self {
            table,
            geometry,
            crs: Crs::WGS84,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Table(Table),
    Geo(GeoTable),
}

impl Frame {
    /// Attribute table, without geometries.
    pub fn table(&self) -> &Table {
        match self {
            Frame::Table(t) => t,
            Frame::Geo(g) => &g.table,
        }
    }

    pub fn as_geo(&self) -> Option<&GeoTable> {
        match self {
            Frame::Geo(g) => Some(g),
            Frame::Table(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}
