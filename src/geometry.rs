//! Geometry-mode conversion: WKT strings and lon/lat pairs to `geo-types`.

use geo_types::{Geometry, Point};
use tracing::warn;
use wkt::{ToWkt, TryFromWkt};

use crate::error::{Result, TdxError};
use crate::table::{Cell, GeoTable, Table};

/// Repairs line WKT before parsing.
///
/// Any `MULTILINESTRING` member with fewer than two coordinates is dropped;
/// a `LINESTRING` with fewer than two coordinates, or a multi-line whose
/// members are all degenerate, yields `None`. Other text passes through
/// trimmed and is left for the parser to judge.
pub fn sanitize_wkt(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.to_ascii_uppercase();

    if let Some(rest) = upper.strip_prefix("MULTILINESTRING") {
        let body = trimmed[trimmed.len() - rest.len()..].trim();
        let Some(inner) = body.strip_prefix('(').and_then(|b| b.strip_suffix(')')) else {
            return Some(trimmed.to_string());
        };
        let members: Vec<&str> = components(inner)
            .into_iter()
            .filter(|c| coordinate_count(c) >= 2)
            .collect();
        if members.is_empty() {
            return None;
        }
        return Some(format!("MULTILINESTRING ({})", members.join(", ")));
    }

    if let Some(rest) = upper.strip_prefix("LINESTRING") {
        let body = trimmed[trimmed.len() - rest.len()..].trim();
        if body.starts_with('(') && coordinate_count(body) < 2 {
            return None;
        }
    }

    Some(trimmed.to_string())
}

/// Splits `(a b, c d), (e f)` into its top-level parenthesized members.
fn components(inner: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in inner.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    out.push(&inner[start..=i]);
                }
            }
            _ => {}
        }
    }
    out
}

fn coordinate_count(member: &str) -> usize {
    member
        .trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
        .split(',')
        .filter(|pair| !pair.trim().is_empty())
        .count()
}

/// Sanitizes and parses a WKT string. Degenerate input becomes `None`.
pub fn parse_wkt(raw: &str) -> Result<Option<Geometry<f64>>> {
    let Some(clean) = sanitize_wkt(raw) else {
        return Ok(None);
    };
    Geometry::<f64>::try_from_wkt_str(&clean)
        .map(Some)
        .map_err(|e| TdxError::Geometry {
            wkt: raw.chars().take(80).collect(),
            message: e.to_string(),
        })
}

pub fn to_wkt(geometry: &Geometry<f64>) -> String {
    geometry.wkt_string()
}

/// Point from longitude/latitude cells; `None` if either is missing.
pub fn point(lon: &Cell, lat: &Cell) -> Option<Geometry<f64>> {
    Some(Geometry::Point(Point::new(lon.as_f64()?, lat.as_f64()?)))
}

/// Moves a WKT text column into the geometry vector. A row whose WKT does
/// not parse keeps its attributes and gets no geometry.
pub fn from_wkt_column(mut table: Table, column: &str) -> GeoTable {
    let cells = table.take_column(column).unwrap_or_default();
    let geometry = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let raw = cell.as_str()?;
            parse_wkt(raw).unwrap_or_else(|e| {
                warn!(row, error = %e, "Unparseable geometry, row kept without it");
                None
            })
        })
        .collect();
    let geometry = pad(geometry, table.len());
    GeoTable::new(table, geometry)
}

/// Moves a longitude/latitude column pair into point geometries.
pub fn from_point_columns(mut table: Table, lon: &str, lat: &str) -> GeoTable {
    let lons = table.take_column(lon).unwrap_or_default();
    let lats = table.take_column(lat).unwrap_or_default();
    let geometry = lons.iter().zip(&lats).map(|(x, y)| point(x, y)).collect();
    let geometry = pad(geometry, table.len());
    GeoTable::new(table, geometry)
}

// A missing source column means no row has a geometry.
fn pad(mut geometry: Vec<Option<Geometry<f64>>>, rows: usize) -> Vec<Option<Geometry<f64>>> {
    geometry.resize(rows, None);
    geometry
}
