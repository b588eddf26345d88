//! Building blocks for denormalizing nested JSON into rows.
//!
//! A [`Branch`] is a row under construction: the ancestor cells gathered so
//! far plus the JSON node the next level expands from. [`roots`] starts one
//! branch per record and [`fan_out`] replaces every branch with one branch
//! per element of a nested array, copying the ancestor cells into each.
//! After `k` fan-outs there is one branch per level-`k` leaf.

use serde_json::Value;

use crate::table::{Cell, Table};

/// Locale extracted from every localized name object.
pub const LOCALE: &str = "Zh_tw";

#[derive(Debug, Clone)]
pub struct Branch<'a> {
    pub cells: Vec<Cell>,
    pub node: &'a Value,
}

pub fn roots<'a, F>(items: &'a [Value], columns: F) -> Vec<Branch<'a>>
where
    F: Fn(&'a Value) -> Vec<Cell>,
{
    items
        .iter()
        .map(|node| Branch {
            cells: columns(node),
            node,
        })
        .collect()
}

/// Expands each branch over the array at `field`. Branches whose field is
/// missing or empty produce no rows.
pub fn fan_out<'a, F>(branches: Vec<Branch<'a>>, field: &str, columns: F) -> Vec<Branch<'a>>
where
    F: Fn(&'a Value) -> Vec<Cell>,
{
    let mut out = Vec::new();
    for branch in branches {
        for child in list(branch.node, field) {
            let mut cells = branch.cells.clone();
            cells.extend(columns(child));
            out.push(Branch { cells, node: child });
        }
    }
    out
}

/// Collects finished branches into a table with the given columns.
pub fn into_table<S: AsRef<str>>(columns: &[S], branches: Vec<Branch<'_>>) -> Table {
    let mut table = Table::new(columns);
    for branch in branches {
        table.push_row(branch.cells);
    }
    table
}

/// Array at `field`, or an empty slice when absent or not an array.
pub fn list<'a>(node: &'a Value, field: &str) -> &'a [Value] {
    node.get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Scalar at `field`; null when absent.
pub fn field(node: &Value, field: &str) -> Cell {
    node.get(field).map(Cell::from_json).unwrap_or(Cell::Null)
}

/// Scalar at a nested path such as `["StationPosition", "PositionLon"]`.
pub fn path(node: &Value, keys: &[&str]) -> Cell {
    let mut current = node;
    for key in keys {
        match current.get(key) {
            Some(next) => current = next,
            None => return Cell::Null,
        }
    }
    Cell::from_json(current)
}

/// Localized name at `field`.
///
/// A missing field, an empty locale map, a missing [`LOCALE`] key and an
/// empty string are all null. Plain strings pass through, since some
/// endpoints publish names unlocalized.
pub fn localized(node: &Value, field: &str) -> Cell {
    match node.get(field) {
        Some(Value::Object(map)) => match map.get(LOCALE) {
            Some(Value::String(s)) if !s.is_empty() => Cell::Text(s.clone()),
            _ => Cell::Null,
        },
        Some(Value::String(s)) if !s.is_empty() => Cell::Text(s.clone()),
        _ => Cell::Null,
    }
}

/// Array of scalars at `field`, comma-joined; null when absent or empty.
pub fn joined(node: &Value, field: &str) -> Cell {
    let parts: Vec<String> = list(node, field)
        .iter()
        .map(|v| Cell::from_json(v).to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        Cell::Null
    } else {
        Cell::Text(parts.join(","))
    }
}
