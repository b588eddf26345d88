use serde_json::Value;

use super::GEOMETRY;
use crate::flatten::{field, into_table, localized, roots};
use crate::table::Table;

pub const COLUMNS: [&str; 4] = ["LineNo", "LineID", "LineName", GEOMETRY];

pub const WRAPPER: &str = "Shapes";

/// One row per line geometry.
pub fn flatten(records: &[Value]) -> Table {
    let rows = roots(records, |line| {
        vec![
            field(line, "LineNo"),
            field(line, "LineID"),
            localized(line, "LineName"),
            field(line, "Geometry"),
        ]
    });
    into_table(&COLUMNS, rows)
}
