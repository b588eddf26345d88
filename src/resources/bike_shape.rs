use serde_json::Value;

use super::GEOMETRY;
use crate::flatten::{field, into_table, localized, roots};
use crate::table::Table;

pub const COLUMNS: [&str; 11] = [
    "RouteName",
    "AuthorityName",
    "City",
    "Town",
    "RoadSectionStart",
    "RoadSectionEnd",
    "Direction",
    "CyclingType",
    "CyclingLength",
    "FinishedTime",
    GEOMETRY,
];

/// One row per cycling route. Geometry stays raw here; sanitizing happens
/// when it is parsed.
pub fn flatten(records: &[Value]) -> Table {
    let rows = roots(records, |route| {
        vec![
            localized(route, "RouteName"),
            field(route, "AuthorityName"),
            field(route, "City"),
            field(route, "Town"),
            field(route, "RoadSectionStart"),
            field(route, "RoadSectionEnd"),
            field(route, "Direction"),
            field(route, "CyclingType"),
            field(route, "CyclingLength"),
            field(route, "FinishedTime"),
            field(route, "Geometry"),
        ]
    });
    into_table(&COLUMNS, rows)
}
