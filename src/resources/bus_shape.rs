use serde_json::Value;

use super::GEOMETRY;
use crate::flatten::{field, into_table, localized, roots};
use crate::table::Table;

pub const COLUMNS: [&str; 8] = [
    "RouteUID",
    "RouteID",
    "RouteName",
    "SubRouteUID",
    "SubRouteID",
    "SubRouteName",
    "Direction",
    GEOMETRY,
];

/// One row per sub-route geometry; names null when their locale map is empty.
pub fn flatten(records: &[Value]) -> Table {
    let rows = roots(records, |shape| {
        vec![
            field(shape, "RouteUID"),
            field(shape, "RouteID"),
            localized(shape, "RouteName"),
            field(shape, "SubRouteUID"),
            field(shape, "SubRouteID"),
            localized(shape, "SubRouteName"),
            field(shape, "Direction"),
            field(shape, "Geometry"),
        ]
    });
    into_table(&COLUMNS, rows)
}
