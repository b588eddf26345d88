use serde_json::Value;

use super::{POSITION_LAT, POSITION_LON};
use crate::flatten::{fan_out, field, into_table, localized, path, roots};
use crate::table::{Cell, Table};

pub const COLUMNS: [&str; 15] = [
    "RouteUID",
    "RouteID",
    "RouteName",
    "SubRouteUID",
    "SubRouteID",
    "SubRouteName",
    "Direction",
    "StopUID",
    "StopID",
    "StopName",
    "StopBoarding",
    "StopSequence",
    "StationID",
    POSITION_LON,
    POSITION_LAT,
];

/// One row per stop. Each record is a route's sub-route; its stop list is
/// fanned out and the stop position split into longitude and latitude.
pub fn flatten(records: &[Value]) -> Table {
    let sub_routes = roots(records, sub_route_cells);
    into_table(&COLUMNS, fan_out(sub_routes, "Stops", stop_cells))
}

fn sub_route_cells(record: &Value) -> Vec<Cell> {
    vec![
        field(record, "RouteUID"),
        field(record, "RouteID"),
        localized(record, "RouteName"),
        field(record, "SubRouteUID"),
        field(record, "SubRouteID"),
        localized(record, "SubRouteName"),
        field(record, "Direction"),
    ]
}

fn stop_cells(stop: &Value) -> Vec<Cell> {
    vec![
        field(stop, "StopUID"),
        field(stop, "StopID"),
        localized(stop, "StopName"),
        field(stop, "StopBoarding"),
        field(stop, "StopSequence"),
        field(stop, "StationID"),
        path(stop, &["StopPosition", "PositionLon"]),
        path(stop, &["StopPosition", "PositionLat"]),
    ]
}
