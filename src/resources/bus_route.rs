use serde_json::Value;

use crate::flatten::{fan_out, field, into_table, joined, localized, roots};
use crate::table::{Cell, Table};

pub const COLUMNS: [&str; 14] = [
    "RouteUID",
    "RouteID",
    "RouteName",
    "BusRouteType",
    "DepartureStopNameZh",
    "DestinationStopNameZh",
    "City",
    "SubRouteUID",
    "SubRouteID",
    "SubRouteName",
    "OperatorIDs",
    "Direction",
    "FirstBusTime",
    "LastBusTime",
];

/// One row per sub-route, parent route columns repeated on each.
pub fn flatten(records: &[Value]) -> Table {
    let routes = roots(records, route_cells);
    into_table(&COLUMNS, fan_out(routes, "SubRoutes", sub_route_cells))
}

fn route_cells(route: &Value) -> Vec<Cell> {
    vec![
        field(route, "RouteUID"),
        field(route, "RouteID"),
        localized(route, "RouteName"),
        field(route, "BusRouteType"),
        field(route, "DepartureStopNameZh"),
        field(route, "DestinationStopNameZh"),
        field(route, "City"),
    ]
}

fn sub_route_cells(sub: &Value) -> Vec<Cell> {
    vec![
        field(sub, "SubRouteUID"),
        field(sub, "SubRouteID"),
        localized(sub, "SubRouteName"),
        joined(sub, "OperatorIDs"),
        field(sub, "Direction"),
        field(sub, "FirstBusTime"),
        field(sub, "LastBusTime"),
    ]
}
