use serde_json::Value;

use crate::flatten::{fan_out, field, into_table, roots};
use crate::table::Table;

pub const COLUMNS: [&str; 12] = [
    "RouteUID",
    "RouteID",
    "SubRouteID",
    "Direction",
    "Weekday",
    "StartHour",
    "EndHour",
    "FromStopID",
    "FromStationID",
    "ToStopID",
    "ToStationID",
    "RunTime",
];

/// Flattens one route's travel-time document: sub-route, then weekday/hour
/// band, then origin-destination pair, one row per pair.
pub fn flatten(records: &[Value]) -> Table {
    let routes = roots(records, |route| {
        vec![field(route, "RouteUID"), field(route, "RouteID")]
    });
    let sub_routes = fan_out(routes, "SubRoutes", |sub| {
        vec![field(sub, "SubRouteID"), field(sub, "Direction")]
    });
    let bands = fan_out(sub_routes, "TravelTimes", |band| {
        vec![
            field(band, "Weekday"),
            field(band, "StartHour"),
            field(band, "EndHour"),
        ]
    });
    let pairs = fan_out(bands, "S2STimes", |pair| {
        vec![
            field(pair, "FromStopID"),
            field(pair, "FromStationID"),
            field(pair, "ToStopID"),
            field(pair, "ToStationID"),
            field(pair, "RunTime"),
        ]
    });
    into_table(&COLUMNS, pairs)
}
