use serde_json::Value;

use super::{POSITION_LAT, POSITION_LON};
use crate::flatten::{field, into_table, localized, path, roots};
use crate::table::Table;

pub const COLUMNS: [&str; 9] = [
    "StationUID",
    "StationID",
    "AuthorityID",
    "StationName",
    "StationAddress",
    "BikesCapacity",
    "ServiceType",
    POSITION_LON,
    POSITION_LAT,
];

pub fn flatten(records: &[Value]) -> Table {
    let rows = roots(records, |station| {
        vec![
            field(station, "StationUID"),
            field(station, "StationID"),
            field(station, "AuthorityID"),
            localized(station, "StationName"),
            localized(station, "StationAddress"),
            field(station, "BikesCapacity"),
            field(station, "ServiceType"),
            path(station, &["StationPosition", "PositionLon"]),
            path(station, &["StationPosition", "PositionLat"]),
        ]
    });
    into_table(&COLUMNS, rows)
}
