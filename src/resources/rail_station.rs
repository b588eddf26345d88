use serde_json::Value;

use super::{POSITION_LAT, POSITION_LON};
use crate::flatten::{field, into_table, localized, path, roots};
use crate::reference::RailSystem;
use crate::table::{Cell, Table};

pub const CONVENTIONAL_COLUMNS: [&str; 12] = [
    "StationUID",
    "StationID",
    "StationName",
    "StationAddress",
    "StationPhone",
    "StationClass",
    "LocationCity",
    "LocationCityCode",
    "LocationTown",
    "LocationTownCode",
    POSITION_LON,
    POSITION_LAT,
];

pub const FOREST_COLUMNS: [&str; 9] = [
    "StationUID",
    "StationID",
    "StationName",
    "StationAddress",
    "StationPhone",
    "LocationCity",
    "LocationTown",
    POSITION_LON,
    POSITION_LAT,
];

pub const METRO_COLUMNS: [&str; 11] = [
    "StationUID",
    "StationID",
    "StationName",
    "StationAddress",
    "BikeAllowOnHoliday",
    "LocationCity",
    "LocationCityCode",
    "LocationTown",
    "LocationTownCode",
    POSITION_LON,
    POSITION_LAT,
];

/// Wrapper key of the version-3 station payload.
pub const WRAPPER: &str = "Stations";

pub fn columns(system: RailSystem) -> &'static [&'static str] {
    match system {
        RailSystem::Conventional => &CONVENTIONAL_COLUMNS,
        RailSystem::Forest => &FOREST_COLUMNS,
        RailSystem::HighSpeed | RailSystem::Metro => &METRO_COLUMNS,
    }
}

/// One row per station, in the column set of the operator's system.
pub fn flatten(records: &[Value], system: RailSystem) -> Table {
    let rows = match system {
        RailSystem::Conventional => roots(records, conventional),
        RailSystem::Forest => roots(records, forest),
        RailSystem::HighSpeed | RailSystem::Metro => roots(records, metro),
    };
    into_table(columns(system), rows)
}

fn position(station: &Value) -> [Cell; 2] {
    [
        path(station, &["StationPosition", "PositionLon"]),
        path(station, &["StationPosition", "PositionLat"]),
    ]
}

fn conventional(station: &Value) -> Vec<Cell> {
    let mut row = vec![
        field(station, "StationUID"),
        field(station, "StationID"),
        localized(station, "StationName"),
        localized(station, "StationAddress"),
        field(station, "StationPhone"),
        field(station, "StationClass"),
        field(station, "LocationCity"),
        field(station, "LocationCityCode"),
        field(station, "LocationTown"),
        field(station, "LocationTownCode"),
    ];
    row.extend(position(station));
    row
}

fn forest(station: &Value) -> Vec<Cell> {
    let mut row = vec![
        field(station, "StationUID"),
        field(station, "StationID"),
        localized(station, "StationName"),
        localized(station, "StationAddress"),
        field(station, "StationPhone"),
        field(station, "LocationCity"),
        field(station, "LocationTown"),
    ];
    row.extend(position(station));
    row
}

fn metro(station: &Value) -> Vec<Cell> {
    let mut row = vec![
        field(station, "StationUID"),
        field(station, "StationID"),
        localized(station, "StationName"),
        localized(station, "StationAddress"),
        field(station, "BikeAllowOnHoliday"),
        field(station, "LocationCity"),
        field(station, "LocationCityCode"),
        field(station, "LocationTown"),
        field(station, "LocationTownCode"),
    ];
    row.extend(position(station));
    row
}
