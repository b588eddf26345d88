//! One flattener per resource kind.
//!
//! Each module exposes its column contract as constants and a pure
//! `flatten` function from a parsed payload to a [`Table`](crate::table::Table),
//! so the reshaping can be exercised without any transport.

pub mod bike_shape;
pub mod bike_station;
pub mod bus_route;
pub mod bus_shape;
pub mod bus_stop;
pub mod fare;
pub mod rail_shape;
pub mod rail_station;
pub mod schedule;
pub mod station_of_line;
pub mod travel_time;

/// Column carrying WKT in text mode.
pub const GEOMETRY: &str = "Geometry";
pub const POSITION_LON: &str = "PositionLon";
pub const POSITION_LAT: &str = "PositionLat";
