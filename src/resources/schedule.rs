use serde_json::Value;

use crate::flatten::{field, list, localized};
use crate::table::{Cell, Table};

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const COLUMNS: [&str; 27] = [
    "RouteUID",
    "RouteID",
    "RouteName",
    "SubRouteUID",
    "SubRouteID",
    "SubRouteName",
    "Direction",
    "ScheduleType",
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "StartTime",
    "EndTime",
    "MinHeadwayMins",
    "MaxHeadwayMins",
    "TripID",
    "IsLowFloor",
    "StopUID",
    "StopName",
    "ArrivalTime",
    "DepartureTime",
    "StopSequence",
    "StopID",
];

/// How a schedule record describes its service.
#[derive(Debug, Clone, Copy)]
pub enum ServicePattern<'a> {
    Frequency(&'a [Value]),
    Timetable(&'a [Value]),
    Both {
        frequencies: &'a [Value],
        timetables: &'a [Value],
    },
    Unscheduled,
}

impl<'a> ServicePattern<'a> {
    pub fn of(record: &'a Value) -> Self {
        match (list(record, "Frequencys"), list(record, "Timetables")) {
            ([], []) => ServicePattern::Unscheduled,
            (frequencies, []) => ServicePattern::Frequency(frequencies),
            ([], timetables) => ServicePattern::Timetable(timetables),
            (frequencies, timetables) => ServicePattern::Both {
                frequencies,
                timetables,
            },
        }
    }

    fn frequencies(&self) -> &'a [Value] {
        match *self {
            ServicePattern::Frequency(f) | ServicePattern::Both { frequencies: f, .. } => f,
            _ => &[],
        }
    }

    fn timetables(&self) -> &'a [Value] {
        match *self {
            ServicePattern::Timetable(t) | ServicePattern::Both { timetables: t, .. } => t,
            _ => &[],
        }
    }
}

/// Frequency rows for every record, followed by timetable rows for every
/// record. A timetable trip is reduced to its first stop time.
pub fn flatten(records: &[Value]) -> Table {
    let patterns: Vec<_> = records
        .iter()
        .map(|r| (r, ServicePattern::of(r)))
        .collect();

    let mut table = Table::new(&COLUMNS);
    for (record, pattern) in &patterns {
        for frequency in pattern.frequencies() {
            table.push_row(frequency_row(record, frequency));
        }
    }
    for (record, pattern) in &patterns {
        for trip in pattern.timetables() {
            table.push_row(timetable_row(record, trip));
        }
    }
    table
}

fn service_cells(record: &Value, kind: &str) -> Vec<Cell> {
    vec![
        field(record, "RouteUID"),
        field(record, "RouteID"),
        localized(record, "RouteName"),
        field(record, "SubRouteUID"),
        field(record, "SubRouteID"),
        localized(record, "SubRouteName"),
        field(record, "Direction"),
        Cell::from(kind),
    ]
}

fn service_days(entry: &Value) -> Vec<Cell> {
    let days = entry.get("ServiceDay");
    WEEKDAYS
        .iter()
        .map(|day| days.map(|d| field(d, day)).unwrap_or(Cell::Null))
        .collect()
}

fn frequency_row(record: &Value, frequency: &Value) -> Vec<Cell> {
    let mut row = service_cells(record, "Frequency");
    row.extend(service_days(frequency));
    row.extend([
        field(frequency, "StartTime"),
        field(frequency, "EndTime"),
        field(frequency, "MinHeadwayMins"),
        field(frequency, "MaxHeadwayMins"),
    ]);
    row.extend(std::iter::repeat_n(Cell::Null, 8));
    row
}

fn timetable_row(record: &Value, trip: &Value) -> Vec<Cell> {
    let mut row = service_cells(record, "Timetable");
    row.extend(service_days(trip));
    row.extend(std::iter::repeat_n(Cell::Null, 4));
    row.extend([field(trip, "TripID"), field(trip, "IsLowFloor")]);
    match list(trip, "StopTimes").first() {
        Some(first) => row.extend([
            field(first, "StopUID"),
            localized(first, "StopName"),
            field(first, "ArrivalTime"),
            field(first, "DepartureTime"),
            field(first, "StopSequence"),
            field(first, "StopID"),
        ]),
        None => row.extend(std::iter::repeat_n(Cell::Null, 6)),
    }
    row
}
