use std::collections::HashMap;

use serde_json::Value;

use crate::flatten::{fan_out, field, into_table, localized, roots};
use crate::table::{Cell, Table};

/// Columns before sparse ones are dropped.
pub const PROVISIONAL_COLUMNS: [&str; 11] = [
    "LineNo",
    "LineID",
    "LineName",
    "LineSectionName",
    "LineColor",
    "IsBranch",
    "Sequence",
    "StationID",
    "StationName",
    "TraveledDistance",
    "CumulativeDistance",
];

pub const STATION_OF_LINE_WRAPPER: &str = "StationOfLines";
pub const LINE_WRAPPER: &str = "Lines";

/// Joins station sequences to line metadata on `LineID` (left join) and
/// returns the provisional wide table, one row per station per line.
pub fn flatten_wide(station_of_lines: &[Value], lines: &[Value]) -> Table {
    let by_id: HashMap<&str, &Value> = lines
        .iter()
        .filter_map(|line| Some((line.get("LineID")?.as_str()?, line)))
        .collect();

    let line_rows = roots(station_of_lines, |sol| {
        let line = sol
            .get("LineID")
            .and_then(Value::as_str)
            .and_then(|id| by_id.get(id).copied());
        let mut cells = vec![field(sol, "LineNo"), field(sol, "LineID")];
        cells.extend(line_cells(line));
        cells
    });
    let stations = fan_out(line_rows, "Stations", |station| {
        vec![
            field(station, "Sequence"),
            field(station, "StationID"),
            localized(station, "StationName"),
            field(station, "TraveledDistance"),
            field(station, "CumulativeDistance"),
        ]
    });
    into_table(&PROVISIONAL_COLUMNS, stations)
}

/// [`flatten_wide`] with every all-null column removed.
pub fn flatten(station_of_lines: &[Value], lines: &[Value]) -> Table {
    let mut table = flatten_wide(station_of_lines, lines);
    table.drop_empty_columns();
    table
}

// Version-3 lines carry `LineNameZh`; version-2 lines a locale map.
fn line_cells(line: Option<&Value>) -> [Cell; 4] {
    let Some(line) = line else {
        return [Cell::Null, Cell::Null, Cell::Null, Cell::Null];
    };
    let name = either(localized(line, "LineName"), || field(line, "LineNameZh"));
    let section = either(localized(line, "LineSectionName"), || {
        field(line, "LineSectionNameZh")
    });
    [name, section, field(line, "LineColor"), field(line, "IsBranch")]
}

fn either(first: Cell, fallback: impl FnOnce() -> Cell) -> Cell {
    if first.is_null() { fallback() } else { first }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn station_of_lines() -> Value {
        json!({"StationOfLines": [
            {"LineNo": "WL", "LineID": "WL", "Stations": [
                {"Sequence": 1, "StationID": "0900", "StationName": {"Zh_tw": "基隆"}, "TraveledDistance": 0.0},
                {"Sequence": 2, "StationID": "0910", "StationName": {"Zh_tw": "三坑"}, "TraveledDistance": 1.4}
            ]},
            {"LineNo": "PX", "LineID": "PX", "Stations": [
                {"Sequence": 1, "StationID": "7360", "StationName": {"Zh_tw": "八堵"}}
            ]}
        ]})
    }

    fn lines() -> Value {
        json!({"Lines": [
            {"LineNo": "WL", "LineID": "WL", "LineNameZh": "縱貫線", "LineSectionNameZh": "基隆-竹南", "IsBranch": false}
        ]})
    }

    #[test]
    fn test_join_on_line_id() {
        let sol = station_of_lines();
        let lines = lines();
        let wide = flatten_wide(
            crate::parser::records(&sol, STATION_OF_LINE_WRAPPER),
            crate::parser::records(&lines, LINE_WRAPPER),
        );
        assert_eq!(wide.len(), 3);
        assert_eq!(wide.columns(), PROVISIONAL_COLUMNS);
        assert_eq!(wide.value(1, "LineName"), Some(&Cell::from("縱貫線")));
        assert_eq!(wide.value(2, "LineName"), Some(&Cell::Null));
    }

    #[test]
    fn test_all_null_columns_dropped() {
        let sol = station_of_lines();
        let lines = lines();
        let table = flatten(
            crate::parser::records(&sol, STATION_OF_LINE_WRAPPER),
            crate::parser::records(&lines, LINE_WRAPPER),
        );
        assert_eq!(
            table.columns(),
            [
                "LineNo",
                "LineID",
                "LineName",
                "LineSectionName",
                "IsBranch",
                "Sequence",
                "StationID",
                "StationName",
                "TraveledDistance",
            ]
        );
        assert_eq!(table.value(2, "TraveledDistance"), Some(&Cell::Null));
    }
}
