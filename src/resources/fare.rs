//! Route fares.
//!
//! A fare record follows one of three schemas selected by its
//! `FarePricingType`: zonal sections with buffer zones (0), priced
//! origin-destination pairs (1) or staged fares (2). Each schema has its own
//! flattening path and output columns.

use serde_json::Value;

use crate::error::{Result, TdxError};
use crate::flatten::{field, list, localized, path};
use crate::table::{Cell, Table};

pub const BUFFER_ZONE_COLUMNS: [&str; 12] = [
    "RouteID",
    "RouteName",
    "SubRouteID",
    "SubRouteName",
    "SectionID",
    "SectionSequence",
    "ZoneID",
    "Direction",
    "OriginStopID",
    "OriginStopName",
    "DestinationStopID",
    "DestinationStopName",
];

pub const SECTION_FARE_COLUMNS: [&str; 8] = [
    "RouteID",
    "RouteName",
    "SubRouteID",
    "SubRouteName",
    "SectionID",
    "TicketType",
    "FareClass",
    "Price",
];

pub const OD_FARE_COLUMNS: [&str; 12] = [
    "RouteID",
    "RouteName",
    "SubRouteID",
    "SubRouteName",
    "Direction",
    "OriginStopID",
    "OriginStopName",
    "DestinationStopID",
    "DestinationStopName",
    "TicketType",
    "FareClass",
    "Price",
];

pub const STAGE_FARE_COLUMNS: [&str; 14] = [
    "RouteID",
    "RouteName",
    "SubRouteID",
    "SubRouteName",
    "Direction",
    "OriginStageSequence",
    "OriginStageStopID",
    "OriginStageStopName",
    "DestinationStageSequence",
    "DestinationStageStopID",
    "DestinationStageStopName",
    "TicketType",
    "FareClass",
    "Price",
];

/// `FarePricingType` of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarePricing {
    Zonal,
    OriginDestination,
    Staged,
}

impl FarePricing {
    pub fn of(record: &Value) -> Result<Self> {
        match record.get("FarePricingType").and_then(Value::as_i64) {
            Some(0) => Ok(FarePricing::Zonal),
            Some(1) => Ok(FarePricing::OriginDestination),
            Some(2) => Ok(FarePricing::Staged),
            _ => Err(TdxError::UnknownFarePricing(
                record
                    .get("FarePricingType")
                    .map(Value::to_string)
                    .unwrap_or_else(|| "missing".to_string()),
            )),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            FarePricing::Zonal => 0,
            FarePricing::OriginDestination => 1,
            FarePricing::Staged => 2,
        }
    }
}

/// Flattened fares of one route, shaped by its pricing type.
#[derive(Debug, Clone, PartialEq)]
pub enum FareTables {
    Zonal {
        buffer_zones: Table,
        section_fares: Table,
    },
    OriginDestination(Table),
    Staged(Table),
}

impl FareTables {
    pub fn pricing(&self) -> FarePricing {
        match self {
            FareTables::Zonal { .. } => FarePricing::Zonal,
            FareTables::OriginDestination(_) => FarePricing::OriginDestination,
            FareTables::Staged(_) => FarePricing::Staged,
        }
    }

    /// Every table with the name it is written under.
    pub fn tables(&self) -> Vec<(&'static str, &Table)> {
        match self {
            FareTables::Zonal {
                buffer_zones,
                section_fares,
            } => vec![
                ("buffer_zones", buffer_zones),
                ("section_fares", section_fares),
            ],
            FareTables::OriginDestination(t) => vec![("od_fares", t)],
            FareTables::Staged(t) => vec![("stage_fares", t)],
        }
    }
}

/// Classifies every record, requires them to agree, then runs the path for
/// that pricing type. Returns `None` when there are no records.
pub fn flatten(records: &[Value]) -> Result<Option<FareTables>> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let pricing = FarePricing::of(first)?;
    for record in &records[1..] {
        if FarePricing::of(record)? != pricing {
            return Err(TdxError::MixedFarePricing);
        }
    }

    let tables = match pricing {
        FarePricing::Zonal => {
            let (buffer_zones, section_fares) = zonal(records);
            FareTables::Zonal {
                buffer_zones,
                section_fares,
            }
        }
        FarePricing::OriginDestination => FareTables::OriginDestination(origin_destination(records)),
        FarePricing::Staged => FareTables::Staged(staged(records)),
    };
    Ok(Some(tables))
}

fn route_cells(record: &Value) -> Vec<Cell> {
    vec![
        field(record, "RouteID"),
        localized(record, "RouteName"),
        field(record, "SubRouteID"),
        localized(record, "SubRouteName"),
    ]
}

fn price_cells(fare: &Value) -> [Cell; 3] {
    [
        field(fare, "TicketType"),
        field(fare, "FareClass"),
        field(fare, "Price"),
    ]
}

fn stop_cells(stop: Option<&Value>) -> [Cell; 2] {
    match stop {
        Some(stop) => [field(stop, "StopID"), localized(stop, "StopName")],
        None => [Cell::Null, Cell::Null],
    }
}

/// Sections are numbered from 1 within each record; both tables carry that
/// `SectionID` so buffer zones can be joined to their prices.
fn zonal(records: &[Value]) -> (Table, Table) {
    let mut buffer_zones = Table::new(&BUFFER_ZONE_COLUMNS);
    let mut section_fares = Table::new(&SECTION_FARE_COLUMNS);

    for record in records {
        let route = route_cells(record);
        for (idx, section) in list(record, "SectionFares").iter().enumerate() {
            let section_id = Cell::Int(idx as i64 + 1);

            for zone in list(section, "BufferZones") {
                let mut row = route.clone();
                row.extend([
                    section_id.clone(),
                    field(zone, "SectionSequence"),
                    field(zone, "ZoneID"),
                    field(zone, "Direction"),
                ]);
                row.extend(stop_cells(zone.get("FareBufferZoneOrigin")));
                row.extend(stop_cells(zone.get("FareBufferZoneDestination")));
                buffer_zones.push_row(row);
            }

            for fare in list(section, "Fares") {
                let mut row = route.clone();
                row.push(section_id.clone());
                row.extend(price_cells(fare));
                section_fares.push_row(row);
            }
        }
    }
    (buffer_zones, section_fares)
}

fn origin_destination(records: &[Value]) -> Table {
    let mut table = Table::new(&OD_FARE_COLUMNS);
    for record in records {
        let route = route_cells(record);
        for od in list(record, "ODFares") {
            let mut pair = route.clone();
            pair.push(field(od, "Direction"));
            pair.extend(stop_cells(od.get("OriginStop")));
            pair.extend(stop_cells(od.get("DestinationStop")));
            for fare in list(od, "Fares") {
                let mut row = pair.clone();
                row.extend(price_cells(fare));
                table.push_row(row);
            }
        }
    }
    table
}

fn staged(records: &[Value]) -> Table {
    let mut table = Table::new(&STAGE_FARE_COLUMNS);
    for record in records {
        let route = route_cells(record);
        for stage in list(record, "StageFares") {
            let mut span = route.clone();
            span.push(field(stage, "Direction"));
            for boundary in ["OriginStage", "DestinationStage"] {
                span.push(path(stage, &[boundary, "Sequence"]));
                span.extend(stop_cells(stage.get(boundary)));
            }
            for fare in list(stage, "Fares") {
                let mut row = span.clone();
                row.extend(price_cells(fare));
                table.push_row(row);
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_pricing_type() {
        let err = FarePricing::of(&json!({"FarePricingType": 7})).unwrap_err();
        assert!(matches!(err, TdxError::UnknownFarePricing(ref v) if v == "7"));
        assert!(FarePricing::of(&json!({})).is_err());
    }

    #[test]
    fn test_mixed_pricing_rejected() {
        let records = json!([{"FarePricingType": 1}, {"FarePricingType": 2}]);
        let err = flatten(records.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, TdxError::MixedFarePricing));
    }

    #[test]
    fn test_empty_document() {
        assert!(flatten(&[]).unwrap().is_none());
    }

    #[test]
    fn test_zonal_two_related_tables() {
        let records = json!([{
            "RouteID": "9102", "RouteName": {"Zh_tw": "9102"}, "FarePricingType": 0,
            "SectionFares": [
                {"BufferZones": [
                    {"SectionSequence": 1, "ZoneID": "Z1", "Direction": 0,
                     "FareBufferZoneOrigin": {"StopID": "10", "StopName": "大坑"},
                     "FareBufferZoneDestination": {"StopID": "12", "StopName": "南屯"}},
                    {"SectionSequence": 1, "ZoneID": "Z1", "Direction": 1,
                     "FareBufferZoneOrigin": {"StopID": "12", "StopName": "南屯"},
                     "FareBufferZoneDestination": {"StopID": "10", "StopName": "大坑"}}
                 ],
                 "Fares": [{"TicketType": 1, "FareClass": 1, "Price": 15}]},
                {"BufferZones": [],
                 "Fares": [{"TicketType": 1, "FareClass": 1, "Price": 30},
                           {"TicketType": 1, "FareClass": 2, "Price": 15}]}
            ]
        }]);
        let tables = flatten(records.as_array().unwrap()).unwrap().unwrap();
        let FareTables::Zonal { buffer_zones, section_fares } = tables else {
            panic!("expected zonal tables");
        };
        assert_eq!(buffer_zones.len(), 2);
        assert_eq!(section_fares.len(), 3);
        assert_eq!(buffer_zones.value(1, "OriginStopName"), Some(&Cell::from("南屯")));
        assert_eq!(section_fares.value(2, "SectionID"), Some(&Cell::Int(2)));
        assert_eq!(section_fares.value(2, "Price"), Some(&Cell::Int(15)));
    }
}
