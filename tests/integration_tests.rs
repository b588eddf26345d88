use std::fs;
use std::path::Path;

use geo_types::Geometry;
use tdx_flatten::fetch::mock::MockClient;
use tdx_flatten::resources::{bus_route, fare::FarePricing};
use tdx_flatten::{AuthHeader, Cell, FareTables, Frame, TdxClient, TdxConfig, TdxError};

const BASE_URL: &str = "https://tdx.example.test/api/basic";

fn client(mock: MockClient) -> TdxClient<MockClient> {
    let config = TdxConfig::default()
        .with_base_url(BASE_URL)
        .with_auth_url("https://auth.example.test/token");
    TdxClient::with_client(mock, config)
}

fn auth() -> AuthHeader {
    AuthHeader::from_token("test-token")
}

#[test]
fn test_token_then_resource_call_carries_bearer() {
    let mock = MockClient::new()
        .json("/token", r#"{"access_token":"fresh","token_type":"Bearer"}"#)
        .json("/v2/Bus/Route/City/Taipei", include_str!("fixtures/bus_route_taipei.json"));
    let tdx = client(mock);

    let auth = tdx.acquire_token("app-id", "app-key").unwrap();
    tdx.bus_route(&auth, "Taipei", "text", None).unwrap();

    let sent = tdx.http().requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].method, "POST");
    assert_eq!(sent[1].method, "GET");
    assert_eq!(sent[1].authorization.as_deref(), Some("Bearer fresh"));
    assert!(sent[1].url.starts_with(BASE_URL));
    assert!(sent[1].url.contains("format=JSON"));
}

#[test]
fn test_validation_happens_before_any_request() {
    let tdx = client(MockClient::new());

    let err = tdx.bus_route(&auth(), "Atlantis", "text", None).unwrap_err();
    assert!(matches!(err, TdxError::InvalidSelector { kind: "county", .. }));
    assert!(err.to_string().contains("Taipei"));

    let err = tdx.rail_station(&auth(), "MRT", "text", None).unwrap_err();
    assert!(matches!(err, TdxError::InvalidSelector { kind: "operator", .. }));

    let err = tdx.bus_shape(&auth(), "Taipei", "shapefile", None).unwrap_err();
    assert!(matches!(err, TdxError::InvalidOutputMode(_)));

    let err = tdx
        .bus_shape(&auth(), "Taipei", "geometry", Some(Path::new("shape.csv")))
        .unwrap_err();
    assert!(matches!(err, TdxError::ExtensionMismatch { .. }));

    let err = tdx.bus_schedule(&auth(), "Taipei", "geometry", None).unwrap_err();
    assert!(matches!(err, TdxError::InvalidOutputMode(_)));

    // Bike resources have no intercity variant.
    let err = tdx.bike_station(&auth(), "Intercity", "text", None).unwrap_err();
    assert!(matches!(err, TdxError::InvalidSelector { .. }));

    assert_eq!(tdx.http().calls(), 0);
}

#[test]
fn test_bus_route_one_row_per_sub_route() {
    let tdx = client(
        MockClient::new().json("/v2/Bus/Route/City/Taipei", include_str!("fixtures/bus_route_taipei.json")),
    );
    let table = tdx.bus_route(&auth(), "Taipei", "text", None).unwrap();

    // 2 + 3 sub-routes; the route without sub-routes contributes nothing.
    assert_eq!(table.len(), 5);
    assert_eq!(table.columns(), bus_route::COLUMNS);

    let route_ids = table.column_values("RouteID").unwrap();
    assert!(route_ids[..2].iter().all(|c| **c == Cell::from("10132")));
    assert!(route_ids[2..].iter().all(|c| **c == Cell::from("15680")));
    let departures = table.column_values("DepartureStopNameZh").unwrap();
    assert!(departures[2..].iter().all(|c| **c == Cell::from("捷運動物園站")));

    assert_eq!(table.value(0, "OperatorIDs"), Some(&Cell::from("100,1407")));
    assert_eq!(table.value(4, "OperatorIDs"), Some(&Cell::Null));
    // Locale map without Zh_tw is null.
    assert_eq!(table.value(2, "RouteName"), Some(&Cell::Null));
    assert_eq!(table.value(1, "SubRouteName"), Some(&Cell::from("307返程")));
}

#[test]
fn test_bus_stop_geometry_mode_builds_points() {
    let tdx = client(
        MockClient::new().json("/v2/Bus/StopOfRoute/City/Taipei", include_str!("fixtures/bus_stop_taipei.json")),
    );
    let frame = tdx.bus_stop_of_route(&auth(), "Taipei", "geometry", None).unwrap();
    let geo = frame.as_geo().expect("geometry mode returns a geo table");

    assert_eq!(geo.len(), 3);
    assert_eq!(geo.crs.epsg, 4326);
    assert!(geo.table.column("PositionLon").is_none());
    match &geo.geometry[0] {
        Some(Geometry::Point(p)) => {
            assert!((p.x() - 121.4578).abs() < 1e-9);
            assert!((p.y() - 25.0221).abs() < 1e-9);
        }
        other => panic!("expected a point, got {other:?}"),
    }
    assert!(geo.geometry[2].is_none());
    assert_eq!(geo.table.value(2, "StopName"), Some(&Cell::from("撫遠街")));
}

#[test]
fn test_travel_time_concatenates_routes_in_order() {
    let body = include_str!("fixtures/travel_time_route.json");
    let tdx = client(
        MockClient::new()
            .json("/v2/Bus/S2STravelTime/City/Taipei/101", body)
            .json("/v2/Bus/S2STravelTime/City/Taipei/202", body),
    );
    let table = tdx
        .bus_travel_time(&auth(), "Taipei", &["101", "202"][..], "text", None)
        .unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.value(1, "RunTime"), Some(&Cell::Int(120)));
    assert_eq!(table.value(3, "StartHour"), Some(&Cell::Int(7)));

    let urls: Vec<_> = tdx.http().requests().into_iter().map(|r| r.url).collect();
    assert!(urls[0].contains("/Taipei/101"));
    assert!(urls[1].contains("/Taipei/202"));
}

#[test]
fn test_travel_time_failure_aborts_batch() {
    let body = include_str!("fixtures/travel_time_route.json");
    let tdx = client(
        MockClient::new()
            .json("/v2/Bus/S2STravelTime/City/Taipei/101", body)
            .fail("/v2/Bus/S2STravelTime/City/Taipei/202", "connection reset")
            .json("/v2/Bus/S2STravelTime/City/Taipei/303", body),
    );
    let err = tdx
        .bus_travel_time(&auth(), "Taipei", &["101", "202", "303"][..], "text", None)
        .unwrap_err();

    assert!(matches!(err, TdxError::Unreachable { .. }));
    assert!(err.is_recoverable());
    assert_eq!(tdx.http().calls(), 2);
}

#[test]
fn test_unauthorized_resource_is_unreachable() {
    let tdx = client(MockClient::new().respond("/v2/Bus/Schedule/City/Taipei", 401, "Unauthorized"));
    let err = tdx.bus_schedule(&auth(), "Taipei", "text", None).unwrap_err();
    match err {
        TdxError::Unreachable { reason, .. } => assert!(reason.contains("401")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_zonal_fare_writes_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fare.csv");
    let tdx = client(
        MockClient::new().json("/v2/Bus/RouteFare/City/Taichung", include_str!("fixtures/fare_zonal.json")),
    );
    let tables = tdx
        .bus_route_fare(&auth(), "Taichung", "9102", "text", Some(out.as_path()))
        .unwrap();

    assert_eq!(tables.pricing(), FarePricing::Zonal);
    let FareTables::Zonal { buffer_zones, section_fares } = &tables else {
        panic!("expected zonal tables");
    };
    assert_eq!(buffer_zones.len(), 3);
    assert_eq!(section_fares.len(), 3);
    assert_eq!(buffer_zones.value(2, "SectionID"), Some(&Cell::Int(2)));
    assert_eq!(section_fares.value(2, "Price"), Some(&Cell::Int(30)));

    assert!(!out.exists());
    let zones = fs::read_to_string(dir.path().join("fare_buffer_zones.csv")).unwrap();
    assert_eq!(zones.lines().count(), 4);
    assert!(zones.starts_with("RouteID,RouteName,SubRouteID"));
    let fares = fs::read_to_string(dir.path().join("fare_section_fares.csv")).unwrap();
    assert_eq!(fares.lines().count(), 4);
}

#[test]
fn test_origin_destination_fare() {
    let tdx = client(
        MockClient::new().json("/v2/Bus/RouteFare/InterCity", include_str!("fixtures/fare_od.json")),
    );
    let tables = tdx
        .bus_route_fare(&auth(), "Intercity", "1815", "text", None)
        .unwrap();

    let FareTables::OriginDestination(table) = tables else {
        panic!("expected origin-destination fares");
    };
    assert_eq!(table.len(), 3);
    assert_eq!(table.value(1, "DestinationStopName"), Some(&Cell::from("板橋")));
    assert_eq!(table.value(2, "DestinationStopID"), Some(&Cell::from("C1")));
    assert_eq!(table.value(2, "Price"), Some(&Cell::Int(90)));
}

#[test]
fn test_staged_fare() {
    let tdx = client(
        MockClient::new().json("/v2/Bus/RouteFare/City/Kaohsiung", include_str!("fixtures/fare_stage.json")),
    );
    let tables = tdx
        .bus_route_fare(&auth(), "Kaohsiung", "5001", "text", None)
        .unwrap();

    let FareTables::Staged(table) = tables else {
        panic!("expected staged fares");
    };
    assert_eq!(table.len(), 3);
    assert_eq!(table.value(0, "OriginStageSequence"), Some(&Cell::Int(1)));
    assert_eq!(table.value(2, "DestinationStageStopName"), Some(&Cell::from("終站")));
    assert_eq!(table.value(2, "FareClass"), Some(&Cell::Int(2)));
}

#[test]
fn test_bike_shape_repairs_degenerate_lines() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cycling.geojson");
    let tdx = client(
        MockClient::new().json("/v2/Cycling/Shape/City/Taipei", include_str!("fixtures/bike_shape_taipei.json")),
    );
    let frame = tdx.bike_shape(&auth(), "Taipei", "geometry", Some(out.as_path())).unwrap();
    let Frame::Geo(geo) = &frame else {
        panic!("expected geometry output");
    };

    assert_eq!(geo.len(), 3);
    match &geo.geometry[0] {
        Some(Geometry::MultiLineString(mls)) => {
            assert_eq!(mls.0.len(), 2);
            assert_eq!(mls.0[1].0.len(), 3);
        }
        other => panic!("expected a multi-line, got {other:?}"),
    }
    assert!(geo.geometry[1].is_none());
    assert!(geo.geometry[2].is_none());

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["features"].as_array().unwrap().len(), 3);
    assert_eq!(written["features"][0]["geometry"]["type"], "MultiLineString");
    assert_eq!(written["features"][0]["properties"]["RouteName"], "河濱自行車道");
}

#[test]
fn test_bike_shape_geometry_mode_writes_shapefile_set() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.shp");
    let tdx = client(
        MockClient::new().json("/v2/Cycling/Shape/City/Taipei", include_str!("fixtures/bike_shape_taipei.json")),
    );
    tdx.bike_shape(&auth(), "Taipei", "geometry", Some(out.as_path())).unwrap();

    for ext in ["shp", "shx", "dbf"] {
        assert!(out.with_extension(ext).exists(), "missing out.{ext}");
    }
    let prj = fs::read_to_string(out.with_extension("prj")).unwrap();
    assert!(prj.contains("GCS_WGS_1984"));
    assert!(prj.contains("6378137.0,298.257223563"));

    // Only the first row has a geometry left after repair.
    let shapes = shapefile::read_shapes_as::<_, shapefile::Polyline>(&out).unwrap();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].parts().len(), 2);
}

#[test]
fn test_bike_shape_text_mode_keeps_raw_wkt() {
    let tdx = client(
        MockClient::new().json("/v2/Cycling/Shape/City/Taipei", include_str!("fixtures/bike_shape_taipei.json")),
    );
    let frame = tdx.bike_shape(&auth(), "Taipei", "text", None).unwrap();
    let table = frame.table();
    assert!(frame.as_geo().is_none());
    assert_eq!(
        table.value(1, "Geometry"),
        Some(&Cell::from("MULTILINESTRING ((121.520 25.030))"))
    );
}

#[test]
fn test_empty_bike_station_is_not_offered() {
    let tdx = client(MockClient::new().json("/v2/Bike/Station/City/KinmenCounty", "[]"));
    let err = tdx.bike_station(&auth(), "KinmenCounty", "text", None).unwrap_err();
    assert!(matches!(err, TdxError::NotOffered { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_station_of_line_joins_and_drops_empty_columns() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("sol.txt");
    let tdx = client(
        MockClient::new()
            .json("/v2/Rail/Metro/StationOfLine/TRTC", include_str!("fixtures/station_of_line_trtc.json"))
            .json("/v2/Rail/Metro/Line/TRTC", include_str!("fixtures/line_trtc.json")),
    );
    let table = tdx
        .rail_station_of_line(&auth(), "TRTC", "text", Some(out.as_path()))
        .unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(
        table.columns(),
        [
            "LineNo",
            "LineID",
            "LineName",
            "LineColor",
            "IsBranch",
            "Sequence",
            "StationID",
            "StationName",
            "CumulativeDistance",
        ]
    );
    assert_eq!(table.value(1, "LineName"), Some(&Cell::from("板南線")));
    // No line metadata for Y: left join keeps the rows with nulls.
    assert_eq!(table.value(2, "LineName"), Some(&Cell::Null));
    assert_eq!(table.value(2, "StationID"), Some(&Cell::from("Y07")));

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("LineNo\tLineID\tLineName"));
}

#[test]
fn test_thsr_station_of_line_not_offered() {
    let tdx = client(MockClient::new());
    let err = tdx.rail_station_of_line(&auth(), "THSR", "text", None).unwrap_err();
    assert!(matches!(err, TdxError::NotOffered { .. }));
    assert_eq!(tdx.http().calls(), 0);
}

#[test]
fn test_bus_route_csv_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("routes.csv");
    let tdx = client(
        MockClient::new().json("/v2/Bus/Route/City/Taipei", include_str!("fixtures/bus_route_taipei.json")),
    );
    tdx.bus_route(&auth(), "Taipei", "text", Some(out.as_path())).unwrap();

    let mut reader = csv::Reader::from_path(&out).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), bus_route::COLUMNS);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(&rows[0][10], "100,1407");
    assert_eq!(&rows[2][2], "");
}

#[test]
fn test_argument_check_matches_client_validation() {
    use tdx_flatten::request::Resource;

    let tdx = client(MockClient::new());
    let cases: [(Resource, &str, &str, Option<&Path>); 3] = [
        (Resource::BikeShape, "Intercity", "geometry", None),
        (Resource::RailStation, "Atlantis", "text", None),
        (Resource::BusRoute, "Taipei", "geometry", None),
    ];
    for (resource, selector, mode, out) in cases {
        assert!(resource.check(selector, mode, out).unwrap_err().is_validation());
    }
    assert!(tdx.bike_shape(&auth(), "Intercity", "geometry", None).unwrap_err().is_validation());
    assert!(tdx.rail_station(&auth(), "Atlantis", "text", None).unwrap_err().is_validation());
    assert!(tdx.bus_route(&auth(), "Taipei", "geometry", None).unwrap_err().is_validation());
    assert_eq!(tdx.http().calls(), 0);

    let out = Path::new("stations.shp");
    assert!(Resource::RailStation.check("TRA", "geometry", Some(out)).is_ok());
}
