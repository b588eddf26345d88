//! The public call surface: one method per resource kind.
//!
//! Every method validates its selector, output mode and destination before
//! touching the network, performs its GET(s), flattens the payload, converts
//! geometry when asked and finally writes the result if a destination was
//! given.

use std::path::Path;

use serde_json::Value;
use url::Url;
use tracing::{debug, info, warn};

use crate::config::TdxConfig;
use crate::error::{Result, TdxError};
use crate::fetch::auth::{self, AuthHeader};
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::geometry;
use crate::output::{write_frame, write_text};
use crate::parser::{records, reports_no_service};
use crate::reference::{self, Operator, RailSystem};
use crate::request::{
    Destination, OutputMode, odata_literal, validate_output, validate_route_id,
    validate_text_output,
};
use crate::resources::{
    GEOMETRY, POSITION_LAT, POSITION_LON, bike_shape, bike_station, bus_route, bus_shape,
    bus_stop, fare, rail_shape, rail_station, schedule, station_of_line, travel_time,
};
use crate::table::{Frame, Table};

use fare::FareTables;

/// Where a resource keeps its geometry in text mode.
#[derive(Debug, Clone, Copy)]
enum GeometrySource {
    Wkt,
    Point,
}

pub struct TdxClient<C = BasicClient> {
    http: C,
    config: TdxConfig,
}

impl TdxClient<BasicClient> {
    /// Client over `reqwest` honouring the configured timeout.
    pub fn new(config: TdxConfig) -> Result<Self> {
        let http = BasicClient::with_timeout(config.timeout_secs)
            .map_err(|e| TdxError::ClientSetup(e.to_string()))?;
        Ok(Self { http, config })
    }
}

impl<C: HttpClient> TdxClient<C> {
    pub fn with_client(http: C, config: TdxConfig) -> Self {
        Self { http, config }
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    pub fn config(&self) -> &TdxConfig {
        &self.config
    }

    /// Exchanges application credentials for a bearer header.
    pub fn acquire_token(&self, app_id: &str, app_secret: &str) -> Result<AuthHeader> {
        auth::acquire_token(&self.http, &self.config.auth_url, app_id, app_secret)
    }

    fn get(&self, auth: &AuthHeader, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.get_at(auth, path, &[], query)
    }

    /// Like [`get`](Self::get) with caller-supplied ids appended to the path
    /// as percent-encoded segments.
    fn get_at(
        &self,
        auth: &AuthHeader,
        path: &str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let url = endpoint(&self.config.base_url, path, segments)?;
        fetch_json(&self.http, url.as_str(), auth, query)
    }

    /// Bus routes, one row per sub-route.
    #[tracing::instrument(skip_all, fields(county = %county))]
    pub fn bus_route(
        &self,
        auth: &AuthHeader,
        county: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Table> {
        let area = reference::area(county, true)?;
        let destination = validate_text_output("bus route", mode, destination)?;

        let payload = self.get(auth, &format!("v2/Bus/Route/{}", area.path()), &[])?;
        let table = bus_route::flatten(records(&payload, ""));
        finish_table(table, destination.as_ref())
    }

    /// Bus route shapes, one row per sub-route geometry.
    #[tracing::instrument(skip_all, fields(county = %county))]
    pub fn bus_shape(
        &self,
        auth: &AuthHeader,
        county: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Frame> {
        let area = reference::area(county, true)?;
        let (mode, destination) = validate_output(mode, destination)?;

        let payload = self.get(auth, &format!("v2/Bus/Shape/{}", area.path()), &[])?;
        let table = bus_shape::flatten(records(&payload, ""));
        finish(table, mode, GeometrySource::Wkt, destination.as_ref())
    }

    /// Stops of every sub-route, one row per stop.
    #[tracing::instrument(skip_all, fields(county = %county))]
    pub fn bus_stop_of_route(
        &self,
        auth: &AuthHeader,
        county: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Frame> {
        let area = reference::area(county, true)?;
        let (mode, destination) = validate_output(mode, destination)?;

        let payload = self.get(auth, &format!("v2/Bus/StopOfRoute/{}", area.path()), &[])?;
        let table = bus_stop::flatten(records(&payload, ""));
        finish(table, mode, GeometrySource::Point, destination.as_ref())
    }

    /// Stop-to-stop travel times for each route id, fetched sequentially in
    /// list order and concatenated.
    ///
    /// The first failing request aborts the batch; no partial table is
    /// returned.
    #[tracing::instrument(skip_all, fields(county = %county, routes = route_ids.len()))]
    pub fn bus_travel_time<S: AsRef<str>>(
        &self,
        auth: &AuthHeader,
        county: &str,
        route_ids: &[S],
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Table> {
        let area = reference::area(county, true)?;
        let destination = validate_text_output("travel time", mode, destination)?;
        let route_ids = route_ids
            .iter()
            .map(|id| validate_route_id(id.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let total = route_ids.len();
        let mut table = Table::new(&travel_time::COLUMNS);
        for (idx, &route_id) in route_ids.iter().enumerate() {
            info!(progress = %format!("{}/{}", idx + 1, total), route_id, "Fetching travel times");
            let payload = self.get_at(
                auth,
                &format!("v2/Bus/S2STravelTime/{}", area.path()),
                &[route_id],
                &[],
            )?;
            table.extend(travel_time::flatten(records(&payload, "")));
        }
        finish_table(table, destination.as_ref())
    }

    /// Frequency-based and timetabled services, concatenated.
    #[tracing::instrument(skip_all, fields(county = %county))]
    pub fn bus_schedule(
        &self,
        auth: &AuthHeader,
        county: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Table> {
        let area = reference::area(county, true)?;
        let destination = validate_text_output("schedule", mode, destination)?;

        let payload = self.get(auth, &format!("v2/Bus/Schedule/{}", area.path()), &[])?;
        let table = schedule::flatten(records(&payload, ""));
        finish_table(table, destination.as_ref())
    }

    /// Fares of one route. The shape of the result depends on the route's
    /// `FarePricingType`; zonal fares come back as two tables.
    #[tracing::instrument(skip_all, fields(county = %county, route_id = %route_id))]
    pub fn bus_route_fare(
        &self,
        auth: &AuthHeader,
        county: &str,
        route_id: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<FareTables> {
        let area = reference::area(county, true)?;
        let destination = validate_text_output("route fare", mode, destination)?;
        let route_id = validate_route_id(route_id)?;

        let filter = format!("RouteID eq {}", odata_literal(route_id));
        let payload = self.get(
            auth,
            &format!("v2/Bus/RouteFare/{}", area.path()),
            &[("$filter", filter.as_str())],
        )?;
        let Some(tables) = fare::flatten(records(&payload, ""))? else {
            return Err(not_offered("route fare", &format!("{}/{route_id}", area.code())));
        };
        debug!(pricing = tables.pricing().code(), "Fare schema selected");

        if let Some(destination) = &destination {
            match &tables {
                FareTables::Zonal { .. } => {
                    for (name, table) in tables.tables() {
                        write_text(table, &destination.with_suffix(name))?;
                    }
                }
                FareTables::OriginDestination(table) | FareTables::Staged(table) => {
                    write_text(table, destination)?;
                }
            }
        }
        Ok(tables)
    }

    /// Stations of a rail operator, in the column set of its system.
    #[tracing::instrument(skip_all, fields(operator = %operator))]
    pub fn rail_station(
        &self,
        auth: &AuthHeader,
        operator: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Frame> {
        let operator = reference::operator(operator)?;
        let (mode, destination) = validate_output(mode, destination)?;

        let payload = self.get(auth, &rail_path(operator, "Station"), &[])?;
        let table = rail_station::flatten(
            records(&payload, rail_station::WRAPPER),
            operator.system,
        );
        finish(table, mode, GeometrySource::Point, destination.as_ref())
    }

    /// Line geometries of a rail operator.
    #[tracing::instrument(skip_all, fields(operator = %operator))]
    pub fn rail_shape(
        &self,
        auth: &AuthHeader,
        operator: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Frame> {
        let operator = reference::operator(operator)?;
        let (mode, destination) = validate_output(mode, destination)?;
        if operator.system == RailSystem::Forest {
            return Err(not_offered("rail shape", operator.code));
        }

        let payload = self.get(auth, &rail_path(operator, "Shape"), &[])?;
        let table = rail_shape::flatten(records(&payload, rail_shape::WRAPPER));
        finish(table, mode, GeometrySource::Wkt, destination.as_ref())
    }

    /// Station sequence of every line joined to the line metadata. Columns
    /// with no value in any row are dropped.
    #[tracing::instrument(skip_all, fields(operator = %operator))]
    pub fn rail_station_of_line(
        &self,
        auth: &AuthHeader,
        operator: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Table> {
        let operator = reference::operator(operator)?;
        let destination = validate_text_output("station of line", mode, destination)?;
        if operator.system == RailSystem::HighSpeed {
            return Err(not_offered("station of line", operator.code));
        }

        let sequences = self.get(auth, &rail_path(operator, "StationOfLine"), &[])?;
        let lines = self.get(auth, &rail_path(operator, "Line"), &[])?;
        let table = station_of_line::flatten(
            records(&sequences, station_of_line::STATION_OF_LINE_WRAPPER),
            records(&lines, station_of_line::LINE_WRAPPER),
        );
        finish_table(table, destination.as_ref())
    }

    /// Cycling network of a county, with degenerate line members repaired
    /// before parsing.
    #[tracing::instrument(skip_all, fields(county = %county))]
    pub fn bike_shape(
        &self,
        auth: &AuthHeader,
        county: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Frame> {
        let area = reference::area(county, false)?;
        let (mode, destination) = validate_output(mode, destination)?;

        let payload = self.get(auth, &format!("v2/Cycling/Shape/{}", area.path()), &[])?;
        if reports_no_service(&payload, "") {
            return Err(not_offered("cycling shape", area.code()));
        }
        let table = bike_shape::flatten(records(&payload, ""));
        finish(table, mode, GeometrySource::Wkt, destination.as_ref())
    }

    /// Bike-share stations of a county.
    #[tracing::instrument(skip_all, fields(county = %county))]
    pub fn bike_station(
        &self,
        auth: &AuthHeader,
        county: &str,
        mode: &str,
        destination: Option<&Path>,
    ) -> Result<Frame> {
        let area = reference::area(county, false)?;
        let (mode, destination) = validate_output(mode, destination)?;

        let payload = self.get(auth, &format!("v2/Bike/Station/{}", area.path()), &[])?;
        if reports_no_service(&payload, "") {
            return Err(not_offered("bike station", area.code()));
        }
        let table = bike_station::flatten(records(&payload, ""));
        finish(table, mode, GeometrySource::Point, destination.as_ref())
    }
}

/// Endpoint path for a rail resource. Conventional and forest rail live on
/// version 3; high-speed rail and metros on version 2, metros per operator.
fn rail_path(operator: &Operator, resource: &str) -> String {
    match operator.system {
        RailSystem::Conventional | RailSystem::Forest => {
            format!("v3/Rail/{}/{}", operator.code, resource)
        }
        RailSystem::HighSpeed => format!("v2/Rail/THSR/{resource}"),
        RailSystem::Metro => format!("v2/Rail/Metro/{}/{}", resource, operator.code),
    }
}

fn endpoint(base_url: &str, path: &str, segments: &[&str]) -> Result<Url> {
    let raw = format!("{base_url}/{path}");
    let invalid = |reason: String| TdxError::Unreachable {
        url: raw.clone(),
        reason,
    };
    let mut url = Url::parse(&raw).map_err(|e| invalid(format!("invalid url: {e}")))?;
    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| invalid("url has no path".to_string()))?
            .extend(segments);
    }
    Ok(url)
}

fn not_offered(resource: &'static str, selector: &str) -> TdxError {
    warn!(resource, selector, "Resource not offered");
    TdxError::NotOffered {
        resource,
        selector: selector.to_string(),
    }
}

fn finish_table(table: Table, destination: Option<&Destination>) -> Result<Table> {
    debug!(rows = table.len(), "Flattened");
    if let Some(destination) = destination {
        write_text(&table, destination)?;
    }
    Ok(table)
}

fn finish(
    table: Table,
    mode: OutputMode,
    source: GeometrySource,
    destination: Option<&Destination>,
) -> Result<Frame> {
    debug!(rows = table.len(), mode = %mode, "Flattened");
    let frame = match (mode, source) {
        (OutputMode::Text, _) => Frame::Table(table),
        (OutputMode::Geometry, GeometrySource::Wkt) => {
            Frame::Geo(geometry::from_wkt_column(table, GEOMETRY))
        }
        (OutputMode::Geometry, GeometrySource::Point) => Frame::Geo(geometry::from_point_columns(
            table,
            POSITION_LON,
            POSITION_LAT,
        )),
    };
    if let Some(destination) = destination {
        write_frame(&frame, destination)?;
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockClient;

    fn client(mock: MockClient) -> TdxClient<MockClient> {
        TdxClient::with_client(mock, TdxConfig::default().with_base_url("https://tdx.example.test/api"))
    }

    #[test]
    fn test_rail_paths() {
        let tra = reference::operator("TRA").unwrap();
        let thsr = reference::operator("THSR").unwrap();
        let krtc = reference::operator("KRTC").unwrap();
        assert_eq!(rail_path(tra, "Station"), "v3/Rail/TRA/Station");
        assert_eq!(rail_path(thsr, "Shape"), "v2/Rail/THSR/Shape");
        assert_eq!(rail_path(krtc, "StationOfLine"), "v2/Rail/Metro/StationOfLine/KRTC");
    }

    #[test]
    fn test_forest_rail_shape_not_offered_without_request() {
        let tdx = client(MockClient::new());
        let auth = AuthHeader::from_token("abc");
        let err = tdx.rail_shape(&auth, "AFR", "geometry", None).unwrap_err();
        assert!(matches!(err, TdxError::NotOffered { .. }));
        assert_eq!(tdx.http().calls(), 0);
    }

    #[test]
    fn test_intercity_route_path() {
        let tdx = client(MockClient::new().json("/v2/Bus/Route/InterCity", "[]"));
        let auth = AuthHeader::from_token("abc");
        let table = tdx.bus_route(&auth, "Intercity", "text", None).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), bus_route::COLUMNS);
    }

    #[test]
    fn test_bike_station_message_is_not_offered() {
        let tdx = client(
            MockClient::new().json("/v2/Bike/Station/City/PenghuCounty", r#"{"Message":"no data"}"#),
        );
        let auth = AuthHeader::from_token("abc");
        let err = tdx.bike_station(&auth, "PenghuCounty", "text", None).unwrap_err();
        assert!(matches!(err, TdxError::NotOffered { resource: "bike station", .. }));
    }

    #[test]
    fn test_fare_filter_query() {
        let tdx = client(MockClient::new().json("/v2/Bus/RouteFare/City/Taichung", "[]"));
        let auth = AuthHeader::from_token("abc");
        let err = tdx.bus_route_fare(&auth, "Taichung", "300", "text", None).unwrap_err();
        assert!(matches!(err, TdxError::NotOffered { .. }));
        let url = &tdx.http().requests()[0].url;
        assert!(url.contains("%24filter=RouteID+eq+%27300%27"));
    }

    #[test]
    fn test_fare_filter_escapes_quotes() {
        let tdx = client(MockClient::new().json("/v2/Bus/RouteFare/City/Taichung", "[]"));
        let auth = AuthHeader::from_token("abc");
        let _ = tdx.bus_route_fare(&auth, "Taichung", "307' or RouteID ne '", "text", None);
        let url = &tdx.http().requests()[0].url;
        assert!(url.contains("RouteID+eq+%27307%27%27+or+RouteID+ne+%27%27%27"));
    }

    #[test]
    fn test_travel_time_route_id_stays_one_segment() {
        let tdx = client(MockClient::new().json("/v2/Bus/S2STravelTime/City/Taipei/", "[]"));
        let auth = AuthHeader::from_token("abc");
        tdx.bus_travel_time(&auth, "Taipei", &["../../Rail/TRA/Station?x="][..], "text", None)
            .unwrap();
        let url = &tdx.http().requests()[0].url;
        assert!(url.starts_with(
            "https://tdx.example.test/api/v2/Bus/S2STravelTime/City/Taipei/..%2F..%2FRail%2FTRA%2FStation%3Fx="
        ));
    }

    #[test]
    fn test_dot_route_id_rejected_before_request() {
        let tdx = client(MockClient::new());
        let auth = AuthHeader::from_token("abc");
        let err = tdx
            .bus_travel_time(&auth, "Taipei", &["101", ".."][..], "text", None)
            .unwrap_err();
        assert!(matches!(err, TdxError::InvalidRouteId(_)));
        assert!(err.is_validation());
        assert_eq!(tdx.http().calls(), 0);
    }
}
