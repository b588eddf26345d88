//! Output-mode and destination validation, done before any request.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::warn;

use crate::error::{Result, TdxError};
use crate::reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Plain table; geometry stays as WKT text or coordinate columns.
    Text,
    /// Geometry column parsed and tagged with WGS84.
    Geometry,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Text => "text",
            OutputMode::Geometry => "geometry",
        }
    }
}

impl FromStr for OutputMode {
    type Err = TdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputMode::Text),
            "geometry" => Ok(OutputMode::Geometry),
            _ => Err(TdxError::InvalidOutputMode(s.to_string())),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    /// Tab separated, chosen by a `.txt` extension.
    Tsv,
    /// `.shp` with its `.shx`, `.dbf` and `.prj` sidecars.
    Shapefile,
    GeoJson,
}

/// A file path whose extension has been checked against the output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: PathBuf,
    pub format: OutputFormat,
}

impl Destination {
    pub fn validate(path: &Path, mode: OutputMode) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let format = match (mode, ext.as_deref()) {
            (OutputMode::Text, Some("csv")) => OutputFormat::Csv,
            (OutputMode::Text, Some("txt")) => OutputFormat::Tsv,
            (OutputMode::Geometry, Some("shp")) => OutputFormat::Shapefile,
            (OutputMode::Geometry, Some("geojson" | "json")) => OutputFormat::GeoJson,
            (OutputMode::Text, _) => return Err(mismatch(mode, path, ".csv or .txt")),
            (OutputMode::Geometry, _) => return Err(mismatch(mode, path, ".shp, .geojson or .json")),
        };
        Ok(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    /// Same directory and extension, with `_{suffix}` appended to the stem.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut name = format!("{stem}_{suffix}");
        if let Some(ext) = self.path.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        Self {
            path: self.path.with_file_name(name),
            format: self.format,
        }
    }
}

fn mismatch(mode: OutputMode, path: &Path, expected: &'static str) -> TdxError {
    TdxError::ExtensionMismatch {
        mode: mode.as_str(),
        path: path.to_path_buf(),
        expected,
    }
}

/// Parses the mode string and checks the optional destination against it.
pub fn validate_output(
    mode: &str,
    destination: Option<&Path>,
) -> Result<(OutputMode, Option<Destination>)> {
    let mode: OutputMode = mode.parse()?;
    let destination = destination
        .map(|p| Destination::validate(p, mode))
        .transpose()?;
    Ok((mode, destination))
}

/// Like [`validate_output`] for resources that carry no geometry: only
/// `text` is accepted.
pub fn validate_text_output(
    resource: &'static str,
    mode: &str,
    destination: Option<&Path>,
) -> Result<Option<Destination>> {
    match validate_output(mode, destination)? {
        (OutputMode::Text, destination) => Ok(destination),
        (OutputMode::Geometry, _) => Err(TdxError::InvalidOutputMode(format!(
            "{mode} ({resource} has no geometry)"
        ))),
    }
}

/// The resource kinds a [`crate::TdxClient`] can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    BusRoute,
    BusShape,
    BusStop,
    TravelTime,
    Schedule,
    RouteFare,
    RailStation,
    RailShape,
    StationOfLine,
    BikeShape,
    BikeStation,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::BusRoute => "bus route",
            Resource::BusShape => "bus shape",
            Resource::BusStop => "stop of route",
            Resource::TravelTime => "travel time",
            Resource::Schedule => "schedule",
            Resource::RouteFare => "route fare",
            Resource::RailStation => "rail station",
            Resource::RailShape => "rail shape",
            Resource::StationOfLine => "station of line",
            Resource::BikeShape => "cycling shape",
            Resource::BikeStation => "bike station",
        }
    }

    fn has_geometry(&self) -> bool {
        matches!(
            self,
            Resource::BusShape
                | Resource::BusStop
                | Resource::RailStation
                | Resource::RailShape
                | Resource::BikeShape
                | Resource::BikeStation
        )
    }

    /// Runs the selector, mode and destination checks the matching client
    /// call makes before its first request, so a caller can reject bad input
    /// without a token.
    pub fn check(&self, selector: &str, mode: &str, destination: Option<&Path>) -> Result<()> {
        match self {
            Resource::RailStation | Resource::RailShape | Resource::StationOfLine => {
                reference::operator(selector)?;
            }
            Resource::BikeShape | Resource::BikeStation => {
                reference::area(selector, false)?;
            }
            _ => {
                reference::area(selector, true)?;
            }
        }
        if self.has_geometry() {
            validate_output(mode, destination)?;
        } else {
            validate_text_output(self.name(), mode, destination)?;
        }
        Ok(())
    }
}

/// Checks a route id before it is placed in a URL path or filter.
pub fn validate_route_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || id.chars().any(char::is_control) {
        warn!(route_id = id, "Invalid route id");
        return Err(TdxError::InvalidRouteId(id.to_string()));
    }
    Ok(id)
}

/// Quotes `value` as an OData string literal, doubling embedded quotes.
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
