//! Persistence of flattened results.
//!
//! Text tables go to CSV (or tab-separated `.txt`) without an index column.
//! Geometry tables go to a shapefile set with a `.prj` sidecar, or to a
//! GeoJSON FeatureCollection; both carry their CRS.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use csv::WriterBuilder;
use geo_types::{Geometry, LineString};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde_json::json;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::record::EsriShape;
use shapefile::{Polyline, Writer};
use tracing::{debug, info, warn};

use crate::error::{Result, TdxError};
use crate::request::{Destination, OutputFormat};
use crate::table::{Cell, Frame, GeoTable, Table};

/// dBase field names hold at most ten characters.
const DBF_NAME_LEN: usize = 10;
/// Byte width of every attribute field; dBase caps character fields here.
const DBF_TEXT_LEN: u8 = 254;

/// Logs the shape of a frame at debug level.
pub fn print_summary(frame: &Frame) {
    debug!(
        rows = frame.len(),
        columns = ?frame.table().columns(),
        geometry = frame.as_geo().is_some(),
        "Frame summary"
    );
}

/// Writes `frame` to `destination` in the format its extension selected.
pub fn write_frame(frame: &Frame, destination: &Destination) -> Result<()> {
    match (frame, destination.format) {
        (Frame::Geo(geo), OutputFormat::GeoJson) => write_geojson(&destination.path, geo),
        (Frame::Geo(geo), OutputFormat::Shapefile) => write_shapefile(&destination.path, geo),
        (frame, _) => write_text(frame.table(), destination),
    }
}

/// Writes a plain table as CSV or, for `.txt` destinations, tab separated.
pub fn write_text(table: &Table, destination: &Destination) -> Result<()> {
    write_table(&destination.path, table, delimiter(destination.format))
}

fn delimiter(format: OutputFormat) -> u8 {
    match format {
        OutputFormat::Tsv => b'\t',
        _ => b',',
    }
}

/// Writes a header row followed by every data row, replacing any existing file.
pub fn write_table(path: &Path, table: &Table, delimiter: u8) -> Result<()> {
    debug!(path = %path.display(), rows = table.len(), "Writing table");
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(File::create(path)?);

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = table.len(), "Table written");
    Ok(())
}

/// Writes one feature per row, with the attribute cells as properties.
pub fn write_geojson(path: &Path, geo: &GeoTable) -> Result<()> {
    let columns = geo.table.columns();
    let features = geo
        .table
        .rows()
        .iter()
        .zip(&geo.geometry)
        .map(|(row, geometry)| {
            let properties: JsonObject = columns
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.clone(), cell.to_json()))
                .collect();
            Feature {
                bbox: None,
                geometry: geometry
                    .as_ref()
                    .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut crs = JsonObject::new();
    crs.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": geo.crs.urn() } }),
    );

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs),
    };
    std::fs::write(path, GeoJson::from(collection).to_string())?;

    info!(path = %path.display(), features = geo.len(), "GeoJSON written");
    Ok(())
}

/// Writes the `.shp`/`.shx`/`.dbf` set next to `path` plus a `.prj` with the
/// table's CRS. Attributes become character fields under names shortened to
/// the dBase limit.
///
/// A shapefile holds one shape type: points, or polylines for line and
/// multi-line geometries. Rows without a geometry are left out.
pub fn write_shapefile(path: &Path, geo: &GeoTable) -> Result<()> {
    let names = dbf_field_names(geo.table.columns());
    let mut fields = TableWriterBuilder::new();
    for name in &names {
        let field = FieldName::try_from(name.as_str())
            .map_err(|e| TdxError::Shapefile(format!("field name {name}: {e:?}")))?;
        fields = fields.add_character_field(field, DBF_TEXT_LEN);
    }

    let rows: Vec<(&Vec<Cell>, &Geometry<f64>)> = geo
        .table
        .rows()
        .iter()
        .zip(&geo.geometry)
        .filter_map(|(row, geometry)| Some((row, geometry.as_ref()?)))
        .collect();
    let skipped = geo.len() - rows.len();
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "Rows without geometry left out of shapefile");
    }

    let mut writer = Writer::from_path(path, fields).map_err(shapefile_error)?;
    match rows.first().map(|(_, geometry)| *geometry) {
        Some(Geometry::Point(_)) => write_shapes(&mut writer, &names, &rows, as_point)?,
        Some(_) => write_shapes(&mut writer, &names, &rows, as_polyline)?,
        None => {}
    }
    drop(writer);

    if let Some(prj) = geo.crs.esri_wkt() {
        std::fs::write(path.with_extension("prj"), prj)?;
    }

    info!(path = %path.display(), shapes = rows.len(), "Shapefile written");
    Ok(())
}

fn write_shapes<W, S>(
    writer: &mut Writer<W>,
    names: &[String],
    rows: &[(&Vec<Cell>, &Geometry<f64>)],
    convert: fn(&Geometry<f64>) -> Option<S>,
) -> Result<()>
where
    W: Write + Seek,
    S: EsriShape,
{
    for (row, geometry) in rows {
        let shape = convert(geometry).ok_or_else(|| {
            TdxError::Shapefile(format!("cannot mix {} into one shapefile", kind(geometry)))
        })?;
        writer
            .write_shape_and_record(&shape, &dbf_record(names, row))
            .map_err(shapefile_error)?;
    }
    Ok(())
}

fn as_point(geometry: &Geometry<f64>) -> Option<shapefile::Point> {
    match geometry {
        Geometry::Point(p) => Some(shapefile::Point::new(p.x(), p.y())),
        _ => None,
    }
}

fn as_polyline(geometry: &Geometry<f64>) -> Option<Polyline> {
    let lines: Vec<&LineString<f64>> = match geometry {
        Geometry::LineString(line) => vec![line],
        Geometry::MultiLineString(lines) => lines.0.iter().collect(),
        _ => return None,
    };
    let parts: Vec<Vec<shapefile::Point>> = lines
        .into_iter()
        .map(|line| {
            line.coords()
                .map(|c| shapefile::Point::new(c.x, c.y))
                .collect::<Vec<_>>()
        })
        .filter(|part| part.len() >= 2)
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(Polyline::with_parts(parts))
}

fn kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "point",
        Geometry::LineString(_) | Geometry::MultiLineString(_) => "line",
        _ => "unsupported geometry",
    }
}

fn shapefile_error(err: shapefile::Error) -> TdxError {
    TdxError::Shapefile(err.to_string())
}

/// Column names cut to the dBase limit, made unique with a numeric suffix.
fn dbf_field_names(columns: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let base: String = column.chars().take(DBF_NAME_LEN).collect();
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            let suffix = n.to_string();
            let stem: String = base.chars().take(DBF_NAME_LEN - suffix.len()).collect();
            name = format!("{stem}{suffix}");
            n += 1;
        }
        names.push(name);
    }
    names
}

fn dbf_record(names: &[String], row: &[Cell]) -> Record {
    let mut record = Record::default();
    for (name, cell) in names.iter().zip(row) {
        let value = (!cell.is_null()).then(|| clip(cell.to_string(), DBF_TEXT_LEN as usize));
        record.insert(name.clone(), FieldValue::Character(value));
    }
    record
}

fn clip(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
