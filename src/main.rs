//! CLI entry point for tdx_flatten.
//!
//! Checks the selector and output arguments, acquires an access token from
//! `TDX_APP_ID`/`TDX_APP_KEY`, fetches one resource kind and writes the
//! flattened result to the given file.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tdx_flatten::request::{Resource, validate_route_id};
use tdx_flatten::{
    AuthHeader, FareTables, Frame, TdxClient, TdxConfig, TdxError, county_codes, operator_codes,
    road_classes,
};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "tdx_flatten")]
#[command(about = "Fetch TDX transport resources as flat tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Selector, output mode and destination shared by every resource command.
#[derive(clap::Args)]
struct Target {
    /// County/city code (or Intercity) for bus resources, operator code for rail
    #[arg(value_name = "SELECTOR")]
    selector: String,

    /// Output mode: text or geometry
    #[arg(short, long, default_value = "text")]
    mode: String,

    /// File to write (.csv/.txt for text, .shp/.geojson/.json for geometry)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configured credentials yield an access token
    Token,
    /// List the valid county, operator and road class codes
    Codes,
    /// Bus routes, one row per sub-route
    BusRoute(Target),
    /// Bus route shapes
    BusShape(Target),
    /// Stops of every bus sub-route
    BusStop(Target),
    /// Stop-to-stop travel times for the given routes
    TravelTime {
        #[command(flatten)]
        target: Target,

        /// Route ids, fetched in order
        #[arg(long = "route", required = true, num_args = 1..)]
        routes: Vec<String>,
    },
    /// Frequency and timetable schedules
    Schedule(Target),
    /// Fares of one bus route
    Fare {
        #[command(flatten)]
        target: Target,

        /// Route id
        #[arg(long = "route")]
        route: String,
    },
    /// Stations of a rail operator
    RailStation(Target),
    /// Line shapes of a rail operator
    RailShape(Target),
    /// Station sequences of a rail operator's lines
    StationOfLine(Target),
    /// Cycling network of a county
    BikeShape(Target),
    /// Bike-share stations of a county
    BikeStation(Target),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/tdx_flatten.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("tdx_flatten.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    if let Commands::Codes = cli.command {
        print_codes();
        return Ok(());
    }

    if let Err(e) = check_arguments(&cli.command) {
        error!(error = %e, "Invalid arguments, no request sent");
        return Err(e.into());
    }

    let client = TdxClient::new(TdxConfig::from_env())?;
    info!(base_url = %client.config().base_url, "Using TDX endpoint");
    let auth = token(&client)?;

    let outcome = match cli.command {
        Commands::Token | Commands::Codes => {
            info!("Access token acquired");
            return Ok(());
        }
        Commands::BusRoute(t) => client
            .bus_route(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|table| table.len()),
        Commands::BusShape(t) => client
            .bus_shape(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|frame| frame_rows(&frame)),
        Commands::BusStop(t) => client
            .bus_stop_of_route(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|frame| frame_rows(&frame)),
        Commands::TravelTime { target: t, routes } => client
            .bus_travel_time(&auth, &t.selector, routes.as_slice(), &t.mode, t.out.as_deref())
            .map(|table| table.len()),
        Commands::Schedule(t) => client
            .bus_schedule(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|table| table.len()),
        Commands::Fare { target: t, route } => client
            .bus_route_fare(&auth, &t.selector, &route, &t.mode, t.out.as_deref())
            .map(|tables| fare_rows(&tables)),
        Commands::RailStation(t) => client
            .rail_station(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|frame| frame_rows(&frame)),
        Commands::RailShape(t) => client
            .rail_shape(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|frame| frame_rows(&frame)),
        Commands::StationOfLine(t) => client
            .rail_station_of_line(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|table| table.len()),
        Commands::BikeShape(t) => client
            .bike_shape(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|frame| frame_rows(&frame)),
        Commands::BikeStation(t) => client
            .bike_station(&auth, &t.selector, &t.mode, t.out.as_deref())
            .map(|frame| frame_rows(&frame)),
    };

    match outcome {
        Ok(rows) => info!(rows, "Done"),
        Err(e) if e.is_recoverable() => warn!(error = %e, "Nothing written"),
        Err(e) if e.is_validation() => {
            error!(error = %e, "Invalid arguments");
            return Err(e.into());
        }
        Err(e) => {
            error!(error = %e, "Request failed");
            return Err(e.into());
        }
    }
    Ok(())
}

/// Rejects a bad selector, mode, destination or route id before any token
/// or resource request is made.
fn check_arguments(command: &Commands) -> tdx_flatten::Result<()> {
    let (resource, target) = match command {
        Commands::Token | Commands::Codes => return Ok(()),
        Commands::BusRoute(t) => (Resource::BusRoute, t),
        Commands::BusShape(t) => (Resource::BusShape, t),
        Commands::BusStop(t) => (Resource::BusStop, t),
        Commands::TravelTime { target, routes } => {
            for route in routes {
                validate_route_id(route)?;
            }
            (Resource::TravelTime, target)
        }
        Commands::Schedule(t) => (Resource::Schedule, t),
        Commands::Fare { target, route } => {
            validate_route_id(route)?;
            (Resource::RouteFare, target)
        }
        Commands::RailStation(t) => (Resource::RailStation, t),
        Commands::RailShape(t) => (Resource::RailShape, t),
        Commands::StationOfLine(t) => (Resource::StationOfLine, t),
        Commands::BikeShape(t) => (Resource::BikeShape, t),
        Commands::BikeStation(t) => (Resource::BikeStation, t),
    };
    resource.check(&target.selector, &target.mode, target.out.as_deref())
}

/// Reads the application credentials and exchanges them for a bearer header.
fn token(client: &TdxClient) -> Result<AuthHeader> {
    let app_id = std::env::var("TDX_APP_ID").context("TDX_APP_ID must be set")?;
    let app_key = std::env::var("TDX_APP_KEY").context("TDX_APP_KEY must be set")?;
    client
        .acquire_token(&app_id, &app_key)
        .inspect_err(|e: &TdxError| error!(error = %e, "Could not acquire access token"))
        .context("token acquisition failed")
}

fn frame_rows(frame: &Frame) -> usize {
    tdx_flatten::output::print_summary(frame);
    frame.len()
}

fn fare_rows(tables: &FareTables) -> usize {
    for (name, table) in tables.tables() {
        info!(table = name, rows = table.len(), "Fare table");
    }
    tables.tables().iter().map(|(_, t)| t.len()).sum()
}

fn print_codes() {
    for county in county_codes() {
        println!("county\t{}\t{}\t{}", county.code, county.name_zh, county.name_en);
    }
    println!("county\t{}\t公路客運\tIntercity", tdx_flatten::reference::INTERCITY);
    for op in operator_codes() {
        println!("operator\t{}\t{}\t{}", op.code, op.name_zh, op.name_en);
    }
    for class in road_classes() {
        println!("road_class\t{}\t{}\t{}", class.code, class.name_zh, class.name_en);
    }
}
