//! Client for the TDX transport open-data platform that reshapes its nested
//! JSON resources (bus routes, shapes, stops, travel times, schedules and
//! fares; rail stations, shapes and line sequences; cycling routes and
//! bike-share stations) into flat tables, optionally with parsed geometry.

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod geometry;
pub mod output;
pub mod parser;
pub mod reference;
pub mod request;
pub mod resources;
pub mod table;

pub use client::TdxClient;
pub use config::TdxConfig;
pub use error::{Result, TdxError};
pub use fetch::auth::AuthHeader;
pub use reference::{county_codes, operator_codes, road_classes};
pub use request::OutputMode;
pub use resources::fare::{FarePricing, FareTables};
pub use table::{Cell, Crs, Frame, GeoTable, Table};
