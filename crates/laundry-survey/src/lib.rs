//! `laundry-survey` - Field survey of laundry-service establishments
//!
//! This library provides the survey form and its validation, the backend
//! gateways that persist entries and photos, the paged grid view over stored
//! entries, and the Excel export.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod entry;
pub mod error;
pub mod export;
pub mod form;
pub mod gateway;
pub mod geo;
pub mod logging;

pub use config::{BackendKind, Config};
pub use dashboard::{GridPage, GridQuery, GridView};
pub use entry::{Category, SurveyEntry};
pub use error::{Error, Result};
pub use export::{ExportOutcome, ExportTransform};
pub use form::{FormController, SurveyForm, YesNo};
pub use gateway::{connect, Gateway, LocalGateway, MemoryGateway, RestGateway, Row};
pub use geo::{Coordinates, FixedLocator, Geolocator, UnavailableLocator};
pub use logging::init_logging;
