use crate::series::error::SeriesError;
use crate::stations::error::RegistryError;
use crate::types::station::Registry;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpotclimError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("Target coordinates ({lat}, {lon}) are not usable")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Target elevation {elevation_ft} ft is not usable")]
    InvalidElevation { elevation_ft: f64 },

    #[error(
        "No usable {registry} station data near ({lat}, {lon}), {stations_tried} stations tried"
    )]
    NoStationsAvailable {
        registry: Registry,
        lat: f64,
        lon: f64,
        stations_tried: usize,
        #[source]
        last_error: Option<Box<SpotclimError>>,
    },

    #[error("Station distances for the {registry} registry collapse to zero and cannot be weighted")]
    DegenerateDistance { registry: Registry },

    #[error("Only {valid_days} valid days in the requested period, {required} required")]
    InsufficientHistory { valid_days: usize, required: usize },

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
