mod adjust;
mod blend;
mod classify;
mod derive;
mod engine;
mod error;
mod gapfill;
mod series;
mod stations;
mod summarize;
mod types;
mod utils;

pub use error::SpotclimError;
pub use engine::*;

pub use types::config::{Period, ProfileConfig, RegionCutover};
pub use types::observation::*;
pub use types::report::*;
pub use types::station::*;

pub use gapfill::{
    ConditionsEstimate, GapPredictor, LinearCoefficients, LinearGapModel, PrimaryFeatures,
};

pub use series::archive::ArchiveSeries;
pub use series::provider::{DailySeries, DailySeriesProvider, SeriesOutcome};
pub use stations::registry::{distance_miles, CatalogFile, StationIndex, StationRegistryProvider};
pub use stations::select::{WeightedStation, WeightedStationSet};

pub use series::error::SeriesError;
pub use stations::error::RegistryError;
