//! The loader contract a station series source has to satisfy.

use crate::series::error::SeriesError;
use crate::types::config::Period;
use crate::types::observation::{PrimaryDay, SecondaryDay};
use crate::types::station::StationRecord;
use async_trait::async_trait;

/// Daily rows for one station, typed by its registry.
#[derive(Debug, Clone)]
pub enum DailySeries {
    Primary(Vec<PrimaryDay>),
    Secondary(Vec<SecondaryDay>),
}

impl DailySeries {
    pub fn len(&self) -> usize {
        match self {
            DailySeries::Primary(rows) => rows.len(),
            DailySeries::Secondary(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of asking a provider for one station's series.
///
/// `NoData` means the source has nothing at all for that station; it is kept
/// distinct from `Loaded` with an empty row set, which means the station
/// exists but recorded nothing inside the requested period.
#[derive(Debug, Clone)]
pub enum SeriesOutcome {
    Loaded(DailySeries),
    NoData,
}

/// Source of daily observations, one station at a time.
///
/// Implementations must be shareable across concurrent loads; the engine
/// fetches up to `load_concurrency` stations at once against a single
/// provider instance.
#[async_trait]
pub trait DailySeriesProvider: Send + Sync {
    async fn fetch(
        &self,
        station: &StationRecord,
        period: Period,
    ) -> Result<SeriesOutcome, SeriesError>;
}
