//! Concurrent station loading with the propagate-and-degrade policy.
//!
//! All selected stations of one registry are fetched through a single
//! provider with bounded concurrency and a per-station deadline. Failures
//! and timeouts drop the station from the blend instead of aborting the
//! request; the caller re-normalizes weights over the survivors and only
//! treats an empty survivor set as fatal.

use crate::series::error::SeriesError;
use crate::series::provider::{DailySeries, DailySeriesProvider, SeriesOutcome};
use crate::stations::select::WeightedStationSet;
use crate::types::config::Period;
use crate::types::station::{Registry, StationRecord};
use futures_util::{stream, StreamExt};
use log::{info, warn};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::timeout;

/// One station that loaded successfully, with its typed series.
#[derive(Debug, Clone)]
pub struct LoadedStation {
    pub station: StationRecord,
    pub series: DailySeries,
}

/// Outcome of loading every selected station of one registry.
#[derive(Debug)]
pub struct RegistryLoad {
    pub registry: Registry,
    pub stations_tried: usize,
    /// Survivors in selection (ascending distance) order.
    pub loaded: Vec<LoadedStation>,
    /// Stations the provider had no archive entry for.
    pub no_data: Vec<String>,
    /// Load errors, including per-station timeouts.
    pub failures: Vec<SeriesError>,
}

impl RegistryLoad {
    /// Codes of the stations that survived, for weight renormalization.
    pub fn surviving_codes(&self) -> HashSet<String> {
        self.loaded
            .iter()
            .map(|entry| entry.station.code())
            .collect()
    }
}

/// Fetches every station in `set` through `provider`, at most `concurrency`
/// in flight, each bounded by `load_timeout`.
pub async fn load_registry(
    provider: &dyn DailySeriesProvider,
    set: &WeightedStationSet,
    period: Period,
    concurrency: usize,
    load_timeout: Duration,
) -> RegistryLoad {
    let fetches = set.rows().iter().enumerate().map(|(index, row)| {
        let station = row.station.clone();
        async move {
            let outcome = timeout(load_timeout, provider.fetch(&station, period)).await;
            (index, station, outcome)
        }
    });

    let mut results: Vec<_> = stream::iter(fetches)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    // buffer_unordered yields in completion order; restore selection order.
    results.sort_by_key(|(index, _, _)| *index);

    let mut load = RegistryLoad {
        registry: set.registry(),
        stations_tried: set.len(),
        loaded: Vec::with_capacity(results.len()),
        no_data: vec![],
        failures: vec![],
    };

    for (_, station, outcome) in results {
        match outcome {
            Err(_) => {
                warn!(
                    "Dropping station {} from the {} blend: load exceeded {} s",
                    station.code(),
                    load.registry,
                    load_timeout.as_secs()
                );
                load.failures.push(SeriesError::LoadTimeout {
                    station: station.code(),
                    seconds: load_timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                warn!(
                    "Dropping station {} from the {} blend: {}",
                    station.code(),
                    load.registry,
                    e
                );
                load.failures.push(e);
            }
            Ok(Ok(SeriesOutcome::NoData)) => {
                info!(
                    "Station {} has no {} archive entry",
                    station.code(),
                    load.registry
                );
                load.no_data.push(station.code());
            }
            Ok(Ok(SeriesOutcome::Loaded(series))) => {
                load.loaded.push(LoadedStation { station, series });
            }
        }
    }
    load
}
