//! Wires the client to hand-rolled providers instead of a local archive.
//! The same pattern fits a database-backed registry or an object store of
//! daily series.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use spotclim::{
    DailySeries, DailySeriesProvider, Period, PrimaryDay, Registry, RegistryError, SecondaryDay,
    SeriesError, SeriesOutcome, Spotclim, SpotclimError, StationRecord, StationRegistryProvider,
    Variable,
};
use std::sync::Arc;

struct InMemoryRegistry;

#[async_trait]
impl StationRegistryProvider for InMemoryRegistry {
    async fn load(&self, registry: Registry) -> Result<Vec<StationRecord>, RegistryError> {
        let records = match registry {
            Registry::Primary => vec![
                record(registry, "P1", 39.8, -104.9, 5300.0),
                record(registry, "P2", 39.6, -105.0, 5600.0),
            ],
            Registry::Secondary => vec![record(registry, "S1", 39.75, -104.95, 5400.0)],
        };
        Ok(records)
    }
}

fn record(registry: Registry, id: &str, lat: f64, lon: f64, elevation_ft: f64) -> StationRecord {
    StationRecord {
        provider: "DEMO".to_string(),
        id: id.to_string(),
        name: None,
        latitude: lat,
        longitude: lon,
        elevation_ft,
        registry,
    }
}

/// A smooth seasonal cycle standing in for real observations.
struct SineSeries;

#[async_trait]
impl DailySeriesProvider for SineSeries {
    async fn fetch(
        &self,
        station: &StationRecord,
        period: Period,
    ) -> Result<SeriesOutcome, SeriesError> {
        let series = match station.registry {
            Registry::Primary => DailySeries::Primary(
                period
                    .days()
                    .map(|date| {
                        let s = season(date);
                        PrimaryDay {
                            date,
                            high_temp: Some(62.0 + 26.0 * s),
                            low_temp: Some(38.0 + 26.0 * s),
                            precipitation: Some(0.06 + 0.02 * s),
                            snowfall: None,
                        }
                    })
                    .collect(),
            ),
            Registry::Secondary => DailySeries::Secondary(
                period
                    .days()
                    .map(|date| SecondaryDay {
                        date,
                        wind_direction: Some(200.0),
                        wind_speed: Some(8.0),
                        wind_gust: Some(19.0),
                        sunshine_pct: Some(60.0 + 20.0 * season(date)),
                    })
                    .collect(),
            ),
        };
        Ok(SeriesOutcome::Loaded(series))
    }
}

fn season(date: NaiveDate) -> f64 {
    -(std::f64::consts::TAU * date.ordinal() as f64 / 365.0).cos()
}

#[tokio::main]
async fn main() -> Result<(), SpotclimError> {
    env_logger::init();

    let client = Spotclim::with_providers()
        .stations(Arc::new(InMemoryRegistry))
        .series(Arc::new(SineSeries))
        .call();

    let report = client
        .profile()
        .latitude(39.7)
        .longitude(-104.9)
        .elevation_ft(5280.0)
        .period(Period::new(
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        ))
        .call()
        .await?;

    println!(
        "classified {} ({}), zone {}",
        report.location.koppen_code, report.location.koppen_label, report.location.hardiness_zone
    );
    if let Some(mean) = report.variable(Variable::MeanTemp) {
        println!("monthly mean temps: {:?}", mean.monthly);
    }
    if let Some(comfort) = report.variable(Variable::ComfortIndex) {
        println!("annual comfort: {:?}", comfort.annual);
    }

    Ok(())
}
