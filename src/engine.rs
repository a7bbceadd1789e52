//! This module provides the main entry point for resolving climate profiles.
//! A profile request takes a coordinate and elevation, interpolates the
//! surrounding station histories, and reduces them to a [`ClimateReport`].

use crate::adjust::ElevationAdjuster;
use crate::blend::{self, WeightedSeries};
use crate::classify::{hardiness, koppen};
use crate::derive::indices::IndexCalculator;
use crate::error::SpotclimError;
use crate::gapfill::{self, GapPredictor, LinearGapModel};
use crate::series::archive::ArchiveSeries;
use crate::series::load::{load_registry, RegistryLoad};
use crate::series::provider::{DailySeries, DailySeriesProvider};
use crate::stations::registry::{CatalogFile, StationIndex, StationRegistryProvider};
use crate::stations::select::WeightedStationSet;
use crate::summarize::summarize;
use crate::types::config::{Period, ProfileConfig};
use crate::types::observation::{PrimaryDay, SecondaryDay};
use crate::types::report::{ClimateReport, LocationReport, Variable, VariableSummary};
use crate::types::station::Registry;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Climate-profile client over a daily-observation archive.
///
/// The client owns three read-only resources: a station-registry provider, a
/// daily-series provider and a gap predictor. All of them are safe to share;
/// one client can serve any number of concurrent [`profile`](Spotclim::profile)
/// calls.
///
/// Create an instance with [`Spotclim::from_archive`] to read a local archive
/// directory, or wire up custom providers with [`Spotclim::with_providers`].
///
/// # Examples
///
/// ```rust
/// # use spotclim::{Spotclim, SpotclimError};
/// # async fn run() -> Result<(), SpotclimError> {
/// let client = Spotclim::from_archive("/data/climate-archive").await?;
/// let report = client
///     .profile()
///     .latitude(39.7)
///     .longitude(-104.9)
///     .elevation_ft(5280.0)
///     .call()
///     .await?;
/// println!("{} ({})", report.location.koppen_code, report.location.hardiness_zone);
/// # Ok(())
/// # }
/// ```
pub struct Spotclim {
    stations: Arc<dyn StationRegistryProvider>,
    series: Arc<dyn DailySeriesProvider>,
    predictor: Arc<dyn GapPredictor>,
    config: ProfileConfig,
}

#[bon]
impl Spotclim {
    /// Creates a client reading station catalogs and daily series from a
    /// local archive directory, with the default configuration.
    ///
    /// Parquet conversions of the archive are cached under the system cache
    /// directory, which is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`SpotclimError::CacheDirResolution`] if the system cache
    /// directory cannot be determined, or [`SpotclimError::CacheDirCreation`]
    /// if it cannot be created.
    pub async fn from_archive(archive_dir: impl Into<PathBuf>) -> Result<Self, SpotclimError> {
        Self::from_archive_with(archive_dir, ProfileConfig::default()).await
    }

    /// Creates a client over a local archive with an explicit configuration.
    ///
    /// ```rust
    /// # use spotclim::{ProfileConfig, Spotclim, SpotclimError};
    /// # async fn run() -> Result<(), SpotclimError> {
    /// let config = ProfileConfig::builder()
    ///     .primary_station_count(4)
    ///     .max_distance_miles(150.0)
    ///     .build();
    /// let client = Spotclim::from_archive_with("/data/climate-archive", config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_archive_with(
        archive_dir: impl Into<PathBuf>,
        config: ProfileConfig,
    ) -> Result<Self, SpotclimError> {
        let archive_dir = archive_dir.into();
        let cache_dir = get_cache_dir().map_err(SpotclimError::CacheDirResolution)?;
        ensure_cache_dir_exists(&cache_dir)
            .await
            .map_err(|e| SpotclimError::CacheDirCreation(cache_dir.clone(), e))?;
        Ok(Self {
            stations: Arc::new(CatalogFile::new(archive_dir.clone(), cache_dir.clone())),
            series: Arc::new(ArchiveSeries::new(archive_dir, cache_dir)),
            predictor: Arc::new(LinearGapModel::default()),
            config,
        })
    }

    /// Assembles a client from injected providers.
    ///
    /// This is the constructor for anything that is not a plain local
    /// archive: registries served from a database, series from an object
    /// store, or a gap model trained on different station pairs. Omitted
    /// parts fall back to the built-in gap model and default configuration.
    #[builder]
    pub fn with_providers(
        stations: Arc<dyn StationRegistryProvider>,
        series: Arc<dyn DailySeriesProvider>,
        predictor: Option<Arc<dyn GapPredictor>>,
        config: Option<ProfileConfig>,
    ) -> Self {
        Self {
            stations,
            series,
            predictor: predictor.unwrap_or_else(|| Arc::new(LinearGapModel::default())),
            config: config.unwrap_or_default(),
        }
    }

    /// Resolves the climate profile for one target point.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.latitude(f64)`: **Required.** Decimal degrees, positive north.
    /// * `.longitude(f64)`: **Required.** Decimal degrees, positive east.
    /// * `.elevation_ft(f64)`: **Required.** Target elevation in feet.
    /// * `.period(Period)`: Date window to profile; defaults to the
    ///   configured period (the 1991-2020 normals unless overridden).
    ///
    /// # Errors
    ///
    /// Returns [`SpotclimError::InvalidCoordinates`] or
    /// [`SpotclimError::InvalidElevation`] for malformed targets, checked
    /// before any station lookup. Returns
    /// [`SpotclimError::NoStationsAvailable`] when a registry has no usable
    /// station, carrying the last load error when one exists. Returns
    /// [`SpotclimError::InsufficientHistory`] when too few valid days remain
    /// to aggregate meaningfully.
    #[builder]
    pub async fn profile(
        &self,
        latitude: f64,
        longitude: f64,
        elevation_ft: f64,
        period: Option<Period>,
    ) -> Result<ClimateReport, SpotclimError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(SpotclimError::InvalidCoordinates {
                lat: latitude,
                lon: longitude,
            });
        }
        if !elevation_ft.is_finite() {
            return Err(SpotclimError::InvalidElevation { elevation_ft });
        }
        let period = period.unwrap_or(self.config.period);

        let (primary_catalog, secondary_catalog) = tokio::join!(
            self.stations.load(Registry::Primary),
            self.stations.load(Registry::Secondary)
        );
        let primary_index = StationIndex::build(Registry::Primary, primary_catalog?);
        let secondary_index = StationIndex::build(Registry::Secondary, secondary_catalog?);

        let primary_set = self.select_stations(&primary_index, latitude, longitude)?;
        let secondary_set = self.select_stations(&secondary_index, latitude, longitude)?;
        info!(
            "Selected {} primary and {} secondary stations near ({latitude}, {longitude})",
            primary_set.len(),
            secondary_set.len()
        );

        let (primary_load, secondary_load) = tokio::join!(
            load_registry(
                self.series.as_ref(),
                &primary_set,
                period,
                self.config.load_concurrency,
                self.config.load_timeout,
            ),
            load_registry(
                self.series.as_ref(),
                &secondary_set,
                period,
                self.config.load_concurrency,
                self.config.load_timeout,
            )
        );
        let primary_load = require_survivors(primary_load, latitude, longitude)?;
        let secondary_load = require_survivors(secondary_load, latitude, longitude)?;

        let primary_set = primary_set.renormalized_to(&primary_load.surviving_codes());
        let secondary_set = secondary_set.renormalized_to(&secondary_load.surviving_codes());
        let primary_elevation = primary_set.weighted_mean_elevation();
        let secondary_elevation = secondary_set.weighted_mean_elevation();

        let adjuster = ElevationAdjuster::new(elevation_ft);
        let primary_merged =
            blend::merge_primary(&weighted_primary(primary_load, &primary_set, &adjuster));
        let secondary_merged =
            blend::merge_secondary(&weighted_secondary(secondary_load, &secondary_set));
        let mut days = blend::assemble_calendar(period, &primary_merged, &secondary_merged);

        let cutover = self.config.cutover_for(latitude, longitude);
        gapfill::fill_conditions(&mut days, self.predictor.as_ref(), cutover);
        gapfill::predict_dewpoint(&mut days, self.predictor.as_ref());
        for day in &mut days {
            adjuster.adjust_merged(day, primary_elevation, secondary_elevation);
        }
        IndexCalculator::new(latitude, elevation_ft).derive(&mut days);

        let valid_days = days.iter().filter(|d| d.mean_temp.is_some()).count();
        if valid_days < self.config.min_valid_days {
            return Err(SpotclimError::InsufficientHistory {
                valid_days,
                required: self.config.min_valid_days,
            });
        }

        let variables = summarize(&days, self.config.min_valid_days);
        let koppen = koppen::classify(
            &monthly_array(variables.get(&Variable::MeanTemp)),
            &monthly_array(variables.get(&Variable::Precipitation)),
        );
        let annual_min = variables
            .get(&Variable::LowTemp)
            .and_then(|s| s.expected_annual_min)
            .unwrap_or(f64::NAN);

        Ok(ClimateReport {
            location: LocationReport {
                latitude,
                longitude,
                elevation_ft,
                koppen_code: koppen.code,
                koppen_label: koppen.label,
                hardiness_zone: hardiness::hardiness_zone(annual_min).to_string(),
            },
            dates: period.days().collect(),
            variables,
        })
    }

    /// Ranks and weights the nearest stations of one registry.
    fn select_stations(
        &self,
        index: &StationIndex,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeightedStationSet, SpotclimError> {
        let registry = index.registry();
        let (count, power) = match registry {
            Registry::Primary => (
                self.config.primary_station_count,
                self.config.primary_weight_power,
            ),
            Registry::Secondary => (
                self.config.secondary_station_count,
                self.config.secondary_weight_power,
            ),
        };
        let ranked = index.nearest(latitude, longitude, count, self.config.max_distance_miles);
        if ranked.is_empty() {
            return Err(SpotclimError::NoStationsAvailable {
                registry,
                lat: latitude,
                lon: longitude,
                stations_tried: 0,
                last_error: None,
            });
        }
        WeightedStationSet::build(registry, ranked, power, self.config.min_distance_miles)
    }
}

/// Fails the request when a registry load left no survivor at all, keeping
/// the last load error for diagnosis.
fn require_survivors(
    load: RegistryLoad,
    lat: f64,
    lon: f64,
) -> Result<RegistryLoad, SpotclimError> {
    if load.loaded.is_empty() {
        let last_error = load
            .failures
            .into_iter()
            .next_back()
            .map(|e| Box::new(SpotclimError::from(e)));
        return Err(SpotclimError::NoStationsAvailable {
            registry: load.registry,
            lat,
            lon,
            stations_tried: load.stations_tried,
            last_error,
        });
    }
    Ok(load)
}

/// Pairs each surviving primary series with its renormalized weight, lapsing
/// temperatures against that station's own elevation on the way in.
fn weighted_primary(
    load: RegistryLoad,
    set: &WeightedStationSet,
    adjuster: &ElevationAdjuster,
) -> Vec<WeightedSeries<PrimaryDay>> {
    let weights: HashMap<String, f64> = set
        .rows()
        .iter()
        .map(|row| (row.station.code(), row.weight))
        .collect();
    load.loaded
        .into_iter()
        .filter_map(|entry| {
            let weight = *weights.get(&entry.station.code())?;
            let DailySeries::Primary(mut days) = entry.series else {
                return None;
            };
            for day in &mut days {
                adjuster.lapse_temperatures(day, entry.station.elevation_ft);
            }
            Some(WeightedSeries { weight, days })
        })
        .collect()
}

fn weighted_secondary(
    load: RegistryLoad,
    set: &WeightedStationSet,
) -> Vec<WeightedSeries<SecondaryDay>> {
    let weights: HashMap<String, f64> = set
        .rows()
        .iter()
        .map(|row| (row.station.code(), row.weight))
        .collect();
    load.loaded
        .into_iter()
        .filter_map(|entry| {
            let weight = *weights.get(&entry.station.code())?;
            let DailySeries::Secondary(days) = entry.series else {
                return None;
            };
            Some(WeightedSeries { weight, days })
        })
        .collect()
}

/// First twelve monthly values of a summary as a fixed-size array.
fn monthly_array(summary: Option<&VariableSummary>) -> [Option<f64>; 12] {
    let mut months = [None; 12];
    if let Some(summary) = summary {
        for (idx, value) in summary.monthly.iter().take(12).enumerate() {
            months[idx] = *value;
        }
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::error::SeriesError;
    use crate::series::provider::SeriesOutcome;
    use crate::types::station::StationRecord;
    use async_trait::async_trait;
    use chrono::{Datelike, NaiveDate};
    use std::io;

    fn station(registry: Registry, id: &str, lat: f64, lon: f64, elevation_ft: f64) -> StationRecord {
        StationRecord {
            provider: "GHCN".to_string(),
            id: id.to_string(),
            name: None,
            latitude: lat,
            longitude: lon,
            elevation_ft,
            registry,
        }
    }

    struct FixtureRegistry {
        primary: Vec<StationRecord>,
        secondary: Vec<StationRecord>,
    }

    impl FixtureRegistry {
        fn denver() -> Self {
            FixtureRegistry {
                primary: vec![
                    station(Registry::Primary, "P1", 39.8, -104.9, 5300.0),
                    station(Registry::Primary, "P2", 39.6, -105.0, 5600.0),
                    station(Registry::Primary, "P3", 39.7, -104.7, 5200.0),
                ],
                secondary: vec![
                    station(Registry::Secondary, "S1", 39.75, -104.95, 5400.0),
                    station(Registry::Secondary, "S2", 39.65, -104.85, 5280.0),
                ],
            }
        }
    }

    #[async_trait]
    impl StationRegistryProvider for FixtureRegistry {
        async fn load(
            &self,
            registry: Registry,
        ) -> Result<Vec<StationRecord>, crate::stations::error::RegistryError> {
            Ok(match registry {
                Registry::Primary => self.primary.clone(),
                Registry::Secondary => self.secondary.clone(),
            })
        }
    }

    /// Deterministic mid-latitude seasonal climate, cold winters and wet
    /// summers, identical for every station of a registry.
    struct SyntheticSeries;

    fn seasonal(date: NaiveDate) -> f64 {
        -(std::f64::consts::TAU * date.ordinal() as f64 / 365.0).cos()
    }

    fn primary_day(date: NaiveDate) -> PrimaryDay {
        let s = seasonal(date);
        PrimaryDay {
            date,
            high_temp: Some(60.0 + 28.0 * s),
            low_temp: Some(35.0 + 28.0 * s),
            precipitation: Some(0.07 + 0.03 * s),
            snowfall: None,
        }
    }

    fn secondary_day(date: NaiveDate) -> SecondaryDay {
        let s = seasonal(date);
        SecondaryDay {
            date,
            wind_direction: Some(180.0),
            wind_speed: Some(9.0 + 2.0 * s),
            wind_gust: Some(21.0 + 2.0 * s),
            sunshine_pct: Some(65.0 + 15.0 * s),
        }
    }

    fn synthetic_outcome(station: &StationRecord, period: Period) -> SeriesOutcome {
        let series = match station.registry {
            Registry::Primary => DailySeries::Primary(period.days().map(primary_day).collect()),
            Registry::Secondary => {
                DailySeries::Secondary(period.days().map(secondary_day).collect())
            }
        };
        SeriesOutcome::Loaded(series)
    }

    #[async_trait]
    impl DailySeriesProvider for SyntheticSeries {
        async fn fetch(
            &self,
            station: &StationRecord,
            period: Period,
        ) -> Result<SeriesOutcome, SeriesError> {
            Ok(synthetic_outcome(station, period))
        }
    }

    fn denver_client() -> Spotclim {
        Spotclim::with_providers()
            .stations(Arc::new(FixtureRegistry::denver()))
            .series(Arc::new(SyntheticSeries))
            .call()
    }

    fn three_year_period() -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
    }

    #[tokio::test]
    async fn denver_profile_has_a_seasonal_shape() {
        let report = denver_client()
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .period(three_year_period())
            .call()
            .await
            .expect("profile");

        let mean = report.variable(Variable::MeanTemp).expect("mean temp");
        let january = mean.monthly[0].expect("january");
        let july = mean.monthly[6].expect("july");
        assert!(january < july, "january {january} vs july {july}");

        let precip = report.variable(Variable::Precipitation).expect("precip");
        assert!(precip.annual.expect("annual precip") > 0.0);

        assert_eq!(report.dates.len(), three_year_period().num_days());
        assert_eq!(mean.daily.len(), report.dates.len());
    }

    #[tokio::test]
    async fn denver_profile_classifies_as_hot_summer_continental() {
        let report = denver_client()
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .period(three_year_period())
            .call()
            .await
            .expect("profile");

        assert_eq!(report.location.koppen_code, "Dfa");
        assert_eq!(report.location.hardiness_zone, "7b");
        // Cold mornings near saturation: the winter has frost days.
        let frost = report.variable(Variable::FrostDays).expect("frost");
        assert!(frost.monthly[0].expect("january frost") > 0.0);
    }

    #[tokio::test]
    async fn malformed_targets_are_rejected_before_lookup() {
        let client = denver_client();
        let err = client
            .profile()
            .latitude(f64::NAN)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .call()
            .await
            .expect_err("should reject");
        assert!(matches!(err, SpotclimError::InvalidCoordinates { .. }));

        let err = client
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(f64::INFINITY)
            .call()
            .await
            .expect_err("should reject");
        assert!(matches!(err, SpotclimError::InvalidElevation { .. }));
    }

    #[tokio::test]
    async fn empty_radius_fails_with_no_stations() {
        let config = ProfileConfig::builder().max_distance_miles(5.0).build();
        let client = Spotclim::with_providers()
            .stations(Arc::new(FixtureRegistry::denver()))
            .series(Arc::new(SyntheticSeries))
            .config(config)
            .call();
        let err = client
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .call()
            .await
            .expect_err("nothing within five miles");
        assert!(matches!(
            err,
            SpotclimError::NoStationsAvailable {
                registry: Registry::Primary,
                stations_tried: 0,
                ..
            }
        ));
    }

    /// Fails every secondary fetch, leaves primary intact.
    struct BrokenSecondary;

    #[async_trait]
    impl DailySeriesProvider for BrokenSecondary {
        async fn fetch(
            &self,
            station: &StationRecord,
            period: Period,
        ) -> Result<SeriesOutcome, SeriesError> {
            match station.registry {
                Registry::Primary => Ok(synthetic_outcome(station, period)),
                Registry::Secondary => Err(SeriesError::ArchiveRead(
                    PathBuf::from(station.code()),
                    io::Error::new(io::ErrorKind::NotFound, "archive missing"),
                )),
            }
        }
    }

    #[tokio::test]
    async fn total_registry_failure_carries_the_last_error() {
        let client = Spotclim::with_providers()
            .stations(Arc::new(FixtureRegistry::denver()))
            .series(Arc::new(BrokenSecondary))
            .call();
        let err = client
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .period(three_year_period())
            .call()
            .await
            .expect_err("secondary registry is down");
        match err {
            SpotclimError::NoStationsAvailable {
                registry,
                stations_tried,
                last_error,
                ..
            } => {
                assert_eq!(registry, Registry::Secondary);
                assert_eq!(stations_tried, 2);
                assert!(last_error.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// One primary station has no archive entry; the rest carry the blend.
    struct FlakyPrimary;

    #[async_trait]
    impl DailySeriesProvider for FlakyPrimary {
        async fn fetch(
            &self,
            station: &StationRecord,
            period: Period,
        ) -> Result<SeriesOutcome, SeriesError> {
            if station.id == "P2" {
                return Ok(SeriesOutcome::NoData);
            }
            Ok(synthetic_outcome(station, period))
        }
    }

    #[tokio::test]
    async fn partial_station_failure_degrades_instead_of_aborting() {
        let client = Spotclim::with_providers()
            .stations(Arc::new(FixtureRegistry::denver()))
            .series(Arc::new(FlakyPrimary))
            .call();
        let report = client
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .period(three_year_period())
            .call()
            .await
            .expect("two of three stations suffice");
        let mean = report.variable(Variable::MeanTemp).expect("mean temp");
        assert!(mean.monthly[0].expect("jan") < mean.monthly[6].expect("jul"));
    }

    #[tokio::test]
    async fn short_period_is_insufficient_history() {
        let period = Period::new(
            NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 6, 10).unwrap(),
        );
        let err = denver_client()
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .period(period)
            .call()
            .await
            .expect_err("ten days cannot make a climate");
        assert!(matches!(
            err,
            SpotclimError::InsufficientHistory {
                valid_days: 10,
                required: 300
            }
        ));
    }

    /// Secondary stations exist but have recorded nothing in the period.
    struct SilentSecondary;

    #[async_trait]
    impl DailySeriesProvider for SilentSecondary {
        async fn fetch(
            &self,
            station: &StationRecord,
            period: Period,
        ) -> Result<SeriesOutcome, SeriesError> {
            match station.registry {
                Registry::Primary => Ok(synthetic_outcome(station, period)),
                Registry::Secondary => Ok(SeriesOutcome::Loaded(DailySeries::Secondary(vec![]))),
            }
        }
    }

    #[tokio::test]
    async fn wind_is_predicted_before_the_cutover_and_missing_after() {
        let client = Spotclim::with_providers()
            .stations(Arc::new(FixtureRegistry::denver()))
            .series(Arc::new(SilentSecondary))
            .call();
        let period = Period::new(
            NaiveDate::from_ymd_opt(1971, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1974, 12, 31).unwrap(),
        );
        let report = client
            .profile()
            .latitude(39.7)
            .longitude(-104.9)
            .elevation_ft(5280.0)
            .period(period)
            .call()
            .await
            .expect("profile");

        let wind = report.variable(Variable::WindSpeed).expect("wind");
        let first = wind.daily.first().expect("first day");
        let last = wind.daily.last().expect("last day");
        assert!(first.is_some(), "pre-cutover day should be gap-filled");
        assert!(last.is_none(), "post-cutover gap must stay missing");
        // Dewpoint is estimated on both sides of the cutover.
        let dewpoint = report.variable(Variable::Dewpoint).expect("dewpoint");
        assert!(dewpoint.daily.first().expect("first").is_some());
        assert!(dewpoint.daily.last().expect("last").is_some());
    }
}
