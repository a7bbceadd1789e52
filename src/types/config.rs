//! Tunable parameters for a profile run.
//!
//! Every knob has a default matching the 1991-2020 climate-normals setup, so
//! `ProfileConfig::default()` is a complete, usable configuration. Individual
//! fields are overridden through the generated builder:
//!
//! ```
//! use spotclim::ProfileConfig;
//!
//! let config = ProfileConfig::builder()
//!     .primary_station_count(4)
//!     .max_distance_miles(150.0)
//!     .build();
//! assert_eq!(config.primary_station_count, 4);
//! assert_eq!(config.secondary_station_count, 5);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive date window a profile is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Period { start, end }
    }

    /// The standard 30-year climate-normals window, 1991-01-01 to 2020-12-31.
    pub fn normals() -> Self {
        Period {
            start: ymd(1991, 1, 1),
            end: ymd(2020, 12, 31),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Every calendar date in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Number of calendar days in the window (0 when end precedes start).
    pub fn num_days(&self) -> usize {
        let span = (self.end - self.start).num_days() + 1;
        span.max(0) as usize
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::normals()
    }
}

/// Regional exception to the secondary-history cutover date.
///
/// A target point inside the bounding box uses `cutover` instead of the
/// configured global date. Boxes are checked in order; the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionCutover {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub cutover: NaiveDate,
}

impl RegionCutover {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

/// Configuration for station selection, loading, and summarizing.
#[derive(Debug, Clone, bon::Builder)]
pub struct ProfileConfig {
    /// Nearest primary-registry stations blended per request.
    #[builder(default = 8)]
    pub primary_station_count: usize,
    /// Nearest secondary-registry stations blended per request.
    #[builder(default = 5)]
    pub secondary_station_count: usize,
    /// Inverse-distance exponent for primary stations.
    #[builder(default = 1.0)]
    pub primary_weight_power: f64,
    /// Inverse-distance exponent for secondary stations. The flatter default
    /// reflects the sparser secondary network.
    #[builder(default = 0.5)]
    pub secondary_weight_power: f64,
    /// Distances are clamped to this floor before weighting so a station on
    /// top of the target cannot swallow the whole weight budget.
    #[builder(default = 0.1)]
    pub min_distance_miles: f64,
    /// When set, stations farther than this are never selected.
    pub max_distance_miles: Option<f64>,
    /// Station series loaded concurrently per registry.
    #[builder(default = 10)]
    pub load_concurrency: usize,
    /// Per-station load deadline before the station is dropped from the blend.
    #[builder(default = Duration::from_secs(20))]
    pub load_timeout: Duration,
    /// Populated days required before monthly/annual aggregates are computed.
    #[builder(default = 300)]
    pub min_valid_days: usize,
    #[builder(default)]
    pub period: Period,
    /// Secondary observations before this date are discarded in favor of
    /// model predictions; observed values on or after it are kept.
    #[builder(default = ymd(1973, 1, 1))]
    pub secondary_cutover: NaiveDate,
    /// Regional exceptions to `secondary_cutover`, checked in order.
    #[builder(default)]
    pub cutover_overrides: Vec<RegionCutover>,
}

impl ProfileConfig {
    /// The cutover date in effect for a target point, honoring any regional
    /// override containing it.
    pub fn cutover_for(&self, latitude: f64, longitude: f64) -> NaiveDate {
        self.cutover_overrides
            .iter()
            .find(|region| region.contains(latitude, longitude))
            .map(|region| region.cutover)
            .unwrap_or(self.secondary_cutover)
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig::builder().build()
    }
}

// Infallible for the literal arguments used in this module.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_normals_setup() {
        let config = ProfileConfig::default();
        assert_eq!(config.primary_station_count, 8);
        assert_eq!(config.secondary_station_count, 5);
        assert_eq!(config.primary_weight_power, 1.0);
        assert_eq!(config.secondary_weight_power, 0.5);
        assert_eq!(config.min_distance_miles, 0.1);
        assert!(config.max_distance_miles.is_none());
        assert_eq!(config.load_concurrency, 10);
        assert_eq!(config.load_timeout, Duration::from_secs(20));
        assert_eq!(config.min_valid_days, 300);
        assert_eq!(config.period.start, ymd(1991, 1, 1));
        assert_eq!(config.period.end, ymd(2020, 12, 31));
        assert_eq!(config.secondary_cutover, ymd(1973, 1, 1));
        assert!(config.cutover_overrides.is_empty());
    }

    #[test]
    fn period_day_iteration_covers_leap_years() {
        let period = Period::new(ymd(2020, 2, 27), ymd(2020, 3, 1));
        let days: Vec<NaiveDate> = period.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[2], ymd(2020, 2, 29));
        assert_eq!(period.num_days(), 4);
    }

    #[test]
    fn normals_window_has_thirty_years_of_days() {
        // 1991-2020 contains 8 leap years.
        assert_eq!(Period::normals().num_days(), 30 * 365 + 8);
    }

    #[test]
    fn regional_cutover_overrides_the_global_date() {
        let alaska = RegionCutover {
            min_latitude: 51.0,
            max_latitude: 72.0,
            min_longitude: -170.0,
            max_longitude: -129.0,
            cutover: ymd(1985, 1, 1),
        };
        let config = ProfileConfig::builder()
            .cutover_overrides(vec![alaska])
            .build();
        assert_eq!(config.cutover_for(64.8, -147.7), ymd(1985, 1, 1));
        assert_eq!(config.cutover_for(39.7, -104.9), ymd(1973, 1, 1));
    }
}
