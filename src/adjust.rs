//! Elevation adjustment model.
//!
//! Station histories describe conditions at station elevation; the target
//! point usually sits somewhere else. Temperatures are lapsed per station
//! before merging, against each station's own elevation. Everything
//! multiplicative (wind speedup, sun attenuation, orographic precipitation,
//! snow conversion, day-count scaling) plus the dewpoint lapse runs after
//! merging, against the registry's weighted mean station elevation.

use crate::types::observation::{ClimateDay, PrimaryDay};

/// Temperature lapse, °F lost per 1000 ft climbed.
pub const TEMP_LAPSE_F_PER_KFT: f64 = 4.5;
/// Dewpoint lapse, °F lost per 1000 ft climbed.
pub const DEWPOINT_LAPSE_F_PER_KFT: f64 = 3.0;
/// Daily precipitation at or above this counts as a precipitation day.
pub const PRECIP_DAY_MIN_IN: f64 = 0.01;
/// Daily snowfall at or above this counts as a snow day.
pub const SNOW_DAY_MIN_IN: f64 = 0.1;

/// Capped wind/gust speedup multiplier, floored at zero.
fn wind_factor(delta: f64) -> f64 {
    (1.0 + delta * 0.2).min(5.0).max(0.0)
}

/// Sunshine attenuation; weaker when skies are already clear.
fn sun_factor(delta: f64, sunshine_pct: f64) -> f64 {
    (1.0 - delta * 0.1 * (100.0 - sunshine_pct) / 100.0).max(0.0)
}

/// Orographic precipitation multiplier; descent applies a second, more
/// aggressive reduction factor.
fn precip_factor(delta: f64) -> f64 {
    let mut factor = (1.0 + delta * 0.125).min(5.0);
    if delta < 0.0 {
        factor *= (1.0 + delta * 0.15).max(0.0);
    }
    factor.max(0.0)
}

/// Inches of snow per inch of liquid on cold days, from the diurnal range.
fn rain_to_snow_ratio(diurnal_range: f64) -> f64 {
    (diurnal_range / 2.0).clamp(5.0, 20.0)
}

fn snow_descent_reduction(delta: f64) -> f64 {
    if delta < 0.0 {
        (1.0 + delta * 0.5).max(0.0)
    } else {
        1.0
    }
}

/// Precip/snow day-count scaling, bounded to [0, 2].
fn day_count_factor(delta: f64) -> f64 {
    (1.0 + delta * 0.02).clamp(0.0, 2.0)
}

/// Elevation corrections for one target elevation.
#[derive(Debug, Clone, Copy)]
pub struct ElevationAdjuster {
    target_elevation_ft: f64,
}

impl ElevationAdjuster {
    pub fn new(target_elevation_ft: f64) -> Self {
        ElevationAdjuster {
            target_elevation_ft,
        }
    }

    /// Elevation difference in thousands of feet, positive when the target
    /// sits above the reference.
    pub fn delta_kft(&self, reference_elevation_ft: f64) -> f64 {
        (self.target_elevation_ft - reference_elevation_ft) / 1000.0
    }

    /// Lapses one station's temperatures to target elevation, using that
    /// station's own elevation. Runs before merging.
    pub fn lapse_temperatures(&self, day: &mut PrimaryDay, station_elevation_ft: f64) {
        let delta = self.delta_kft(station_elevation_ft);
        if let Some(high) = day.high_temp.as_mut() {
            *high -= delta * TEMP_LAPSE_F_PER_KFT;
        }
        if let Some(low) = day.low_temp.as_mut() {
            *low -= delta * TEMP_LAPSE_F_PER_KFT;
        }
    }

    /// Applies the post-merge adjustments to one assembled day.
    ///
    /// `primary_mean_elevation_ft` / `secondary_mean_elevation_ft` are the
    /// weighted mean station elevations of the two registries; precipitation,
    /// snow, dewpoint and the day-count flags follow the primary delta, wind
    /// and sunshine follow the secondary delta. A zero delta leaves every
    /// already-populated field untouched.
    pub fn adjust_merged(
        &self,
        day: &mut ClimateDay,
        primary_mean_elevation_ft: f64,
        secondary_mean_elevation_ft: f64,
    ) {
        let dp = self.delta_kft(primary_mean_elevation_ft);
        let ds = self.delta_kft(secondary_mean_elevation_ft);

        if ds != 0.0 {
            let factor = wind_factor(ds);
            if let Some(wind) = day.wind_speed.as_mut() {
                *wind *= factor;
            }
            if let Some(gust) = day.wind_gust.as_mut() {
                *gust *= factor;
            }
            if let Some(sun) = day.sunshine_pct.as_mut() {
                *sun = (*sun * sun_factor(ds, *sun)).clamp(0.0, 100.0);
            }
        }

        if dp != 0.0 {
            if let Some(precip) = day.precipitation.as_mut() {
                *precip *= precip_factor(dp);
            }
            day.snowfall = self.adjusted_snowfall(day, dp);
            if let Some(dewpoint) = day.dewpoint.as_mut() {
                *dewpoint -= dp * DEWPOINT_LAPSE_F_PER_KFT;
            }
        }

        day.precip_flag = day
            .precipitation
            .map(|p| if p >= PRECIP_DAY_MIN_IN { day_count_factor(dp) } else { 0.0 });
        day.snow_flag = day
            .snowfall
            .map(|s| if s >= SNOW_DAY_MIN_IN { day_count_factor(dp) } else { 0.0 });
    }

    /// Snowfall at target elevation. Cold days re-derive snow from adjusted
    /// liquid precipitation; otherwise the recorded snowfall is scaled by the
    /// same orographic factor as precipitation.
    fn adjusted_snowfall(&self, day: &ClimateDay, dp: f64) -> Option<f64> {
        let freezing_high = day.high_temp.is_some_and(|h| h < 32.0);
        let freezing_low_and_mean = day.low_temp.is_some_and(|l| l < 32.0)
            && day.mean_temp.is_some_and(|m| m < 32.0);

        if freezing_high || freezing_low_and_mean {
            // precipitation has already been orographically adjusted above
            let precip = day.precipitation?;
            let diurnal = day.high_temp? - day.low_temp?;
            Some(precip * rain_to_snow_ratio(diurnal) * snow_descent_reduction(dp))
        } else {
            day.snowfall.map(|s| s * precip_factor(dp))
        }
    }
}
