//! Per-day derived indices.
//!
//! Everything here is a pure function of one assembled day plus the target's
//! latitude and elevation. Missing inputs propagate as missing outputs; no
//! formula ever substitutes zero for an absent observation. The exception is
//! wind in the apparent-temperature formula, where a recorded calm is
//! substituted with 3 mph to dodge the wind-chill singularity at zero.

use crate::derive::smooth::{despike, DEWPOINT_SIGMA, TEMPERATURE_SIGMA};
use crate::derive::solar;
use crate::types::observation::ClimateDay;

/// Base for heating and cooling degree days.
pub const DEGREE_DAY_BASE_F: f64 = 65.0;
/// Base for growing degree days.
pub const GROWING_BASE_F: f64 = 50.0;

fn fahrenheit_to_celsius(temp_f: f64) -> f64 {
    (temp_f - 32.0) * 5.0 / 9.0
}

/// Magnus-type saturation vapor pressure in hPa for a temperature in °C.
fn saturation_vapor_pressure(temp_c: f64) -> f64 {
    6.112 * 10f64.powf(7.5 * temp_c / (237.7 + temp_c))
}

/// Relative humidity in percent from air temperature and dewpoint, both °F.
///
/// A dewpoint at or above the temperature reads as saturation.
pub fn relative_humidity(temp_f: f64, dewpoint_f: f64) -> f64 {
    if dewpoint_f >= temp_f {
        return 100.0;
    }
    let vapor = saturation_vapor_pressure(fahrenheit_to_celsius(dewpoint_f));
    let saturation = saturation_vapor_pressure(fahrenheit_to_celsius(temp_f));
    (100.0 * vapor / saturation).clamp(0.0, 100.0)
}

/// NWS heat index with both boundary correction terms.
fn heat_index(temp_f: f64, humidity_pct: f64) -> f64 {
    let t = temp_f;
    let r = humidity_pct;
    let mut index = -42.379 + 2.04901523 * t + 10.14333127 * r
        - 0.22475541 * t * r
        - 6.83783e-3 * t * t
        - 5.481717e-2 * r * r
        + 1.22874e-3 * t * t * r
        + 8.5282e-4 * t * r * r
        - 1.99e-6 * t * t * r * r;
    if r < 13.0 && (80.0..=112.0).contains(&t) {
        index -= ((13.0 - r) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt();
    } else if r > 85.0 && (80.0..=87.0).contains(&t) {
        index += ((r - 85.0) / 10.0) * ((87.0 - t) / 5.0);
    }
    index
}

/// NWS wind chill for temperature in °F and wind in mph.
fn wind_chill(temp_f: f64, wind_mph: f64) -> f64 {
    let v = wind_mph.powf(0.16);
    35.74 + 0.6215 * temp_f - 35.75 * v + 0.4275 * temp_f * v
}

/// Apparent temperature: heat index above 80 °F, wind chill below 50 °F with
/// enough wind, the air temperature itself otherwise. A missing wind reading
/// on a cold day falls back to the air temperature rather than guessing.
pub fn apparent_temperature(
    temp_f: f64,
    humidity_pct: Option<f64>,
    wind_mph: Option<f64>,
) -> Option<f64> {
    if temp_f > 80.0 {
        return humidity_pct.map(|rh| heat_index(temp_f, rh));
    }
    if temp_f < 50.0 {
        if let Some(wind) = wind_mph {
            let wind = if wind == 0.0 { 3.0 } else { wind };
            if wind >= 3.0 {
                return Some(wind_chill(temp_f, wind));
            }
        }
    }
    Some(temp_f)
}

/// Piecewise-linear comfort sub-score for a temperature, peaking at 70 °F.
fn temperature_score(temp_f: f64) -> f64 {
    if temp_f <= 20.0 || temp_f >= 110.0 {
        0.0
    } else if temp_f <= 70.0 {
        (temp_f - 20.0) / 50.0 * 100.0
    } else {
        (110.0 - temp_f) / 40.0 * 100.0
    }
}

/// Dewpoint comfort sub-score, full marks at or below 50 °F, zero at 75 °F.
fn dewpoint_score(dewpoint_f: f64) -> f64 {
    if dewpoint_f <= 50.0 {
        100.0
    } else if dewpoint_f >= 75.0 {
        0.0
    } else {
        (75.0 - dewpoint_f) / 25.0 * 100.0
    }
}

/// Derives the full index set for a target location.
#[derive(Debug, Clone, Copy)]
pub struct IndexCalculator {
    latitude: f64,
    elevation_ft: f64,
}

impl IndexCalculator {
    pub fn new(latitude: f64, elevation_ft: f64) -> Self {
        IndexCalculator {
            latitude,
            elevation_ft,
        }
    }

    /// Smooths the despike-eligible series, then derives every index day by
    /// day. Mean temperature is recomputed after smoothing so it cannot
    /// disagree with the extremes it came from.
    pub fn derive(&self, days: &mut [ClimateDay]) {
        let mut highs: Vec<Option<f64>> = days.iter().map(|d| d.high_temp).collect();
        let mut lows: Vec<Option<f64>> = days.iter().map(|d| d.low_temp).collect();
        let mut dewpoints: Vec<Option<f64>> = days.iter().map(|d| d.dewpoint).collect();
        despike(&mut highs, TEMPERATURE_SIGMA);
        despike(&mut lows, TEMPERATURE_SIGMA);
        despike(&mut dewpoints, DEWPOINT_SIGMA);

        for (idx, day) in days.iter_mut().enumerate() {
            day.high_temp = highs[idx];
            day.low_temp = lows[idx];
            day.dewpoint = dewpoints[idx];
            day.mean_temp = match (day.high_temp, day.low_temp) {
                (Some(high), Some(low)) => Some((high + low) / 2.0),
                _ => None,
            };
            self.derive_day(day);
        }
    }

    fn derive_day(&self, day: &mut ClimateDay) {
        let declination = solar::declination_deg(day.day_of_year);
        let sun_angle = solar::noon_sun_angle_deg(self.latitude, declination);
        day.sun_angle = Some(sun_angle);
        day.daylight_hours = Some(solar::daylight_hours(self.latitude, declination));

        day.humidity_morning = match (day.low_temp, day.dewpoint) {
            (Some(low), Some(dewpoint)) => Some(relative_humidity(low, dewpoint)),
            _ => None,
        };
        day.humidity_afternoon = match (day.high_temp, day.dewpoint) {
            (Some(high), Some(dewpoint)) => Some(relative_humidity(high, dewpoint)),
            _ => None,
        };

        day.apparent_high = day
            .high_temp
            .and_then(|t| apparent_temperature(t, day.humidity_afternoon, day.wind_speed));
        day.apparent_low = day
            .low_temp
            .and_then(|t| apparent_temperature(t, day.humidity_morning, day.wind_speed));

        day.uv_index = day.sunshine_pct.map(|sun| {
            ((sun_angle / 90.0)
                * 12.0
                * (1.0 + self.elevation_ft / 1000.0 * 0.05)
                * (sun / 100.0).sqrt())
            .max(0.0)
        });

        day.cooling_degree_days = day.mean_temp.map(|m| (m - DEGREE_DAY_BASE_F).max(0.0));
        day.heating_degree_days = day.mean_temp.map(|m| (DEGREE_DAY_BASE_F - m).max(0.0));
        day.growing_degree_days = day.mean_temp.map(|m| (m - GROWING_BASE_F).max(0.0));

        day.comfort_index = comfort_index(day);

        day.frost_flag = match (day.humidity_morning, day.low_temp) {
            (Some(humidity), Some(low)) => {
                Some(if humidity > 90.0 && low <= 32.0 { 1.0 } else { 0.0 })
            }
            _ => None,
        };
    }
}

/// Weighted comfort blend: temperature 40 %, apparent temperature 20 %,
/// dewpoint 20 %, sunshine 20 %. Missing any component means no score.
fn comfort_index(day: &ClimateDay) -> Option<f64> {
    let mean = day.mean_temp?;
    let apparent = match (day.apparent_high, day.apparent_low) {
        (Some(high), Some(low)) => (high + low) / 2.0,
        _ => return None,
    };
    let dewpoint = day.dewpoint?;
    let sunshine = day.sunshine_pct?;
    let score = 0.4 * temperature_score(mean)
        + 0.2 * temperature_score(apparent)
        + 0.2 * dewpoint_score(dewpoint)
        + 0.2 * sunshine;
    Some(score.clamp(0.0, 100.0))
}
