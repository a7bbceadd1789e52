//! Typed daily records. Every physical field is an `Option`: a missing
//! observation stays `None` through the whole pipeline and is never coerced
//! to zero or to a sentinel value.

use chrono::{Datelike, NaiveDate};

/// One day of primary-registry history (temperature / precipitation / snow).
#[derive(Debug, PartialEq, Clone)]
pub struct PrimaryDay {
    pub date: NaiveDate,
    pub high_temp: Option<f64>,     // tmax, degrees F
    pub low_temp: Option<f64>,      // tmin, degrees F
    pub precipitation: Option<f64>, // prcp, inches
    pub snowfall: Option<f64>,      // snow, inches
}

/// One day of secondary-registry history (wind / sunshine).
#[derive(Debug, PartialEq, Clone)]
pub struct SecondaryDay {
    pub date: NaiveDate,
    pub wind_direction: Option<f64>, // wdir, degrees
    pub wind_speed: Option<f64>,     // wspd, mph
    pub wind_gust: Option<f64>,      // wpgt, mph
    pub sunshine_pct: Option<f64>,   // sun_pct, 0-100
}

/// One reconciled day of the merged series, carrying the blended registry
/// fields plus every derived field. Rows are created calendar-complete for
/// the requested period; fields stay `None` where no station contributed and
/// no later stage filled them.
#[derive(Debug, PartialEq, Clone)]
pub struct ClimateDay {
    pub date: NaiveDate,
    /// Ordinal day of year, 1-366.
    pub day_of_year: u32,

    // Blended primary fields (degrees F / inches).
    pub high_temp: Option<f64>,
    pub low_temp: Option<f64>,
    pub precipitation: Option<f64>,
    pub snowfall: Option<f64>,

    // Blended secondary fields (degrees / mph / percent).
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub sunshine_pct: Option<f64>,

    // Derived fields.
    pub mean_temp: Option<f64>,
    pub dewpoint: Option<f64>,
    pub humidity_morning: Option<f64>,
    pub humidity_afternoon: Option<f64>,
    pub apparent_high: Option<f64>,
    pub apparent_low: Option<f64>,
    pub sun_angle: Option<f64>,
    pub daylight_hours: Option<f64>,
    pub uv_index: Option<f64>,
    pub cooling_degree_days: Option<f64>,
    pub heating_degree_days: Option<f64>,
    pub growing_degree_days: Option<f64>,
    pub comfort_index: Option<f64>,

    // Day-count flags, 0.0 or 1.0 so they aggregate as rates.
    pub frost_flag: Option<f64>,
    pub precip_flag: Option<f64>,
    pub snow_flag: Option<f64>,
}

impl ClimateDay {
    /// An empty row for `date` with every field unset.
    pub fn empty(date: NaiveDate) -> Self {
        ClimateDay {
            date,
            day_of_year: date.ordinal(),
            high_temp: None,
            low_temp: None,
            precipitation: None,
            snowfall: None,
            wind_direction: None,
            wind_speed: None,
            wind_gust: None,
            sunshine_pct: None,
            mean_temp: None,
            dewpoint: None,
            humidity_morning: None,
            humidity_afternoon: None,
            apparent_high: None,
            apparent_low: None,
            sun_angle: None,
            daylight_hours: None,
            uv_index: None,
            cooling_degree_days: None,
            heating_degree_days: None,
            growing_degree_days: None,
            comfort_index: None,
            frost_flag: None,
            precip_flag: None,
            snow_flag: None,
        }
    }
}
