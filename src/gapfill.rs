//! Gap filling for the sparse early decades of the secondary registry.
//!
//! Wind and sunshine records only become dense after the cutover date; before
//! it, missing values are estimated from the primary variables of the same
//! day. After the cutover a missing value is treated as genuinely missing and
//! left alone. Dewpoint is observed by neither registry, so it is estimated
//! for every day that has temperature extremes.
//!
//! The default model is a set of affine coefficients over the four primary
//! features. Custom models implement [`GapPredictor`], or load alternative
//! coefficients from JSON into [`LinearGapModel`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::observation::ClimateDay;

/// Primary-variable inputs to the predictor for one day.
///
/// Temperature extremes are required; precipitation and snowfall default to
/// zero when unreported, since a missing total usually means a dry day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryFeatures {
    pub high_temp: f64,
    pub low_temp: f64,
    pub precipitation: f64,
    pub snowfall: f64,
}

impl PrimaryFeatures {
    pub fn from_day(day: &ClimateDay) -> Option<Self> {
        Some(PrimaryFeatures {
            high_temp: day.high_temp?,
            low_temp: day.low_temp?,
            precipitation: day.precipitation.unwrap_or(0.0),
            snowfall: day.snowfall.unwrap_or(0.0),
        })
    }
}

/// Predicted secondary conditions for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionsEstimate {
    pub wind_direction: f64,
    pub wind_speed: f64,
    pub sunshine_pct: f64,
    pub wind_gust: f64,
}

/// Estimates secondary-registry conditions from primary features.
pub trait GapPredictor: Send + Sync {
    fn conditions(&self, features: &PrimaryFeatures) -> ConditionsEstimate;
    fn dewpoint(&self, features: &PrimaryFeatures) -> f64;
}

/// One affine map from the four primary features to a target variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCoefficients {
    pub intercept: f64,
    pub high_temp: f64,
    pub low_temp: f64,
    pub precipitation: f64,
    pub snowfall: f64,
}

impl LinearCoefficients {
    fn apply(&self, features: &PrimaryFeatures) -> f64 {
        self.intercept
            + self.high_temp * features.high_temp
            + self.low_temp * features.low_temp
            + self.precipitation * features.precipitation
            + self.snowfall * features.snowfall
    }
}

/// Affine gap model with one coefficient row per predicted variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGapModel {
    pub wind_direction: LinearCoefficients,
    pub wind_speed: LinearCoefficients,
    pub sunshine_pct: LinearCoefficients,
    pub wind_gust: LinearCoefficients,
    pub dewpoint: LinearCoefficients,
}

impl LinearGapModel {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for LinearGapModel {
    /// Built-in coefficients fitted against mid-latitude station pairs.
    fn default() -> Self {
        LinearGapModel {
            wind_direction: LinearCoefficients {
                intercept: 170.0,
                high_temp: 0.5,
                low_temp: -0.3,
                precipitation: 20.0,
                snowfall: 5.0,
            },
            wind_speed: LinearCoefficients {
                intercept: 6.0,
                high_temp: 0.02,
                low_temp: 0.01,
                precipitation: 6.0,
                snowfall: 1.0,
            },
            sunshine_pct: LinearCoefficients {
                intercept: 85.0,
                high_temp: 0.30,
                low_temp: -0.45,
                precipitation: -60.0,
                snowfall: -8.0,
            },
            wind_gust: LinearCoefficients {
                intercept: 12.0,
                high_temp: 0.03,
                low_temp: 0.02,
                precipitation: 10.0,
                snowfall: 2.0,
            },
            dewpoint: LinearCoefficients {
                intercept: 2.0,
                high_temp: 0.10,
                low_temp: 0.85,
                precipitation: 8.0,
                snowfall: 1.0,
            },
        }
    }
}

impl GapPredictor for LinearGapModel {
    fn conditions(&self, features: &PrimaryFeatures) -> ConditionsEstimate {
        ConditionsEstimate {
            wind_direction: self.wind_direction.apply(features).rem_euclid(360.0),
            wind_speed: self.wind_speed.apply(features).max(0.0),
            sunshine_pct: self.sunshine_pct.apply(features).clamp(0.0, 100.0),
            wind_gust: self.wind_gust.apply(features).max(0.0),
        }
    }

    fn dewpoint(&self, features: &PrimaryFeatures) -> f64 {
        self.dewpoint.apply(features)
    }
}

/// Fills missing secondary fields on dates before the cutover.
///
/// Observed values are never overwritten, and days without temperature
/// extremes are skipped since the predictor has nothing to work from.
pub fn fill_conditions(days: &mut [ClimateDay], predictor: &dyn GapPredictor, cutover: NaiveDate) {
    for day in days {
        if day.date >= cutover {
            continue;
        }
        let needs_fill = day.wind_direction.is_none()
            || day.wind_speed.is_none()
            || day.sunshine_pct.is_none()
            || day.wind_gust.is_none();
        if !needs_fill {
            continue;
        }
        let Some(features) = PrimaryFeatures::from_day(day) else {
            continue;
        };
        let estimate = predictor.conditions(&features);
        day.wind_direction = day.wind_direction.or(Some(estimate.wind_direction));
        day.wind_speed = day.wind_speed.or(Some(estimate.wind_speed));
        day.sunshine_pct = day.sunshine_pct.or(Some(estimate.sunshine_pct));
        day.wind_gust = day.wind_gust.or(Some(estimate.wind_gust));
    }
}

/// Estimates dewpoint for every day with temperature extremes.
pub fn predict_dewpoint(days: &mut [ClimateDay], predictor: &dyn GapPredictor) {
    for day in days {
        if let Some(features) = PrimaryFeatures::from_day(day) {
            day.dewpoint = Some(predictor.dewpoint(&features));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cutover() -> NaiveDate {
        d(1973, 1, 1)
    }

    fn day_with_temps(date: NaiveDate) -> ClimateDay {
        let mut day = ClimateDay::empty(date);
        day.high_temp = Some(75.0);
        day.low_temp = Some(55.0);
        day.precipitation = Some(0.0);
        day
    }

    #[test]
    fn fills_missing_conditions_before_the_cutover() {
        let mut days = vec![day_with_temps(d(1960, 7, 1))];
        fill_conditions(&mut days, &LinearGapModel::default(), cutover());
        let day = &days[0];
        assert!(day.wind_direction.unwrap().is_finite());
        assert!(day.wind_speed.unwrap() >= 0.0);
        let sun = day.sunshine_pct.unwrap();
        assert!((0.0..=100.0).contains(&sun));
        assert!(day.wind_gust.unwrap() >= 0.0);
    }

    #[test]
    fn leaves_post_cutover_gaps_alone() {
        let mut days = vec![day_with_temps(d(1995, 7, 1))];
        fill_conditions(&mut days, &LinearGapModel::default(), cutover());
        let day = &days[0];
        assert_eq!(day.wind_direction, None);
        assert_eq!(day.wind_speed, None);
        assert_eq!(day.sunshine_pct, None);
        assert_eq!(day.wind_gust, None);
    }

    #[test]
    fn observed_values_survive_the_fill() {
        let mut day = day_with_temps(d(1960, 7, 1));
        day.wind_speed = Some(14.0);
        let mut days = vec![day];
        fill_conditions(&mut days, &LinearGapModel::default(), cutover());
        assert_eq!(days[0].wind_speed, Some(14.0));
        assert!(days[0].wind_gust.is_some());
    }

    #[test]
    fn missing_temperatures_block_prediction() {
        let mut day = ClimateDay::empty(d(1960, 7, 1));
        day.precipitation = Some(0.3);
        let mut days = vec![day];
        fill_conditions(&mut days, &LinearGapModel::default(), cutover());
        predict_dewpoint(&mut days, &LinearGapModel::default());
        assert_eq!(days[0].wind_speed, None);
        assert_eq!(days[0].dewpoint, None);
    }

    #[test]
    fn dewpoint_is_predicted_on_both_sides_of_the_cutover() {
        let mut days = vec![day_with_temps(d(1960, 7, 1)), day_with_temps(d(2005, 7, 1))];
        predict_dewpoint(&mut days, &LinearGapModel::default());
        assert!(days[0].dewpoint.is_some());
        assert!(days[1].dewpoint.is_some());
        // Tracks the low more closely than the high.
        let dewpoint = days[0].dewpoint.unwrap();
        assert!((dewpoint - 56.25).abs() < 1e-9);
    }

    #[test]
    fn coefficients_round_trip_through_json() {
        let model = LinearGapModel::default();
        let json = serde_json::to_string(&model).unwrap();
        let restored = LinearGapModel::from_json(&json).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn estimates_respect_physical_bounds() {
        let model = LinearGapModel::default();
        let soaked = PrimaryFeatures {
            high_temp: 40.0,
            low_temp: 33.0,
            precipitation: 3.0,
            snowfall: 0.0,
        };
        let estimate = model.conditions(&soaked);
        assert_eq!(estimate.sunshine_pct, 0.0);
        assert!(estimate.wind_speed >= 0.0);
        assert!((0.0..360.0).contains(&estimate.wind_direction));
    }
}
