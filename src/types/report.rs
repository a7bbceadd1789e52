//! The report structure a profile request resolves to, and the catalog of
//! output variables with their reduction policies.

use crate::types::observation::ClimateDay;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// How a variable reduces from daily values to monthly/annual figures.
///
/// Level fields (temperatures, humidity, wind, percentages) are plain
/// arithmetic means over the period. Rate fields (precipitation, snowfall,
/// degree-days, day-count flags) are accumulations: the monthly figure is the
/// month's daily mean scaled by days-in-month, and the annual figure is the
/// overall daily mean scaled by 365.25.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionPolicy {
    Level,
    Rate,
}

/// Which side of the distribution an extremal variable reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeKind {
    Max,
    Min,
}

macro_rules! variables {
    ($( $variant:ident => ($name:literal, $policy:ident, $extreme:expr, $field:ident) ),+ $(,)?) => {
        /// Every variable the report carries, in output order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Variable {
            $( $variant, )+
        }

        impl Variable {
            /// All variables in declaration order.
            pub const ALL: &'static [Variable] = &[ $( Variable::$variant, )+ ];

            /// The report key for this variable.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Variable::$variant => $name, )+
                }
            }

            /// Whether the variable averages (level) or accumulates (rate).
            pub fn policy(&self) -> ReductionPolicy {
                match self {
                    $( Variable::$variant => ReductionPolicy::$policy, )+
                }
            }

            /// `Some` when the variable additionally reports record and
            /// expected extremes.
            pub fn extreme(&self) -> Option<ExtremeKind> {
                match self {
                    $( Variable::$variant => $extreme, )+
                }
            }

            /// Reads this variable's value out of a merged daily row.
            pub fn extract(&self, day: &ClimateDay) -> Option<f64> {
                match self {
                    $( Variable::$variant => day.$field, )+
                }
            }
        }
    };
}

variables! {
    HighTemp => ("high_temp", Level, Some(ExtremeKind::Max), high_temp),
    LowTemp => ("low_temp", Level, Some(ExtremeKind::Min), low_temp),
    MeanTemp => ("mean_temp", Level, None, mean_temp),
    Precipitation => ("precipitation", Rate, None, precipitation),
    Snowfall => ("snowfall", Rate, None, snowfall),
    WindSpeed => ("wind_speed", Level, None, wind_speed),
    WindGust => ("wind_gust", Level, Some(ExtremeKind::Max), wind_gust),
    WindDirection => ("wind_direction", Level, None, wind_direction),
    SunshinePercent => ("sunshine_percent", Level, None, sunshine_pct),
    Dewpoint => ("dewpoint", Level, None, dewpoint),
    HumidityMorning => ("humidity_morning", Level, None, humidity_morning),
    HumidityAfternoon => ("humidity_afternoon", Level, None, humidity_afternoon),
    ApparentHigh => ("apparent_high", Level, Some(ExtremeKind::Max), apparent_high),
    ApparentLow => ("apparent_low", Level, Some(ExtremeKind::Min), apparent_low),
    DaylightHours => ("daylight_hours", Level, None, daylight_hours),
    UvIndex => ("uv_index", Level, None, uv_index),
    CoolingDegreeDays => ("cooling_degree_days", Rate, None, cooling_degree_days),
    HeatingDegreeDays => ("heating_degree_days", Rate, None, heating_degree_days),
    GrowingDegreeDays => ("growing_degree_days", Rate, None, growing_degree_days),
    ComfortIndex => ("comfort_index", Level, None, comfort_index),
    FrostDays => ("frost_days", Rate, None, frost_flag),
    PrecipDays => ("precip_days", Rate, None, precip_flag),
    SnowDays => ("snow_days", Rate, None, snow_flag),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-variable reduction of the merged daily series.
///
/// `daily` is aligned with [`ClimateReport::dates`]; `monthly` always has 12
/// entries (January first). Extremal fields are populated only for variables
/// whose [`Variable::extreme`] is `Some`; record figures reduce over the whole
/// series while `expected_*` figures average each year's extreme across years.
#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub daily: Vec<Option<f64>>,
    pub monthly: Vec<Option<f64>>,
    pub annual: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_max: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_min: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_annual_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_annual_min: Option<f64>,
}

/// Site facts derived once per report and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct LocationReport {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_ft: f64,
    /// Köppen code such as "Cfb", or "Unclassified".
    pub koppen_code: String,
    /// Human label for the Köppen code, or "Unknown".
    pub koppen_label: String,
    /// USDA-style half zone such as "5b", or "Unknown".
    pub hardiness_zone: String,
}

/// The full profile for one target point.
#[derive(Debug, Clone, Serialize)]
pub struct ClimateReport {
    pub location: LocationReport,
    /// Date axis shared by every variable's `daily` array.
    pub dates: Vec<NaiveDate>,
    pub variables: BTreeMap<Variable, VariableSummary>,
}

impl ClimateReport {
    /// Convenience accessor for one variable's summary.
    pub fn variable(&self, var: Variable) -> Option<&VariableSummary> {
        self.variables.get(&var)
    }
}
