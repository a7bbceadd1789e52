//! Per-date weighted merging of station series.
//!
//! Each registry is merged independently. On a given date only the stations
//! that actually report a field contribute to it, and their weights are
//! renormalized to the reporting subset, so one station's outage shifts its
//! share onto the rest instead of dragging the mean toward zero. Dates absent
//! from every station still appear in the assembled calendar as empty rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::config::Period;
use crate::types::observation::{ClimateDay, PrimaryDay, SecondaryDay};

/// One station's daily rows with the selection weight it earned.
pub struct WeightedSeries<T> {
    pub weight: f64,
    pub days: Vec<T>,
}

/// Running weighted mean over whichever stations report a value.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    weight: f64,
}

impl Accumulator {
    fn add(&mut self, value: Option<f64>, weight: f64) {
        if let Some(value) = value {
            self.sum += value * weight;
            self.weight += weight;
        }
    }

    /// None when no station reported, which keeps missing data missing.
    fn mean(&self) -> Option<f64> {
        if self.weight > 0.0 {
            Some(self.sum / self.weight)
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct PrimaryAccumulator {
    high_temp: Accumulator,
    low_temp: Accumulator,
    precipitation: Accumulator,
    snowfall: Accumulator,
}

#[derive(Debug, Default, Clone, Copy)]
struct SecondaryAccumulator {
    wind_direction: Accumulator,
    wind_speed: Accumulator,
    wind_gust: Accumulator,
    sunshine_pct: Accumulator,
}

/// Merges primary-registry series into one row per reported date.
pub fn merge_primary(series: &[WeightedSeries<PrimaryDay>]) -> BTreeMap<NaiveDate, PrimaryDay> {
    let mut merged: BTreeMap<NaiveDate, PrimaryAccumulator> = BTreeMap::new();
    for entry in series {
        for day in &entry.days {
            let acc = merged.entry(day.date).or_default();
            acc.high_temp.add(day.high_temp, entry.weight);
            acc.low_temp.add(day.low_temp, entry.weight);
            acc.precipitation.add(day.precipitation, entry.weight);
            acc.snowfall.add(day.snowfall, entry.weight);
        }
    }
    merged
        .into_iter()
        .map(|(date, acc)| {
            (
                date,
                PrimaryDay {
                    date,
                    high_temp: acc.high_temp.mean(),
                    low_temp: acc.low_temp.mean(),
                    precipitation: acc.precipitation.mean(),
                    snowfall: acc.snowfall.mean(),
                },
            )
        })
        .collect()
}

/// Merges secondary-registry series into one row per reported date.
///
/// Wind direction is averaged arithmetically in degrees like every other
/// field, without circular wraparound handling.
pub fn merge_secondary(
    series: &[WeightedSeries<SecondaryDay>],
) -> BTreeMap<NaiveDate, SecondaryDay> {
    let mut merged: BTreeMap<NaiveDate, SecondaryAccumulator> = BTreeMap::new();
    for entry in series {
        for day in &entry.days {
            let acc = merged.entry(day.date).or_default();
            acc.wind_direction.add(day.wind_direction, entry.weight);
            acc.wind_speed.add(day.wind_speed, entry.weight);
            acc.wind_gust.add(day.wind_gust, entry.weight);
            acc.sunshine_pct.add(day.sunshine_pct, entry.weight);
        }
    }
    merged
        .into_iter()
        .map(|(date, acc)| {
            (
                date,
                SecondaryDay {
                    date,
                    wind_direction: acc.wind_direction.mean(),
                    wind_speed: acc.wind_speed.mean(),
                    wind_gust: acc.wind_gust.mean(),
                    sunshine_pct: acc.sunshine_pct.mean(),
                },
            )
        })
        .collect()
}

/// Lays the merged registries onto a complete calendar for the period.
///
/// Every date in the period gets a row. Mean temperature is derived where
/// both extremes are present; dates nobody reported stay empty rather than
/// being dropped, so downstream day counting sees the full span.
pub fn assemble_calendar(
    period: Period,
    primary: &BTreeMap<NaiveDate, PrimaryDay>,
    secondary: &BTreeMap<NaiveDate, SecondaryDay>,
) -> Vec<ClimateDay> {
    period
        .days()
        .map(|date| {
            let mut day = ClimateDay::empty(date);
            if let Some(row) = primary.get(&date) {
                day.high_temp = row.high_temp;
                day.low_temp = row.low_temp;
                day.precipitation = row.precipitation;
                day.snowfall = row.snowfall;
            }
            if let Some(row) = secondary.get(&date) {
                day.wind_direction = row.wind_direction;
                day.wind_speed = row.wind_speed;
                day.wind_gust = row.wind_gust;
                day.sunshine_pct = row.sunshine_pct;
            }
            day.mean_temp = match (day.high_temp, day.low_temp) {
                (Some(high), Some(low)) => Some((high + low) / 2.0),
                _ => None,
            };
            day
        })
        .collect()
}
