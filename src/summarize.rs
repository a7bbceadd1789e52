//! Temporal reduction of the daily series into monthly and annual figures.
//!
//! Months are derived from day-of-year through a fixed day-count table with a
//! 29-day February, deliberately leap-year-agnostic so every year maps through
//! the same 12 buckets. Level fields reduce to means; rate fields reduce to
//! mean × days-in-bucket, with 365.25 days standing in for the year. Extremal
//! variables additionally carry record figures over the whole series and
//! "expected" figures, the average of each qualifying year's extreme.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::types::observation::ClimateDay;
use crate::types::report::{ExtremeKind, ReductionPolicy, Variable, VariableSummary};

/// Leap-agnostic days-in-month table.
pub(crate) const MONTH_DAYS: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_PER_YEAR: f64 = 365.25;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 0-based month bucket for a day-of-year, via the fixed table.
fn month_of_day(day_of_year: u32) -> usize {
    let mut remaining = day_of_year;
    for (idx, days) in MONTH_DAYS.iter().enumerate() {
        if remaining <= *days {
            return idx;
        }
        remaining -= days;
    }
    11
}

#[derive(Debug, Default, Clone, Copy)]
struct YearExtremes {
    max: Option<f64>,
    min: Option<f64>,
    valid_days: usize,
}

/// Reduces the daily series for every report variable.
///
/// `min_valid_days` gates which years contribute to the expected extremes; a
/// year too sparse to be representative is skipped there but still counts
/// toward the plain means and records.
pub fn summarize(days: &[ClimateDay], min_valid_days: usize) -> BTreeMap<Variable, VariableSummary> {
    Variable::ALL
        .iter()
        .map(|&var| (var, summarize_variable(var, days, min_valid_days)))
        .collect()
}

fn summarize_variable(
    var: Variable,
    days: &[ClimateDay],
    min_valid_days: usize,
) -> VariableSummary {
    let mut daily = Vec::with_capacity(days.len());
    let mut month_sum = [0.0_f64; 12];
    let mut month_count = [0_usize; 12];
    let mut month_max: [Option<f64>; 12] = [None; 12];
    let mut month_min: [Option<f64>; 12] = [None; 12];
    let mut total_sum = 0.0;
    let mut total_count = 0_usize;
    let mut series_max: Option<f64> = None;
    let mut series_min: Option<f64> = None;
    let mut years: BTreeMap<i32, YearExtremes> = BTreeMap::new();

    for day in days {
        let value = var.extract(day);
        daily.push(value.map(round2));
        let Some(value) = value else { continue };

        let month = month_of_day(day.day_of_year);
        month_sum[month] += value;
        month_count[month] += 1;
        month_max[month] = Some(month_max[month].map_or(value, |m| m.max(value)));
        month_min[month] = Some(month_min[month].map_or(value, |m| m.min(value)));
        total_sum += value;
        total_count += 1;
        series_max = Some(series_max.map_or(value, |m| m.max(value)));
        series_min = Some(series_min.map_or(value, |m| m.min(value)));

        let year = years.entry(day.date.year()).or_default();
        year.max = Some(year.max.map_or(value, |m| m.max(value)));
        year.min = Some(year.min.map_or(value, |m| m.min(value)));
        year.valid_days += 1;
    }

    let monthly: Vec<Option<f64>> = (0..12)
        .map(|m| {
            if month_count[m] == 0 {
                return None;
            }
            let mean = month_sum[m] / month_count[m] as f64;
            Some(round2(match var.policy() {
                ReductionPolicy::Level => mean,
                ReductionPolicy::Rate => mean * MONTH_DAYS[m] as f64,
            }))
        })
        .collect();

    let annual = (total_count > 0).then(|| {
        let mean = total_sum / total_count as f64;
        round2(match var.policy() {
            ReductionPolicy::Level => mean,
            ReductionPolicy::Rate => mean * DAYS_PER_YEAR,
        })
    });

    let mut summary = VariableSummary {
        daily,
        monthly,
        annual,
        monthly_max: None,
        monthly_min: None,
        annual_max: None,
        annual_min: None,
        expected_annual_max: None,
        expected_annual_min: None,
    };

    match var.extreme() {
        Some(ExtremeKind::Max) => {
            summary.monthly_max = Some(month_max.iter().map(|m| m.map(round2)).collect());
            summary.annual_max = series_max.map(round2);
            summary.expected_annual_max =
                expected_extreme(&years, min_valid_days, |y| y.max).or(summary.annual_max);
        }
        Some(ExtremeKind::Min) => {
            summary.monthly_min = Some(month_min.iter().map(|m| m.map(round2)).collect());
            summary.annual_min = series_min.map(round2);
            summary.expected_annual_min =
                expected_extreme(&years, min_valid_days, |y| y.min).or(summary.annual_min);
        }
        None => {}
    }
    summary
}

/// Average of each qualifying year's extreme. None when no year has enough
/// valid days, in which case the caller falls back to the record figure.
fn expected_extreme(
    years: &BTreeMap<i32, YearExtremes>,
    min_valid_days: usize,
    extreme: impl Fn(&YearExtremes) -> Option<f64>,
) -> Option<f64> {
    let qualifying: Vec<f64> = years
        .values()
        .filter(|y| y.valid_days >= min_valid_days)
        .filter_map(extreme)
        .collect();
    if qualifying.is_empty() {
        return None;
    }
    Some(round2(qualifying.iter().sum::<f64>() / qualifying.len() as f64))
}
