//! Conversion of collected archive frames into typed daily rows.
//!
//! Upstream archives mark missing values either with nulls or with the
//! legacy −9999/9999 sentinels; both become `None` here so nothing past this
//! module ever sees a sentinel.

use crate::series::error::SeriesError;
use crate::types::observation::{PrimaryDay, SecondaryDay};
use chrono::NaiveDate;
use polars::prelude::*;

pub(crate) const COL_DATE: &str = "date";
pub(crate) const COL_TMAX: &str = "tmax"; // High temperature
pub(crate) const COL_TMIN: &str = "tmin"; // Low temperature
pub(crate) const COL_PRCP: &str = "prcp"; // Precipitation
pub(crate) const COL_SNOW: &str = "snow"; // Snowfall amount
pub(crate) const COL_WDIR: &str = "wdir"; // Wind direction
pub(crate) const COL_WSPD: &str = "wspd"; // Wind speed
pub(crate) const COL_WPGT: &str = "wpgt"; // Peak wind gust
pub(crate) const COL_SUN: &str = "sun_pct"; // Sunshine percentage

/// Retrieves a column by name from a DataFrame.
fn get_column<'a>(df: &'a DataFrame, col: &str) -> Result<&'a Column, SeriesError> {
    df.column(col)
        .map_err(|e| SeriesError::ColumnNotFound(col.to_string(), e))
}

fn float_chunked<'a>(
    df: &'a DataFrame,
    col: &str,
    station: &str,
) -> Result<&'a Float64Chunked, SeriesError> {
    get_column(df, col)?.f64().map_err(|e| SeriesError::Collect {
        station: station.to_string(),
        source: e,
    })
}

/// Nulls non-finite values and the archive's missing-value sentinels.
fn scrub(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != -9999.0 && *v != 9999.0)
}

// The date column's physical values are i32 days since the Unix epoch.
fn row_date(dates: &DateChunked, idx: usize, epoch: NaiveDate) -> Option<NaiveDate> {
    dates
        .get(idx)
        .map(|days| epoch + chrono::Duration::days(days as i64))
}

/// Typed rows from a collected primary-registry frame, in frame order.
/// Rows with a null date are dropped.
pub(crate) fn primary_days(df: &DataFrame, station: &str) -> Result<Vec<PrimaryDay>, SeriesError> {
    let dates = get_column(df, COL_DATE)?
        .date()
        .map_err(|e| SeriesError::Collect {
            station: station.to_string(),
            source: e,
        })?;
    let tmax = float_chunked(df, COL_TMAX, station)?;
    let tmin = float_chunked(df, COL_TMIN, station)?;
    let prcp = float_chunked(df, COL_PRCP, station)?;
    let snow = float_chunked(df, COL_SNOW, station)?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(date) = row_date(dates, i, epoch) else {
            continue;
        };
        rows.push(PrimaryDay {
            date,
            high_temp: scrub(tmax.get(i)),
            low_temp: scrub(tmin.get(i)),
            precipitation: scrub(prcp.get(i)),
            snowfall: scrub(snow.get(i)),
        });
    }
    Ok(rows)
}

/// Typed rows from a collected secondary-registry frame, in frame order.
pub(crate) fn secondary_days(
    df: &DataFrame,
    station: &str,
) -> Result<Vec<SecondaryDay>, SeriesError> {
    let dates = get_column(df, COL_DATE)?
        .date()
        .map_err(|e| SeriesError::Collect {
            station: station.to_string(),
            source: e,
        })?;
    let wdir = float_chunked(df, COL_WDIR, station)?;
    let wspd = float_chunked(df, COL_WSPD, station)?;
    let wpgt = float_chunked(df, COL_WPGT, station)?;
    let sun = float_chunked(df, COL_SUN, station)?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(date) = row_date(dates, i, epoch) else {
            continue;
        };
        rows.push(SecondaryDay {
            date,
            wind_direction: scrub(wdir.get(i)),
            wind_speed: scrub(wspd.get(i)),
            wind_gust: scrub(wpgt.get(i)),
            sunshine_pct: scrub(sun.get(i)),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary_frame() -> DataFrame {
        let dates = DateChunked::from_naive_date(
            COL_DATE.into(),
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            ],
        );
        df!(
            COL_TMAX => [Some(41.0), Some(-9999.0)],
            COL_TMIN => [Some(22.0), None::<f64>],
            COL_PRCP => [Some(0.0), Some(0.12)],
            COL_SNOW => [Some(9999.0), Some(1.5)],
        )
        .unwrap()
        .hstack(&[dates.into_series().into()])
        .unwrap()
    }

    #[test]
    fn sentinels_and_nulls_become_none() {
        let df = primary_frame();
        let rows = primary_days(&df, "TEST:1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].high_temp, Some(41.0));
        assert_eq!(rows[0].snowfall, None); // 9999 sentinel
        assert_eq!(rows[1].high_temp, None); // -9999 sentinel
        assert_eq!(rows[1].low_temp, None); // genuine null
        assert_eq!(rows[1].precipitation, Some(0.12));
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn zero_is_a_real_value_not_missing() {
        let df = primary_frame();
        let rows = primary_days(&df, "TEST:1").unwrap();
        assert_eq!(rows[0].precipitation, Some(0.0));
    }

    #[test]
    fn missing_column_is_reported() {
        let df = df!(COL_TMAX => [1.0f64]).unwrap();
        let err = primary_days(&df, "TEST:1").unwrap_err();
        assert!(matches!(err, SeriesError::ColumnNotFound(name, _) if name == COL_DATE));
    }
}
