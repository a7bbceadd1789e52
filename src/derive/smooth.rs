//! Outlier smoothing for derived-input series.
//!
//! Sensor glitches (a 120 °F reading in January) would otherwise leak through
//! humidity and apparent-temperature formulas into the summaries. Each value
//! is compared to the mean of its neighbors inside a centered 14-day window;
//! values beyond the sigma threshold are replaced by that local mean.
//! Replacements are decided against the original series in one pass, so a
//! replaced value cannot mask or create outliers among its neighbors.

/// Days on each side of the centered window.
const WINDOW_HALF: usize = 7;
/// Neighbors required before a replacement is considered.
const MIN_NEIGHBORS: usize = 4;

/// Sigma threshold for the temperature extremes.
pub const TEMPERATURE_SIGMA: f64 = 3.0;
/// Tighter threshold for dewpoint, whose estimates drift harder.
pub const DEWPOINT_SIGMA: f64 = 2.0;

/// Replaces outliers beyond `threshold_sigma` local standard deviations with
/// the local rolling mean. Missing values are skipped and never invented.
pub fn despike(values: &mut [Option<f64>], threshold_sigma: f64) {
    let replacements: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let value = (*value)?;
            let (mean, std) = neighbor_stats(values, idx)?;
            if (value - mean).abs() > threshold_sigma * std {
                Some((idx, mean))
            } else {
                None
            }
        })
        .collect();
    for (idx, mean) in replacements {
        values[idx] = Some(mean);
    }
}

/// Mean and population standard deviation of the present neighbors in the
/// window around `idx`, excluding `idx` itself. None when the window is too
/// sparse to say anything.
fn neighbor_stats(values: &[Option<f64>], idx: usize) -> Option<(f64, f64)> {
    let start = idx.saturating_sub(WINDOW_HALF);
    let end = (idx + WINDOW_HALF + 1).min(values.len());
    let neighbors: Vec<f64> = (start..end)
        .filter(|&i| i != idx)
        .filter_map(|i| values[i])
        .collect();
    if neighbors.len() < MIN_NEIGHBORS {
        return None;
    }
    let mean = neighbors.iter().sum::<f64>() / neighbors.len() as f64;
    let variance = neighbors
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / neighbors.len() as f64;
    Some((mean, variance.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_spike_is_replaced_by_the_local_mean() {
        let mut values: Vec<Option<f64>> = vec![Some(50.0); 15];
        values[7] = Some(90.0);
        despike(&mut values, TEMPERATURE_SIGMA);
        assert_eq!(values[7], Some(50.0));
        assert_eq!(values[0], Some(50.0));
    }

    #[test]
    fn smooth_trend_passes_through_untouched() {
        let mut values: Vec<Option<f64>> = (0..30).map(|i| Some(i as f64)).collect();
        let before = values.clone();
        despike(&mut values, TEMPERATURE_SIGMA);
        assert_eq!(values, before);
    }

    #[test]
    fn missing_values_stay_missing() {
        let mut values: Vec<Option<f64>> = vec![Some(50.0); 15];
        values[3] = None;
        despike(&mut values, TEMPERATURE_SIGMA);
        assert_eq!(values[3], None);
    }

    #[test]
    fn short_series_is_left_alone() {
        let mut values = vec![Some(10.0), Some(500.0), Some(11.0)];
        despike(&mut values, TEMPERATURE_SIGMA);
        // Two neighbors are not enough evidence to rewrite history.
        assert_eq!(values[1], Some(500.0));
    }

    #[test]
    fn dewpoint_threshold_is_stricter() {
        // Alternating 49/51 neighbors put the spike between two and three
        // local standard deviations from their mean.
        let mut values: Vec<Option<f64>> = (0..15)
            .map(|i| Some(if i % 2 == 0 { 49.0 } else { 51.0 }))
            .collect();
        values[7] = Some(52.5);
        let neighbor_mean = (8.0 * 49.0 + 6.0 * 51.0) / 14.0;
        let mut at_three = values.clone();
        despike(&mut at_three, TEMPERATURE_SIGMA);
        assert_eq!(at_three[7], Some(52.5));
        despike(&mut values, DEWPOINT_SIGMA);
        assert!((values[7].unwrap() - neighbor_mean).abs() < 1e-9);
    }

    #[test]
    fn edge_spike_is_caught_by_the_one_sided_window() {
        let mut values: Vec<Option<f64>> = vec![Some(30.0); 10];
        values[0] = Some(80.0);
        despike(&mut values, TEMPERATURE_SIGMA);
        assert_eq!(values[0], Some(30.0));
    }
}
