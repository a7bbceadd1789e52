//! Inverse-distance weighting over a ranked station list.
//!
//! Selection itself happens in [`StationIndex::nearest`]; this module turns
//! the ranked `(station, miles)` pairs into a [`WeightedStationSet`] whose
//! weights sum to 1.0 and never increase with distance.
//!
//! [`StationIndex::nearest`]: crate::stations::registry::StationIndex::nearest

use crate::error::SpotclimError;
use crate::types::station::{Registry, StationRecord};
use ordered_float::OrderedFloat;
use std::collections::HashSet;

/// One selected station with its great-circle distance and blend weight.
#[derive(Debug, Clone)]
pub struct WeightedStation {
    pub station: StationRecord,
    pub distance_miles: f64,
    pub weight: f64,
}

/// Ordered stations feeding one registry's blend.
///
/// Rows ascend by distance. Weights are `(1/d)^p` normalized to sum 1.0, so
/// they are antitonic in distance by construction; distances below the
/// configured floor are clamped first, which keeps a station sitting exactly
/// on the target from collapsing the whole budget onto itself.
#[derive(Debug, Clone)]
pub struct WeightedStationSet {
    registry: Registry,
    rows: Vec<WeightedStation>,
}

impl WeightedStationSet {
    /// Weights a ranked `(station, distance_miles)` list.
    ///
    /// Fails with [`SpotclimError::DegenerateDistance`] only when the floor
    /// itself is unusable: some distance is zero and `min_distance_miles`
    /// is not positive, so no substitute distance exists.
    pub fn build(
        registry: Registry,
        ranked: Vec<(StationRecord, f64)>,
        weight_power: f64,
        min_distance_miles: f64,
    ) -> Result<Self, SpotclimError> {
        let mut ranked = ranked;
        ranked.sort_by_key(|(_, miles)| OrderedFloat(*miles));

        let distances: Vec<f64> = ranked.iter().map(|(_, d)| *d).collect();
        let weights = idw_weights(&distances, weight_power, min_distance_miles)
            .ok_or(SpotclimError::DegenerateDistance { registry })?;

        let rows = ranked
            .into_iter()
            .zip(weights)
            .map(|((station, distance_miles), weight)| WeightedStation {
                station,
                distance_miles,
                weight,
            })
            .collect();
        Ok(WeightedStationSet { registry, rows })
    }

    pub fn registry(&self) -> Registry {
        self.registry
    }

    pub fn rows(&self) -> &[WeightedStation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Weight-averaged station elevation in feet, 0.0 for an empty set.
    pub fn weighted_mean_elevation(&self) -> f64 {
        self.rows
            .iter()
            .map(|row| row.weight * row.station.elevation_ft)
            .sum()
    }

    /// The set restricted to stations whose code survived loading, with
    /// weights rescaled to sum 1.0 again. Order is preserved.
    pub fn renormalized_to(&self, surviving_codes: &HashSet<String>) -> WeightedStationSet {
        let kept: Vec<WeightedStation> = self
            .rows
            .iter()
            .filter(|row| surviving_codes.contains(&row.station.code()))
            .cloned()
            .collect();
        let total: f64 = kept.iter().map(|row| row.weight).sum();
        let rows = kept
            .into_iter()
            .map(|mut row| {
                if total > 0.0 {
                    row.weight /= total;
                }
                row
            })
            .collect();
        WeightedStationSet {
            registry: self.registry,
            rows,
        }
    }
}

/// `(1/d)^p` weights normalized to sum 1.0, distances clamped to the floor.
///
/// `None` when the floor cannot rescue a zero distance.
fn idw_weights(distances: &[f64], weight_power: f64, min_distance_miles: f64) -> Option<Vec<f64>> {
    if distances.is_empty() {
        return Some(vec![]);
    }
    let mut raw = Vec::with_capacity(distances.len());
    for &d in distances {
        let effective = d.max(min_distance_miles);
        if effective <= 0.0 {
            return None;
        }
        raw.push((1.0 / effective).powf(weight_power));
    }
    let total: f64 = raw.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(raw.into_iter().map(|w| w / total).collect())
}
