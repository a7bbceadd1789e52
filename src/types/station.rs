//! Data structures describing the weather stations that interpolation draws
//! from, including registry membership and the implementations required for
//! spatial indexing with the `rstar` crate.

use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names one of the two independent station registries.
///
/// A registry is a set of stations that all record the same variables. The
/// primary registry carries temperature, precipitation and snowfall history;
/// the secondary registry carries wind and sunshine history. The two are
/// selected, weighted and merged independently before being reconciled into a
/// single daily series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    /// Temperature / precipitation / snowfall stations.
    Primary,
    /// Wind / sunshine / wind-direction stations.
    Secondary,
}

impl Registry {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Registry::Primary => "primary",
            Registry::Secondary => "secondary",
        }
    }

    pub(crate) fn cache_file_prefix(&self) -> String {
        format!("{}-", self.path_segment())
    }

    /// Column names of the headerless daily CSV archives for this registry,
    /// in file order.
    pub(crate) fn schema_column_names(&self) -> Vec<&'static str> {
        match self {
            Registry::Primary => vec!["date", "tmax", "tmin", "prcp", "snow"],
            Registry::Secondary => vec!["date", "wdir", "wspd", "wpgt", "sun_pct"],
        }
    }
}

/// Formats a `Registry` using its `path_segment`.
///
/// ```
/// use spotclim::Registry;
///
/// assert_eq!(Registry::Primary.to_string(), "primary");
/// assert_eq!(format!("{}", Registry::Secondary), "secondary");
/// ```
impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// A single weather station as listed in a registry catalog.
///
/// Identity is the pair of upstream provider code and station id (for example
/// `"GHCN"` + `"USW00023062"`); together they form the [`code`](Self::code)
/// that series providers use to locate the station's daily archive. Location
/// is decimal-degree latitude/longitude plus elevation in feet. Records are
/// immutable once loaded and owned by the registry index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRecord {
    /// Upstream provider code (e.g. "GHCN", "ISD").
    pub provider: String,
    /// Provider-scoped station identifier.
    pub id: String,
    /// Human-readable station name, if the catalog carries one.
    pub name: Option<String>,
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
    /// Station elevation in feet above sea level.
    pub elevation_ft: f64,
    /// Which registry this station belongs to.
    pub registry: Registry,
}

impl StationRecord {
    /// The `PROVIDER:ID` reference that daily-series providers resolve.
    pub fn code(&self) -> String {
        format!("{}:{}", self.provider, self.id)
    }
}

impl RTreeObject for StationRecord {
    type Envelope = AABB<[f64; 2]>;

    /// A station is a point, so its envelope is the degenerate box around
    /// `[latitude, longitude]`.
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

impl PointDistance for StationRecord {
    /// Squared Euclidean distance in degree space. This is only the R-tree's
    /// candidate ordering; true ranking uses great-circle miles afterwards
    /// (see `stations::select`).
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.latitude - point[0];
        let dy = self.longitude - point[1];
        dx * dx + dy * dy
    }
}
