//! Station registry loading and the in-memory spatial index.
//!
//! A [`StationRegistryProvider`] hands back every station a registry knows
//! about; the engine builds one [`StationIndex`] per registry from that list.
//! The bundled [`CatalogFile`] provider reads JSON catalogs from an archive
//! directory and keeps a bincode copy next to the cache so repeat runs skip
//! the JSON parse.

use crate::stations::error::RegistryError;
use crate::types::station::{Registry, StationRecord};
use async_trait::async_trait;
use bincode::config::{Configuration, Fixint, LittleEndian};
use haversine::{distance, Location as HaversineLocation, Units};
use log::{debug, info};
use ordered_float::OrderedFloat;
use rstar::RTree;
use std::path::{Path, PathBuf};

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Kilometers per statute mile as the archive's distance tables define it.
pub(crate) const KM_PER_MILE: f64 = 1.6;

/// Source of station metadata for one registry.
///
/// The contract only requires identity, coordinates, elevation, and the
/// registry tag; an implementation may be a flat catalog, a database, or a
/// spatial service. Returning an empty list is valid and is reported by the
/// engine as `NoStationsAvailable`.
#[async_trait]
pub trait StationRegistryProvider: Send + Sync {
    async fn load(&self, registry: Registry) -> Result<Vec<StationRecord>, RegistryError>;
}

/// JSON catalog files under an archive directory, one per registry
/// (`stations_primary.json`, `stations_secondary.json`), with a bincode
/// sidecar cache for fast reloads.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    archive_dir: PathBuf,
    cache_dir: PathBuf,
}

impl CatalogFile {
    pub fn new(archive_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        CatalogFile {
            archive_dir: archive_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    fn catalog_path(&self, registry: Registry) -> PathBuf {
        self.archive_dir
            .join(format!("stations_{}.json", registry.path_segment()))
    }

    fn cache_path(&self, registry: Registry) -> PathBuf {
        self.cache_dir
            .join(format!("stations_{}.bin", registry.path_segment()))
    }

    fn decode_cached(cache_path: &Path) -> Result<Vec<StationRecord>, RegistryError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| RegistryError::CacheRead(cache_path.to_path_buf(), e))?;
        let (stations, _) = bincode::serde::decode_from_slice::<Vec<StationRecord>, _>(
            &bytes,
            BINCODE_CONFIG,
        )
        .map_err(|e| RegistryError::CacheDecode(cache_path.to_path_buf(), Box::from(e)))?;
        Ok(stations)
    }

    async fn write_cache(
        stations: Vec<StationRecord>,
        cache_path: &Path,
    ) -> Result<(), RegistryError> {
        let encoded = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| RegistryError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(cache_path, &encoded)
            .await
            .map_err(|e| RegistryError::CacheWrite(cache_path.to_path_buf(), e))?;
        debug!(
            "Cached station catalog ({} bytes) at {}",
            encoded.len(),
            cache_path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl StationRegistryProvider for CatalogFile {
    async fn load(&self, registry: Registry) -> Result<Vec<StationRecord>, RegistryError> {
        let cache_path = self.cache_path(registry);
        if cache_path.exists() {
            let path_clone = cache_path.clone();
            let stations =
                tokio::task::spawn_blocking(move || Self::decode_cached(&path_clone)).await??;
            debug!(
                "Loaded {} {} stations from cache",
                stations.len(),
                registry
            );
            return Ok(stations);
        }

        let catalog_path = self.catalog_path(registry);
        let bytes = tokio::fs::read(&catalog_path)
            .await
            .map_err(|e| RegistryError::CatalogRead(catalog_path.clone(), e))?;
        let parse_path = catalog_path.clone();
        let stations = tokio::task::spawn_blocking(move || {
            serde_json::from_slice::<Vec<StationRecord>>(&bytes)
                .map_err(|e| RegistryError::CatalogParse(parse_path, e))
        })
        .await??;
        info!(
            "Parsed {} {} stations from {}",
            stations.len(),
            registry,
            catalog_path.display()
        );
        Self::write_cache(stations.clone(), &cache_path).await?;
        Ok(stations)
    }
}

/// R-tree over one registry's stations, queried by proximity.
#[derive(Debug, Clone)]
pub struct StationIndex {
    registry: Registry,
    rtree: RTree<StationRecord>,
}

impl StationIndex {
    pub fn build(registry: Registry, stations: Vec<StationRecord>) -> Self {
        StationIndex {
            registry,
            rtree: RTree::bulk_load(stations),
        }
    }

    pub fn registry(&self) -> Registry {
        self.registry
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Up to `n_results` stations nearest the target, ascending by
    /// great-circle miles, optionally capped at `max_distance_miles`.
    ///
    /// The R-tree ranks by squared degree offsets, which disagrees with
    /// great-circle distance away from the equator, so the iterator is
    /// overscanned and the candidates re-sorted on true miles.
    pub fn nearest(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_miles: Option<f64>,
    ) -> Vec<(StationRecord, f64)> {
        if n_results == 0 {
            return vec![];
        }

        let query_point = [latitude, longitude];
        let candidate_limit = (n_results * 2).max(20);

        let mut stations_with_dist: Vec<(StationRecord, f64)> = self
            .rtree
            .nearest_neighbor_iter(&query_point)
            .take(candidate_limit)
            .filter_map(|station| {
                let miles = distance_miles(latitude, longitude, station.latitude, station.longitude);
                match max_distance_miles {
                    Some(cap) if miles > cap => None,
                    _ => Some((station.to_owned(), miles)),
                }
            })
            .collect();

        stations_with_dist.sort_by_key(|(_, miles)| OrderedFloat(*miles));
        stations_with_dist.truncate(n_results);
        stations_with_dist
    }
}

/// Great-circle distance in statute miles.
pub fn distance_miles(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let km = distance(
        HaversineLocation {
            latitude: lat_a,
            longitude: lon_a,
        },
        HaversineLocation {
            latitude: lat_b,
            longitude: lon_b,
        },
        Units::Kilometers,
    );
    km / KM_PER_MILE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, lat: f64, lon: f64) -> StationRecord {
        StationRecord {
            provider: "TEST".to_string(),
            id: id.to_string(),
            name: None,
            latitude: lat,
            longitude: lon,
            elevation_ft: 1000.0,
            registry: Registry::Primary,
        }
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let d_ab = distance_miles(39.7, -104.9, 40.0, -105.3);
        let d_ba = distance_miles(40.0, -105.3, 39.7, -104.9);
        assert!((d_ab - d_ba).abs() < 1e-9);
        assert_eq!(distance_miles(39.7, -104.9, 39.7, -104.9), 0.0);
        // Denver to Boulder is roughly 27 land miles.
        assert!(d_ab > 15.0 && d_ab < 40.0, "got {} miles", d_ab);
    }

    #[test]
    fn nearest_orders_by_true_miles() {
        let index = StationIndex::build(
            Registry::Primary,
            vec![
                station("FAR", 42.0, -100.0),
                station("NEAR", 39.8, -104.9),
                station("MID", 40.5, -104.0),
            ],
        );
        let hits = index.nearest(39.7, -104.9, 2, None);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.id, "NEAR");
        assert_eq!(hits[1].0.id, "MID");
        assert!(hits[0].1 < hits[1].1);
    }

    #[test]
    fn nearest_honors_the_distance_cap() {
        let index = StationIndex::build(
            Registry::Primary,
            vec![station("NEAR", 39.8, -104.9), station("FAR", 45.0, -95.0)],
        );
        let hits = index.nearest(39.7, -104.9, 5, Some(50.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.id, "NEAR");
    }

    #[test]
    fn nearest_with_zero_results_is_empty() {
        let index = StationIndex::build(Registry::Primary, vec![station("A", 39.8, -104.9)]);
        assert!(index.nearest(39.7, -104.9, 0, None).is_empty());
    }

    #[tokio::test]
    async fn catalog_provider_reads_json_and_reuses_cache() -> Result<(), RegistryError> {
        let archive = tempfile::tempdir().expect("tempdir");
        let cache = tempfile::tempdir().expect("tempdir");
        let catalog = serde_json::json!([
            {
                "provider": "GHCN",
                "id": "USW00023062",
                "name": "Denver Stapleton",
                "latitude": 39.7633,
                "longitude": -104.8694,
                "elevation_ft": 5285.0,
                "registry": "primary"
            }
        ]);
        tokio::fs::write(
            archive.path().join("stations_primary.json"),
            serde_json::to_vec(&catalog).expect("serialize catalog"),
        )
        .await
        .expect("write catalog");

        let provider = CatalogFile::new(archive.path(), cache.path());
        let stations = provider.load(Registry::Primary).await?;
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].code(), "GHCN:USW00023062");

        // Second load must come from the bincode sidecar.
        assert!(cache.path().join("stations_primary.bin").exists());
        let again = provider.load(Registry::Primary).await?;
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].elevation_ft, 5285.0);
        Ok(())
    }
}
