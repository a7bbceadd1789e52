//! Flat-file archive provider.
//!
//! Reads headerless daily CSVs laid out as
//! `<archive>/daily/<registry>/<PROVIDER>-<ID>.csv` (optionally gzipped as
//! `.csv.gz`), converts each station file to a parquet cache entry on first
//! touch, and keeps the scanned `LazyFrame` memoized for the life of the
//! provider. Everything downstream works on typed rows, so polars stays
//! confined to this module and [`extract`](crate::series::extract).

use crate::series::error::SeriesError;
use crate::series::extract::{self, COL_DATE};
use crate::series::provider::{DailySeries, DailySeriesProvider, SeriesOutcome};
use crate::types::config::Period;
use crate::types::station::{Registry, StationRecord};
use async_compression::tokio::bufread::GzipDecoder;
use async_trait::async_trait;
use log::{info, warn};
use polars::prelude::*;
use std::collections::{hash_map::Entry, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::sync::Mutex;
use tokio::{fs, task};

/// Archive-backed [`DailySeriesProvider`].
pub struct ArchiveSeries {
    archive_dir: PathBuf,
    cache_dir: PathBuf,
    lazyframe_cache: Mutex<HashMap<(String, Registry), LazyFrame>>,
}

impl ArchiveSeries {
    pub fn new(archive_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        ArchiveSeries {
            archive_dir: archive_dir.into(),
            cache_dir: cache_dir.into(),
            lazyframe_cache: Mutex::new(HashMap::new()),
        }
    }

    /// File stem shared by archive and cache entries for one station.
    fn station_stem(station: &StationRecord) -> String {
        format!("{}-{}", station.provider, station.id)
    }

    /// The station's archive file if one exists; `.csv.gz` wins over `.csv`.
    async fn archive_path(&self, station: &StationRecord) -> Option<PathBuf> {
        let dir = self
            .archive_dir
            .join("daily")
            .join(station.registry.path_segment());
        let stem = Self::station_stem(station);
        let gz = dir.join(format!("{stem}.csv.gz"));
        if fs::metadata(&gz).await.is_ok() {
            return Some(gz);
        }
        let plain = dir.join(format!("{stem}.csv"));
        if fs::metadata(&plain).await.is_ok() {
            return Some(plain);
        }
        None
    }

    async fn read_archive(path: &Path) -> Result<Vec<u8>, SeriesError> {
        if path.extension().is_some_and(|ext| ext == "gz") {
            let file = fs::File::open(path)
                .await
                .map_err(|e| SeriesError::ArchiveRead(path.to_path_buf(), e))?;
            let mut decoder = GzipDecoder::new(BufReader::new(file));
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .await
                .map_err(|e| SeriesError::ArchiveDecompress(path.to_path_buf(), e))?;
            Ok(decompressed)
        } else {
            fs::read(path)
                .await
                .map_err(|e| SeriesError::ArchiveRead(path.to_path_buf(), e))
        }
    }

    /// Parses raw headerless CSV bytes into a DataFrame on a blocking task,
    /// names the columns per the registry schema, and normalizes dtypes
    /// (date column to `Date`, every physical column to `Float64`).
    async fn csv_to_dataframe(
        bytes: Vec<u8>,
        station: &str,
        registry: Registry,
    ) -> Result<DataFrame, SeriesError> {
        let station_owned = station.to_string();
        let schema_names = registry.schema_column_names();

        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new().map_err(|e| SeriesError::CsvReadIo {
                station: station_owned.clone(),
                source: e,
            })?;
            temp_file
                .write_all(&bytes)
                .map_err(|e| SeriesError::CsvReadIo {
                    station: station_owned.clone(),
                    source: e,
                })?;
            temp_file.flush().map_err(|e| SeriesError::CsvReadIo {
                station: station_owned.clone(),
                source: e,
            })?;

            let mut df = CsvReadOptions::default()
                .with_has_header(false)
                .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
                .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
                .map_err(|e| SeriesError::CsvReadPolars {
                    station: station_owned.clone(),
                    source: e,
                })?
                .finish()
                .map_err(|e| SeriesError::CsvReadPolars {
                    station: station_owned.clone(),
                    source: e,
                })?;

            if df.width() != schema_names.len() {
                warn!(
                    "CSV column count ({}) does not match schema length ({}) for station {} in the {} registry",
                    df.width(),
                    schema_names.len(),
                    station_owned,
                    registry
                );
                return Err(SeriesError::SchemaMismatch {
                    station: station_owned,
                    registry,
                    expected: schema_names.len(),
                    found: df.width(),
                });
            }

            df.set_column_names(schema_names.iter().copied())
                .map_err(|e| SeriesError::ColumnRename {
                    station: station_owned.clone(),
                    source: e,
                })?;

            let mut casts: Vec<Expr> = vec![col(COL_DATE).cast(DataType::Date)];
            for name in schema_names.iter().skip(1) {
                casts.push(col(*name).cast(DataType::Float64));
            }
            df.lazy()
                .with_columns(casts)
                .collect()
                .map_err(|e| SeriesError::CsvReadPolars {
                    station: station_owned,
                    source: e,
                })
        })
        .await?
    }

    /// Writes a DataFrame to a parquet file on a blocking task.
    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), SeriesError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| SeriesError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| SeriesError::ParquetWritePolars(path_buf, e))?;
            Ok::<(), SeriesError>(())
        })
        .await??;
        Ok(())
    }

    /// Scans (building the parquet cache entry if needed) one station's
    /// full-history frame.
    async fn load_frame(
        &self,
        station: &StationRecord,
        archive_path: &Path,
    ) -> Result<LazyFrame, SeriesError> {
        let stem = Self::station_stem(station);
        let cache_filename = format!(
            "{}{}.parquet",
            station.registry.cache_file_prefix(),
            stem
        );
        let parquet_path = self.cache_dir.join(&cache_filename);

        if fs::metadata(&parquet_path).await.is_ok() {
            info!(
                "Cache hit for {} series for station {} at {:?}",
                station.registry,
                station.code(),
                parquet_path
            );
        } else {
            info!(
                "Cache miss for {} series for station {}. Reading archive.",
                station.registry,
                station.code()
            );
            let raw_bytes = Self::read_archive(archive_path).await?;
            let df = Self::csv_to_dataframe(raw_bytes, &station.code(), station.registry).await?;

            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| SeriesError::CacheDirCreation(self.cache_dir.clone(), e))?;
            Self::cache_dataframe(df, &parquet_path).await?;
            info!(
                "Cached {} series for station {} to {:?}",
                station.registry,
                station.code(),
                parquet_path
            );
        }

        LazyFrame::scan_parquet(&parquet_path, Default::default())
            .map_err(|e| SeriesError::ParquetScan(parquet_path.clone(), e))
    }

    /// The station's memoized frame, or `None` when the archive has no file.
    async fn station_frame(
        &self,
        station: &StationRecord,
    ) -> Result<Option<LazyFrame>, SeriesError> {
        let key = (station.code(), station.registry);

        {
            let cache = self.lazyframe_cache.lock().await;
            if let Some(frame) = cache.get(&key) {
                return Ok(Some(frame.clone()));
            }
        }

        let Some(archive_path) = self.archive_path(station).await else {
            return Ok(None);
        };
        let loaded_frame = self.load_frame(station, &archive_path).await?;

        let mut cache = self.lazyframe_cache.lock().await;
        match cache.entry(key) {
            Entry::Occupied(entry) => {
                // Another load won the race; keep its frame.
                Ok(Some(entry.get().clone()))
            }
            Entry::Vacant(entry) => {
                entry.insert(loaded_frame.clone());
                Ok(Some(loaded_frame))
            }
        }
    }
}

#[async_trait]
impl DailySeriesProvider for ArchiveSeries {
    async fn fetch(
        &self,
        station: &StationRecord,
        period: Period,
    ) -> Result<SeriesOutcome, SeriesError> {
        let Some(frame) = self.station_frame(station).await? else {
            return Ok(SeriesOutcome::NoData);
        };

        let code = station.code();
        let df = frame
            .filter(
                col(COL_DATE)
                    .gt_eq(lit(period.start))
                    .and(col(COL_DATE).lt_eq(lit(period.end))),
            )
            .collect()
            .map_err(|e| SeriesError::Collect {
                station: code.clone(),
                source: e,
            })?;

        let series = match station.registry {
            Registry::Primary => DailySeries::Primary(extract::primary_days(&df, &code)?),
            Registry::Secondary => DailySeries::Secondary(extract::secondary_days(&df, &code)?),
        };
        Ok(SeriesOutcome::Loaded(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio::io::AsyncWriteExt;

    fn station(registry: Registry) -> StationRecord {
        StationRecord {
            provider: "GHCN".to_string(),
            id: "USW00023062".to_string(),
            name: Some("Denver Stapleton".to_string()),
            latitude: 39.7633,
            longitude: -104.8694,
            elevation_ft: 5285.0,
            registry,
        }
    }

    fn period(start: (i32, u32, u32), end: (i32, u32, u32)) -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
    }

    async fn write_archive(root: &Path, registry: Registry, name: &str, contents: &str) {
        let dir = root.join("daily").join(registry.path_segment());
        fs::create_dir_all(&dir).await.expect("archive dir");
        fs::write(dir.join(name), contents).await.expect("archive file");
    }

    #[tokio::test]
    async fn fetch_reads_csv_builds_parquet_and_types_rows() -> Result<(), SeriesError> {
        let archive = tempfile::tempdir().expect("tempdir");
        let cache = tempfile::tempdir().expect("tempdir");
        write_archive(
            archive.path(),
            Registry::Primary,
            "GHCN-USW00023062.csv",
            "2020-01-01,41.0,22.0,0.0,0.0\n2020-01-02,-9999,25.5,0.05,\n2020-01-03,38.0,20.0,0.3,1.5\n",
        )
        .await;

        let provider = ArchiveSeries::new(archive.path(), cache.path());
        let outcome = provider
            .fetch(&station(Registry::Primary), period((2020, 1, 1), (2020, 1, 2)))
            .await?;

        let SeriesOutcome::Loaded(DailySeries::Primary(rows)) = outcome else {
            panic!("expected loaded primary series");
        };
        assert_eq!(rows.len(), 2); // third day filtered out by the period
        assert_eq!(rows[0].high_temp, Some(41.0));
        assert_eq!(rows[1].high_temp, None); // -9999 sentinel
        assert_eq!(rows[1].snowfall, None); // trailing empty field
        assert_eq!(rows[1].low_temp, Some(25.5));
        assert!(
            cache
                .path()
                .join("primary-GHCN-USW00023062.parquet")
                .exists(),
            "parquet cache entry missing"
        );
        Ok(())
    }

    #[tokio::test]
    async fn fetch_decompresses_gzipped_archives() -> Result<(), SeriesError> {
        use async_compression::tokio::write::GzipEncoder;

        let archive = tempfile::tempdir().expect("tempdir");
        let cache = tempfile::tempdir().expect("tempdir");
        let dir = archive.path().join("daily").join("secondary");
        fs::create_dir_all(&dir).await.expect("archive dir");

        let file = fs::File::create(dir.join("GHCN-USW00023062.csv.gz"))
            .await
            .expect("gz file");
        let mut encoder = GzipEncoder::new(file);
        encoder
            .write_all(b"2020-06-01,180,7.5,21.0,88\n2020-06-02,200,9.0,,72\n")
            .await
            .expect("gz write");
        encoder.shutdown().await.expect("gz finish");

        let provider = ArchiveSeries::new(archive.path(), cache.path());
        let outcome = provider
            .fetch(
                &station(Registry::Secondary),
                period((2020, 6, 1), (2020, 6, 30)),
            )
            .await?;

        let SeriesOutcome::Loaded(DailySeries::Secondary(rows)) = outcome else {
            panic!("expected loaded secondary series");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].wind_direction, Some(180.0));
        assert_eq!(rows[0].sunshine_pct, Some(88.0));
        assert_eq!(rows[1].wind_gust, None);
        Ok(())
    }

    #[tokio::test]
    async fn missing_archive_file_is_no_data_not_an_error() -> Result<(), SeriesError> {
        let archive = tempfile::tempdir().expect("tempdir");
        let cache = tempfile::tempdir().expect("tempdir");
        let provider = ArchiveSeries::new(archive.path(), cache.path());

        let outcome = provider
            .fetch(&station(Registry::Primary), period((2020, 1, 1), (2020, 1, 31)))
            .await?;
        assert!(matches!(outcome, SeriesOutcome::NoData));
        Ok(())
    }

    #[tokio::test]
    async fn period_outside_records_is_an_empty_series() -> Result<(), SeriesError> {
        let archive = tempfile::tempdir().expect("tempdir");
        let cache = tempfile::tempdir().expect("tempdir");
        write_archive(
            archive.path(),
            Registry::Primary,
            "GHCN-USW00023062.csv",
            "2020-01-01,41.0,22.0,0.0,0.0\n",
        )
        .await;

        let provider = ArchiveSeries::new(archive.path(), cache.path());
        let outcome = provider
            .fetch(&station(Registry::Primary), period((1995, 1, 1), (1995, 12, 31)))
            .await?;
        let SeriesOutcome::Loaded(series) = outcome else {
            panic!("expected loaded outcome for an existing archive");
        };
        assert!(series.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn wrong_column_count_is_a_schema_mismatch() {
        let archive = tempfile::tempdir().expect("tempdir");
        let cache = tempfile::tempdir().expect("tempdir");
        write_archive(
            archive.path(),
            Registry::Primary,
            "GHCN-USW00023062.csv",
            "2020-01-01,41.0,22.0\n",
        )
        .await;

        let provider = ArchiveSeries::new(archive.path(), cache.path());
        let err = provider
            .fetch(&station(Registry::Primary), period((2020, 1, 1), (2020, 1, 31)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SeriesError::SchemaMismatch {
                expected: 5,
                found: 3,
                ..
            }
        ));
    }
}
