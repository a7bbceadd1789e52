use crate::types::station::Registry;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read daily archive '{0}'")]
    ArchiveRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to decompress daily archive '{0}'")]
    ArchiveDecompress(PathBuf, #[source] std::io::Error),

    // Errors during CSV reading (inside blocking task)
    #[error("I/O error processing CSV data for station '{station}'")]
    CsvReadIo {
        station: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parsing error processing CSV data for station '{station}'")]
    CsvReadPolars {
        station: String,
        #[source]
        source: PolarsError,
    },

    #[error("CSV column count ({found}) does not match the {registry} schema length ({expected}) for station {station}")]
    SchemaMismatch {
        station: String,
        registry: Registry,
        expected: usize,
        found: usize,
    },

    #[error("Failed to rename columns for station {station}: {source}")]
    ColumnRename {
        station: String,
        source: PolarsError,
    },

    // Errors during parquet caching (inside blocking task)
    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet cache file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Polars operation failed for station {station}: {source}")]
    Collect {
        station: String,
        #[source]
        source: PolarsError,
    },

    #[error("Loading station {station} exceeded the {seconds} s deadline")]
    LoadTimeout { station: String, seconds: u64 },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
