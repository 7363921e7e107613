//! Persistence of the combined table as a directory artifact.
//!
//! The artifact layout is `data.parquet` for the rows plus `metadata.json`
//! for the run provenance. The `table` source format reads the same layout
//! back, so one run's output can feed a later run.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::joiner::RunMetadata;

pub const DATA_FILE: &str = "data.parquet";
pub const METADATA_FILE: &str = "metadata.json";

/// Write the combined table and its metadata to `path`. An existing artifact
/// is only replaced when `force` is set; without it, nothing is touched.
pub fn write_artifact(
    df: &mut DataFrame,
    metadata: &RunMetadata,
    path: &Path,
    force: bool,
) -> Result<()> {
    if path.exists() {
        if !force {
            return Err(PipelineError::OutputExists {
                path: path.display().to_string(),
            });
        }
        if path.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
    }
    fs::create_dir_all(path)?;

    let data = File::create(path.join(DATA_FILE))?;
    ParquetWriter::new(data).finish(df)?;

    let meta = File::create(path.join(METADATA_FILE))?;
    serde_json::to_writer_pretty(meta, metadata)?;

    info!("wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Read back the provenance metadata of an artifact.
pub fn read_metadata(path: &Path) -> Result<RunMetadata> {
    let file = File::open(path.join(METADATA_FILE)).map_err(|source| PipelineError::SourceRead {
        path: path.join(METADATA_FILE).display().to_string(),
        source,
    })?;
    Ok(serde_json::from_reader(file)?)
}
