//! JSON ingestion: flatten an array of flat objects to a temporary TSV and
//! feed it through the delimited reader.
//!
//! The header comes from the first object's keys; later objects contribute an
//! empty cell for any key they lack. The staging file is a `NamedTempFile`,
//! so it is removed when it goes out of scope even when the load fails.

use std::io::Write;

use polars::prelude::DataFrame;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{PipelineError, Result};

pub(crate) fn read_json(location: &str) -> Result<DataFrame> {
    let text = std::fs::read_to_string(location).map_err(|source| PipelineError::SourceRead {
        path: location.to_string(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text)?;
    let staged = flatten_to_tsv(location, &value)?;
    super::read_tsv(staged.path())
}

fn flatten_to_tsv(location: &str, value: &Value) -> Result<NamedTempFile> {
    let rows = value.as_array().ok_or_else(|| PipelineError::JsonShape {
        path: location.to_string(),
    })?;
    let first = rows.first().ok_or_else(|| PipelineError::EmptyJson {
        path: location.to_string(),
    })?;
    let header: Vec<&String> = first
        .as_object()
        .ok_or_else(|| PipelineError::JsonShape {
            path: location.to_string(),
        })?
        .keys()
        .collect();

    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        "{}",
        header.iter().map(|k| k.as_str()).collect::<Vec<_>>().join("\t")
    )?;
    for row in rows {
        let object = row.as_object().ok_or_else(|| PipelineError::JsonShape {
            path: location.to_string(),
        })?;
        let cells: Vec<String> = header
            .iter()
            .map(|key| object.get(*key).map(cell_text).unwrap_or_default())
            .collect();
        writeln!(file, "{}", cells.join("\t"))?;
    }
    file.flush()?;
    Ok(file)
}

/// Render a JSON scalar as a TSV cell. Strings are written bare, null as an
/// empty cell, everything else in its JSON spelling.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
