//! Error taxonomy for the reference-dataset pipeline.
//!
//! Every error is terminal for the run: there is no retry policy and no
//! partial result is ever persisted.

use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{count} dataset(s) are not supported: {names:?}")]
    UnsupportedDatasets { count: usize, names: Vec<String> },

    #[error("no datasets requested")]
    EmptyRequest,

    #[error("failed to read {path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed source {path}: {detail}")]
    SourceParse { path: String, detail: String },

    #[error("dataset {dataset}: derivation of '{field}' failed: {detail}")]
    Derivation {
        dataset: String,
        field: String,
        detail: String,
    },

    #[error("JSON source {path} contains no records; cannot derive a header")]
    EmptyJson { path: String },

    #[error("JSON source {path} is not an array of flat objects")]
    JsonShape { path: String },

    #[error("output path {path} already exists; pass --force-write to replace it")]
    OutputExists { path: String },

    #[error("unsupported reference genome {name:?}; only GRCh38 is supported")]
    UnsupportedReference { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] PolarsError),

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
