//! Per-dataset loading: fetch, derive, nest, filter, re-key.
//!
//! Each dataset comes out of this module as a table with exactly three
//! columns: the `locus` and `alleles` key columns, and one struct column
//! named after the dataset that holds its retained fields. That shape keeps
//! field provenance intact once the tables are joined.

mod json;
mod vcf;

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::registry::{DatasetDescriptor, MITO_CONTIG, SourceFormat};

/// Load every requested dataset, preserving the requested order.
pub fn load_tables(descriptors: &[&DatasetDescriptor]) -> Result<Vec<DataFrame>> {
    descriptors.iter().map(|d| load_dataset(d)).collect()
}

/// Load one dataset into its annotated, keyed form.
pub fn load_dataset(desc: &DatasetDescriptor) -> Result<DataFrame> {
    info!("loading dataset {}", desc.name);

    let mut df = match desc.source_format {
        SourceFormat::Table => read_table(&desc.source_location)?,
        SourceFormat::Tsv => read_tsv(Path::new(&desc.source_location))?,
        SourceFormat::Json => json::read_json(&desc.source_location)?,
        SourceFormat::Vcf => vcf::read_vcf(&desc.source_location)?,
    };

    for (output, transform) in &desc.derivations {
        let series = transform.apply(desc.name, output, &df)?;
        df.with_column(series)?;
    }

    let df = nest_retained(df, desc)?;
    let df = filter_mito(df)?;
    let df = re_key(df, desc.name)?;

    info!("dataset {} has {} mitochondrial rows", desc.name, df.height());
    Ok(df)
}

/// Read a prebuilt columnar table: either a bare Parquet file or an artifact
/// directory written by this tool.
fn read_table(location: &str) -> Result<DataFrame> {
    let path = Path::new(location);
    let data = if path.is_dir() {
        path.join(crate::writer::DATA_FILE)
    } else {
        path.to_path_buf()
    };
    let file = File::open(&data).map_err(|source| PipelineError::SourceRead {
        path: data.display().to_string(),
        source,
    })?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Read tab-separated text with a header row; every column stays a string.
pub(crate) fn read_tsv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|source| PipelineError::SourceRead {
        path: path.display().to_string(),
        source,
    })?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(b'\t'))
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}

/// Wrap the retained fields into a single struct column named after the
/// dataset.
fn nest_retained(df: DataFrame, desc: &DatasetDescriptor) -> Result<DataFrame> {
    let fields: Vec<Expr> = desc.retained_fields.iter().map(|f| col(*f)).collect();
    let df = df
        .lazy()
        .with_column(as_struct(fields).alias(desc.name))
        .collect()?;
    Ok(df)
}

/// Keep only rows whose locus contig is the mitochondrial contig. Sources
/// may carry rows from other contigs; they never belong in the output.
fn filter_mito(df: DataFrame) -> Result<DataFrame> {
    let mask: BooleanChunked = df
        .column("locus")?
        .str()?
        .into_iter()
        .map(|v| Some(matches!(v, Some(s) if s.split(':').next() == Some(MITO_CONTIG))))
        .collect();
    Ok(df.filter(&mask)?)
}

/// Re-key the table by `(locus, alleles)`: keep exactly the key columns plus
/// the dataset's struct column, sorted by key. Idempotent.
pub fn re_key(df: DataFrame, dataset: &str) -> Result<DataFrame> {
    let df = df
        .lazy()
        .select([col("locus"), col("alleles"), col(dataset)])
        .collect()?
        .sort(["locus", "alleles"], SortMultipleOptions::default())?;
    warn_on_duplicate_keys(&df, dataset)?;
    Ok(df)
}

fn warn_on_duplicate_keys(df: &DataFrame, dataset: &str) -> Result<()> {
    let locus = df.column("locus")?.str()?;
    let alleles = df.column("alleles")?.str()?;
    let mut seen = BTreeSet::new();
    let mut duplicates = 0usize;
    for key in locus.into_iter().zip(alleles) {
        if !seen.insert((key.0.map(str::to_owned), key.1.map(str::to_owned))) {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        warn!("dataset {dataset} has {duplicates} duplicate (locus, alleles) keys");
    }
    Ok(())
}
