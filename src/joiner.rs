//! Outer-join of the per-dataset tables plus run provenance metadata.

use std::collections::BTreeMap;

use chrono::Utc;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::registry::DatasetDescriptor;

/// Provenance attached to a combined table, replacing whatever metadata a
/// previous run may have written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// RFC 3339 timestamp of the run that produced the table.
    pub generated_at: String,
    /// Dataset name to source location, for exactly the requested datasets.
    pub datasets: BTreeMap<String, String>,
}

impl RunMetadata {
    pub fn new(descriptors: &[&DatasetDescriptor]) -> Self {
        RunMetadata {
            generated_at: Utc::now().to_rfc3339(),
            datasets: descriptors
                .iter()
                .map(|d| (d.name.to_string(), d.source_location.clone()))
                .collect(),
        }
    }
}

/// Left-fold full outer join on `(locus, alleles)`. The result key set is the
/// union of all input key sets; a dataset's struct column is null for keys it
/// did not report. Input order only affects column layout, not the rows.
pub fn join_tables(
    tables: Vec<DataFrame>,
    descriptors: &[&DatasetDescriptor],
) -> Result<(DataFrame, RunMetadata)> {
    let mut tables = tables.into_iter();
    let first = tables.next().ok_or(PipelineError::EmptyRequest)?;

    let mut joined = first.lazy();
    for table in tables {
        joined = joined.join(
            table.lazy(),
            [col("locus"), col("alleles")],
            [col("locus"), col("alleles")],
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        );
    }
    let joined = joined
        .collect()?
        .sort(["locus", "alleles"], SortMultipleOptions::default())?;

    let metadata = RunMetadata::new(descriptors);
    info!(
        "combined {} dataset(s) into {} keyed rows",
        descriptors.len(),
        joined.height()
    );
    Ok((joined, metadata))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::registry::SourceFormat;

    fn keyed_table(name: &str, keys: &[(&str, &str)], scores: &[&str]) -> DataFrame {
        let locus = Series::new(
            "locus",
            keys.iter().map(|(l, _)| l.to_string()).collect::<Vec<_>>(),
        );
        let alleles = Series::new(
            "alleles",
            keys.iter().map(|(_, a)| a.to_string()).collect::<Vec<_>>(),
        );
        let score = Series::new("score", scores.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        DataFrame::new(vec![locus, alleles, score])
            .unwrap()
            .lazy()
            .with_column(as_struct(vec![col("score")]).alias(name))
            .select([col("locus"), col("alleles"), col(name)])
            .collect()
            .unwrap()
    }

    fn descriptor(name: &'static str, location: &str) -> DatasetDescriptor {
        DatasetDescriptor {
            name,
            source_location: location.to_string(),
            source_format: SourceFormat::Tsv,
            derivations: vec![],
            retained_fields: vec!["score"],
        }
    }

    #[test]
    fn outer_join_keys_are_the_union() {
        let a = keyed_table("a", &[("chrM:1", "A>G"), ("chrM:2", "C>T")], &["a1", "a2"]);
        let b = keyed_table("b", &[("chrM:2", "C>T"), ("chrM:3", "G>A")], &["b2", "b3"]);
        let desc_a = descriptor("a", "a.tsv");
        let desc_b = descriptor("b", "b.tsv");

        let (joined, _) = join_tables(vec![a, b], &[&desc_a, &desc_b]).unwrap();

        let keys: Vec<String> = joined
            .column("locus")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["chrM:1", "chrM:2", "chrM:3"]);

        // chrM:1 has no contribution from b, chrM:3 none from a.
        let b_scores = joined
            .column("b")
            .unwrap()
            .struct_()
            .unwrap()
            .field_by_name("score")
            .unwrap();
        let b_values: Vec<Option<String>> = b_scores
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_owned))
            .collect();
        assert_eq!(b_values, vec![None, Some("b2".to_string()), Some("b3".to_string())]);

        let a_scores = joined
            .column("a")
            .unwrap()
            .struct_()
            .unwrap()
            .field_by_name("score")
            .unwrap();
        let a_values: Vec<Option<String>> = a_scores
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_owned))
            .collect();
        assert_eq!(a_values, vec![Some("a1".to_string()), Some("a2".to_string()), None]);
    }

    #[test]
    fn metadata_reflects_exactly_the_requested_datasets() {
        let a = keyed_table("a", &[("chrM:1", "A>G")], &["a1"]);
        let desc_a = descriptor("a", "gs://somewhere/a.tsv");

        let (_, metadata) = join_tables(vec![a], &[&desc_a]).unwrap();
        assert_eq!(metadata.datasets.len(), 1);
        assert_eq!(
            metadata.datasets.get("a"),
            Some(&"gs://somewhere/a.tsv".to_string())
        );
        // Fresh, parseable timestamp.
        assert!(chrono::DateTime::parse_from_rfc3339(&metadata.generated_at).is_ok());
    }

    #[test]
    fn no_tables_is_an_error() {
        match join_tables(vec![], &[]) {
            Err(PipelineError::EmptyRequest) => {}
            other => panic!("expected EmptyRequest, got {other:?}"),
        }
    }
}
