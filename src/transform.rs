//! Row transforms: the derivation expressions a dataset descriptor declares.
//!
//! Each variant is a pure function from the raw table to one derived column.
//! The set of kinds is closed so every derivation in the registry can be
//! tested in isolation. Null inputs stay null; a non-null value the transform
//! cannot interpret is a fatal derivation error.

use polars::prelude::*;
use regex::Regex;

use crate::error::{PipelineError, Result};
use crate::registry::MITO_CONTIG;

/// Render a mitochondrial position as the canonical locus key.
pub fn mito_locus(position: u64) -> String {
    format!("{MITO_CONTIG}:{position}")
}

/// Render a reference/alternate pair as the canonical alleles key.
pub fn allele_pair(reference: &str, alternate: &str) -> String {
    format!("{reference}>{alternate}")
}

#[derive(Debug, Clone)]
pub enum RowTransform {
    /// The first capture of `pattern` applied to `field` is the position.
    LocusFromPattern {
        field: &'static str,
        pattern: &'static str,
    },
    /// `field` holds the position directly.
    LocusFromField { field: &'static str },
    /// Split `field` on `separator` and parse the piece at `index` as the
    /// position.
    LocusFromSplit {
        field: &'static str,
        separator: char,
        index: usize,
    },
    /// The two captures of `pattern` applied to `field` are REF and ALT.
    AllelesFromPattern {
        field: &'static str,
        pattern: &'static str,
    },
    /// REF and ALT live in two separate fields.
    AllelesFromFields {
        ref_field: &'static str,
        alt_field: &'static str,
    },
    /// Boolean: the source field is present and non-empty.
    Defined { field: &'static str },
    /// Copy an existing column under the output name.
    Passthrough { field: &'static str },
}

impl RowTransform {
    /// Compute the derived column named `output` from the raw table.
    pub fn apply(&self, dataset: &str, output: &str, df: &DataFrame) -> Result<Series> {
        match self {
            RowTransform::LocusFromPattern { field, pattern } => {
                let re = Regex::new(pattern)?;
                let values = map_str_column(df, dataset, output, field, |text| {
                    let caps = re.captures(text).ok_or_else(|| {
                        derivation_error(dataset, output, format!("{text:?} does not match {pattern:?}"))
                    })?;
                    let position = capture_position(dataset, output, &caps, 1)?;
                    Ok(mito_locus(position))
                })?;
                Ok(Series::new(output, values))
            }
            RowTransform::LocusFromField { field } => {
                let values = map_str_column(df, dataset, output, field, |text| {
                    Ok(mito_locus(parse_position(dataset, output, text)?))
                })?;
                Ok(Series::new(output, values))
            }
            RowTransform::LocusFromSplit {
                field,
                separator,
                index,
            } => {
                let values = map_str_column(df, dataset, output, field, |text| {
                    let piece = text.split(*separator).nth(*index).ok_or_else(|| {
                        derivation_error(
                            dataset,
                            output,
                            format!("{text:?} has no piece {index} when split on {separator:?}"),
                        )
                    })?;
                    Ok(mito_locus(parse_position(dataset, output, piece)?))
                })?;
                Ok(Series::new(output, values))
            }
            RowTransform::AllelesFromPattern { field, pattern } => {
                let re = Regex::new(pattern)?;
                let values = map_str_column(df, dataset, output, field, |text| {
                    let caps = re.captures(text).ok_or_else(|| {
                        derivation_error(dataset, output, format!("{text:?} does not match {pattern:?}"))
                    })?;
                    let reference = capture_str(dataset, output, &caps, 1)?;
                    let alternate = capture_str(dataset, output, &caps, 2)?;
                    Ok(allele_pair(reference, alternate))
                })?;
                Ok(Series::new(output, values))
            }
            RowTransform::AllelesFromFields {
                ref_field,
                alt_field,
            } => {
                let refs = df.column(ref_field)?.str()?;
                let alts = df.column(alt_field)?.str()?;
                let values: Vec<Option<String>> = refs
                    .into_iter()
                    .zip(alts)
                    .map(|(r, a)| match (r, a) {
                        (Some(r), Some(a)) => Some(allele_pair(r, a)),
                        _ => None,
                    })
                    .collect();
                Ok(Series::new(output, values))
            }
            RowTransform::Defined { field } => {
                let ca = df.column(field)?.str()?;
                let values: Vec<bool> = ca
                    .into_iter()
                    .map(|v| matches!(v, Some(s) if !s.is_empty()))
                    .collect();
                Ok(Series::new(output, values))
            }
            RowTransform::Passthrough { field } => {
                let mut series = df.column(field)?.clone();
                series.rename(output);
                Ok(series)
            }
        }
    }
}

/// Apply `f` to every non-null value of a string column, keeping nulls.
fn map_str_column(
    df: &DataFrame,
    dataset: &str,
    output: &str,
    field: &str,
    f: impl Fn(&str) -> Result<String>,
) -> Result<Vec<Option<String>>> {
    let ca = df.column(field).map_err(|_| {
        derivation_error(dataset, output, format!("source field {field:?} is missing"))
    })?;
    let ca = ca.str()?;
    let mut out = Vec::with_capacity(ca.len());
    for value in ca {
        match value {
            None => out.push(None),
            Some(text) => out.push(Some(f(text)?)),
        }
    }
    Ok(out)
}

fn derivation_error(dataset: &str, field: &str, detail: String) -> PipelineError {
    PipelineError::Derivation {
        dataset: dataset.to_string(),
        field: field.to_string(),
        detail,
    }
}

fn parse_position(dataset: &str, output: &str, text: &str) -> Result<u64> {
    text.trim()
        .parse()
        .map_err(|_| derivation_error(dataset, output, format!("{text:?} is not a position")))
}

fn capture_position(
    dataset: &str,
    output: &str,
    caps: &regex::Captures<'_>,
    group: usize,
) -> Result<u64> {
    parse_position(dataset, output, capture_str(dataset, output, caps, group)?)
}

fn capture_str<'c>(
    dataset: &str,
    output: &str,
    caps: &'c regex::Captures<'c>,
    group: usize,
) -> Result<&'c str> {
    caps.get(group)
        .map(|m| m.as_str())
        .ok_or_else(|| derivation_error(dataset, output, format!("pattern has no capture group {group}")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn single_column(name: &str, values: Vec<Option<&str>>) -> DataFrame {
        DataFrame::new(vec![Series::new(name, values)]).unwrap()
    }

    fn str_values(series: &Series) -> Vec<Option<String>> {
        series
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_owned))
            .collect()
    }

    #[test]
    fn locus_from_pattern_parses_hgvs_position() {
        let df = single_column("Allele", vec![Some("m.8993T>G"), None]);
        let t = RowTransform::LocusFromPattern {
            field: "Allele",
            pattern: "m.([0-9]+)",
        };
        let series = t.apply("mitomap", "locus", &df).unwrap();
        assert_eq!(str_values(&series), vec![Some("chrM:8993".to_string()), None]);
    }

    #[test]
    fn locus_from_pattern_rejects_non_matching_value() {
        let df = single_column("Allele", vec![Some("not a variant")]);
        let t = RowTransform::LocusFromPattern {
            field: "Allele",
            pattern: "m.([0-9]+)",
        };
        match t.apply("mitomap", "locus", &df) {
            Err(PipelineError::Derivation { dataset, field, .. }) => {
                assert_eq!(dataset, "mitomap");
                assert_eq!(field, "locus");
            }
            other => panic!("expected Derivation error, got {other:?}"),
        }
    }

    #[test]
    fn alleles_from_pattern_extracts_both_groups() {
        let df = single_column("Allele", vec![Some("m.8993T>G")]);
        let t = RowTransform::AllelesFromPattern {
            field: "Allele",
            pattern: "m.[0-9]+([ATGC]+)>([ATGC]+)",
        };
        let series = t.apply("mitomap", "alleles", &df).unwrap();
        assert_eq!(str_values(&series), vec![Some("T>G".to_string())]);
    }

    #[test]
    fn alleles_from_serialized_array() {
        let df = single_column("alleles", vec![Some(r#"["A","G"]"#)]);
        let t = RowTransform::AllelesFromPattern {
            field: "alleles",
            pattern: r#"\["([AGTC]+)","([AGTC]+)"\]"#,
        };
        let series = t.apply("helix", "alleles", &df).unwrap();
        assert_eq!(str_values(&series), vec![Some("A>G".to_string())]);
    }

    #[test]
    fn locus_from_field_and_split() {
        let df = single_column("Start", vec![Some("152")]);
        let t = RowTransform::LocusFromField { field: "Start" };
        let series = t.apply("mitimpact", "locus", &df).unwrap();
        assert_eq!(str_values(&series), vec![Some("chrM:152".to_string())]);

        let df = single_column("locus", vec![Some("chrM:8993")]);
        let t = RowTransform::LocusFromSplit {
            field: "locus",
            separator: ':',
            index: 1,
        };
        let series = t.apply("helix", "locus", &df).unwrap();
        assert_eq!(str_values(&series), vec![Some("chrM:8993".to_string())]);
    }

    #[test]
    fn alleles_from_fields_keeps_nulls() {
        let df = DataFrame::new(vec![
            Series::new("Ref", vec![Some("A"), Some("C"), None]),
            Series::new("Alt", vec![Some("G"), None, Some("T")]),
        ])
        .unwrap();
        let t = RowTransform::AllelesFromFields {
            ref_field: "Ref",
            alt_field: "Alt",
        };
        let series = t.apply("mitimpact", "alleles", &df).unwrap();
        assert_eq!(
            str_values(&series),
            vec![Some("A>G".to_string()), None, None]
        );
    }

    #[test]
    fn defined_is_false_for_null_and_empty() {
        let df = single_column("Associated Diseases", vec![Some("LHON"), Some(""), None]);
        let t = RowTransform::Defined {
            field: "Associated Diseases",
        };
        let series = t.apply("mitomap", "pathogenic", &df).unwrap();
        let values: Vec<Option<bool>> = series.bool().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(true), Some(false), Some(false)]);
    }

    #[test]
    fn passthrough_renames_the_column() {
        let df = single_column("info.ALLELEID", vec![Some("12345")]);
        let t = RowTransform::Passthrough {
            field: "info.ALLELEID",
        };
        let series = t.apply("clinvar", "ALLELEID", &df).unwrap();
        assert_eq!(series.name(), "ALLELEID");
        assert_eq!(str_values(&series), vec![Some("12345".to_string())]);
    }

    #[test]
    fn missing_source_field_is_a_derivation_error() {
        let df = single_column("other", vec![Some("x")]);
        let t = RowTransform::LocusFromField { field: "Start" };
        assert!(matches!(
            t.apply("mitimpact", "locus", &df),
            Err(PipelineError::Derivation { .. })
        ));
    }
}
