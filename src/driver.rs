//! Run orchestration: validate the request, then load, join, and write.

use std::path::PathBuf;

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::registry::{self, DatasetDescriptor};
use crate::{joiner, loader, writer};

#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Comma-separated dataset names.
    pub datasets: String,
    pub output_path: PathBuf,
    pub force_write: bool,
}

/// Split and validate the requested dataset names, preserving request order.
/// Any unknown name aborts the run before a single byte of source I/O.
pub fn resolve(dataset_arg: &str) -> Result<Vec<&'static DatasetDescriptor>> {
    let names: Vec<&str> = dataset_arg.split(',').collect();
    let unknown: Vec<String> = names
        .iter()
        .filter(|name| registry::descriptor(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(PipelineError::UnsupportedDatasets {
            count: unknown.len(),
            names: unknown,
        });
    }
    Ok(names
        .iter()
        .filter_map(|name| registry::descriptor(name))
        .collect())
}

pub fn run(args: &RunArgs) -> Result<()> {
    let descriptors = resolve(&args.datasets)?;

    // Fail on a taken output path before loading anything.
    if args.output_path.exists() && !args.force_write {
        return Err(PipelineError::OutputExists {
            path: args.output_path.display().to_string(),
        });
    }

    let requested: Vec<&str> = descriptors.iter().map(|d| d.name).collect();
    info!("loading and combining {requested:?}");
    let tables = loader::load_tables(&descriptors)?;
    let (mut joined, metadata) = joiner::join_tables(tables, &descriptors)?;

    info!("writing to {}", args.output_path.display());
    writer::write_artifact(&mut joined, &metadata, &args.output_path, args.force_write)?;
    info!("done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolves_requested_datasets_in_order() {
        let descriptors = resolve("clinvar,gnomad,mitomap").unwrap();
        let names: Vec<&str> = descriptors.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["clinvar", "gnomad", "mitomap"]);
    }

    #[test]
    fn resolution_only_touches_requested_datasets() {
        let descriptors = resolve("helix").unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "helix");
    }

    #[test]
    fn unknown_names_are_reported_together() {
        match resolve("gnomad,bogus,also_bogus") {
            Err(PipelineError::UnsupportedDatasets { count, names }) => {
                assert_eq!(count, 2);
                assert_eq!(names, vec!["bogus".to_string(), "also_bogus".to_string()]);
            }
            other => panic!("expected UnsupportedDatasets, got {other:?}"),
        }
    }

    #[test]
    fn empty_request_reports_the_empty_name() {
        assert!(matches!(
            resolve(""),
            Err(PipelineError::UnsupportedDatasets { count: 1, .. })
        ));
    }

    #[test]
    fn unknown_dataset_aborts_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("combined");
        let args = RunArgs {
            datasets: "bogus".to_string(),
            output_path: out.clone(),
            force_write: false,
        };
        assert!(matches!(
            run(&args),
            Err(PipelineError::UnsupportedDatasets { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn existing_output_without_force_aborts_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("combined");
        std::fs::create_dir_all(&out).unwrap();
        let args = RunArgs {
            datasets: "gnomad".to_string(),
            output_path: out,
            force_write: false,
        };
        assert!(matches!(run(&args), Err(PipelineError::OutputExists { .. })));
    }
}
