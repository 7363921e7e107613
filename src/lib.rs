//! Batch ETL for mitochondrial-variant reference data: load several external
//! datasets, normalize each to a `(locus, alleles)` key, outer-join them into
//! one wide table, and persist the result with run provenance.
//!
//! Pipeline shape: registry → loader → joiner → writer, driven once per run.
//! All columnar execution delegates to polars.

pub mod driver;
pub mod engine;
pub mod error;
pub mod joiner;
pub mod loader;
pub mod registry;
pub mod transform;
pub mod writer;

pub use error::{PipelineError, Result};
