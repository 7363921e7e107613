//! Process-wide dataframe-engine initialization.
//!
//! The engine picks up parallelism and chunking knobs from the environment,
//! so they must be set once, before the first table is materialized. The
//! `Once` guard makes repeated calls harmless: only the first configuration
//! takes effect.

use std::sync::Once;

use crate::error::{PipelineError, Result};

/// The only reference genome the locus normalization understands.
pub const GRCH38: &str = "GRCh38";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub reference_genome: String,
    /// Upper bound on the engine's worker threads; `None` lets it decide.
    pub max_threads: Option<usize>,
    /// Row-chunk size hint for streaming execution.
    pub block_size: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            reference_genome: GRCH38.to_string(),
            max_threads: None,
            block_size: None,
        }
    }
}

/// Apply the engine configuration. Must run before any pipeline stage.
pub fn init(config: &EngineConfig) -> Result<()> {
    static INIT: Once = Once::new();

    if config.reference_genome != GRCH38 {
        return Err(PipelineError::UnsupportedReference {
            name: config.reference_genome.clone(),
        });
    }

    INIT.call_once(|| {
        // The thread pool reads these on first use; they have no effect
        // once the engine is running.
        if let Some(threads) = config.max_threads {
            unsafe { std::env::set_var("POLARS_MAX_THREADS", threads.to_string()) };
        }
        if let Some(block_size) = config.block_size {
            unsafe { std::env::set_var("POLARS_STREAMING_CHUNK_SIZE", block_size.to_string()) };
        }
    });

    Ok(())
}
