//! Run results as JSON.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use crate::sim::RunOutput;

/// Writes the run summary and the output map to a JSON file.
pub fn write_results(path: &Path, output: &RunOutput) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), output)
        .with_context(|| format!("Failed to write results to: {}", path.display()))?;
    Ok(())
}

pub fn to_results_string(output: &RunOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("Failed to serialize results")
}
