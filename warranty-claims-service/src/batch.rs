use anyhow::{Context as _, anyhow, bail};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use crate::models::{Claim, ClaimOutcome};

/// Parse claims from a JSON array of objects or from JSON Lines
pub fn parse_claims(input: &str) -> anyhow::Result<Vec<Claim>> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("Invalid JSON claims array")?
    } else {
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", n + 1))
            })
            .collect::<anyhow::Result<_>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Value::Object(fields) => Ok(Claim::new(fields)),
            other => Err(anyhow!("Claim {} is not a JSON object: {}", i + 1, other)),
        })
        .collect()
}

pub fn load_claims(path: &Path) -> anyhow::Result<Vec<Claim>> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read claims from {}", path.display()))?;
    parse_claims(&input)
}

/// Write outcomes as a pretty-printed JSON array
pub fn write_outcomes(outcomes: &[ClaimOutcome], writer: impl Write) -> anyhow::Result<()> {
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, outcomes).context("Failed to serialize results")?;
    writeln!(writer)?;
    Ok(())
}

pub fn save_outcomes(outcomes: &[ClaimOutcome], path: &Path) -> anyhow::Result<()> {
    if path.is_dir() {
        bail!("Output path {} is a directory", path.display());
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_outcomes(outcomes, std::io::BufWriter::new(file))
}
