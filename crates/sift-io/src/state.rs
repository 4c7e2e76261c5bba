use anyhow::{Context, Result, bail};
use sift_pipeline::{THRESHOLD_STATE_VERSION, ThresholdState};
use std::path::Path;

use crate::dataset::create_parent;

pub fn write_state(state: &ThresholdState, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;

    let text = serde_json::to_string_pretty(state).context("serialize threshold state")?;
    std::fs::write(path, text)
        .with_context(|| format!("write state file {}", path.display()))?;
    Ok(())
}

pub fn read_state(path: impl AsRef<Path>) -> Result<ThresholdState> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read state file {}", path.display()))?;
    let state: ThresholdState = serde_json::from_str(&text)
        .with_context(|| format!("parse state file {}", path.display()))?;
    if state.version > THRESHOLD_STATE_VERSION {
        bail!(
            "state file {} has version {}, newest supported is {}",
            path.display(),
            state.version,
            THRESHOLD_STATE_VERSION
        );
    }
    Ok(state)
}
