use anyhow::{Context, Result};
use sift_data::Dataset;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub fn write_dataset(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;

    let file =
        File::create(path).with_context(|| format!("create dataset file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), dataset)
        .with_context(|| format!("write dataset file {}", path.display()))?;
    Ok(())
}

/// Reads and validates a dataset written by [`write_dataset`].
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open dataset file {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse dataset file {}", path.display()))
}

pub(crate) fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    Ok(())
}
