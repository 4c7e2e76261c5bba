use anyhow::{Context, Result};
use sift_data::{Attributes, Dataset};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::dataset::create_parent;

/// Writes `dataset` as a legacy VTK ASCII unstructured grid.
pub fn export_vtk(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;

    let file = File::create(path).with_context(|| format!("create VTK file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_vtk(dataset, &mut writer).with_context(|| format!("write VTK file {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush VTK file {}", path.display()))?;
    Ok(())
}

pub fn write_vtk(dataset: &Dataset, mut out: impl Write) -> io::Result<()> {
    writeln!(out, "# vtk DataFile Version 3.0")?;
    writeln!(out, "sift {}", dataset.kind())?;
    writeln!(out, "ASCII")?;
    writeln!(out, "DATASET UNSTRUCTURED_GRID")?;

    writeln!(out, "POINTS {} double", dataset.point_count())?;
    for p in dataset.points() {
        writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
    }

    let size: usize = dataset.cells().iter().map(|c| c.point_ids.len() + 1).sum();
    writeln!(out, "CELLS {} {size}", dataset.cell_count())?;
    for cell in dataset.cells() {
        write!(out, "{}", cell.point_ids.len())?;
        for id in &cell.point_ids {
            write!(out, " {id}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "CELL_TYPES {}", dataset.cell_count())?;
    for cell in dataset.cells() {
        writeln!(out, "{}", cell.kind.vtk_type())?;
    }

    write_attributes(&mut out, "POINT_DATA", dataset.point_count(), dataset.point_data())?;
    write_attributes(&mut out, "CELL_DATA", dataset.cell_count(), dataset.cell_data())?;
    Ok(())
}

// Active scalars go first so readers that take the first SCALARS block see them.
fn write_attributes(
    out: &mut impl Write,
    section: &str,
    count: usize,
    attributes: &Attributes,
) -> io::Result<()> {
    if count == 0 || attributes.is_empty() {
        return Ok(());
    }
    writeln!(out, "{section} {count}")?;

    let active = attributes.scalars();
    let rest = attributes
        .arrays()
        .iter()
        .filter(|a| active.is_none_or(|s| s.name() != a.name()));
    for array in active.into_iter().chain(rest) {
        writeln!(out, "SCALARS {} double 1", array.name().replace(' ', "_"))?;
        writeln!(out, "LOOKUP_TABLE default")?;
        for value in array.values() {
            writeln!(out, "{value}")?;
        }
    }
    Ok(())
}
