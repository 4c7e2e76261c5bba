use serde::{Deserialize, Serialize};
use sift_base::Bounds;
use sift_data::Dataset;
use std::sync::Arc;
use tracing::debug;

/// Which attribute the cell threshold reads its scalars from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum AttributeMode {
    /// Point scalars when present, otherwise cell scalars.
    #[default]
    Default,
    UsePointData,
    UseCellData,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellThresholdConfig {
    #[serde(default)]
    pub attribute_mode: AttributeMode,
    /// With point scalars, keep a cell only when every one of its points
    /// passes. Otherwise a single passing point is enough.
    #[serde(default = "default_all_scalars")]
    pub all_scalars: bool,
}

impl Default for CellThresholdConfig {
    fn default() -> Self {
        Self {
            attribute_mode: AttributeMode::Default,
            all_scalars: true,
        }
    }
}

fn default_all_scalars() -> bool {
    true
}

/// A rebindable threshold stage: each execution reads `input`, applies
/// `bounds` and keeps the result as its output.
pub trait ThresholdAlgorithm {
    fn name(&self) -> &'static str;

    fn execute(&mut self, input: &Arc<Dataset>, bounds: Bounds) -> Arc<Dataset>;

    fn output(&self) -> Option<&Arc<Dataset>>;

    /// Number of times [`ThresholdAlgorithm::execute`] has run.
    fn execution_count(&self) -> u64;
}

/// Keeps the cells whose scalars fall inside the bounds.
#[derive(Debug, Default)]
pub struct CellThreshold {
    config: CellThresholdConfig,
    output: Option<Arc<Dataset>>,
    executions: u64,
}

impl CellThreshold {
    pub fn new(config: CellThresholdConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CellThresholdConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CellThresholdConfig {
        &mut self.config
    }
}

impl ThresholdAlgorithm for CellThreshold {
    fn name(&self) -> &'static str {
        "cells"
    }

    fn execute(&mut self, input: &Arc<Dataset>, bounds: Bounds) -> Arc<Dataset> {
        let output = Arc::new(threshold_cells(input, bounds, &self.config));
        self.executions += 1;
        debug!(
            mode = self.name(),
            lower = bounds.lower,
            upper = bounds.upper,
            cells_in = input.cell_count(),
            cells_out = output.cell_count(),
            "threshold executed"
        );
        self.output = Some(Arc::clone(&output));
        output
    }

    fn output(&self) -> Option<&Arc<Dataset>> {
        self.output.as_ref()
    }

    fn execution_count(&self) -> u64 {
        self.executions
    }
}

/// Keeps the points whose scalars fall inside the bounds, as vertices.
#[derive(Debug, Default)]
pub struct PointThreshold {
    output: Option<Arc<Dataset>>,
    executions: u64,
}

impl PointThreshold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThresholdAlgorithm for PointThreshold {
    fn name(&self) -> &'static str {
        "points"
    }

    fn execute(&mut self, input: &Arc<Dataset>, bounds: Bounds) -> Arc<Dataset> {
        let output = Arc::new(threshold_points(input, bounds));
        self.executions += 1;
        debug!(
            mode = self.name(),
            lower = bounds.lower,
            upper = bounds.upper,
            points_in = input.point_count(),
            points_out = output.point_count(),
            "threshold executed"
        );
        self.output = Some(Arc::clone(&output));
        output
    }

    fn output(&self) -> Option<&Arc<Dataset>> {
        self.output.as_ref()
    }

    fn execution_count(&self) -> u64 {
        self.executions
    }
}

enum Scalars<'a> {
    Point(&'a [f64]),
    Cell(&'a [f64]),
}

fn select_scalars(input: &Dataset, mode: AttributeMode) -> Option<Scalars<'_>> {
    let point = move || input.point_data().scalars().map(|s| Scalars::Point(s.values()));
    let cell = move || input.cell_data().scalars().map(|s| Scalars::Cell(s.values()));
    match mode {
        AttributeMode::Default => point().or_else(cell),
        AttributeMode::UsePointData => point(),
        AttributeMode::UseCellData => cell(),
    }
}

/// Cell-based threshold. The output is always an unstructured grid and is
/// empty when the selected scalars are missing.
pub fn threshold_cells(input: &Dataset, bounds: Bounds, config: &CellThresholdConfig) -> Dataset {
    let kept: Vec<usize> = match select_scalars(input, config.attribute_mode) {
        Some(Scalars::Point(values)) => input
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| {
                let mut passing = cell.point_ids.iter().map(|&id| bounds.passes(values[id]));
                if config.all_scalars {
                    passing.all(|p| p)
                } else {
                    passing.any(|p| p)
                }
            })
            .map(|(index, _)| index)
            .collect(),
        Some(Scalars::Cell(values)) => values
            .iter()
            .enumerate()
            .filter(|(_, value)| bounds.passes(**value))
            .map(|(index, _)| index)
            .collect(),
        None => Vec::new(),
    };
    input.extract_cells(&kept)
}

/// Point-based threshold over the active point scalars. The output is poly
/// data with one vertex per passing point.
pub fn threshold_points(input: &Dataset, bounds: Bounds) -> Dataset {
    let kept: Vec<usize> = match input.point_data().scalars() {
        Some(scalars) => scalars
            .values()
            .iter()
            .enumerate()
            .filter(|(_, value)| bounds.passes(**value))
            .map(|(index, _)| index)
            .collect(),
        None => Vec::new(),
    };
    input.extract_points(&kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_base::Result;
    use sift_data::{DatasetBuilder, DatasetKind};

    // 3x2 points, two quads; x runs 0, 1, 2 across each row.
    fn strip() -> Result<Dataset> {
        DatasetBuilder::structured_grid(3, 2, 1.0)?
            .point_scalars_from("x", |p| p.x)
            .cell_scalars("id", vec![10.0, 20.0])
            .build()
    }

    #[test]
    fn all_scalars_requires_every_point() -> Result<()> {
        let input = strip()?;
        let out = threshold_cells(&input, Bounds::new(0.0, 1.0), &CellThresholdConfig::default());
        assert_eq!(out.kind(), DatasetKind::UnstructuredGrid);
        assert_eq!(out.cell_count(), 1);
        assert_eq!(out.point_count(), 4);
        Ok(())
    }

    #[test]
    fn any_scalar_keeps_touching_cells() -> Result<()> {
        let input = strip()?;
        let config = CellThresholdConfig {
            all_scalars: false,
            ..CellThresholdConfig::default()
        };
        let out = threshold_cells(&input, Bounds::new(0.0, 1.0), &config);
        assert_eq!(out.cell_count(), 2);
        Ok(())
    }

    #[test]
    fn cell_data_mode_reads_cell_scalars() -> Result<()> {
        let input = strip()?;
        let config = CellThresholdConfig {
            attribute_mode: AttributeMode::UseCellData,
            ..CellThresholdConfig::default()
        };
        let out = threshold_cells(&input, Bounds::new(15.0, 25.0), &config);
        assert_eq!(out.cell_count(), 1);
        assert_eq!(out.cell_data().scalars().map(|s| s.values().to_vec()), Some(vec![20.0]));
        Ok(())
    }

    #[test]
    fn missing_scalars_yield_empty_output() -> Result<()> {
        let input = DatasetBuilder::structured_grid(2, 2, 1.0)?.build()?;
        let cells = threshold_cells(&input, Bounds::new(-1.0, 1.0), &CellThresholdConfig::default());
        let points = threshold_points(&input, Bounds::new(-1.0, 1.0));
        assert!(cells.is_empty());
        assert!(points.is_empty());
        assert_eq!(points.kind(), DatasetKind::PolyData);
        Ok(())
    }

    #[test]
    fn points_mode_keeps_passing_points() -> Result<()> {
        let input = strip()?;
        let out = threshold_points(&input, Bounds::new(1.5, 2.0));
        assert_eq!(out.point_count(), 2);
        assert_eq!(out.cell_count(), 2);
        Ok(())
    }

    #[test]
    fn inverted_bounds_keep_nothing() -> Result<()> {
        let input = strip()?;
        let out = threshold_points(&input, Bounds::new(2.0, 0.0));
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn execute_counts_and_keeps_output() -> Result<()> {
        let input = Arc::new(strip()?);
        let mut algorithm = PointThreshold::new();
        assert!(algorithm.output().is_none());

        algorithm.execute(&input, Bounds::new(0.0, 0.0));
        let out = algorithm.execute(&input, Bounds::new(0.0, 2.0));

        assert_eq!(algorithm.execution_count(), 2);
        assert_eq!(out.point_count(), 6);
        assert!(algorithm.output().is_some_and(|o| Arc::ptr_eq(o, &out)));
        Ok(())
    }
}
