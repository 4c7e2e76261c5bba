use sift_base::{Result, ScalarRange};
use sift_data::{CellKind, DatasetBuilder, DatasetKind};

#[test]
fn grid_with_point_and_cell_scalars() -> Result<()> {
    let grid = DatasetBuilder::structured_grid(5, 5, 0.5)?
        .point_scalars_from("elevation", |p| p.x + p.y)
        .cell_scalars("id", (0..16).map(f64::from).collect())
        .build()?;

    assert_eq!(grid.kind(), DatasetKind::StructuredGrid);
    assert!(grid.cells().iter().all(|c| c.kind == CellKind::Quad));
    assert_eq!(grid.point_scalar_range(), Some(ScalarRange::new(0.0, 4.0)));
    assert_eq!(grid.cell_scalar_range(), Some(ScalarRange::new(0.0, 15.0)));
    Ok(())
}
