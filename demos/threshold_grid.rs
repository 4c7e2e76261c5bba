use anyhow::Result;
use sift_data::DatasetBuilder;
use sift_io::export_vtk;
use sift_pipeline::{DataSource, Pipeline, ThresholdFilter};

fn main() -> Result<()> {
    let grid = DatasetBuilder::structured_grid(21, 21, 0.5)?
        .point_scalars_from("radius", |p| ((p.x - 5.0).powi(2) + (p.y - 5.0).powi(2)).sqrt())
        .build()?;

    let mut pipeline = Pipeline::new();
    let source = pipeline.add(DataSource::new("grid", grid));
    let filter = pipeline.add(ThresholdFilter::new("ring"));
    pipeline.connect(source, filter)?;
    pipeline.edit::<ThresholdFilter, _>(filter, |f| {
        f.set_lower_threshold(2.0);
        f.set_upper_threshold(4.0);
    })?;

    export_vtk(&pipeline.outputs(filter)?[0], "out/ring.vtk")?;
    Ok(())
}
