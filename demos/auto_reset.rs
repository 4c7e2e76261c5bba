use anyhow::Result;
use sift_data::DatasetBuilder;
use sift_pipeline::{DataSource, FilterType, Pipeline, ThresholdFilter};

fn main() -> Result<()> {
    let grid = DatasetBuilder::structured_grid(11, 2, 1.0)?
        .point_scalars_from("field", |p| p.x * 10.0)
        .build()?;

    let mut pipeline = Pipeline::new();
    let source = pipeline.add(DataSource::new("field", grid));
    let filter = pipeline.add(ThresholdFilter::new("threshold"));
    pipeline.connect(source, filter)?;
    report(&pipeline, filter)?;

    let shifted: Vec<f64> = (0..2)
        .flat_map(|_| (0..11).map(|i| 10.0 + f64::from(i) * 8.0))
        .collect();
    pipeline.edit::<DataSource, _>(source, |s| s.set_point_scalars(shifted))??;
    report(&pipeline, filter)?;

    pipeline.edit::<ThresholdFilter, _>(filter, |f| f.set_filter_type(FilterType::Points))?;
    report(&pipeline, filter)?;
    Ok(())
}

fn report(pipeline: &Pipeline, filter: sift_pipeline::NodeId) -> Result<()> {
    let node = pipeline.node::<ThresholdFilter>(filter)?;
    let output = &pipeline.outputs(filter)?[0];
    println!(
        "{} bounds [{}, {}] -> {} points, {} cells (runs: {})",
        node.filter_type(),
        node.lower_threshold(),
        node.upper_threshold(),
        output.point_count(),
        output.cell_count(),
        node.active_algorithm().execution_count()
    );
    Ok(())
}
