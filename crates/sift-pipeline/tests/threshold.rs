use sift_base::{Bounds, Result, ScalarRange};
use sift_data::{Dataset, DatasetBuilder};
use sift_pipeline::{
    DataSource, FilterPhase, FilterType, NodeId, Pipeline, PipelineNode, ThresholdFilter,
    ThresholdState,
};

// 11 x 11 grid; point scalars run 0..=100 along x, cell scalars hold the cell index.
fn field(lo: f64, hi: f64) -> Result<Dataset> {
    DatasetBuilder::structured_grid(11, 11, 1.0)?
        .point_scalars_from("field", |p| lo + (hi - lo) * p.x / 10.0)
        .cell_scalars("index", (0..100).map(f64::from).collect())
        .build()
}

fn executions(pipeline: &Pipeline, id: NodeId) -> Result<u64> {
    let filter = pipeline.node::<ThresholdFilter>(id)?;
    Ok(filter.algorithm(FilterType::Cells).execution_count()
        + filter.algorithm(FilterType::Points).execution_count())
}

fn threshold_after(source: DataSource) -> Result<(Pipeline, NodeId, NodeId)> {
    let mut pipeline = Pipeline::new();
    let src = pipeline.add(source);
    let filter = pipeline.add(ThresholdFilter::new("threshold"));
    pipeline.connect(src, filter)?;
    Ok((pipeline, src, filter))
}

fn rescaled(lo: f64, hi: f64) -> Vec<f64> {
    (0..11)
        .flat_map(|_| (0..11).map(move |i| lo + (hi - lo) * f64::from(i) / 10.0))
        .collect()
}

#[test]
fn first_update_adopts_data_range_with_one_execution() -> Result<()> {
    let (pipeline, _src, filter) = threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;
    let node = pipeline.node::<ThresholdFilter>(filter)?;

    assert_eq!(node.phase(), FilterPhase::Initialized);
    assert_eq!(node.declared_range(), ScalarRange::new(0.0, 100.0));
    assert_eq!(node.bounds(), Bounds::new(0.0, 100.0));
    assert_eq!(executions(&pipeline, filter)?, 1);
    assert_eq!(pipeline.outputs(filter)?[0].cell_count(), 100);
    Ok(())
}

#[test]
fn both_auto_resets_coalesce_into_one_execution() -> Result<()> {
    let (mut pipeline, src, filter) =
        threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;

    pipeline.edit::<DataSource, _>(src, |s| s.set_point_scalars(rescaled(10.0, 90.0)))??;

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.bounds(), Bounds::new(10.0, 90.0));
    assert_eq!(node.declared_range(), ScalarRange::new(10.0, 90.0));
    assert_eq!(executions(&pipeline, filter)?, 2);
    Ok(())
}

#[test]
fn lower_auto_reset_alone_tracks_lower_endpoint() -> Result<()> {
    let (mut pipeline, src, filter) =
        threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;
    pipeline.edit::<ThresholdFilter, _>(filter, |f| f.set_auto_reset_upper(false))?;
    let before = executions(&pipeline, filter)?;

    pipeline.edit::<DataSource, _>(src, |s| s.set_point_scalars(rescaled(10.0, 90.0)))??;

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.lower_threshold(), 10.0);
    assert_eq!(node.upper_threshold(), 100.0);
    assert_eq!(executions(&pipeline, filter)?, before + 1);
    Ok(())
}

#[test]
fn redundant_auto_reset_enable_keeps_user_bound() -> Result<()> {
    let (mut pipeline, _src, filter) =
        threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;
    pipeline.edit::<ThresholdFilter, _>(filter, |f| f.set_lower_threshold(30.0))?;
    let before = executions(&pipeline, filter)?;

    pipeline.edit::<ThresholdFilter, _>(filter, |f| f.set_auto_reset_lower(true))?;

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.bounds(), Bounds::new(30.0, 100.0));
    assert_eq!(executions(&pipeline, filter)?, before);
    Ok(())
}

#[test]
fn bound_setter_reexecutes_and_notifies_downstream() -> Result<()> {
    let (mut pipeline, _src, first) =
        threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;
    let second = pipeline.add(ThresholdFilter::new("second"));
    pipeline.connect(first, second)?;
    let downstream_before = executions(&pipeline, second)?;

    pipeline.edit::<ThresholdFilter, _>(first, |f| f.set_upper_threshold(50.0))?;

    assert_eq!(executions(&pipeline, first)?, 2);
    assert_eq!(executions(&pipeline, second)?, downstream_before + 1);
    // Columns 0..=5 pass, so 5 cells per row survive.
    assert_eq!(pipeline.outputs(first)?[0].cell_count(), 50);
    let node = pipeline.node::<ThresholdFilter>(second)?;
    assert_eq!(node.upper_threshold(), 50.0);
    Ok(())
}

#[test]
fn switching_filter_type_matches_a_fresh_run() -> Result<()> {
    let (mut pipeline, src, filter) =
        threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;
    pipeline.edit::<ThresholdFilter, _>(filter, |f| {
        f.set_thresholds(Bounds::new(20.0, 40.0));
        f.set_filter_type(FilterType::Points);
    })?;

    let mut fresh = ThresholdFilter::new("fresh");
    fresh.set_filter_type(FilterType::Points);
    fresh.set_auto_reset_lower(false);
    fresh.set_auto_reset_upper(false);
    fresh
        .inputs_mut()
        .push(pipeline.node::<DataSource>(src)?.output_port().clone());
    fresh.update_pipeline();
    fresh.set_thresholds(Bounds::new(20.0, 40.0));

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.active_algorithm().name(), "points");
    assert_eq!(node.algorithm(FilterType::Points).execution_count(), 1);
    assert_eq!(pipeline.outputs(filter)?, fresh.outputs());
    assert_eq!(pipeline.outputs(filter)?[0].point_count(), 33);
    Ok(())
}

#[test]
fn detached_filter_keeps_frozen_outputs() -> Result<()> {
    let (mut pipeline, src, filter) =
        threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;
    let frozen = pipeline.outputs(filter)?;

    assert!(pipeline.disconnect(src, filter)?);
    pipeline.edit::<DataSource, _>(src, |s| s.set_point_scalars(rescaled(10.0, 90.0)))??;
    pipeline.edit::<ThresholdFilter, _>(filter, |f| {
        f.update_pipeline();
        f.update_data();
        f.set_lower_threshold(30.0);
    })?;

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.phase(), FilterPhase::Detached);
    assert_eq!(executions(&pipeline, filter)?, 1);
    assert_eq!(pipeline.outputs(filter)?, frozen);
    Ok(())
}

#[test]
fn cell_scalars_drive_range_without_point_scalars() -> Result<()> {
    let grid = DatasetBuilder::structured_grid(3, 3, 1.0)?
        .cell_scalars("pressure", vec![-4.0, 0.0, 2.0, 8.0])
        .build()?;
    let (pipeline, _src, filter) = threshold_after(DataSource::new("grid", grid))?;

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.bounds(), Bounds::new(-4.0, 8.0));
    assert_eq!(pipeline.outputs(filter)?[0].cell_count(), 4);
    Ok(())
}

#[test]
fn new_upstream_dataset_rebuilds_the_chain() -> Result<()> {
    let (mut pipeline, src, filter) =
        threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;

    let replacement = field(-5.0, 5.0)?;
    pipeline.edit::<DataSource, _>(src, |s| s.set_dataset(replacement))?;

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.bounds(), Bounds::new(-5.0, 5.0));
    assert_eq!(executions(&pipeline, filter)?, 2);
    Ok(())
}

#[test]
fn restored_state_reattaches_with_persisted_bounds() -> Result<()> {
    let state = ThresholdState {
        filter_type: FilterType::Points,
        lower_threshold: 0.0,
        upper_threshold: 10.0,
        auto_reset_lower: false,
        auto_reset_upper: false,
        ..ThresholdState::default()
    };
    let mut pipeline = Pipeline::new();
    let src = pipeline.add(DataSource::new("field", field(0.0, 100.0)?));
    let filter = pipeline.add(ThresholdFilter::from_state("restored", &state));
    pipeline.connect(src, filter)?;

    let node = pipeline.node::<ThresholdFilter>(filter)?;
    assert_eq!(node.state(), state);
    assert_eq!(node.declared_range(), ScalarRange::new(0.0, 100.0));
    // Columns 0 and 1 on each of the 11 rows.
    assert_eq!(pipeline.outputs(filter)?[0].point_count(), 22);
    Ok(())
}

#[test]
fn persisted_state_omits_derived_range() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let (pipeline, _src, filter) = threshold_after(DataSource::new("field", field(0.0, 100.0)?))?;
    let state = pipeline.node::<ThresholdFilter>(filter)?.state();

    let json = serde_json::to_value(&state)?;
    assert_eq!(json["filter_type"], "cells");
    assert_eq!(json["lower_threshold"], 0.0);
    assert!(json.get("data_min").is_none());
    assert!(json.get("first_update").is_none());
    Ok(())
}
