use crate::node::{Events, NodeEvent, OutputPort, PipelineNode};
use sift_base::Result;
use sift_data::Dataset;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Pipeline root that publishes one dataset.
pub struct DataSource {
    name: String,
    dataset: Arc<Dataset>,
    inputs: Vec<OutputPort>,
    output: OutputPort,
    events: Events,
}

impl DataSource {
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Self {
        let dataset = Arc::new(dataset);
        let output = OutputPort::new();
        output.set(vec![Arc::clone(&dataset)]);
        Self {
            name: name.into(),
            dataset,
            inputs: Vec::new(),
            output,
            events: Events::default(),
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Publishes a different dataset object; consumers rebuild.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.publish(dataset);
        self.events.raise(NodeEvent::PipelineChanged);
    }

    /// Replaces the active point scalar values; consumers refresh.
    pub fn set_point_scalars(&mut self, values: Vec<f64>) -> Result<()> {
        let dataset = self.dataset.with_point_scalar_values(values)?;
        self.publish(dataset);
        self.events.raise(NodeEvent::DataChanged);
        Ok(())
    }

    /// Replaces the active cell scalar values; consumers refresh.
    pub fn set_cell_scalars(&mut self, values: Vec<f64>) -> Result<()> {
        let dataset = self.dataset.with_cell_scalar_values(values)?;
        self.publish(dataset);
        self.events.raise(NodeEvent::DataChanged);
        Ok(())
    }

    fn publish(&mut self, dataset: Dataset) {
        debug!(
            source = %self.name,
            kind = %dataset.kind(),
            points = dataset.point_count(),
            cells = dataset.cell_count(),
            "dataset published"
        );
        self.dataset = Arc::new(dataset);
        self.output.set(vec![Arc::clone(&self.dataset)]);
    }
}

impl PipelineNode for DataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[OutputPort] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<OutputPort> {
        &mut self.inputs
    }

    fn accepts_inputs(&self) -> bool {
        false
    }

    fn output_port(&self) -> &OutputPort {
        &self.output
    }

    fn update_pipeline(&mut self) {}

    fn update_data(&mut self) {}

    fn take_events(&mut self) -> Vec<NodeEvent> {
        self.events.take()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
