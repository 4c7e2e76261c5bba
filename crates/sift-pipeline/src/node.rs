use sift_data::Dataset;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Notification a node raises after its outputs are final.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeEvent {
    /// Output values changed; consumers refresh through `update_data`.
    DataChanged,
    /// Output structure changed; consumers rebuild through `update_pipeline`.
    PipelineChanged,
}

/// Shared handle onto the datasets a node produces.
///
/// A consumer keeps clones of its upstreams' ports as its inputs and always
/// reads them live, so it never sees a dataset that was replaced upstream.
#[derive(Clone, Debug, Default)]
pub struct OutputPort(Rc<RefCell<Vec<Arc<Dataset>>>>);

impl OutputPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasets(&self) -> Vec<Arc<Dataset>> {
        self.0.borrow().clone()
    }

    pub fn primary(&self) -> Option<Arc<Dataset>> {
        self.0.borrow().first().cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn same_port(&self, other: &OutputPort) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn set(&self, datasets: Vec<Arc<Dataset>>) {
        *self.0.borrow_mut() = datasets;
    }
}

/// Pending notifications of one node, in the order they were raised.
#[derive(Debug, Default)]
pub struct Events(Vec<NodeEvent>);

impl Events {
    pub fn raise(&mut self, event: NodeEvent) {
        self.0.push(event);
    }

    pub fn take(&mut self) -> Vec<NodeEvent> {
        std::mem::take(&mut self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A stage of the data-flow graph.
///
/// `update_pipeline` answers a topology change upstream and rebuilds the
/// outputs from `inputs[0].outputs[0]`; `update_data` answers a value change
/// and refreshes derived state. Both do nothing without an input. Every
/// mutation that produces output raises its event last, through
/// [`PipelineNode::take_events`].
pub trait PipelineNode: Any {
    fn name(&self) -> &str;

    fn inputs(&self) -> &[OutputPort];

    fn inputs_mut(&mut self) -> &mut Vec<OutputPort>;

    fn accepts_inputs(&self) -> bool {
        true
    }

    fn output_port(&self) -> &OutputPort;

    fn outputs(&self) -> Vec<Arc<Dataset>> {
        self.output_port().datasets()
    }

    fn update_pipeline(&mut self);

    fn update_data(&mut self);

    fn take_events(&mut self) -> Vec<NodeEvent>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
