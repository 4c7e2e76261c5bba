mod graph;
mod node;
mod source;
mod threshold;

pub use graph::{NodeId, Pipeline};
pub use node::{Events, NodeEvent, OutputPort, PipelineNode};
pub use source::DataSource;
pub use threshold::{
    DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD, FilterPhase, FilterType,
    THRESHOLD_STATE_VERSION, ThresholdFilter, ThresholdState, data_range,
};

pub use sift_ops::{AttributeMode, CellThresholdConfig, ThresholdAlgorithm};
