use crate::node::{Events, NodeEvent, OutputPort, PipelineNode};
use serde::{Deserialize, Serialize};
use sift_base::{Bounds, Error, ScalarRange};
use sift_data::Dataset;
use sift_ops::{CellThreshold, CellThresholdConfig, PointThreshold, ThresholdAlgorithm};
use std::any::Any;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_LOWER_THRESHOLD: f64 = -1.0e20;
pub const DEFAULT_UPPER_THRESHOLD: f64 = 1.0e20;

/// Version written into [`ThresholdState`].
pub const THRESHOLD_STATE_VERSION: u32 = 0;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    #[default]
    Cells,
    Points,
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cells => f.write_str("cells"),
            Self::Points => f.write_str("points"),
        }
    }
}

impl FromStr for FilterType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "cells" => Ok(Self::Cells),
            "points" => Ok(Self::Points),
            other => Err(Error::InvalidParameter(format!(
                "filter type must be `cells` or `points`, got `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterPhase {
    Detached,
    /// Attached, waiting for the first non-empty data range.
    Uninitialized,
    Initialized,
}

/// Persisted part of a [`ThresholdFilter`]. The declared data range is
/// rebuilt from the input after loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdState {
    #[serde(default)]
    pub version: u32,
    pub filter_type: FilterType,
    pub lower_threshold: f64,
    pub upper_threshold: f64,
    pub auto_reset_lower: bool,
    pub auto_reset_upper: bool,
    #[serde(default)]
    pub cells: CellThresholdConfig,
}

impl Default for ThresholdState {
    fn default() -> Self {
        Self {
            version: THRESHOLD_STATE_VERSION,
            filter_type: FilterType::Cells,
            lower_threshold: DEFAULT_LOWER_THRESHOLD,
            upper_threshold: DEFAULT_UPPER_THRESHOLD,
            auto_reset_lower: true,
            auto_reset_upper: true,
            cells: CellThresholdConfig::default(),
        }
    }
}

/// Range the bounds are declared against: point scalars first, then cell
/// scalars. `None` when the dataset carries neither.
pub fn data_range(dataset: &Dataset) -> Option<ScalarRange> {
    if dataset.point_data().scalars().is_some() {
        dataset.point_scalar_range()
    } else {
        dataset.cell_scalar_range()
    }
}

/// Thresholds its input on the active scalars, by cells or by points.
///
/// Both algorithm instances are owned here and configured independently;
/// `filter_type` picks the one that runs. Bounds follow the input's data
/// range on the first update and afterwards on each side whose auto-reset
/// flag is set. Every operation is a no-op while no input is attached.
pub struct ThresholdFilter {
    name: String,
    inputs: Vec<OutputPort>,
    output: OutputPort,
    events: Events,
    filter_type: FilterType,
    lower_threshold: f64,
    upper_threshold: f64,
    auto_reset_lower: bool,
    auto_reset_upper: bool,
    data_min: f64,
    data_max: f64,
    first_update: bool,
    keep_bounds_on_first_update: bool,
    cells: CellThreshold,
    points: PointThreshold,
}

impl Default for ThresholdFilter {
    fn default() -> Self {
        Self::new("Threshold")
    }
}

impl ThresholdFilter {
    pub fn new(name: impl Into<String>) -> Self {
        let state = ThresholdState::default();
        Self {
            name: name.into(),
            inputs: Vec::new(),
            output: OutputPort::new(),
            events: Events::default(),
            filter_type: state.filter_type,
            lower_threshold: state.lower_threshold,
            upper_threshold: state.upper_threshold,
            auto_reset_lower: state.auto_reset_lower,
            auto_reset_upper: state.auto_reset_upper,
            data_min: DEFAULT_LOWER_THRESHOLD,
            data_max: DEFAULT_UPPER_THRESHOLD,
            first_update: true,
            keep_bounds_on_first_update: false,
            cells: CellThreshold::new(state.cells),
            points: PointThreshold::new(),
        }
    }

    /// Rebuilds a detached filter from persisted state. The restored bounds
    /// survive the first update; only the declared range is recomputed.
    pub fn from_state(name: impl Into<String>, state: &ThresholdState) -> Self {
        let mut filter = Self::new(name);
        filter.filter_type = state.filter_type;
        filter.lower_threshold = state.lower_threshold;
        filter.upper_threshold = state.upper_threshold;
        filter.auto_reset_lower = state.auto_reset_lower;
        filter.auto_reset_upper = state.auto_reset_upper;
        *filter.cells.config_mut() = state.cells;
        filter.keep_bounds_on_first_update = true;
        filter
    }

    pub fn state(&self) -> ThresholdState {
        ThresholdState {
            version: THRESHOLD_STATE_VERSION,
            filter_type: self.filter_type,
            lower_threshold: self.lower_threshold,
            upper_threshold: self.upper_threshold,
            auto_reset_lower: self.auto_reset_lower,
            auto_reset_upper: self.auto_reset_upper,
            cells: *self.cells.config(),
        }
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn lower_threshold(&self) -> f64 {
        self.lower_threshold
    }

    pub fn upper_threshold(&self) -> f64 {
        self.upper_threshold
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.lower_threshold, self.upper_threshold)
    }

    pub fn auto_reset_lower(&self) -> bool {
        self.auto_reset_lower
    }

    pub fn auto_reset_upper(&self) -> bool {
        self.auto_reset_upper
    }

    /// `(data_min, data_max)`: the legal range the bounds are declared
    /// against. Informative only; setters do not clamp.
    pub fn declared_range(&self) -> ScalarRange {
        ScalarRange::new(self.data_min, self.data_max)
    }

    pub fn is_inverted(&self) -> bool {
        self.bounds().is_inverted()
    }

    pub fn phase(&self) -> FilterPhase {
        if self.inputs.is_empty() {
            FilterPhase::Detached
        } else if self.first_update {
            FilterPhase::Uninitialized
        } else {
            FilterPhase::Initialized
        }
    }

    pub fn algorithm(&self, filter_type: FilterType) -> &dyn ThresholdAlgorithm {
        match filter_type {
            FilterType::Cells => &self.cells as &dyn ThresholdAlgorithm,
            FilterType::Points => &self.points,
        }
    }

    pub fn active_algorithm(&self) -> &dyn ThresholdAlgorithm {
        self.algorithm(self.filter_type)
    }

    pub fn cell_config(&self) -> &CellThresholdConfig {
        self.cells.config()
    }

    /// Switches the active algorithm and, when attached, runs it on the
    /// current input with the current bounds.
    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        if self.filter_type == filter_type {
            return;
        }
        self.filter_type = filter_type;
        debug!(filter = %self.name, mode = %filter_type, "filter type switched");
        self.rerun();
    }

    pub fn set_lower_threshold(&mut self, value: f64) {
        self.lower_threshold = value;
        self.rerun();
    }

    pub fn set_upper_threshold(&mut self, value: f64) {
        self.upper_threshold = value;
        self.rerun();
    }

    /// Sets both bounds with a single execution.
    pub fn set_thresholds(&mut self, bounds: Bounds) {
        self.lower_threshold = bounds.lower;
        self.upper_threshold = bounds.upper;
        self.rerun();
    }

    /// Turning the flag on snaps the lower bound to the current data range
    /// right away. Re-enabling an active flag changes nothing.
    pub fn set_auto_reset_lower(&mut self, enabled: bool) {
        let was_enabled = std::mem::replace(&mut self.auto_reset_lower, enabled);
        if !enabled || was_enabled {
            return;
        }
        if let Some(range) = self.primary_input().and_then(|input| data_range(&input)) {
            self.data_min = range.min;
            self.set_lower_threshold(range.min);
        }
    }

    /// Turning the flag on snaps the upper bound to the current data range
    /// right away. Re-enabling an active flag changes nothing.
    pub fn set_auto_reset_upper(&mut self, enabled: bool) {
        let was_enabled = std::mem::replace(&mut self.auto_reset_upper, enabled);
        if !enabled || was_enabled {
            return;
        }
        if let Some(range) = self.primary_input().and_then(|input| data_range(&input)) {
            self.data_max = range.max;
            self.set_upper_threshold(range.max);
        }
    }

    /// Edits the cell algorithm; reruns when it is the active one.
    pub fn configure_cells(&mut self, edit: impl FnOnce(&mut CellThresholdConfig)) {
        edit(self.cells.config_mut());
        if self.filter_type == FilterType::Cells {
            self.rerun();
        }
    }

    fn primary_input(&self) -> Option<Arc<Dataset>> {
        self.inputs.first().and_then(OutputPort::primary)
    }

    /// Stages the new declared range and bounds without executing anything.
    fn update_ranges(&mut self, input: &Dataset) {
        let Some(range) = data_range(input) else {
            return;
        };

        if self.first_update {
            self.data_min = range.min;
            self.data_max = range.max;
            if !self.keep_bounds_on_first_update {
                self.lower_threshold = range.min;
                self.upper_threshold = range.max;
            }
            self.first_update = false;
            self.keep_bounds_on_first_update = false;
            return;
        }

        if self.auto_reset_lower {
            self.data_min = range.min;
            self.lower_threshold = range.min;
        }
        if self.auto_reset_upper {
            self.data_max = range.max;
            self.upper_threshold = range.max;
        }
    }

    fn rerun(&mut self) {
        if let Some(input) = self.primary_input() {
            self.execute(&input);
        }
    }

    /// Runs the active algorithm once, publishes its result and raises the
    /// matching event as the last step.
    fn execute(&mut self, input: &Arc<Dataset>) {
        let bounds = self.bounds();
        if bounds.is_inverted() {
            warn!(
                filter = %self.name,
                lower = bounds.lower,
                upper = bounds.upper,
                "inverted threshold bounds select nothing"
            );
        }

        let previous_kind = self.output.primary().map(|d| d.kind());
        let output = match self.filter_type {
            FilterType::Cells => self.cells.execute(input, bounds),
            FilterType::Points => self.points.execute(input, bounds),
        };
        let kind = output.kind();
        self.output.set(vec![output]);

        let event = match previous_kind {
            Some(previous) if previous != kind => NodeEvent::PipelineChanged,
            _ => NodeEvent::DataChanged,
        };
        self.events.raise(event);
    }
}

impl PipelineNode for ThresholdFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[OutputPort] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<OutputPort> {
        &mut self.inputs
    }

    fn output_port(&self) -> &OutputPort {
        &self.output
    }

    fn update_pipeline(&mut self) {
        let Some(input) = self.primary_input() else {
            return;
        };
        self.update_ranges(&input);
        self.execute(&input);
    }

    fn update_data(&mut self) {
        let Some(input) = self.primary_input() else {
            return;
        };
        self.update_ranges(&input);
        self.execute(&input);
    }

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
