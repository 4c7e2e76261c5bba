pub mod dataset;
pub mod state;
pub mod vtk;

pub use dataset::{read_dataset, write_dataset};
pub use state::{read_state, write_state};
pub use vtk::{export_vtk, write_vtk};
