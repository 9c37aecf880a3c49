//! Flash chip definitions and registry

pub mod registry;
mod types;

pub use registry::{chips, find_by_jedec_id, find_by_name};
pub use types::{manufacturer, ChipGeometry, EraseBlock, Features};
