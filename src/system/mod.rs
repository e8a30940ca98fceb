pub mod specs;

pub use specs::{get_system_specs, SystemSpecs};
