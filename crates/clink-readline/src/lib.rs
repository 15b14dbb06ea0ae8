pub mod engine;
pub mod module;

pub use engine::{EngineOutcome, EngineStatus, LineEngine};
pub use module::{mark_invisible_regions, ReadlineModule};
