//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod jobs;
pub mod model_state;

pub use deps::ServerDeps;
pub use model_state::{ModelState, SwitchLock, SwitchPermit};
