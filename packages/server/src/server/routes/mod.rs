// HTTP routes
pub mod analysis;
pub mod gateway;
pub mod health;

pub use analysis::*;
pub use gateway::*;
pub use health::*;
