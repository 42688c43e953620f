// Common types shared across the application

pub mod error;
pub mod extract;

pub use error::{AppError, AppResult};
pub use extract::{AppJson, AppPath};
