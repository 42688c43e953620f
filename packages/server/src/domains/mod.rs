pub mod analysis;
pub mod gateway;
