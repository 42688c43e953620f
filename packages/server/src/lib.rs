// Summary fidelity service - API core
//
// Relays summary generation and model switches to an OpenAI-compatible
// provider, and measures how many of a summary's lemmas occur in its source
// text, either inline or through background extraction tasks.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
