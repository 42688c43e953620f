//! Analysis domain actions
//!
//! Called directly from the HTTP routes. The synchronous path extracts both
//! texts in-process; the asynchronous path goes through the task broker and
//! combines the two results later.

mod analyze;
mod tasks;

pub use analyze::analyze;
pub use tasks::{aggregate, poll, submit_analysis};
