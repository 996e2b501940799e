//! Small shared helpers.

pub mod timestamps;

pub use timestamps::{display_timestamp, run_timestamp, RunClock};
