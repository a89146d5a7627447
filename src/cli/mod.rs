//! CLI output formatting
//!
//! Human-readable, colored run summary for the terminal.

pub mod display;

pub use display::render_run_summary;
