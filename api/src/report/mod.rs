//! Report module
//!
//! Plain-text renderings of agenda data.

pub mod renderer;

pub use renderer::{render_weekly_report, ReportMode};
