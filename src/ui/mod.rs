//! User interface module - operator-facing report output.
//!
//! Everything the operator reads goes through [formatter]; internal
//! diagnostics go through `tracing` instead.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_commit_outcome, display_dry_run_complete, display_error,
    display_plan_report, display_publish_report, display_status, display_success,
    format_boundary_warning, format_error, format_plan_header, format_plan_line, format_status,
    format_success,
};
