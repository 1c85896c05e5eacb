//! Presentation layer (C8, spec.md §4.8).

pub mod plan_view;
pub mod terminal;

pub use plan_view::render_plan;
pub use terminal::{detect_capabilities, TerminalCapabilities};
