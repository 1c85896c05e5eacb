//! Template layer (C5, spec.md §4.5).

pub mod render;
pub mod vars;

pub use render::render_template;
pub use vars::load_template_vars;
