//! Diagram renderers.

mod template;

pub use template::TemplateDiagramRenderer;
