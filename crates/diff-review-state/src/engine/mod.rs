//! Engines keeping the derived views of a diff consistent.

pub mod collapse;
pub mod context;
pub mod discussions;
pub mod projector;

pub use collapse::CollapseTrigger;
pub use context::ContextExpander;
pub use projector::ViewType;
