//! Extension traits for plugging data sources into the load workflows.

mod diff_source;

pub use diff_source::{DiffSource, NoOpDiffSource, SourceError};
