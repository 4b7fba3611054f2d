//! Domain models for batch-label matching.

mod batch;

pub use batch::*;
