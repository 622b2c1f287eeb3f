//! Backend targets and round-robin selection.
//!
//! - [`registry`]: parses configured URLs into [`BackendTarget`]s and keeps
//!   them in rotation order
//! - [`selector`]: owns the rotation cursor and hands out one target per call

pub mod registry;
pub mod selector;

pub use registry::{BackendTarget, TargetEntry, TargetRegistry};
pub use selector::TargetSelector;
