//! CLI command implementations

pub mod predict;
pub mod train;
