//! Version and key-rotation queries
//!
//! - [`select`]: the ordering rule every store applies for "latest"
//! - [`KeyRotationQueries`]: retire / progress / batch queries for the
//!   re-encryption workflow

pub mod rotation;
pub mod select;

pub use rotation::{KeyRotationQueries, RotationProgress};
