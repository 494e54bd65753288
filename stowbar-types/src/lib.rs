//! Stowbar Types
//!
//! Shared geometry, display, permission and layout types used by the menu bar
//! core and the diagnostics CLI.

pub mod geometry;
pub mod logging;
pub mod types;

pub use geometry::*;
pub use types::*;
