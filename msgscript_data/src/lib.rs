//! Shared data model for compiled message scripts.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{ValidationError, validate_script};
