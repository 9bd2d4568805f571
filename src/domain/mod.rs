//! Domain layer types and invariants.

pub mod content;
pub mod editor;
pub mod error;
pub mod session;
