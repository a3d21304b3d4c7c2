//! Unified error types for the syndext library.
//!
//! This module provides a unified error type that encompasses failures from
//! buffer walking, serializer capabilities, and the extension collection
//! itself, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
