//! Common types and utilities for the matching core
//!
//! This library contains the shared domain layer used by the matching
//! engine: a unified error type, decimal aliases for monetary values,
//! nanosecond timestamps, and the order/trade models.

pub mod decimal;
pub mod error;
pub mod model;
pub mod time;

/// Re-export important types
pub use error::{Error, Result};
pub use decimal::*;
