//! Error types for the matching core
//!
//! One unified error enum is shared by the order book and the engine.
//! User-facing rejections (duplicate, not found, not cancellable) are
//! returned synchronously to the submitter; `InvariantViolation` is
//! fatal and poisons the book that raised it.

use thiserror::Error;

use crate::model::order::Status;

/// Matching core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Submit or insert with an order id already live in the target book
    #[error("Duplicate order: {0}")]
    DuplicateOrder(String),

    /// Cancel targeting an id absent from the book
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The order's status does not allow cancellation
    #[error("Order cannot be cancelled: {id}, status: {status:?}")]
    NotCancellable {
        /// Order id the cancel targeted
        id: String,
        /// Status observed at cancel time
        status: Status,
    },

    /// Error when a market cannot be found
    #[error("Market not found: {0}")]
    MarketNotFound(String),

    /// Error related to order validation
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Fatal: book state is internally inconsistent
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
