//! Error types for the execution simulator

use crate::order::{OrderId, OrderState};
use services_common::{AmountError, MarketId};
use thiserror::Error;

/// Simulator-specific error types
#[derive(Error, Debug)]
pub enum SimError {
    /// Order uses a feature the simulator does not support
    #[error("unsupported order: {reason}")]
    UnsupportedOrder {
        /// Why the order was rejected
        reason: String,
    },

    /// Order request is malformed
    #[error("invalid order: {reason}")]
    InvalidOrder {
        /// What makes the request invalid
        reason: String,
    },

    /// Order not known to the simulator
    #[error("order not found: {order_id}")]
    OrderNotFound {
        /// The identifier that could not be resolved
        order_id: OrderId,
    },

    /// Operation requires an open order
    #[error("cannot cancel a non-open order: {order_id} is {state:?}")]
    NotOpen {
        /// The order the operation was attempted on
        order_id: OrderId,
        /// Its current, non-open state
        state: OrderState,
    },

    /// Illegal lifecycle transition
    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current state
        from: OrderState,
        /// Requested state
        to: OrderState,
    },

    /// Market has not been registered with the simulator
    #[error("market not registered: {market}")]
    UnknownMarket {
        /// The unknown market id
        market: MarketId,
    },

    /// Fixed-point arithmetic error
    #[error("amount error: {0}")]
    Amount(#[from] AmountError),

    /// Persistence collaborator error
    #[error("persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

/// Type alias for simulator results
pub type SimResult<T> = Result<T, SimError>;
