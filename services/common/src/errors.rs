//! Error types shared across services

use thiserror::Error;

/// Errors raised by fixed-point amount arithmetic
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    /// Two amounts with different bases were combined or compared
    #[error("basis mismatch: {left} vs {right}")]
    BasisMismatch {
        /// Basis of the left-hand operand
        left: i64,
        /// Basis of the right-hand operand
        right: i64,
    },

    /// Count arithmetic overflowed the i64 range
    #[error("amount overflow on {operation}")]
    Overflow {
        /// The operation that overflowed
        operation: &'static str,
    },
}
