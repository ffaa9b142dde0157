//! Fixed-point amounts and timestamps
//!
//! An [`Amount`] is an integer `count` interpreted against an integer `basis`
//! (real value = `count / basis`). All arithmetic stays on counts; two
//! amounts only combine when their bases match. This removes floating-point
//! drift from price/volume math entirely.

use crate::constants::time::{NANOS_PER_MICRO, NANOS_PER_MILLI};
use crate::errors::AmountError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Fixed-point quantity: `count` at a per-market `basis` scale
///
/// Equality is representational: `1/1` and `100/100` denote the same real
/// value but are not equal, by design — amounts from different markets must
/// never silently mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    count: i64,
    basis: i64,
}

impl Amount {
    /// Create an amount from a raw count and basis
    #[must_use]
    pub const fn new(count: i64, basis: i64) -> Self {
        Self { count, basis }
    }

    /// Zero at unit basis
    pub const ZERO: Self = Self { count: 0, basis: 1 };

    /// Raw integer count
    #[must_use]
    pub const fn count(&self) -> i64 {
        self.count
    }

    /// Scale factor converting the count into a real value
    #[must_use]
    pub const fn basis(&self) -> i64 {
        self.basis
    }

    /// Check whether the count is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.count == 0
    }

    /// Check whether the count is strictly positive
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.count > 0
    }

    /// Absolute value
    #[must_use]
    pub const fn abs(self) -> Self {
        Self {
            count: self.count.abs(),
            basis: self.basis,
        }
    }

    /// Negated amount
    #[must_use]
    pub const fn neg(self) -> Self {
        Self {
            count: -self.count,
            basis: self.basis,
        }
    }

    /// Add two amounts of the same basis
    pub fn checked_add(self, other: Self) -> Result<Self, AmountError> {
        self.require_same_basis(other)?;
        let count = self
            .count
            .checked_add(other.count)
            .ok_or(AmountError::Overflow { operation: "add" })?;
        Ok(Self { count, basis: self.basis })
    }

    /// Subtract two amounts of the same basis
    pub fn checked_sub(self, other: Self) -> Result<Self, AmountError> {
        self.require_same_basis(other)?;
        let count = self
            .count
            .checked_sub(other.count)
            .ok_or(AmountError::Overflow { operation: "sub" })?;
        Ok(Self { count, basis: self.basis })
    }

    /// Compare two amounts of the same basis
    pub fn checked_cmp(self, other: Self) -> Result<Ordering, AmountError> {
        self.require_same_basis(other)?;
        Ok(self.count.cmp(&other.count))
    }

    /// Get the value as f64 for external APIs only
    ///
    /// WARNING: may lose precision for counts beyond 2^53. Internal code
    /// must stay on fixed-point counts.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        // The one permitted float conversion, at the system boundary.
        #[allow(clippy::cast_precision_loss)]
        {
            self.count as f64 / self.basis as f64
        }
    }

    const fn require_same_basis(self, other: Self) -> Result<(), AmountError> {
        if self.basis == other.basis {
            Ok(())
        } else {
            Err(AmountError::BasisMismatch {
                left: self.basis,
                right: other.basis,
            })
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.basis == 1 {
            write!(f, "{}", self.count)
        } else {
            write!(f, "{}", self.as_f64())
        }
    }
}

/// Timestamp in nanoseconds since the UNIX epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ts(pub u64);

impl Ts {
    /// Get the current wall-clock timestamp
    #[must_use]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));
        let nanos = duration.as_secs() * 1_000_000_000 + u64::from(duration.subsec_nanos());
        Self(nanos)
    }

    /// Create a timestamp from nanoseconds
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * NANOS_PER_MILLI)
    }

    /// Get the timestamp as nanoseconds
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Get the timestamp as microseconds
    #[must_use]
    pub const fn as_micros(&self) -> u64 {
        self.0 / NANOS_PER_MICRO
    }

    /// Get the timestamp as milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0 / NANOS_PER_MILLI
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
