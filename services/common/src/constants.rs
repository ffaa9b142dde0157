//! Core constants for the execution simulator
//!
//! Centralized constants to replace magic numbers throughout the codebase.

/// Fixed-point arithmetic constants
pub mod fixed_point {
    /// Conversion factor for basis points (1/100th of a percent)
    pub const BASIS_POINTS: i64 = 10_000;

    /// Half of one basis-point denominator, used for round-half-up division
    pub const HALF_BASIS_POINTS: i64 = BASIS_POINTS / 2;

    /// Basis for markets quoting whole units (count == value)
    pub const UNIT_BASIS: i64 = 1;
}

/// Time-related constants
pub mod time {
    /// Nanoseconds per second
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;

    /// Nanoseconds per millisecond
    pub const NANOS_PER_MILLI: u64 = 1_000_000;

    /// Nanoseconds per microsecond
    pub const NANOS_PER_MICRO: u64 = 1_000;
}

/// Trading parameters
pub mod trading {
    /// Default execution slippage in basis points (0.2%)
    pub const DEFAULT_SLIPPAGE_BP: i64 = 20;

    /// Default taker commission in basis points (0.2%)
    pub const DEFAULT_COMMISSION_BP: i64 = 20;

    /// Default capacity of the engine event channel
    pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 10_000;
}
