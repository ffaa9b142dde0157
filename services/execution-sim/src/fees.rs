//! Commission computation
//!
//! The matching core treats fees as an external pure function: a fill and
//! its market go in, an [`Amount`] comes out. The default implementation
//! charges a flat basis-point rate on notional.

use crate::order::Fill;
use services_common::constants::fixed_point::{BASIS_POINTS, HALF_BASIS_POINTS};
use services_common::constants::trading::DEFAULT_COMMISSION_BP;
use services_common::{Amount, Market};

/// Pure fee collaborator
pub trait CommissionModel: Send + Sync {
    /// Commission owed for a fill, denominated in the market's quote
    /// currency at the combined `price_basis * volume_basis` scale
    fn commission(&self, fill: &Fill, market: &Market) -> Amount;
}

/// Flat basis-point commission on notional
#[derive(Debug, Clone, Copy)]
pub struct BasisPointCommission {
    /// Fee rate in basis points
    pub rate_bp: i64,
}

impl BasisPointCommission {
    /// Commission at a given basis-point rate
    #[must_use]
    pub const fn new(rate_bp: i64) -> Self {
        Self { rate_bp }
    }

    /// Free trading, useful for tests and fee-exempt venues
    #[must_use]
    pub const fn free() -> Self {
        Self { rate_bp: 0 }
    }
}

impl Default for BasisPointCommission {
    fn default() -> Self {
        Self { rate_bp: DEFAULT_COMMISSION_BP }
    }
}

impl CommissionModel for BasisPointCommission {
    fn commission(&self, fill: &Fill, market: &Market) -> Amount {
        let notional = i128::from(fill.price_count).unsigned_abs()
            * i128::from(fill.volume_count).unsigned_abs();
        let scaled = notional * self.rate_bp.unsigned_abs() as u128;
        let count = (scaled + HALF_BASIS_POINTS.unsigned_abs() as u128)
            / BASIS_POINTS.unsigned_abs() as u128;
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Amount::new(count, market.price_basis * market.volume_basis)
    }
}
