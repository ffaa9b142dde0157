//! Order recovery
//!
//! Rebuilds in-flight orders from the persistence collaborator after a
//! restart and reconciles their quantities before they re-enter the book.

use crate::error::SimResult;
use crate::order::{OrderRecord, OrderState, SpecificOrder};
use crate::store::OrderStore;
use std::sync::Arc;
use tracing::{info, warn};

/// States re-inserted into the book at startup
pub const RECOVERABLE_STATES: [OrderState; 4] = [
    OrderState::Placed,
    OrderState::PartFilled,
    OrderState::Routed,
    OrderState::Cancelling,
];

/// Recovery statistics
#[derive(Debug, Clone, Default)]
pub struct RecoveryStats {
    /// Orders rebuilt into memory
    pub orders_recovered: u32,
    /// Fills found on recovered orders
    pub fills_recovered: u32,
    /// Quantity discrepancies repaired
    pub discrepancies_found: u32,
    /// Recovery time (ms)
    pub recovery_time_ms: u64,
}

/// Recovery manager for handling restarts
pub struct RecoveryManager {
    store: Arc<dyn OrderStore>,
}

impl RecoveryManager {
    /// Create a recovery manager over a store
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Load, reconcile and rebuild every order in a recoverable state
    pub async fn recover(&self) -> SimResult<(Vec<Arc<SpecificOrder>>, RecoveryStats)> {
        let start = std::time::Instant::now();
        let mut stats = RecoveryStats::default();

        let records = self.store.load_orders_by_state(&RECOVERABLE_STATES).await?;
        let mut orders = Vec::with_capacity(records.len());
        for mut record in records {
            stats.fills_recovered += record.fills.len() as u32;
            if reconcile_quantities(&mut record) {
                stats.discrepancies_found += 1;
            }
            orders.push(Arc::new(SpecificOrder::from_record(record)));
            stats.orders_recovered += 1;
        }

        stats.recovery_time_ms = start.elapsed().as_millis() as u64;
        info!(
            orders = stats.orders_recovered,
            fills = stats.fills_recovered,
            discrepancies = stats.discrepancies_found,
            "order recovery complete"
        );
        Ok((orders, stats))
    }
}

/// Repair a record whose remaining volume disagrees with its fill history
///
/// The fill history is the authority: remaining becomes requested minus the
/// signed fill sum, clamped between zero and the requested volume. Returns
/// whether a repair was needed.
fn reconcile_quantities(record: &mut OrderRecord) -> bool {
    let executed: i64 = record.fills.iter().map(|f| f.volume_count).sum();
    let expected = record.volume_count - executed;
    let clamped = if record.volume_count >= 0 {
        expected.clamp(0, record.volume_count)
    } else {
        expected.clamp(record.volume_count, 0)
    };

    if record.remaining_volume_count != clamped {
        warn!(
            order_id = %record.id,
            stored = record.remaining_volume_count,
            repaired = clamped,
            "remaining volume disagreed with fill history"
        );
        record.remaining_volume_count = clamped;
        return true;
    }
    false
}
