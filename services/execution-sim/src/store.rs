//! Order persistence collaborator
//!
//! The core never touches a durable store directly: it hands snapshots to an
//! [`OrderStore`] and loads them back at startup recovery. The in-memory
//! implementation backs tests and embedded use.

use crate::order::{Fill, OrderId, OrderRecord, OrderState};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Persistence collaborator consumed through simple create/update calls
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a newly created order
    async fn save_order(&self, record: &OrderRecord) -> Result<()>;

    /// Upsert an order after a state or quantity change
    async fn update_order(&self, record: &OrderRecord) -> Result<()>;

    /// Persist a fill
    async fn record_fill(&self, fill: &Fill) -> Result<()>;

    /// Load every order currently in one of the given states
    async fn load_orders_by_state(&self, states: &[OrderState]) -> Result<Vec<OrderRecord>>;
}

/// Store keeping everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<FxHashMap<OrderId, OrderRecord>>,
    fills: RwLock<Vec<Fill>>,
}

impl InMemoryOrderStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all persisted fills
    #[must_use]
    pub fn fills(&self) -> Vec<Fill> {
        self.fills.read().clone()
    }

    /// Snapshot of one persisted order
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<OrderRecord> {
        self.orders.read().get(&id).cloned()
    }

    /// Number of persisted orders
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Whether the store holds no orders
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save_order(&self, record: &OrderRecord) -> Result<()> {
        self.orders.write().insert(record.id, record.clone());
        debug!(order_id = %record.id, "order persisted");
        Ok(())
    }

    async fn update_order(&self, record: &OrderRecord) -> Result<()> {
        self.orders.write().insert(record.id, record.clone());
        Ok(())
    }

    async fn record_fill(&self, fill: &Fill) -> Result<()> {
        self.fills.write().push(fill.clone());
        Ok(())
    }

    async fn load_orders_by_state(&self, states: &[OrderState]) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read();
        Ok(orders
            .values()
            .filter(|record| states.contains(&record.state))
            .cloned()
            .collect())
    }
}
