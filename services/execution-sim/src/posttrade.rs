//! Fill post-processing
//!
//! Runs after a matching pass has committed its book mutations: attach
//! commission, append the fill to the order's history, apply the lifecycle
//! transition, persist, then publish. Strictly sequential per fill; no book
//! lock is held anywhere in this path.

use crate::error::SimResult;
use crate::fees::CommissionModel;
use crate::lifecycle::OrderLifecycleManager;
use crate::order::{Fill, OrderState, OrderUpdate, SpecificOrder};
use crate::store::OrderStore;
use crate::{EngineEvent, SimMetrics};
use services_common::Market;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::broadcast;
use tracing::{error, warn};

/// Enriches fills and hands them to the publish and persistence collaborators
pub(crate) struct FillProcessor {
    commission: Arc<dyn CommissionModel>,
    store: Arc<dyn OrderStore>,
    events: broadcast::Sender<EngineEvent>,
    lifecycle: Arc<OrderLifecycleManager>,
    metrics: Arc<SimMetrics>,
}

impl FillProcessor {
    pub(crate) fn new(
        commission: Arc<dyn CommissionModel>,
        store: Arc<dyn OrderStore>,
        events: broadcast::Sender<EngineEvent>,
        lifecycle: Arc<OrderLifecycleManager>,
        metrics: Arc<SimMetrics>,
    ) -> Self {
        Self { commission, store, events, lifecycle, metrics }
    }

    /// Process one fill end to end; returns the enriched fill
    pub(crate) async fn process(
        &self,
        market: &Market,
        order: &Arc<SpecificOrder>,
        mut fill: Fill,
    ) -> SimResult<Fill> {
        fill.commission = Some(self.commission.commission(&fill, market));

        let update = {
            let mut core = order.core();

            let executed: i64 = core.fills.iter().map(Fill::volume_abs).sum();
            if executed + fill.volume_abs() > order.volume_count.abs() {
                self.metrics.overfills.fetch_add(1, Ordering::Relaxed);
                error!(
                    order_id = %order.id,
                    fill_id = %fill.id,
                    executed,
                    fill_volume = fill.volume_abs(),
                    requested = order.volume_count.abs(),
                    "fill volume exceeds requested volume"
                );
            }
            core.fills.push(fill.clone());

            let next = if core.remaining_volume_count == 0 {
                OrderState::Filled
            } else {
                OrderState::PartFilled
            };
            if core.state != next {
                if core.state.is_terminal() {
                    // A cancel won the race; the executed volume still stands.
                    warn!(order_id = %order.id, state = ?core.state, "fill recorded after terminal state");
                } else {
                    self.lifecycle.validate_transition(core.state, next)?;
                    core.state = next;
                }
            }

            OrderUpdate {
                order_id: order.id,
                market: order.market,
                state: core.state,
                remaining_volume_count: core.remaining_volume_count,
                reason: None,
                ts: fill.ts,
            }
        };

        let record = order.to_record();
        self.store.record_fill(&fill).await?;
        self.store.update_order(&record).await?;

        self.metrics.fills_generated.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .volume_filled
            .fetch_add(fill.volume_abs() as u64, Ordering::Relaxed);

        let _ = self.events.send(EngineEvent::Fill(fill.clone()));
        let _ = self.events.send(EngineEvent::Order(update));
        Ok(fill)
    }

    /// Publish an order update outside the fill path
    pub(crate) fn publish_update(&self, update: OrderUpdate) {
        let _ = self.events.send(EngineEvent::Order(update));
    }

    /// New receiver on the event channel
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}
