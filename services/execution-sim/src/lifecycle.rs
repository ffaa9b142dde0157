//! Order lifecycle management
//!
//! Legality of every state change lives in one transition table; all
//! mutation paths consult it before touching an order.

use crate::error::{SimError, SimResult};
use crate::order::{FillKind, OrderRequest, OrderState};
use std::collections::HashMap;
use tracing::debug;

/// Order lifecycle manager
#[derive(Debug)]
pub struct OrderLifecycleManager {
    /// Valid state transitions
    valid_transitions: HashMap<OrderState, Vec<OrderState>>,
}

impl Default for OrderLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderLifecycleManager {
    /// Create a lifecycle manager with the standard transition table
    #[must_use]
    pub fn new() -> Self {
        let mut valid_transitions = HashMap::new();

        valid_transitions.insert(
            OrderState::New,
            vec![OrderState::Placed, OrderState::Cancelled, OrderState::Rejected],
        );

        valid_transitions.insert(
            OrderState::Placed,
            vec![
                OrderState::PartFilled,
                OrderState::Filled,
                OrderState::Routed,
                OrderState::Cancelling,
                OrderState::Cancelled,
            ],
        );

        // Repeated partial fills stay in PartFilled.
        valid_transitions.insert(
            OrderState::PartFilled,
            vec![
                OrderState::PartFilled,
                OrderState::Filled,
                OrderState::Cancelling,
                OrderState::Cancelled,
            ],
        );

        valid_transitions.insert(
            OrderState::Routed,
            vec![
                OrderState::PartFilled,
                OrderState::Filled,
                OrderState::Cancelling,
                OrderState::Cancelled,
            ],
        );

        valid_transitions.insert(
            OrderState::Cancelling,
            vec![OrderState::Cancelled, OrderState::Rejected],
        );

        // Terminal states have no transitions.
        valid_transitions.insert(OrderState::Filled, vec![]);
        valid_transitions.insert(OrderState::Cancelled, vec![]);
        valid_transitions.insert(OrderState::Rejected, vec![]);

        Self { valid_transitions }
    }

    /// Validate an order request before it is accepted
    ///
    /// Stop prices are not supported by the simulator: such orders are
    /// rejected at submission and never enter the book.
    pub fn validate_request(&self, request: &OrderRequest) -> SimResult<()> {
        if request.stop_price_count.is_some() {
            return Err(SimError::UnsupportedOrder {
                reason: "stop prices unsupported".to_string(),
            });
        }

        if request.volume_count.abs() == 0 {
            return Err(SimError::InvalidOrder {
                reason: "volume must be non-zero".to_string(),
            });
        }

        match request.kind {
            FillKind::Limit if request.limit_price_count.is_none() => {
                return Err(SimError::InvalidOrder {
                    reason: "limit order requires a limit price".to_string(),
                });
            }
            FillKind::Market if request.limit_price_count.is_some() => {
                return Err(SimError::InvalidOrder {
                    reason: "market order must not carry a limit price".to_string(),
                });
            }
            _ => {}
        }

        Ok(())
    }

    /// Validate a state transition
    pub fn validate_transition(&self, from: OrderState, to: OrderState) -> SimResult<()> {
        if let Some(valid_next_states) = self.valid_transitions.get(&from) {
            if valid_next_states.contains(&to) {
                debug!("valid transition: {:?} -> {:?}", from, to);
                return Ok(());
            }
        }
        Err(SimError::InvalidTransition { from, to })
    }

    /// Whether a cancel may be attempted from this state
    #[must_use]
    pub const fn can_cancel(&self, state: OrderState) -> bool {
        state.is_open()
    }

    /// Next valid states from a given state
    #[must_use]
    pub fn valid_transitions_from(&self, state: OrderState) -> Vec<OrderState> {
        self.valid_transitions.get(&state).cloned().unwrap_or_default()
    }
}
