use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::info;
use uuid::Uuid;

use crate::engine::access::acting_restaurant;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Statuses a restaurant may request. `picked-up` and `delivered` belong to
/// the rider flow.
pub const RESTAURANT_SETTABLE: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Cancelled,
];

/// How far a restaurant may move an order in one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any later kitchen state, e.g. `pending -> ready` for pre-made items.
    #[default]
    Forward,
    /// Only the immediate successor.
    Strict,
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(TransitionPolicy::Forward),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown transition policy '{other}'")),
        }
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionPolicy::Forward => f.write_str("forward"),
            TransitionPolicy::Strict => f.write_str("strict"),
        }
    }
}

/// Successor along the restaurant-driven chain `pending -> confirmed ->
/// preparing -> ready`. Everything else has no restaurant successor.
pub fn next_status(current: OrderStatus) -> Option<OrderStatus> {
    match current {
        OrderStatus::Pending => Some(OrderStatus::Confirmed),
        OrderStatus::Confirmed => Some(OrderStatus::Preparing),
        OrderStatus::Preparing => Some(OrderStatus::Ready),
        OrderStatus::Ready
        | OrderStatus::PickedUp
        | OrderStatus::Delivered
        | OrderStatus::Cancelled => None,
    }
}

#[derive(Debug)]
pub struct TransitionTable {
    allowed: BTreeMap<OrderStatus, BTreeSet<OrderStatus>>,
}

impl TransitionTable {
    fn build(policy: TransitionPolicy) -> Self {
        let kitchen = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ];

        let allowed = kitchen
            .into_iter()
            .map(|from| {
                let mut targets: BTreeSet<OrderStatus> = match policy {
                    TransitionPolicy::Forward => {
                        kitchen.into_iter().filter(|to| *to > from).collect()
                    }
                    TransitionPolicy::Strict => next_status(from).into_iter().collect(),
                };
                targets.insert(OrderStatus::Cancelled);
                (from, targets)
            })
            .collect();

        Self { allowed }
    }

    pub fn for_policy(policy: TransitionPolicy) -> &'static TransitionTable {
        static FORWARD: OnceLock<TransitionTable> = OnceLock::new();
        static STRICT: OnceLock<TransitionTable> = OnceLock::new();

        match policy {
            TransitionPolicy::Forward => {
                FORWARD.get_or_init(|| Self::build(TransitionPolicy::Forward))
            }
            TransitionPolicy::Strict => STRICT.get_or_init(|| Self::build(TransitionPolicy::Strict)),
        }
    }

    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        self.allowed
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    pub fn targets(&self, from: OrderStatus) -> Vec<OrderStatus> {
        self.allowed
            .get(&from)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }
}

pub fn validate_transition(
    policy: TransitionPolicy,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<(), AppError> {
    if !RESTAURANT_SETTABLE.contains(&to) {
        return Err(AppError::validation(format!("invalid status '{to}'")));
    }

    if TransitionTable::for_policy(policy).allows(from, to) {
        Ok(())
    } else if from.is_terminal() {
        Err(AppError::validation(format!(
            "order is already {from} and cannot change"
        )))
    } else {
        Err(AppError::validation(format!(
            "cannot move order from {from} to {to}"
        )))
    }
}

/// Restaurant-driven status change. The ownership and transition checks
/// run against the committed record inside the store's atomic update.
pub fn update_order_status(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    requested: OrderStatus,
) -> Result<Order, AppError> {
    let restaurant = acting_restaurant(state, actor)?;
    let policy = state.transition_policy;
    let mut previous = requested;

    let order = state.orders.update(order_id, |order| {
        if order.restaurant_id != restaurant.id {
            return Err(AppError::Forbidden);
        }
        validate_transition(policy, order.status, requested)?;
        previous = order.status;
        order.status = requested;
        Ok(())
    })?;

    state.metrics.record_transition(requested.as_str());
    info!(
        order_id = %order.id,
        restaurant_id = %restaurant.id,
        from = %previous,
        to = %requested,
        "order status updated"
    );

    Ok(order)
}
