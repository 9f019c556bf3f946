use serde::Serialize;
use uuid::Uuid;

use crate::engine::access::{acting_restaurant, authorize_read, require_role};
use crate::engine::lifecycle::next_status;
use crate::error::AppError;
use crate::models::actor::{Actor, Role};
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;
use crate::store::orders::{OrderQuery, SortOrder};

const DELIVERY_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub restaurant_name: Option<String>,
    pub next_status: Option<OrderStatus>,
}

pub fn customer_orders(state: &AppState, actor: &Actor) -> Result<Vec<Order>, AppError> {
    require_role(actor, Role::Customer)?;
    Ok(state.orders.find(&OrderQuery {
        customer_id: Some(actor.id),
        ..OrderQuery::default()
    }))
}

pub fn order_by_id(state: &AppState, actor: &Actor, order_id: Uuid) -> Result<Order, AppError> {
    let order = state.orders.get(order_id)?;
    authorize_read(state, actor, &order)?;
    Ok(order)
}

pub fn track_order(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
) -> Result<TrackedOrder, AppError> {
    let order = order_by_id(state, actor, order_id)?;
    Ok(TrackedOrder {
        restaurant_name: state.restaurants.name_of(order.restaurant_id),
        next_status: next_status(order.status),
        order,
    })
}

pub fn restaurant_orders(
    state: &AppState,
    actor: &Actor,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, AppError> {
    let restaurant = acting_restaurant(state, actor)?;
    Ok(state.orders.find(&OrderQuery {
        restaurant_id: Some(restaurant.id),
        status,
        ..OrderQuery::default()
    }))
}

/// Ready and unclaimed, longest-waiting first.
pub fn available_deliveries(state: &AppState, actor: &Actor) -> Result<Vec<Order>, AppError> {
    require_role(actor, Role::Rider)?;
    Ok(state.orders.find(&OrderQuery {
        status: Some(OrderStatus::Ready),
        unclaimed_only: true,
        sort: SortOrder::OldestFirst,
        ..OrderQuery::default()
    }))
}

pub fn active_deliveries(state: &AppState, actor: &Actor) -> Result<Vec<Order>, AppError> {
    require_role(actor, Role::Rider)?;
    Ok(state.orders.find(&OrderQuery {
        rider_id: Some(actor.id),
        status: Some(OrderStatus::PickedUp),
        ..OrderQuery::default()
    }))
}

pub fn delivery_history(state: &AppState, actor: &Actor) -> Result<Vec<Order>, AppError> {
    require_role(actor, Role::Rider)?;
    Ok(state.orders.find(&OrderQuery {
        rider_id: Some(actor.id),
        status: Some(OrderStatus::Delivered),
        sort: SortOrder::LatestDeliveryFirst,
        limit: Some(DELIVERY_HISTORY_LIMIT),
        ..OrderQuery::default()
    }))
}
