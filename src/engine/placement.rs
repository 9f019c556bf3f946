use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::access::require_role;
use crate::error::AppError;
use crate::models::actor::{Actor, Role};
use crate::models::order::{LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub restaurant_id: Uuid,
    pub items: Vec<LineItem>,
    pub delivery_address: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Largest unit price accepted on a line item.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Largest quantity accepted on a line item.
pub const MAX_QUANTITY: u32 = 9999;

fn overflow() -> AppError {
    AppError::validation("order amount is too large")
}

pub fn subtotal(items: &[LineItem]) -> Result<Decimal, AppError> {
    items.iter().try_fold(Decimal::ZERO, |sum, item| {
        item.line_total()
            .and_then(|line| sum.checked_add(line))
            .ok_or_else(overflow)
    })
}

fn validate(request: &NewOrder) -> Result<(), AppError> {
    if request.items.is_empty() {
        return Err(AppError::validation("order must contain at least one item"));
    }

    for (index, item) in request.items.iter().enumerate() {
        if item.quantity < 1 {
            return Err(AppError::validation(format!(
                "item {index}: quantity must be at least 1"
            )));
        }
        if item.quantity > MAX_QUANTITY {
            return Err(AppError::validation(format!(
                "item {index}: quantity exceeds maximum allowed ({MAX_QUANTITY})"
            )));
        }
        if item.name.trim().is_empty() {
            return Err(AppError::validation(format!("item {index}: name is required")));
        }
        if item.unit_price.is_sign_negative() {
            return Err(AppError::validation(format!(
                "item {index}: unit price must not be negative"
            )));
        }
        if item.unit_price > MAX_UNIT_PRICE {
            return Err(AppError::validation(format!(
                "item {index}: unit price exceeds maximum allowed ({MAX_UNIT_PRICE})"
            )));
        }
    }

    if request.delivery_address.trim().is_empty() {
        return Err(AppError::validation("delivery address is required"));
    }
    if request.customer_phone.trim().is_empty() {
        return Err(AppError::validation("customer phone is required"));
    }

    Ok(())
}

/// Creates a pending order. Prices and names are frozen as submitted and
/// the delivery fee is read from the restaurant at this instant.
pub fn place_order(state: &AppState, actor: &Actor, request: NewOrder) -> Result<Order, AppError> {
    require_role(actor, Role::Customer)?;
    validate(&request)?;

    let restaurant = state.restaurants.get(request.restaurant_id)?;

    let subtotal = subtotal(&request.items)?;
    let delivery_fee = restaurant.delivery_fee;
    let total = subtotal.checked_add(delivery_fee).ok_or_else(overflow)?;
    let now = Utc::now();

    let order = Order {
        id: Uuid::new_v4(),
        customer_id: actor.id,
        restaurant_id: restaurant.id,
        rider_id: None,
        items: request.items,
        subtotal,
        delivery_fee,
        total,
        status: OrderStatus::Pending,
        payment_method: request.payment_method,
        payment_status: PaymentStatus::initial_for(request.payment_method),
        delivery_address: request.delivery_address,
        customer_phone: request.customer_phone,
        customer_name: actor.name.clone(),
        special_instructions: request
            .special_instructions
            .filter(|note| !note.trim().is_empty()),
        estimated_delivery_time: now + Duration::minutes(state.estimated_delivery_minutes),
        actual_delivery_time: None,
        created_at: now,
        updated_at: now,
    };

    let order = state.orders.insert(order);
    state.metrics.orders_placed_total.inc();

    info!(
        order_id = %order.id,
        restaurant_id = %order.restaurant_id,
        customer_id = %order.customer_id,
        total = %order.total,
        "order placed"
    );

    Ok(order)
}
