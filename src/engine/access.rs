use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::actor::{Actor, Role};
use crate::models::order::Order;
use crate::models::restaurant::Restaurant;
use crate::state::AppState;

/// Who may read an order by id.
///
/// `Broad` lets any restaurant- or rider-role actor read any order, in
/// addition to the customer who placed it. `Scoped` narrows that to the
/// owning restaurant, the assigned rider, and riders browsing an order that
/// is still up for claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadPolicy {
    #[default]
    Broad,
    Scoped,
}

impl FromStr for ReadPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "broad" => Ok(ReadPolicy::Broad),
            "scoped" => Ok(ReadPolicy::Scoped),
            other => Err(format!("unknown read policy '{other}'")),
        }
    }
}

impl fmt::Display for ReadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadPolicy::Broad => f.write_str("broad"),
            ReadPolicy::Scoped => f.write_str("scoped"),
        }
    }
}

pub fn require_role(actor: &Actor, role: Role) -> Result<(), AppError> {
    if actor.role == role {
        Ok(())
    } else {
        tracing::debug!(actor_id = %actor.id, role = ?actor.role, required = ?role, "role check failed");
        Err(AppError::Forbidden)
    }
}

/// Maps a restaurant-role actor to the restaurant they own.
pub fn acting_restaurant(state: &AppState, actor: &Actor) -> Result<Restaurant, AppError> {
    require_role(actor, Role::Restaurant)?;
    state.restaurants.find_by_owner(actor.id)
}

pub fn can_read(
    policy: ReadPolicy,
    actor: &Actor,
    order: &Order,
    restaurant: Option<&Restaurant>,
) -> bool {
    if order.customer_id == actor.id {
        return true;
    }

    match (policy, actor.role) {
        (_, Role::Customer) => false,
        (ReadPolicy::Broad, Role::Restaurant | Role::Rider) => true,
        (ReadPolicy::Scoped, Role::Restaurant) => {
            restaurant.is_some_and(|r| r.id == order.restaurant_id && r.owner_id == actor.id)
        }
        (ReadPolicy::Scoped, Role::Rider) => {
            order.rider_id == Some(actor.id) || order.is_claimable()
        }
    }
}

pub fn authorize_read(state: &AppState, actor: &Actor, order: &Order) -> Result<(), AppError> {
    let restaurant = state.restaurants.get(order.restaurant_id).ok();
    if can_read(state.read_policy, actor, order, restaurant.as_ref()) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
