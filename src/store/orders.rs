use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    LatestDeliveryFirst,
}

/// Filter over the order set. Unset fields match everything; date bounds
/// are inclusive.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub customer_id: Option<Uuid>,
    pub restaurant_id: Option<Uuid>,
    pub rider_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub unclaimed_only: bool,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub delivered_from: Option<DateTime<Utc>>,
    pub delivered_to: Option<DateTime<Utc>>,
    pub sort: SortOrder,
    pub limit: Option<usize>,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        if self.customer_id.is_some_and(|id| order.customer_id != id) {
            return false;
        }
        if self.restaurant_id.is_some_and(|id| order.restaurant_id != id) {
            return false;
        }
        if self.rider_id.is_some() && order.rider_id != self.rider_id {
            return false;
        }
        if self.status.is_some_and(|status| order.status != status) {
            return false;
        }
        if self.unclaimed_only && order.rider_id.is_some() {
            return false;
        }
        if self.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        if self.delivered_from.is_some() || self.delivered_to.is_some() {
            let Some(delivered_at) = order.actual_delivery_time else {
                return false;
            };
            if self.delivered_from.is_some_and(|from| delivered_at < from) {
                return false;
            }
            if self.delivered_to.is_some_and(|to| delivered_at > to) {
                return false;
            }
        }
        true
    }
}

/// In-memory order table. Every mutation goes through [`OrderStore::update`],
/// which holds the entry's shard lock across read, check and write.
#[derive(Default)]
pub struct OrderStore {
    orders: DashMap<Uuid, Order>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Persists a new order with the timestamps it was built with.
    pub fn insert(&self, order: Order) -> Order {
        self.orders.insert(order.id, order.clone());
        order
    }

    pub fn get(&self, id: Uuid) -> Result<Order, AppError> {
        self.orders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::order_not_found(id))
    }

    /// Atomic conditional update. `apply` sees the committed record and
    /// either mutates it or rejects; on rejection nothing is written.
    pub fn update<F>(&self, id: Uuid, apply: F) -> Result<Order, AppError>
    where
        F: FnOnce(&mut Order) -> Result<(), AppError>,
    {
        let mut entry = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::order_not_found(id))?;

        let mut draft = entry.value().clone();
        apply(&mut draft)?;
        draft.updated_at = Utc::now();
        *entry = draft.clone();

        Ok(draft)
    }

    pub fn find(&self, query: &OrderQuery) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        match query.sort {
            SortOrder::NewestFirst => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::OldestFirst => orders.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::LatestDeliveryFirst => {
                orders.sort_by(|a, b| b.actual_delivery_time.cmp(&a.actual_delivery_time))
            }
        }

        if let Some(limit) = query.limit {
            orders.truncate(limit);
        }

        orders
    }
}
