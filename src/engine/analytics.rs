//! Read-side aggregates over committed orders. Every call rescans the
//! filtered order set; nothing is cached.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::access::{acting_restaurant, require_role};
use crate::error::AppError;
use crate::models::actor::{Actor, Role};
use crate::models::order::{Order, OrderStatus};
use crate::models::restaurant::Restaurant;
use crate::state::AppState;
use crate::store::orders::{OrderQuery, SortOrder};

/// Rider's cut of each delivery fee; the platform keeps the rest.
pub const RIDER_SHARE: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

const TOP_ITEMS_LIMIT: usize = 10;

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn rider_share(delivery_fee: Decimal) -> Decimal {
    round_money(delivery_fee * RIDER_SHARE)
}

/// Start of the current local day, expressed in UTC.
pub fn local_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = now.with_timezone(&Local).date_naive().and_time(chrono::NaiveTime::MIN);
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Inclusive date window parsed from query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, AppError> {
        Ok(Self {
            start: start.map(parse_instant).transpose()?,
            end: end.map(parse_instant).transpose()?,
        })
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (UTC midnight).
fn parse_instant(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| AppError::validation(format!("invalid date '{raw}'")))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_orders: usize,
    pub today_revenue: Decimal,
    pub pending_orders: usize,
    pub total_orders: usize,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub restaurant_info: Restaurant,
}

/// Today's revenue counts every order created since `day_start` whatever
/// its status; all-time revenue counts delivered orders only. Both exclude
/// delivery fees.
pub fn dashboard_stats(orders: &[Order], day_start: DateTime<Utc>) -> DashboardStats {
    let today: Vec<&Order> = orders.iter().filter(|o| o.created_at >= day_start).collect();

    DashboardStats {
        today_orders: today.len(),
        today_revenue: today.iter().map(|o| o.subtotal).sum(),
        pending_orders: orders
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Preparing
                )
            })
            .count(),
        total_orders: orders.len(),
        total_revenue: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .map(|o| o.subtotal)
            .sum(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemSales {
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub cancelled_orders: usize,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub top_selling_items: Vec<ItemSales>,
}

/// Average order value divides delivered revenue by *all* orders in range.
/// Top items count quantities across every status.
pub fn analytics(orders: &[Order]) -> Analytics {
    let total_orders = orders.len();
    let completed_orders = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .count();
    let cancelled_orders = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Cancelled)
        .count();
    let total_revenue: Decimal = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .map(|o| o.subtotal)
        .sum();

    let average_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        round_money(total_revenue / Decimal::from(total_orders))
    };

    let mut sales: BTreeMap<&str, u64> = BTreeMap::new();
    for item in orders.iter().flat_map(|o| o.items.iter()) {
        *sales.entry(item.name.as_str()).or_default() += u64::from(item.quantity);
    }

    let mut top_selling_items: Vec<ItemSales> = sales
        .into_iter()
        .map(|(name, quantity)| ItemSales {
            name: name.to_string(),
            quantity,
        })
        .collect();
    top_selling_items.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    top_selling_items.truncate(TOP_ITEMS_LIMIT);

    Analytics {
        total_orders,
        completed_orders,
        cancelled_orders,
        total_revenue,
        average_order_value,
        top_selling_items,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub total_earnings: Decimal,
    pub today_earnings: Decimal,
    pub total_deliveries: usize,
    pub today_deliveries: usize,
}

/// Expects the rider's delivered orders.
pub fn earnings(delivered: &[Order], day_start: DateTime<Utc>) -> Earnings {
    let today: Vec<&Order> = delivered
        .iter()
        .filter(|o| o.actual_delivery_time.is_some_and(|at| at >= day_start))
        .collect();

    Earnings {
        total_earnings: delivered.iter().map(|o| rider_share(o.delivery_fee)).sum(),
        today_earnings: today.iter().map(|o| rider_share(o.delivery_fee)).sum(),
        total_deliveries: delivered.len(),
        today_deliveries: today.len(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningsRecord {
    pub order_id: Uuid,
    pub restaurant_name: Option<String>,
    pub delivery_fee: Decimal,
    pub earnings: Decimal,
    pub delivered_at: Option<DateTime<Utc>>,
}

pub fn dashboard(state: &AppState, actor: &Actor) -> Result<Dashboard, AppError> {
    let restaurant = acting_restaurant(state, actor)?;
    let orders = state.orders.find(&OrderQuery {
        restaurant_id: Some(restaurant.id),
        ..OrderQuery::default()
    });

    Ok(Dashboard {
        stats: dashboard_stats(&orders, local_midnight(Utc::now())),
        restaurant_info: restaurant,
    })
}

pub fn restaurant_analytics(
    state: &AppState,
    actor: &Actor,
    range: DateRange,
) -> Result<Analytics, AppError> {
    let restaurant = acting_restaurant(state, actor)?;
    let orders = state.orders.find(&OrderQuery {
        restaurant_id: Some(restaurant.id),
        created_from: range.start,
        created_to: range.end,
        ..OrderQuery::default()
    });

    Ok(analytics(&orders))
}

pub fn rider_earnings(state: &AppState, actor: &Actor) -> Result<Earnings, AppError> {
    require_role(actor, Role::Rider)?;
    let delivered = state.orders.find(&OrderQuery {
        rider_id: Some(actor.id),
        status: Some(OrderStatus::Delivered),
        ..OrderQuery::default()
    });

    Ok(earnings(&delivered, local_midnight(Utc::now())))
}

/// Per-order rider earnings, newest delivery first.
pub fn earnings_history(
    state: &AppState,
    actor: &Actor,
    range: DateRange,
) -> Result<Vec<EarningsRecord>, AppError> {
    require_role(actor, Role::Rider)?;
    let delivered = state.orders.find(&OrderQuery {
        rider_id: Some(actor.id),
        status: Some(OrderStatus::Delivered),
        delivered_from: range.start,
        delivered_to: range.end,
        sort: SortOrder::LatestDeliveryFirst,
        ..OrderQuery::default()
    });

    Ok(delivered
        .into_iter()
        .map(|order| EarningsRecord {
            order_id: order.id,
            restaurant_name: state.restaurants.name_of(order.restaurant_id),
            delivery_fee: order.delivery_fee,
            earnings: rider_share(order.delivery_fee),
            delivered_at: order.actual_delivery_time,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::order::{LineItem, PaymentMethod, PaymentStatus};

    fn order(status: OrderStatus, subtotal: i64, created_at: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            rider_id: None,
            items: Vec::new(),
            subtotal: Decimal::from(subtotal),
            delivery_fee: Decimal::from(500),
            total: Decimal::from(subtotal + 500),
            status,
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Paid,
            delivery_address: "2 Awolowo Rd".to_string(),
            customer_phone: "0701".to_string(),
            customer_name: "Uche".to_string(),
            special_instructions: None,
            estimated_delivery_time: created_at + Duration::minutes(45),
            actual_delivery_time: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn with_items(mut order: Order, items: &[(&str, u32)]) -> Order {
        order.items = items
            .iter()
            .map(|(name, quantity)| LineItem {
                menu_item_id: Uuid::new_v4(),
                name: name.to_string(),
                unit_price: Decimal::from(1000),
                quantity: *quantity,
            })
            .collect();
        order
    }

    fn delivered_at(fee: i64, at: DateTime<Utc>) -> Order {
        let mut o = order(OrderStatus::Delivered, 1000, at - Duration::hours(1));
        o.delivery_fee = Decimal::from(fee);
        o.actual_delivery_time = Some(at);
        o
    }

    #[test]
    fn rider_share_is_eighty_percent() {
        assert_eq!(rider_share(Decimal::from(500)), Decimal::from(400));
        assert_eq!(rider_share(Decimal::new(333, 0)), Decimal::new(26640, 2));
        assert_eq!(rider_share(Decimal::new(1, 2)), Decimal::new(1, 2));
    }

    #[test]
    fn analytics_over_mixed_statuses() {
        let now = Utc::now();
        let mut orders = Vec::new();
        for _ in 0..6 {
            orders.push(order(OrderStatus::Delivered, 10000, now));
        }
        for _ in 0..2 {
            orders.push(order(OrderStatus::Cancelled, 7000, now));
        }
        for _ in 0..2 {
            orders.push(order(OrderStatus::Pending, 3000, now));
        }

        let result = analytics(&orders);
        assert_eq!(result.total_orders, 10);
        assert_eq!(result.completed_orders, 6);
        assert_eq!(result.cancelled_orders, 2);
        assert_eq!(result.total_revenue, Decimal::from(60000));
        assert_eq!(result.average_order_value, Decimal::from(6000));
    }

    #[test]
    fn analytics_on_empty_range_is_zero() {
        let result = analytics(&[]);
        assert_eq!(result.total_orders, 0);
        assert_eq!(result.average_order_value, Decimal::ZERO);
        assert!(result.top_selling_items.is_empty());
    }

    #[test]
    fn top_items_count_every_status_and_cap_at_ten() {
        let now = Utc::now();
        let mut orders = vec![
            with_items(
                order(OrderStatus::Cancelled, 0, now),
                &[("Puff puff", 7), ("Zobo", 1)],
            ),
            with_items(
                order(OrderStatus::Delivered, 0, now),
                &[("Zobo", 4), ("Chin chin", 2)],
            ),
        ];
        let extras: Vec<(String, u32)> = (0..12).map(|i| (format!("extra-{i:02}"), 1)).collect();
        let extras: Vec<(&str, u32)> = extras.iter().map(|(n, q)| (n.as_str(), *q)).collect();
        orders.push(with_items(order(OrderStatus::Pending, 0, now), &extras));

        let top = analytics(&orders).top_selling_items;
        assert_eq!(top.len(), 10);
        assert_eq!(
            top[0],
            ItemSales {
                name: "Puff puff".to_string(),
                quantity: 7
            }
        );
        assert_eq!(top[1].name, "Zobo");
        assert_eq!(top[1].quantity, 5);
        assert_eq!(top[2].name, "Chin chin");
        assert!(top.windows(2).all(|pair| pair[0].quantity >= pair[1].quantity));
    }

    #[test]
    fn dashboard_today_revenue_ignores_status_but_total_does_not() {
        let day_start = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let orders = vec![
            order(OrderStatus::Pending, 1000, day_start + Duration::hours(2)),
            order(OrderStatus::Cancelled, 2000, day_start + Duration::hours(3)),
            order(OrderStatus::Delivered, 4000, day_start - Duration::days(1)),
            order(OrderStatus::Confirmed, 500, day_start - Duration::days(2)),
            order(OrderStatus::Ready, 800, day_start - Duration::days(2)),
        ];

        let stats = dashboard_stats(&orders, day_start);
        assert_eq!(stats.today_orders, 2);
        assert_eq!(stats.today_revenue, Decimal::from(3000));
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.total_orders, 5);
        assert_eq!(stats.total_revenue, Decimal::from(4000));
    }

    #[test]
    fn earnings_split_today_from_all_time() {
        let day_start = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let delivered = vec![
            delivered_at(500, day_start + Duration::hours(1)),
            delivered_at(250, day_start - Duration::hours(1)),
        ];

        let result = earnings(&delivered, day_start);
        assert_eq!(result.total_earnings, Decimal::from(600));
        assert_eq!(result.today_earnings, Decimal::from(400));
        assert_eq!(result.total_deliveries, 2);
        assert_eq!(result.today_deliveries, 1);
    }

    #[test]
    fn date_range_accepts_rfc3339_and_plain_dates() {
        let range = DateRange::parse(Some("2026-01-01"), Some("2026-01-31T23:59:59Z")).unwrap();
        assert_eq!(
            range.start,
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            range.end,
            Some(Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap())
        );

        assert!(matches!(
            DateRange::parse(Some("last tuesday"), None),
            Err(AppError::Validation(_))
        ));
        assert_eq!(DateRange::parse(None, None).unwrap(), DateRange::default());
    }

    #[test]
    fn local_midnight_is_not_after_now() {
        let now = Utc::now();
        let midnight = local_midnight(now);
        assert!(midnight <= now);
        assert!(now - midnight < Duration::hours(25));
    }
}
