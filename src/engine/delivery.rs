use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::access::require_role;
use crate::engine::analytics::rider_share;
use crate::error::AppError;
use crate::models::actor::{Actor, Role};
use crate::models::order::{Order, OrderStatus, PaymentStatus};
use crate::state::AppState;

/// First-claim-wins. The claim check and the write happen under the order's
/// lock, so of two racing riders exactly one gets the order and the other
/// sees `Conflict`.
pub fn accept_delivery(state: &AppState, actor: &Actor, order_id: Uuid) -> Result<Order, AppError> {
    require_role(actor, Role::Rider)?;

    let result = state.orders.update(order_id, |order| {
        if order.rider_id.is_some() {
            return Err(AppError::already_assigned());
        }
        if order.status != OrderStatus::Ready {
            return Err(AppError::validation("order is not ready for pickup"));
        }
        order.rider_id = Some(actor.id);
        order.status = OrderStatus::PickedUp;
        Ok(())
    });

    match result {
        Ok(order) => {
            state.metrics.record_claim("accepted");
            state.metrics.record_transition(OrderStatus::PickedUp.as_str());
            info!(order_id = %order.id, rider_id = %actor.id, "delivery accepted");
            Ok(order)
        }
        Err(err @ AppError::Conflict(_)) => {
            state.metrics.record_claim("conflict");
            warn!(order_id = %order_id, rider_id = %actor.id, "delivery already claimed");
            Err(err)
        }
        Err(err) => {
            state.metrics.record_claim("rejected");
            Err(err)
        }
    }
}

pub fn complete_delivery(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
) -> Result<Order, AppError> {
    require_role(actor, Role::Rider)?;

    let order = state.orders.update(order_id, |order| {
        if order.rider_id != Some(actor.id) {
            return Err(AppError::Forbidden);
        }
        if order.status != OrderStatus::PickedUp {
            return Err(AppError::validation("order is not in picked-up status"));
        }
        order.status = OrderStatus::Delivered;
        order.payment_status = PaymentStatus::Paid;
        order.actual_delivery_time = Some(Utc::now());
        Ok(())
    })?;

    let earned = rider_share(order.delivery_fee);
    state.metrics.record_transition(OrderStatus::Delivered.as_str());
    state
        .metrics
        .rider_earnings_total
        .add(earned.to_f64().unwrap_or_default());

    info!(
        order_id = %order.id,
        rider_id = %actor.id,
        earnings = %earned,
        "delivery completed"
    );

    Ok(order)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::engine::lifecycle::update_order_status;
    use crate::engine::placement::{place_order, NewOrder};
    use crate::models::order::{LineItem, PaymentMethod};
    use crate::models::restaurant::Restaurant;

    struct Fixture {
        state: AppState,
        owner: Actor,
        customer: Actor,
        restaurant_id: Uuid,
    }

    fn fixture() -> Fixture {
        let state = AppState::default();
        let owner = Actor::new(Uuid::new_v4(), Role::Restaurant, "Chef");
        let restaurant_id = Uuid::new_v4();
        state
            .restaurants
            .register(Restaurant {
                id: restaurant_id,
                owner_id: owner.id,
                name: "Iya Basira".to_string(),
                delivery_fee: Decimal::from(500),
                minimum_order: Decimal::ZERO,
                is_open: true,
                rating: 4.8,
            })
            .unwrap();

        Fixture {
            state,
            owner,
            customer: Actor::new(Uuid::new_v4(), Role::Customer, "Segun"),
            restaurant_id,
        }
    }

    impl Fixture {
        fn order_in(&self, status: OrderStatus) -> Order {
            let order = place_order(
                &self.state,
                &self.customer,
                NewOrder {
                    restaurant_id: self.restaurant_id,
                    items: vec![LineItem {
                        menu_item_id: Uuid::new_v4(),
                        name: "Ewa agoyin".to_string(),
                        unit_price: Decimal::from(2000),
                        quantity: 1,
                    }],
                    delivery_address: "9 Ikorodu Rd".to_string(),
                    customer_phone: "0905".to_string(),
                    payment_method: PaymentMethod::Cash,
                    special_instructions: None,
                },
            )
            .unwrap();

            if status != OrderStatus::Pending {
                update_order_status(&self.state, &self.owner, order.id, status).unwrap();
            }
            self.state.orders.get(order.id).unwrap()
        }
    }

    fn rider(name: &str) -> Actor {
        Actor::new(Uuid::new_v4(), Role::Rider, name)
    }

    #[test]
    fn claim_and_complete_a_ready_order() {
        let fx = fixture();
        let order = fx.order_in(OrderStatus::Ready);
        let rider = rider("Kola");

        let claimed = accept_delivery(&fx.state, &rider, order.id).unwrap();
        assert_eq!(claimed.status, OrderStatus::PickedUp);
        assert_eq!(claimed.rider_id, Some(rider.id));
        assert_eq!(claimed.payment_status, PaymentStatus::Pending);

        let delivered = complete_delivery(&fx.state, &rider, order.id).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.payment_status, PaymentStatus::Paid);
        assert!(delivered.actual_delivery_time.is_some());
    }

    #[test]
    fn order_not_ready_cannot_be_claimed() {
        let fx = fixture();
        let order = fx.order_in(OrderStatus::Preparing);

        let result = accept_delivery(&fx.state, &rider("Kola"), order.id);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(fx.state.orders.get(order.id).unwrap().rider_id, None);
    }

    #[test]
    fn second_claim_conflicts() {
        let fx = fixture();
        let order = fx.order_in(OrderStatus::Ready);
        let first = rider("Kola");

        accept_delivery(&fx.state, &first, order.id).unwrap();
        let result = accept_delivery(&fx.state, &rider("Dayo"), order.id);

        assert_eq!(result.unwrap_err(), AppError::already_assigned());
        assert_eq!(fx.state.orders.get(order.id).unwrap().rider_id, Some(first.id));
    }

    #[test]
    fn racing_claims_have_exactly_one_winner() {
        let fx = Arc::new(fixture());
        let order = fx.order_in(OrderStatus::Ready);
        let riders: Vec<Actor> = (0..8).map(|i| rider(&format!("rider-{i}"))).collect();

        let handles: Vec<_> = riders
            .iter()
            .cloned()
            .map(|r| {
                let fx = fx.clone();
                std::thread::spawn(move || accept_delivery(&fx.state, &r, order.id))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let winners: Vec<&Order> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(
            results
                .iter()
                .filter(|r| r.is_err())
                .all(|r| matches!(r, Err(AppError::Conflict(_))))
        );

        let stored = fx.state.orders.get(order.id).unwrap();
        assert_eq!(stored.rider_id, winners[0].rider_id);
        assert!(riders.iter().any(|r| Some(r.id) == stored.rider_id));
    }

    #[test]
    fn only_assigned_rider_completes() {
        let fx = fixture();
        let order = fx.order_in(OrderStatus::Ready);
        let assigned = rider("Kola");
        accept_delivery(&fx.state, &assigned, order.id).unwrap();

        let result = complete_delivery(&fx.state, &rider("Dayo"), order.id);
        assert_eq!(result.unwrap_err(), AppError::Forbidden);
        assert_eq!(
            fx.state.orders.get(order.id).unwrap().status,
            OrderStatus::PickedUp
        );
    }

    #[test]
    fn completing_twice_fails_validation() {
        let fx = fixture();
        let order = fx.order_in(OrderStatus::Ready);
        let r = rider("Kola");
        accept_delivery(&fx.state, &r, order.id).unwrap();
        let first = complete_delivery(&fx.state, &r, order.id).unwrap();

        let second = complete_delivery(&fx.state, &r, order.id);
        assert!(matches!(second, Err(AppError::Validation(_))));
        assert_eq!(
            fx.state.orders.get(order.id).unwrap().actual_delivery_time,
            first.actual_delivery_time
        );
    }

    #[test]
    fn restaurant_cannot_touch_order_after_pickup() {
        let fx = fixture();
        let order = fx.order_in(OrderStatus::Ready);
        accept_delivery(&fx.state, &rider("Kola"), order.id).unwrap();

        let result = update_order_status(&fx.state, &fx.owner, order.id, OrderStatus::Cancelled);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn customers_cannot_claim() {
        let fx = fixture();
        let order = fx.order_in(OrderStatus::Ready);
        let result = accept_delivery(&fx.state, &fx.customer, order.id);
        assert_eq!(result.unwrap_err(), AppError::Forbidden);
    }
}
