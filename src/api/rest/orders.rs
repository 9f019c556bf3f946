use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::engine::placement::{place_order, NewOrder};
use crate::engine::queries::{self, TrackedOrder};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/:id", get(get_order))
        .route("/api/orders/:id/track", get(track_order))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let Json(payload) = payload?;
    let order = place_order(&state, &actor, payload)?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(queries::customer_orders(&state, &actor)?))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = id?;
    Ok(Json(queries::order_by_id(&state, &actor, id)?))
}

async fn track_order(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TrackedOrder>, AppError> {
    let Path(id) = id?;
    Ok(Json(queries::track_order(&state, &actor, id)?))
}
