use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::rest::restaurant::RangeParams;
use crate::engine::analytics::{self, DateRange, Earnings, EarningsRecord};
use crate::engine::delivery::{accept_delivery, complete_delivery};
use crate::engine::queries;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rider/deliveries/available", get(available))
        .route("/api/rider/deliveries/active", get(active))
        .route("/api/rider/deliveries/history", get(history))
        .route("/api/rider/deliveries/:id/accept", post(accept))
        .route("/api/rider/deliveries/:id/complete", post(complete))
        .route("/api/rider/earnings", get(earnings))
        .route("/api/rider/earnings/history", get(earnings_history))
}

async fn available(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(queries::available_deliveries(&state, &actor)?))
}

async fn active(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(queries::active_deliveries(&state, &actor)?))
}

async fn history(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(queries::delivery_history(&state, &actor)?))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = id?;
    Ok(Json(accept_delivery(&state, &actor, id)?))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = id?;
    Ok(Json(complete_delivery(&state, &actor, id)?))
}

async fn earnings(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Earnings>, AppError> {
    Ok(Json(analytics::rider_earnings(&state, &actor)?))
}

async fn earnings_history(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<EarningsRecord>>, AppError> {
    let Query(params) = params?;
    let range = DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?;
    Ok(Json(analytics::earnings_history(&state, &actor, range)?))
}
