use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::analytics::{self, Analytics, Dashboard, DateRange};
use crate::engine::lifecycle::update_order_status;
use crate::engine::queries;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/restaurant/dashboard", get(dashboard))
        .route("/api/restaurant/orders", get(list_orders))
        .route("/api/restaurant/orders/:id/status", put(update_status))
        .route("/api/restaurant/analytics", get(restaurant_analytics))
}

#[derive(Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

/// Status arrives as a raw string so unknown values surface as a
/// validation error rather than a body rejection.
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.parse::<OrderStatus>().map_err(AppError::Validation)
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(analytics::dashboard(&state, &actor)?))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    filter: Result<Query<StatusFilter>, QueryRejection>,
) -> Result<Json<Vec<Order>>, AppError> {
    let Query(filter) = filter?;
    let status = filter.status.as_deref().map(parse_status).transpose()?;
    Ok(Json(queries::restaurant_orders(&state, &actor, status)?))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let requested = parse_status(&payload.status)?;
    Ok(Json(update_order_status(&state, &actor, id, requested)?))
}

async fn restaurant_analytics(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Analytics>, AppError> {
    let Query(params) = params?;
    let range = DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?;
    Ok(Json(analytics::restaurant_analytics(&state, &actor, range)?))
}
