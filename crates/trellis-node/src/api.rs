//! HTTP API for the Trellis node.

use crate::node::NodeState;
use crate::storage::RocksStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use trellis_core::{
    Engine, NewUser, Plan, PlanType, Position, Registration, Stats, Transaction, Triangle,
    TriangleId, TriangleInfo, TriangleQuery, TriangleView, User, UserId,
};

type AppState = Arc<NodeState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Users
        .route("/api/v1/users", post(register_user))
        .route("/api/v1/users/:id", get(get_user))
        .route("/api/v1/users/:id/assign", post(assign_user))
        .route("/api/v1/users/:id/triangle", get(get_user_triangle))
        .route("/api/v1/users/:id/transactions", get(list_user_transactions))
        // Referral tokens
        .route("/api/v1/referrers/:token", get(resolve_referrer))
        // Triangles
        .route("/api/v1/triangles", get(list_triangles).post(create_triangle))
        .route("/api/v1/triangles/:id", get(get_triangle))
        // Plans
        .route("/api/v1/plans", get(list_plans))
        .route("/api/v1/plans/:plan", put(put_plan))
        // Counters
        .route("/api/v1/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- Errors ---

/// Engine error rendered as a JSON body with a matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(what: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: what.into(),
        }
    }
}

impl From<trellis_core::Error> for ApiError {
    fn from(e: trellis_core::Error) -> Self {
        use trellis_core::Error::*;
        let status = match &e {
            NotFound(_) => StatusCode::NOT_FOUND,
            InvalidInput(_) => StatusCode::BAD_REQUEST,
            SlotOccupied(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("engine error: {}", e);
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run an engine call off the async workers; the store does blocking I/O.
async fn with_engine<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Engine<RocksStore>) -> trellis_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    let joined = tokio::task::spawn_blocking(move || f(&state.engine)).await;
    match joined {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            tracing::error!("engine task failed: {}", e);
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "engine task failed".to_string(),
            })
        }
    }
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- User endpoints ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    username: String,
    plan: String,
    referral_code: Option<String>,
    /// Referral token: id, username, referral code or id suffix
    referrer: Option<String>,
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    let new = NewUser {
        username: req.username,
        plan: PlanType::from(req.plan),
        referral_code: req.referral_code,
        referrer_token: req.referrer,
    };
    let registration = with_engine(&state, move |engine| engine.register_user(new)).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<User>> {
    with_engine(&state, move |engine| engine.user(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("user {id}")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    referrer_id: Option<UserId>,
}

async fn assign_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    body: Option<Json<AssignRequest>>,
) -> ApiResult<Json<Position>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let position = with_engine(&state, move |engine| engine.assign(id, req.referrer_id)).await?;
    Ok(Json(position))
}

async fn get_user_triangle(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<TriangleInfo>> {
    with_engine(&state, move |engine| engine.user_triangle_info(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no triangle for user {id}")))
}

async fn list_user_transactions(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let txs = with_engine(&state, move |engine| engine.transactions_for(id)).await?;
    Ok(Json(txs))
}

async fn resolve_referrer(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<User>> {
    let lookup = token.clone();
    with_engine(&state, move |engine| engine.resolve_referrer(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("referrer {token:?}")))
}

// --- Triangle endpoints ---

#[derive(Debug, Default, Deserialize)]
struct TriangleParams {
    plan: Option<String>,
    complete: Option<bool>,
    #[serde(default)]
    newest: bool,
    limit: Option<usize>,
}

impl From<TriangleParams> for TriangleQuery {
    fn from(params: TriangleParams) -> Self {
        let mut query = TriangleQuery::new();
        if let Some(plan) = params.plan {
            query = query.plan(plan);
        }
        if let Some(complete) = params.complete {
            query = query.complete(complete);
        }
        if params.newest {
            query = query.newest_first();
        }
        if let Some(limit) = params.limit {
            query = query.limit(limit);
        }
        query
    }
}

async fn list_triangles(
    State(state): State<AppState>,
    Query(params): Query<TriangleParams>,
) -> ApiResult<Json<Vec<Triangle>>> {
    let query = TriangleQuery::from(params);
    let triangles = with_engine(&state, move |engine| engine.triangles(&query)).await?;
    Ok(Json(triangles))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTriangleRequest {
    plan_type: String,
}

async fn create_triangle(
    State(state): State<AppState>,
    Json(req): Json<CreateTriangleRequest>,
) -> ApiResult<(StatusCode, Json<Triangle>)> {
    let plan = PlanType::from(req.plan_type);
    let triangle = with_engine(&state, move |engine| engine.create_triangle(&plan)).await?;
    Ok((StatusCode::CREATED, Json(triangle)))
}

async fn get_triangle(
    State(state): State<AppState>,
    Path(id): Path<TriangleId>,
) -> ApiResult<Json<TriangleView>> {
    with_engine(&state, move |engine| engine.triangle(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("triangle {id}")))
}

// --- Plan endpoints ---

async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<Plan>>> {
    let plans = with_engine(&state, |engine| engine.plans()).await?;
    Ok(Json(plans))
}

#[derive(Debug, Deserialize)]
struct PutPlanRequest {
    payout: Decimal,
}

async fn put_plan(
    State(state): State<AppState>,
    Path(plan): Path<String>,
    Json(req): Json<PutPlanRequest>,
) -> ApiResult<Json<Plan>> {
    let plan = PlanType::from(plan);
    let stored = with_engine(&state, move |engine| engine.put_plan(&plan, req.payout)).await?;
    Ok(Json(stored))
}

async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<Stats>> {
    let stats = with_engine(&state, |engine| engine.stats()).await?;
    Ok(Json(stats))
}
