use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{dashboard::AgentSummary, orders::OrderList},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::agent_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/active", get(active_orders))
        .route("/orders/history", get(delivery_history))
        .route("/orders/summary", get(summary))
}

#[utoipa::path(
    get,
    path = "/api/agent/orders/active",
    responses(
        (status = 200, description = "Assigned and dispatched orders", body = ApiResponse<OrderList>),
        (status = 403, description = "Agent access only")
    ),
    security(("bearer_auth" = [])),
    tag = "Agent"
)]
pub async fn active_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = agent_service::active_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/agent/orders/history",
    responses(
        (status = 200, description = "Delivered orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Agent"
)]
pub async fn delivery_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = agent_service::delivery_history(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/agent/orders/summary",
    responses(
        (status = 200, description = "Delivery counts and earnings", body = ApiResponse<AgentSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Agent"
)]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AgentSummary>>> {
    let resp = agent_service::summary(&state, &user).await?;
    Ok(Json(resp))
}
