use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{
        dashboard::{AgentList, StatusCounts, WholesalerAnalytics},
        orders::OrderList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::wholesaler_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/summary", get(order_summary))
        .route("/orders/recent", get(recent_orders))
        .route("/analytics", get(analytics))
        .route("/agents", get(list_agents))
}

#[utoipa::path(
    get,
    path = "/api/wholesaler/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_order" = Option<String>, Query, description = "asc or desc by creation time")
    ),
    responses(
        (status = 200, description = "Orders placed with the caller's store", body = ApiResponse<OrderList>),
        (status = 403, description = "Wholesaler access only")
    ),
    security(("bearer_auth" = [])),
    tag = "Wholesaler"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = wholesaler_service::list_store_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wholesaler/orders/summary",
    responses(
        (status = 200, description = "Order counts per status", body = ApiResponse<StatusCounts>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wholesaler"
)]
pub async fn order_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StatusCounts>>> {
    let resp = wholesaler_service::order_summary(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wholesaler/orders/recent",
    responses(
        (status = 200, description = "Five most recent orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wholesaler"
)]
pub async fn recent_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = wholesaler_service::recent_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wholesaler/analytics",
    responses(
        (status = 200, description = "Revenue and monthly sales", body = ApiResponse<WholesalerAnalytics>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wholesaler"
)]
pub async fn analytics(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WholesalerAnalytics>>> {
    let resp = wholesaler_service::analytics(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wholesaler/agents",
    responses(
        (status = 200, description = "Registered delivery agents", body = ApiResponse<AgentList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wholesaler"
)]
pub async fn list_agents(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AgentList>>> {
    let resp = wholesaler_service::list_agents(&state, &user).await?;
    Ok(Json(resp))
}
