use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{AssignAgentRequest, Invoice, OrderList, OrderWithItems, PlaceOrderRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{agent_service, fulfillment_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_order))
        .route("/{id}/accept", post(accept_order))
        .route("/{id}/reject", post(reject_order))
        .route("/{id}/assign-agent", post(assign_agent))
        .route("/{id}/dispatch", post(dispatch_order))
        .route("/{id}/deliver", post(deliver_order))
}

pub fn retailer_router() -> Router<AppState> {
    Router::new().route("/orders", get(list_my_orders))
}

pub fn invoice_router() -> Router<AppState> {
    Router::new().route("/{order_id}", get(get_invoice))
}

#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/orders",
    params(("store_id" = Uuid, Path, description = "Store to order from")),
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid order, insufficient stock or credit"),
        (status = 403, description = "Retailer access only"),
        (status = 404, description = "Store or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::place_order(&state, &user, store_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/retailer/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_order" = Option<String>, Query, description = "asc or desc by creation time")
    ),
    responses(
        (status = 200, description = "The caller's orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_my_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its lines", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/accept",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order accepted", body = ApiResponse<OrderWithItems>),
        (status = 409, description = "Order is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Fulfillment"
)]
pub async fn accept_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = fulfillment_service::accept_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/reject",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order rejected", body = ApiResponse<Order>),
        (status = 409, description = "Order is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Fulfillment"
)]
pub async fn reject_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = fulfillment_service::reject_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/assign-agent",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AssignAgentRequest,
    responses(
        (status = 200, description = "Agent assigned", body = ApiResponse<Order>),
        (status = 400, description = "Invalid agent"),
        (status = 409, description = "Order is not accepted")
    ),
    security(("bearer_auth" = [])),
    tag = "Fulfillment"
)]
pub async fn assign_agent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignAgentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = fulfillment_service::assign_agent(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/dispatch",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order dispatched", body = ApiResponse<Order>),
        (status = 409, description = "Order is not assigned")
    ),
    security(("bearer_auth" = [])),
    tag = "Fulfillment"
)]
pub async fn dispatch_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = fulfillment_service::dispatch_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/deliver",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", body = ApiResponse<Order>),
        (status = 403, description = "Not the assigned agent"),
        (status = 409, description = "Order is not dispatched")
    ),
    security(("bearer_auth" = [])),
    tag = "Fulfillment"
)]
pub async fn deliver_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = agent_service::deliver_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Invoice for an order", body = ApiResponse<Invoice>),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Invoice>>> {
    let resp = order_service::invoice(&state, &user, order_id).await?;
    Ok(Json(resp))
}
