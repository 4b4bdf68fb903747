use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::credit::{
        ApproveCreditRequest, CreditLineList, CreditRequestList, MyCredit, RequestCreditQuery,
        SelfSettleRequest, SettleCreditRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{CreditAccount, User},
    response::ApiResponse,
    services::credit_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(request_credit))
        .route("/requests", get(list_requests))
        .route("/accounts", get(list_accounts))
        .route("/me", get(my_credit))
        .route("/self/settle", put(settle_self))
        .route("/retailers/{retailer_id}/approve", put(approve_credit))
        .route("/retailers/{retailer_id}/reject", put(reject_credit))
        .route("/retailers/{retailer_id}/settle", put(settle_account))
}

#[utoipa::path(
    post,
    path = "/api/credit/request",
    params(
        ("store_id" = Option<Uuid>, Query, description = "Store whose wholesaler is asked; omit to ask every wholesaler")
    ),
    responses(
        (status = 200, description = "Credit requested", body = ApiResponse<User>),
        (status = 409, description = "Credit already approved")
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn request_credit(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RequestCreditQuery>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = credit_service::request_credit(&state, &user, query.store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/credit/requests",
    responses(
        (status = 200, description = "Retailers waiting for a credit decision", body = ApiResponse<CreditRequestList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CreditRequestList>>> {
    let resp = credit_service::list_requests(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/credit/accounts",
    responses(
        (status = 200, description = "Credit accounts of the caller's retailers", body = ApiResponse<CreditLineList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CreditLineList>>> {
    let resp = credit_service::list_accounts(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/credit/me",
    responses(
        (status = 200, description = "The caller's credit lines", body = ApiResponse<MyCredit>)
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn my_credit(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MyCredit>>> {
    let resp = credit_service::my_credit(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/credit/retailers/{retailer_id}/approve",
    params(("retailer_id" = Uuid, Path, description = "Retailer user id")),
    request_body = ApproveCreditRequest,
    responses(
        (status = 200, description = "Credit approved", body = ApiResponse<CreditAccount>),
        (status = 400, description = "Invalid credit limit")
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn approve_credit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(retailer_id): Path<Uuid>,
    Json(payload): Json<ApproveCreditRequest>,
) -> AppResult<Json<ApiResponse<CreditAccount>>> {
    let resp = credit_service::approve_credit(&state, &user, retailer_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/credit/retailers/{retailer_id}/reject",
    params(("retailer_id" = Uuid, Path, description = "Retailer user id")),
    responses(
        (status = 200, description = "Credit rejected", body = ApiResponse<CreditAccount>)
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn reject_credit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(retailer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CreditAccount>>> {
    let resp = credit_service::reject_credit(&state, &user, retailer_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/credit/retailers/{retailer_id}/settle",
    params(("retailer_id" = Uuid, Path, description = "Retailer user id")),
    request_body = SettleCreditRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<CreditAccount>),
        (status = 400, description = "Invalid amount or exceeds used credit")
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn settle_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(retailer_id): Path<Uuid>,
    Json(payload): Json<SettleCreditRequest>,
) -> AppResult<Json<ApiResponse<CreditAccount>>> {
    let resp = credit_service::settle_account(&state, &user, retailer_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/credit/self/settle",
    request_body = SelfSettleRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<CreditAccount>),
        (status = 400, description = "Invalid amount or exceeds used credit")
    ),
    security(("bearer_auth" = [])),
    tag = "Credit"
)]
pub async fn settle_self(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SelfSettleRequest>,
) -> AppResult<Json<ApiResponse<CreditAccount>>> {
    let resp = credit_service::settle_self(&state, &user, payload).await?;
    Ok(Json(resp))
}
