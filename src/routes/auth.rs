use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{
        LoginRequest, LoginResponse, RegisterAgentRequest, RegisterResponse,
        RegisterRetailerRequest, RegisterWholesalerRequest, UpdateProfileRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register/wholesaler", post(register_wholesaler))
        .route("/register/retailer", post(register_retailer))
        .route("/register/agent", post(register_agent))
        .route("/login", post(login))
}

pub fn me_router() -> Router<AppState> {
    Router::new().route("/", get(me).put(update_me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register/wholesaler",
    request_body = RegisterWholesalerRequest,
    responses(
        (status = 200, description = "Register wholesaler with its store", body = ApiResponse<RegisterResponse>),
        (status = 409, description = "User already exists")
    ),
    tag = "Auth"
)]
pub async fn register_wholesaler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterWholesalerRequest>,
) -> AppResult<Json<ApiResponse<RegisterResponse>>> {
    let resp = auth_service::register_wholesaler(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/register/retailer",
    request_body = RegisterRetailerRequest,
    responses(
        (status = 200, description = "Register retailer", body = ApiResponse<RegisterResponse>),
        (status = 409, description = "User already exists")
    ),
    tag = "Auth"
)]
pub async fn register_retailer(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRetailerRequest>,
) -> AppResult<Json<ApiResponse<RegisterResponse>>> {
    let resp = auth_service::register_retailer(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/register/agent",
    request_body = RegisterAgentRequest,
    responses(
        (status = 200, description = "Register delivery agent", body = ApiResponse<RegisterResponse>),
        (status = 409, description = "User already exists")
    ),
    tag = "Auth"
)]
pub async fn register_agent(
    State(state): State<AppState>,
    Json(payload): Json<RegisterAgentRequest>,
) -> AppResult<Json<ApiResponse<RegisterResponse>>> {
    let resp = auth_service::register_agent(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user profile", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
