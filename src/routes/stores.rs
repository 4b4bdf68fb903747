use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, ProductList,
            UpdateProductRequest,
        },
        stores::{CreateStoreRequest, StoreList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Category, Product, Store},
    response::ApiResponse,
    routes::orders,
    services::catalog_service,
    state::AppState,
};

pub fn stores_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_store).get(list_stores))
        .route("/my", get(my_store))
        .route(
            "/{store_id}/categories",
            post(create_category).get(list_categories),
        )
        .route("/{store_id}/orders", post(orders::place_order))
}

pub fn categories_router() -> Router<AppState> {
    Router::new().route(
        "/{category_id}/products",
        post(create_product).get(list_category_products),
    )
}

pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_products))
        .route("/{id}", patch(update_product))
}

#[utoipa::path(
    post,
    path = "/api/stores",
    request_body = CreateStoreRequest,
    responses(
        (status = 200, description = "Store created", body = ApiResponse<Store>),
        (status = 403, description = "Wholesaler access only"),
        (status = 409, description = "Store already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn create_store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStoreRequest>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = catalog_service::create_store(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores",
    responses(
        (status = 200, description = "List stores", body = ApiResponse<StoreList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<StoreList>>> {
    let resp = catalog_service::list_stores(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/my",
    responses(
        (status = 200, description = "The caller's store", body = ApiResponse<Store>),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn my_store(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = catalog_service::my_store(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/categories",
    params(("store_id" = Uuid, Path, description = "Store id")),
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<Category>),
        (status = 403, description = "Access denied")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = catalog_service::create_category(&state, &user, store_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/categories",
    params(("store_id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 200, description = "Categories of a store", body = ApiResponse<CategoryList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = catalog_service::list_categories(&state, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories/{category_id}/products",
    params(("category_id" = Uuid, Path, description = "Category id")),
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Access denied")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = catalog_service::create_product(&state, &user, category_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{category_id}/products",
    params(("category_id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Active products of a category", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn list_category_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::list_category_products(&state, category_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Every product in the caller's store", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn list_my_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::list_my_products(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = catalog_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
