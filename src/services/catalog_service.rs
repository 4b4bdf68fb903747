use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        catalog::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, ProductList,
            UpdateProductRequest,
        },
        stores::{CreateStoreRequest, StoreList},
    },
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
        },
        products::{self, ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        stores::{ActiveModel as StoreActive, Column as StoreCol, Entity as Stores},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_wholesaler},
    models::{Category, Product, Store},
    response::{ApiResponse, Meta},
    services::order_access::{owned_store, store_of},
    state::AppState,
};

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn check_product_numbers(price: Decimal, stock: i32, moq: i32) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::InvalidRequest("price must be greater than 0".into()));
    }
    if stock < 0 {
        return Err(AppError::InvalidRequest("stock cannot be negative".into()));
    }
    if moq < 1 {
        return Err(AppError::InvalidRequest("moq must be at least 1".into()));
    }
    Ok(())
}

pub async fn create_store(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    ensure_wholesaler(user)?;
    let name = required(&payload.name, "name")?;
    let address = required(&payload.address, "address")?;

    let existing = Stores::find()
        .filter(StoreCol::OwnerEmail.eq(user.email.as_str()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Store already exists".into()));
    }

    let store = StoreActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        address: Set(address),
        owner_email: Set(user.email.clone()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "store_create",
        "stores",
        serde_json::json!({ "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Store created successfully",
        store.into(),
        Some(Meta::empty()),
    ))
}

pub async fn my_store(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Store>> {
    ensure_wholesaler(user)?;
    let store = store_of(&state.orm, user).await?;
    Ok(ApiResponse::success("Store", store.into(), None))
}

pub async fn list_stores(state: &AppState) -> AppResult<ApiResponse<StoreList>> {
    let items = Stores::find()
        .order_by_asc(StoreCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Store::from)
        .collect();
    Ok(ApiResponse::success("Stores", StoreList { items }, Some(Meta::empty())))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_wholesaler(user)?;
    let name = required(&payload.name, "name")?;
    let store = owned_store(&state.orm, user, store_id).await?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        store_id: Set(store.id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id, "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category added successfully",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(
    state: &AppState,
    store_id: Uuid,
) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .filter(CategoryCol::StoreId.eq(store_id))
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(Meta::empty())))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    category_id: Uuid,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_wholesaler(user)?;
    let name = required(&payload.name, "name")?;
    let unit = required(&payload.unit, "unit")?;
    let moq = payload.moq.unwrap_or(1);
    check_product_numbers(payload.price, payload.stock, moq)?;

    let category = Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    owned_store(&state.orm, user, category.store_id).await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        price: Set(payload.price),
        unit: Set(unit),
        stock: Set(payload.stock),
        moq: Set(moq),
        category_id: Set(category.id),
        active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product added successfully",
        product.into(),
        Some(Meta::empty()),
    ))
}

/// Price changes apply to future orders only; placed orders keep the price
/// copied onto their items.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_wholesaler(user)?;

    let txn = state.orm.begin().await?;
    let existing = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    let category = Categories::find_by_id(existing.category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    owned_store(&txn, user, category.store_id).await?;

    check_product_numbers(
        payload.price.unwrap_or(existing.price),
        payload.stock.unwrap_or(existing.stock),
        payload.moq.unwrap_or(existing.moq),
    )?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(required(&name, "name")?);
    }
    if let Some(unit) = payload.unit {
        active.unit = Set(required(&unit, "unit")?);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(moq) = payload.moq {
        active.moq = Set(moq);
    }
    if let Some(flag) = payload.active {
        active.active = Set(flag);
    }
    let product = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product.into(),
        Some(Meta::empty()),
    ))
}

/// Every product in the calling wholesaler's store, active or not.
pub async fn list_my_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_wholesaler(user)?;
    let store = store_of(&state.orm, user).await?;
    let items = Products::find()
        .join(JoinType::InnerJoin, products::Relation::Categories.def())
        .filter(CategoryCol::StoreId.eq(store.id))
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ApiResponse::success("Products", ProductList { items }, Some(Meta::empty())))
}

/// Active products of one category, for retailers browsing a store.
pub async fn list_category_products(
    state: &AppState,
    category_id: Uuid,
) -> AppResult<ApiResponse<ProductList>> {
    let items = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::CategoryId.eq(category_id))
                .add(ProdCol::Active.eq(true)),
        )
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ApiResponse::success("Products", ProductList { items }, Some(Meta::empty())))
}
