//! Row loading shared by the order workflows.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    entity::{
        enums::Role,
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{Entity as Orders, Model as OrderModel},
        stores::{Column as StoreCol, Entity as Stores, Model as StoreModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

/// Load an order holding its row lock until the surrounding transaction ends.
pub async fn lock_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

pub async fn find_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

pub async fn order_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<OrderItemModel>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(conn)
        .await?;
    Ok(items)
}

pub async fn find_store<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<StoreModel> {
    Stores::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Store"))
}

/// The store owned by the calling wholesaler.
pub async fn store_of<C: ConnectionTrait>(conn: &C, owner: &AuthUser) -> AppResult<StoreModel> {
    Stores::find()
        .filter(StoreCol::OwnerEmail.eq(owner.email.as_str()))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found. Please create a store first.".into()))
}

/// Load the order's store and check the caller owns it.
pub async fn owned_store<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    store_id: Uuid,
) -> AppResult<StoreModel> {
    let store = find_store(conn, store_id).await?;
    if store.owner_email != user.email {
        return Err(AppError::Forbidden("Access denied".into()));
    }
    Ok(store)
}

pub async fn user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> AppResult<Option<UserModel>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(conn)
        .await?;
    Ok(user)
}

/// Who may read an order: the retailer who placed it, the owner of its
/// store, and the agent it is assigned to.
pub async fn ensure_can_read<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    order: &OrderModel,
) -> AppResult<()> {
    let allowed = match user.role {
        Role::Retailer => order.retailer_email == user.email,
        Role::Agent => order.agent_email.as_deref() == Some(user.email.as_str()),
        Role::Wholesaler => find_store(conn, order.store_id).await?.owner_email == user.email,
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".into()))
    }
}
