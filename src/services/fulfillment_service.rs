use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        credit,
        lifecycle::{OrderAction, next_status},
    },
    dto::orders::{AssignAgentRequest, OrderWithItems},
    entity::{
        credit_accounts::{
            ActiveModel as CreditActive, Column as CreditCol, Entity as CreditAccounts,
            Model as CreditModel,
        },
        enums::{CreditStatus, OrderStatus, PaymentMethod, Role},
        orders::{ActiveModel as OrderActive, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_wholesaler},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    services::order_access::{lock_order, order_items, owned_store, user_by_email},
    state::AppState,
};

/// Lock the order, check the caller owns its store, and resolve the target
/// status for `action` against the persisted status.
async fn begin_transition(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    order_id: Uuid,
    action: OrderAction,
) -> AppResult<(OrderModel, OrderStatus)> {
    let order = lock_order(txn, order_id).await?;
    owned_store(txn, user, order.store_id).await?;
    let next = next_status(order.status, action)?;
    Ok((order, next))
}

fn log_transition(order: &OrderModel, from: OrderStatus) {
    tracing::info!(
        order_id = %order.id,
        from = %from,
        to = %order.status,
        "order status changed"
    );
}

/// The credit line backing a CREDIT order, locked for update.
async fn lock_order_credit(
    txn: &DatabaseTransaction,
    wholesaler_id: Uuid,
    order: &OrderModel,
) -> AppResult<Option<CreditModel>> {
    let Some(retailer) = user_by_email(txn, &order.retailer_email).await? else {
        return Err(AppError::not_found("Retailer"));
    };
    let account = CreditAccounts::find()
        .filter(
            Condition::all()
                .add(CreditCol::WholesalerId.eq(wholesaler_id))
                .add(CreditCol::RetailerId.eq(retailer.id)),
        )
        .lock(LockType::Update)
        .one(txn)
        .await?;
    Ok(account)
}

pub async fn accept_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_wholesaler(user)?;
    let txn = state.orm.begin().await?;
    let (order, next) = begin_transition(&txn, user, order_id, OrderAction::Accept).await?;

    // Credit was reserved at placement; acceptance only confirms the line is
    // still approved.
    if order.payment_method == PaymentMethod::Credit {
        let account = lock_order_credit(&txn, user.user_id, &order).await?;
        match account {
            Some(account) if account.credit_status == CreditStatus::Approved => {}
            _ => return Err(AppError::CreditNotApproved),
        }
    }

    let from = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let items = order_items(&txn, order.id).await?;
    txn.commit().await?;

    log_transition(&order, from);
    audit::record(
        &state.pool,
        user.user_id,
        "order_accept",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order accepted successfully",
        OrderWithItems {
            order: order.into(),
            items: items.into_iter().map(OrderItem::from).collect(),
        },
        Some(Meta::empty()),
    ))
}

/// Reject a pending order and hand back everything placement reserved.
pub async fn reject_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_wholesaler(user)?;
    let txn = state.orm.begin().await?;
    let (order, next) = begin_transition(&txn, user, order_id, OrderAction::Reject).await?;

    // order_items is sorted by product id, matching the placement lock order.
    for item in order_items(&txn, order.id).await? {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&txn)
            .await?;
    }

    if order.payment_method == PaymentMethod::Credit
        && order.credit_status == CreditStatus::Approved
        && let Some(account) = lock_order_credit(&txn, user.user_id, &order).await?
    {
        let credit_used = credit::release(account.credit_used, order.total_amount);
        let mut active: CreditActive = account.into();
        active.credit_used = Set(credit_used);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
    }

    let from = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    log_transition(&order, from);
    audit::record(
        &state.pool,
        user.user_id,
        "order_reject",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order rejected successfully",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn assign_agent(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AssignAgentRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_wholesaler(user)?;
    let agent_email = payload.agent_email.trim().to_lowercase();
    if agent_email.is_empty() {
        return Err(AppError::InvalidRequest("agentEmail is required".into()));
    }

    let txn = state.orm.begin().await?;
    let (order, next) =
        begin_transition(&txn, user, order_id, OrderAction::AssignAgent).await?;

    match user_by_email(&txn, &agent_email).await? {
        Some(agent) if agent.role == Role::Agent => {}
        _ => return Err(AppError::InvalidAgent),
    }

    let from = order.status;
    let mut active: OrderActive = order.into();
    active.agent_email = Set(Some(agent_email.clone()));
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    log_transition(&order, from);
    audit::record(
        &state.pool,
        user.user_id,
        "order_assign_agent",
        "orders",
        serde_json::json!({ "order_id": order.id, "agent_email": agent_email }),
    )
    .await;

    Ok(ApiResponse::success(
        "Agent assigned successfully",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn dispatch_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_wholesaler(user)?;
    let txn = state.orm.begin().await?;
    let (order, next) = begin_transition(&txn, user, order_id, OrderAction::Dispatch).await?;

    let from = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    log_transition(&order, from);
    audit::record(
        &state.pool,
        user.user_id,
        "order_dispatch",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order dispatched successfully",
        order.into(),
        Some(Meta::empty()),
    ))
}
