use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        earnings::agent_earnings,
        lifecycle::{OrderAction, next_status},
    },
    dto::{dashboard::AgentSummary, orders::OrderList},
    entity::{
        enums::{OrderStatus, PaymentMethod, PaymentStatus},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_agent},
    models::Order,
    response::{ApiResponse, Meta},
    services::order_access::lock_order,
    state::AppState,
};

/// Complete a delivery. Earnings are fixed here, once; a second call finds
/// the order already delivered and fails the transition.
pub async fn deliver_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_agent(user)?;
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;

    if order.agent_email.as_deref() != Some(user.email.as_str()) {
        return Err(AppError::Forbidden("Access denied".into()));
    }
    let next = next_status(order.status, OrderAction::Deliver)?;

    let earnings = agent_earnings(order.total_amount);
    let cash_collected = order.payment_method == PaymentMethod::Cod;
    let from = order.status;

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.agent_earnings = Set(Some(earnings));
    if cash_collected {
        active.payment_status = Set(PaymentStatus::Paid);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        from = %from,
        to = %order.status,
        earnings = %earnings,
        "order delivered"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "order_deliver",
        "orders",
        serde_json::json!({ "order_id": order.id, "agent_earnings": earnings }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order delivered successfully",
        order.into(),
        Some(Meta::empty()),
    ))
}

async fn orders_in(
    state: &AppState,
    user: &AuthUser,
    statuses: &[OrderStatus],
) -> AppResult<Vec<Order>> {
    let orders = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::AgentEmail.eq(user.email.as_str()))
                .add(OrderCol::Status.is_in(statuses.iter().copied())),
        )
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();
    Ok(orders)
}

pub async fn active_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    ensure_agent(user)?;
    let items = orders_in(state, user, &[OrderStatus::Assigned, OrderStatus::Dispatched]).await?;
    Ok(ApiResponse::success("Active orders", OrderList { items }, Some(Meta::empty())))
}

pub async fn delivery_history(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_agent(user)?;
    let items = orders_in(state, user, &[OrderStatus::Delivered]).await?;
    Ok(ApiResponse::success("Delivery history", OrderList { items }, Some(Meta::empty())))
}

pub async fn summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AgentSummary>> {
    ensure_agent(user)?;

    let active = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::AgentEmail.eq(user.email.as_str()))
                .add(OrderCol::Status.is_in([OrderStatus::Assigned, OrderStatus::Dispatched])),
        )
        .count(&state.orm)
        .await? as i64;

    // Delivered is terminal, so updated_at is the delivery time.
    let delivered: Vec<(DateTime<Utc>, Decimal)> = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::AgentEmail.eq(user.email.as_str()))
                .add(OrderCol::Status.eq(OrderStatus::Delivered)),
        )
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|o| {
            (
                o.updated_at.with_timezone(&Utc),
                o.agent_earnings.unwrap_or(Decimal::ZERO),
            )
        })
        .collect();

    let mut summary = summarize_earnings(&delivered, Utc::now());
    summary.active = active;
    Ok(ApiResponse::success("Agent summary", summary, Some(Meta::empty())))
}

/// Start of the current week (Sunday 00:00 UTC) and month (day 1 00:00 UTC).
pub fn earning_windows(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    let month_start = today.with_day(1).unwrap_or(today);
    (
        week_start.and_time(NaiveTime::MIN).and_utc(),
        month_start.and_time(NaiveTime::MIN).and_utc(),
    )
}

pub fn summarize_earnings(delivered: &[(DateTime<Utc>, Decimal)], now: DateTime<Utc>) -> AgentSummary {
    let (week_start, month_start) = earning_windows(now);
    let mut summary = AgentSummary {
        delivered: delivered.len() as i64,
        ..AgentSummary::default()
    };
    for (delivered_at, earnings) in delivered {
        summary.earnings += *earnings;
        if *delivered_at >= week_start {
            summary.week_earnings += *earnings;
        }
        if *delivered_at >= month_start {
            summary.month_earnings += *earnings;
        }
    }
    summary
}
