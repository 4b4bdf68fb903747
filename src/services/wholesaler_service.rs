use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    dto::{
        dashboard::{AgentContact, AgentList, StatusCounts, WholesalerAnalytics},
        orders::OrderList,
    },
    entity::{
        enums::{OrderStatus, Role},
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::{Column as UserCol, Entity as Users},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_wholesaler},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::order_access::store_of,
    state::AppState,
};

const RECENT_ORDERS: u64 = 5;

pub async fn list_store_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_wholesaler(user)?;
    let store = store_of(&state.orm, user).await?;
    let (page, limit, offset) = query.pagination();

    let mut condition = Condition::all().add(OrderCol::StoreId.eq(store.id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn order_summary(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<StatusCounts>> {
    ensure_wholesaler(user)?;
    let store = store_of(&state.orm, user).await?;

    let rows: Vec<(OrderStatus, i64)> = Orders::find()
        .select_only()
        .column(OrderCol::Status)
        .column_as(Expr::col(OrderCol::Id).count(), "count")
        .filter(OrderCol::StoreId.eq(store.id))
        .group_by(OrderCol::Status)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let mut counts = StatusCounts::default();
    for (status, count) in rows {
        counts.add(status, count);
    }
    Ok(ApiResponse::success("Order summary", counts, Some(Meta::empty())))
}

pub async fn recent_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_wholesaler(user)?;
    let store = store_of(&state.orm, user).await?;
    let items = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();
    Ok(ApiResponse::success("Recent orders", OrderList { items }, Some(Meta::empty())))
}

pub async fn analytics(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WholesalerAnalytics>> {
    ensure_wholesaler(user)?;
    let store = store_of(&state.orm, user).await?;
    let orders = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .all(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Analytics",
        build_analytics(&orders),
        Some(Meta::empty()),
    ))
}

/// Revenue counts delivered orders only, bucketed by the month they were placed.
pub fn build_analytics(orders: &[OrderModel]) -> WholesalerAnalytics {
    let mut status_counts = StatusCounts::default();
    let mut total_revenue = Decimal::ZERO;
    let mut monthly_sales: BTreeMap<String, Decimal> = BTreeMap::new();

    for order in orders {
        status_counts.add(order.status, 1);
        if order.status == OrderStatus::Delivered {
            total_revenue += order.total_amount;
            let month = order.created_at.with_timezone(&Utc).format("%Y-%m").to_string();
            *monthly_sales.entry(month).or_insert(Decimal::ZERO) += order.total_amount;
        }
    }

    WholesalerAnalytics {
        total_revenue,
        status_counts,
        monthly_sales,
    }
}

pub async fn list_agents(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AgentList>> {
    ensure_wholesaler(user)?;
    let items = Users::find()
        .filter(UserCol::Role.eq(Role::Agent))
        .order_by_asc(UserCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AgentContact::from)
        .collect();
    Ok(ApiResponse::success("Agents", AgentList { items }, Some(Meta::empty())))
}
