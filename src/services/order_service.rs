use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{credit, pricing},
    dto::orders::{
        Invoice, InvoiceLine, OrderLineRequest, OrderList, OrderWithItems, PlaceOrderRequest,
    },
    entity::{
        credit_accounts::{
            ActiveModel as CreditActive, Column as CreditCol, Entity as CreditAccounts,
        },
        enums::{CreditStatus, OrderStatus, PaymentMethod, PaymentStatus, Role},
        order_items::ActiveModel as OrderItemActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        categories::{Column as CategoryCol, Entity as Categories},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_retailer},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::order_access::{
        ensure_can_read, find_order, find_store, order_items, user_by_email,
    },
    state::AppState,
};

/// A requested line after its product has been resolved and priced.
#[derive(Debug, Clone)]
struct PricedLine {
    product_id: Uuid,
    price: Decimal,
    quantity: i32,
    subtotal: Decimal,
}

pub fn parse_payment_method(raw: Option<&str>) -> AppResult<PaymentMethod> {
    match raw {
        None => Ok(PaymentMethod::default()),
        Some(raw) => raw
            .parse::<PaymentMethod>()
            .map_err(|_| AppError::InvalidRequest("Invalid payment method".into())),
    }
}

/// Reject empty carts, non-positive quantities and repeated products.
pub fn validate_lines(lines: &[OrderLineRequest]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::InvalidRequest("Order items required".into()));
    }
    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::InvalidRequest(format!(
                "Quantity for product {} must be greater than 0",
                line.product_id
            )));
        }
        if !seen.insert(line.product_id) {
            return Err(AppError::InvalidRequest(format!(
                "Product {} appears more than once",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// Place a retailer order against one store. Stock and credit are reserved
/// here, in the same transaction that writes the order, and nowhere else.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_retailer(user)?;
    let method = parse_payment_method(payload.payment_method.as_deref())?;
    validate_lines(&payload.items)?;

    let store = find_store(&state.orm, store_id).await?;

    let txn = state.orm.begin().await?;

    // Lock in id order so concurrent placements queue instead of deadlocking.
    let mut product_ids: Vec<Uuid> = payload.items.iter().map(|l| l.product_id).collect();
    product_ids.sort();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let store_categories: HashSet<Uuid> = Categories::find()
        .filter(CategoryCol::StoreId.eq(store.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    let mut lines = Vec::with_capacity(payload.items.len());
    for requested in &payload.items {
        let product = products
            .get(&requested.product_id)
            .filter(|p| p.active)
            .ok_or_else(|| {
                AppError::NotFound(format!("Product {} not found", requested.product_id))
            })?;
        if !store_categories.contains(&product.category_id) {
            return Err(AppError::InvalidRequest(format!(
                "{} is not sold by this store",
                product.name
            )));
        }
        if requested.quantity < product.moq {
            return Err(AppError::InvalidRequest(format!(
                "Minimum order quantity for {} is {}",
                product.name, product.moq
            )));
        }
        if requested.quantity > product.stock {
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
            });
        }
        lines.push(PricedLine {
            product_id: product.id,
            price: product.price,
            quantity: requested.quantity,
            subtotal: pricing::line_subtotal(product.price, requested.quantity),
        });
    }
    let total_amount = pricing::order_total(lines.iter().map(|l| (l.price, l.quantity)));

    let mut payment_status = PaymentStatus::Unpaid;
    let mut credit_status = CreditStatus::None;

    match method {
        PaymentMethod::Credit => {
            let wholesaler = user_by_email(&txn, &store.owner_email)
                .await?
                .ok_or_else(|| AppError::not_found("Store wholesaler"))?;

            let account = CreditAccounts::find()
                .filter(
                    Condition::all()
                        .add(CreditCol::WholesalerId.eq(wholesaler.id))
                        .add(CreditCol::RetailerId.eq(user.user_id)),
                )
                .lock(LockType::Update)
                .one(&txn)
                .await?;

            let Some(account) = account else {
                // Nothing of the order may survive, but the request flag must.
                txn.rollback().await?;
                flag_credit_request(&state.orm, user.user_id).await?;
                tracing::info!(
                    retailer = %user.email,
                    store_id = %store.id,
                    "credit order without account, request flagged"
                );
                return Err(AppError::CreditAccountMissing);
            };

            let credit_used = credit::reserve(
                account.credit_status,
                account.credit_limit,
                account.credit_used,
                total_amount,
            )?;
            let mut active: CreditActive = account.into();
            active.credit_used = Set(credit_used);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?;

            credit_status = CreditStatus::Approved;
        }
        PaymentMethod::Online => {
            // Capture happens outside this service; the order is treated as paid.
            payment_status = PaymentStatus::Paid;
        }
        PaymentMethod::Cod => {}
    }

    for line in &lines {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(&txn)
            .await?;
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store.id),
        retailer_email: Set(user.email.clone()),
        agent_email: Set(None),
        total_amount: Set(total_amount),
        payment_method: Set(method),
        payment_status: Set(payment_status),
        credit_status: Set(credit_status),
        status: Set(OrderStatus::Pending),
        agent_earnings: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            price: Set(line.price),
            quantity: Set(line.quantity),
            subtotal: Set(line.subtotal),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item.into());
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        store_id = %order.store_id,
        method = ?order.payment_method,
        total = %order.total_amount,
        "order placed"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "order_place",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "store_id": order.store_id,
            "total_amount": order.total_amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

async fn flag_credit_request(conn: &DatabaseConnection, retailer_id: Uuid) -> AppResult<()> {
    let retailer = Users::find_by_id(retailer_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Retailer"))?;
    let mut active: UserActive = retailer.into();
    active.credit_status = Set(CreditStatus::Requested);
    active.update(conn).await?;
    Ok(())
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_retailer(user)?;
    let (page, limit, offset) = query.pagination();
    let mut condition = Condition::all().add(OrderCol::RetailerEmail.eq(user.email.as_str()));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders: Vec<Order> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_order(&state.orm, id).await?;
    ensure_can_read(&state.orm, user, &order).await?;

    let items = order_items(&state.orm, order.id)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Data for an invoice document; rendering is left to the caller.
pub async fn invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Invoice>> {
    if user.role == Role::Agent {
        return Err(AppError::Forbidden("Access denied".into()));
    }
    let order = find_order(&state.orm, id).await?;
    ensure_can_read(&state.orm, user, &order).await?;
    let store = find_store(&state.orm, order.store_id).await?;

    let items = order_items(&state.orm, order.id).await?;
    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let names: HashMap<Uuid, String> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let lines = items
        .into_iter()
        .map(|item| InvoiceLine {
            product_name: names
                .get(&item.product_id)
                .cloned()
                .unwrap_or_else(|| item.product_id.to_string()),
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal,
        })
        .collect();

    Ok(ApiResponse::success(
        "Invoice",
        Invoice {
            total_amount: order.total_amount,
            order: order.into(),
            store: store.into(),
            lines,
        },
        Some(Meta::empty()),
    ))
}
