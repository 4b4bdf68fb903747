use std::str::FromStr;

use axum::http::StatusCode;
use b2b_marketplace_api::{
    db::{create_pool, run_migrations},
    dto::{
        catalog::{CreateCategoryRequest, CreateProductRequest, UpdateProductRequest},
        credit::{ApproveCreditRequest, SelfSettleRequest, SettleCreditRequest},
        orders::{AssignAgentRequest, OrderLineRequest, PlaceOrderRequest},
        stores::CreateStoreRequest,
    },
    entity::{
        credit_accounts::{
            ActiveModel as CreditActive, Column as CreditCol, Entity as CreditAccounts,
            Model as CreditAccountModel,
        },
        enums::{CreditStatus, OrderStatus, PaymentStatus, Role},
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
        stores::ActiveModel as StoreActive,
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{
        agent_service, catalog_service, credit_service, fulfillment_service, order_service,
    },
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

// Each test builds its own store and users with unique emails, so tests can
// share one database and run in parallel.
struct Market {
    state: AppState,
    wholesaler: AuthUser,
    retailer: AuthUser,
    agent: AuthUser,
    store_id: Uuid,
    product_id: Uuid,
}

fn dec(raw: &str) -> Decimal {
    Decimal::from_str(raw).expect("decimal literal")
}

async fn test_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };
    let pool = create_pool(&database_url, 5).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool)))
}

async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let email = format!("{}-{}@example.com", role, Uuid::new_v4().simple());
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set("dummy".into()),
        role: Set(role),
        name: Set(format!("Test {role}")),
        phone: Set(Some("9000000000".into())),
        address: Set(Some("1 Test Lane".into())),
        business_name: Set(None),
        credit_status: Set(CreditStatus::None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}

/// Wholesaler with a store holding one product (price 100.00, given stock, MOQ 1).
async fn setup_market(stock: i32) -> anyhow::Result<Option<Market>> {
    let Some(state) = test_state().await? else {
        return Ok(None);
    };
    let wholesaler = create_user(&state, Role::Wholesaler).await?;
    let retailer = create_user(&state, Role::Retailer).await?;
    let agent = create_user(&state, Role::Agent).await?;

    let store = catalog_service::create_store(
        &state,
        &wholesaler,
        CreateStoreRequest {
            name: "Test Wholesale".into(),
            address: "2 Depot Road".into(),
        },
    )
    .await?
    .data
    .expect("store");
    let category = catalog_service::create_category(
        &state,
        &wholesaler,
        store.id,
        CreateCategoryRequest {
            name: "Staples".into(),
        },
    )
    .await?
    .data
    .expect("category");
    let product = catalog_service::create_product(
        &state,
        &wholesaler,
        category.id,
        CreateProductRequest {
            name: "Rice 25kg".into(),
            price: dec("100.00"),
            unit: "bag".into(),
            stock,
            moq: None,
        },
    )
    .await?
    .data
    .expect("product");

    Ok(Some(Market {
        state,
        wholesaler,
        retailer,
        agent,
        store_id: store.id,
        product_id: product.id,
    }))
}

/// A second wholesaler with an empty store, competing for the same retailer.
async fn other_wholesaler(state: &AppState) -> anyhow::Result<(AuthUser, Uuid)> {
    let wholesaler = create_user(state, Role::Wholesaler).await?;
    let store = catalog_service::create_store(
        state,
        &wholesaler,
        CreateStoreRequest {
            name: "Other Wholesale".into(),
            address: "9 Market Street".into(),
        },
    )
    .await?
    .data
    .expect("store");
    Ok((wholesaler, store.id))
}

fn order_of(product_id: Uuid, quantity: i32, method: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        items: vec![OrderLineRequest {
            product_id,
            quantity,
        }],
        payment_method: Some(method.into()),
    }
}

async fn stock_of(m: &Market) -> anyhow::Result<i32> {
    let product = Products::find_by_id(m.product_id)
        .one(&m.state.orm)
        .await?
        .expect("product row");
    Ok(product.stock)
}

async fn approve(m: &Market, limit: &str) -> anyhow::Result<()> {
    credit_service::approve_credit(
        &m.state,
        &m.wholesaler,
        m.retailer.user_id,
        ApproveCreditRequest {
            credit_limit: dec(limit),
        },
    )
    .await?;
    Ok(())
}

async fn credit_used(m: &Market) -> anyhow::Result<Decimal> {
    let account = CreditAccounts::find()
        .filter(
            Condition::all()
                .add(CreditCol::WholesalerId.eq(m.wholesaler.user_id))
                .add(CreditCol::RetailerId.eq(m.retailer.user_id)),
        )
        .one(&m.state.orm)
        .await?
        .expect("credit account");
    Ok(account.credit_used)
}

async fn account_of(m: &Market) -> anyhow::Result<Option<CreditAccountModel>> {
    Ok(CreditAccounts::find()
        .filter(
            Condition::all()
                .add(CreditCol::WholesalerId.eq(m.wholesaler.user_id))
                .add(CreditCol::RetailerId.eq(m.retailer.user_id)),
        )
        .one(&m.state.orm)
        .await?)
}

async fn orders_placed_by(m: &Market) -> anyhow::Result<u64> {
    Ok(Orders::find()
        .filter(OrderCol::RetailerEmail.eq(m.retailer.email.as_str()))
        .count(&m.state.orm)
        .await?)
}

#[tokio::test]
async fn cod_order_runs_full_lifecycle() -> anyhow::Result<()> {
    let Some(m) = setup_market(20).await? else {
        return Ok(());
    };

    let placed = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 5, "COD"),
    )
    .await?
    .data
    .expect("placed order");
    let order_id = placed.order.id;
    assert_eq!(placed.order.total_amount, dec("500.00"));
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(stock_of(&m).await?, 15);

    fulfillment_service::accept_order(&m.state, &m.wholesaler, order_id).await?;
    fulfillment_service::assign_agent(
        &m.state,
        &m.wholesaler,
        order_id,
        AssignAgentRequest {
            agent_email: m.agent.email.clone(),
        },
    )
    .await?;

    let active = agent_service::active_orders(&m.state, &m.agent).await?.data.expect("list");
    assert!(active.items.iter().any(|o| o.id == order_id));

    fulfillment_service::dispatch_order(&m.state, &m.wholesaler, order_id).await?;
    let delivered = agent_service::deliver_order(&m.state, &m.agent, order_id)
        .await?
        .data
        .expect("delivered order");
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.agent_earnings, Some(dec("30.00")));
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);

    let again = agent_service::deliver_order(&m.state, &m.agent, order_id).await;
    assert!(matches!(again, Err(AppError::InvalidTransition { .. })));

    let summary = agent_service::summary(&m.state, &m.agent).await?.data.expect("summary");
    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.active, 0);
    assert_eq!(summary.earnings, dec("30.00"));
    assert_eq!(summary.week_earnings, dec("30.00"));

    // Stock was taken once, at placement.
    assert_eq!(stock_of(&m).await?, 15);
    Ok(())
}

#[tokio::test]
async fn item_price_is_frozen_at_placement() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };

    let placed = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 2, "ONLINE"),
    )
    .await?
    .data
    .expect("placed order");
    assert_eq!(placed.order.payment_status, PaymentStatus::Paid);

    catalog_service::update_product(
        &m.state,
        &m.wholesaler,
        m.product_id,
        UpdateProductRequest {
            price: Some(dec("150.00")),
            ..UpdateProductRequest::default()
        },
    )
    .await?;

    let fetched = order_service::get_order(&m.state, &m.retailer, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.items[0].price, dec("100.00"));
    assert_eq!(fetched.order.total_amount, dec("200.00"));

    let invoice = order_service::invoice(&m.state, &m.retailer, placed.order.id)
        .await?
        .data
        .expect("invoice");
    assert_eq!(invoice.total_amount, dec("200.00"));
    assert_eq!(invoice.lines[0].product_name, "Rice 25kg");
    assert_eq!(invoice.lines[0].subtotal, dec("200.00"));
    Ok(())
}

#[tokio::test]
async fn credit_order_without_account_flags_request_and_places_nothing() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };

    let result = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 3, "CREDIT"),
    )
    .await;
    assert!(matches!(result, Err(AppError::CreditAccountMissing)));

    assert_eq!(orders_placed_by(&m).await?, 0);
    assert_eq!(stock_of(&m).await?, 10);

    let retailer = Users::find_by_id(m.retailer.user_id)
        .one(&m.state.orm)
        .await?
        .expect("retailer");
    assert_eq!(retailer.credit_status, CreditStatus::Requested);

    let requests = credit_service::list_requests(&m.state, &m.wholesaler)
        .await?
        .data
        .expect("requests");
    assert!(requests.items.iter().any(|r| r.id == m.retailer.user_id));
    Ok(())
}

#[tokio::test]
async fn insufficient_credit_rolls_back_everything() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    approve(&m, "250.00").await?;

    let result = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 3, "CREDIT"),
    )
    .await;
    assert!(matches!(result, Err(AppError::InsufficientCredit { .. })));
    assert_eq!(orders_placed_by(&m).await?, 0);
    assert_eq!(stock_of(&m).await?, 10);
    assert_eq!(credit_used(&m).await?, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn stock_and_moq_are_enforced() -> anyhow::Result<()> {
    let Some(m) = setup_market(4).await? else {
        return Ok(());
    };

    let result = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 5, "COD"),
    )
    .await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    catalog_service::update_product(
        &m.state,
        &m.wholesaler,
        m.product_id,
        UpdateProductRequest {
            moq: Some(3),
            ..UpdateProductRequest::default()
        },
    )
    .await?;
    let result = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 2, "COD"),
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));

    catalog_service::update_product(
        &m.state,
        &m.wholesaler,
        m.product_id,
        UpdateProductRequest {
            active: Some(false),
            ..UpdateProductRequest::default()
        },
    )
    .await?;
    let result = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 3, "COD"),
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    assert_eq!(orders_placed_by(&m).await?, 0);
    assert_eq!(stock_of(&m).await?, 4);
    Ok(())
}

#[tokio::test]
async fn reject_restores_stock_and_credit() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    approve(&m, "1000.00").await?;

    let placed = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 3, "CREDIT"),
    )
    .await?
    .data
    .expect("placed order");
    assert_eq!(credit_used(&m).await?, dec("300.00"));
    assert_eq!(stock_of(&m).await?, 7);

    let rejected = fulfillment_service::reject_order(&m.state, &m.wholesaler, placed.order.id)
        .await?
        .data
        .expect("rejected order");
    assert_eq!(rejected.status, OrderStatus::Rejected);
    assert_eq!(credit_used(&m).await?, Decimal::ZERO);
    assert_eq!(stock_of(&m).await?, 10);

    let again = fulfillment_service::accept_order(&m.state, &m.wholesaler, placed.order.id).await;
    assert!(matches!(again, Err(AppError::InvalidTransition { .. })));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_credit_orders_never_overdraw() -> anyhow::Result<()> {
    let Some(m) = setup_market(50).await? else {
        return Ok(());
    };
    approve(&m, "1000.00").await?;

    let first = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 6, "CREDIT"),
    );
    let second = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 6, "CREDIT"),
    );
    let (first, second) = tokio::join!(first, second);

    let succeeded = [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(succeeded, 1, "exactly one placement fits the credit line");
    let failure = if first.is_err() { first } else { second };
    assert!(matches!(failure, Err(AppError::InsufficientCredit { .. })));

    assert_eq!(credit_used(&m).await?, dec("600.00"));
    assert_eq!(stock_of(&m).await?, 44);
    assert_eq!(orders_placed_by(&m).await?, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_orders_never_oversell() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };

    let (first, second) = tokio::join!(
        order_service::place_order(
            &m.state,
            &m.retailer,
            m.store_id,
            order_of(m.product_id, 6, "COD"),
        ),
        order_service::place_order(
            &m.state,
            &m.retailer,
            m.store_id,
            order_of(m.product_id, 6, "COD"),
        )
    );

    assert_ne!(first.is_ok(), second.is_ok());
    assert_eq!(stock_of(&m).await?, 4);
    Ok(())
}

#[tokio::test]
async fn settlement_reduces_used_credit() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    approve(&m, "1000.00").await?;
    order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 3, "CREDIT"),
    )
    .await?;

    let account = credit_service::settle_account(
        &m.state,
        &m.wholesaler,
        m.retailer.user_id,
        SettleCreditRequest {
            amount: dec("100.00"),
        },
    )
    .await?
    .data
    .expect("account");
    assert_eq!(account.credit_used, dec("200.00"));

    let too_much = credit_service::settle_account(
        &m.state,
        &m.wholesaler,
        m.retailer.user_id,
        SettleCreditRequest {
            amount: dec("500.00"),
        },
    )
    .await;
    assert!(matches!(too_much, Err(AppError::ExceedsUsed)));

    let zero = credit_service::settle_self(
        &m.state,
        &m.retailer,
        SelfSettleRequest {
            store_id: m.store_id,
            amount: Decimal::ZERO,
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::InvalidAmount)));

    let sub_cent = credit_service::settle_account(
        &m.state,
        &m.wholesaler,
        m.retailer.user_id,
        SettleCreditRequest {
            amount: dec("0.004"),
        },
    )
    .await;
    assert!(matches!(sub_cent, Err(AppError::InvalidAmount)));
    assert_eq!(credit_used(&m).await?, dec("200.00"));

    let account = credit_service::settle_self(
        &m.state,
        &m.retailer,
        SelfSettleRequest {
            store_id: m.store_id,
            amount: dec("200.00"),
        },
    )
    .await?
    .data
    .expect("account");
    assert_eq!(account.credit_used, Decimal::ZERO);

    let mine = credit_service::my_credit(&m.state, &m.retailer).await?.data.expect("credit");
    assert_eq!(mine.accounts.len(), 1);
    assert_eq!(mine.accounts[0].credit_status, CreditStatus::Approved);
    assert_eq!(mine.total_limit, dec("1000.00"));
    assert_eq!(mine.total_used, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn only_the_right_parties_may_act() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    let placed = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 1, "COD"),
    )
    .await?
    .data
    .expect("placed order");
    let order_id = placed.order.id;

    let rival = create_user(&m.state, Role::Wholesaler).await?;
    let result = fulfillment_service::accept_order(&m.state, &rival, order_id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let result = fulfillment_service::accept_order(&m.state, &m.retailer, order_id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let stranger = create_user(&m.state, Role::Retailer).await?;
    let result = order_service::get_order(&m.state, &stranger, order_id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    fulfillment_service::accept_order(&m.state, &m.wholesaler, order_id).await?;
    let result = fulfillment_service::assign_agent(
        &m.state,
        &m.wholesaler,
        order_id,
        AssignAgentRequest {
            agent_email: m.retailer.email.clone(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidAgent)));

    fulfillment_service::assign_agent(
        &m.state,
        &m.wholesaler,
        order_id,
        AssignAgentRequest {
            agent_email: m.agent.email.clone(),
        },
    )
    .await?;
    fulfillment_service::dispatch_order(&m.state, &m.wholesaler, order_id).await?;

    let other_agent = create_user(&m.state, Role::Agent).await?;
    let result = agent_service::deliver_order(&m.state, &other_agent, order_id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let result = order_service::invoice(&m.state, &m.agent, order_id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // The assigned agent can still read the order it carries.
    order_service::get_order(&m.state, &m.agent, order_id).await?;
    Ok(())
}

#[tokio::test]
async fn request_credit_flags_retailer_until_store_approves() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };

    let flagged = credit_service::request_credit(&m.state, &m.retailer, Some(m.store_id))
        .await?
        .data
        .expect("retailer");
    assert_eq!(flagged.credit_status, CreditStatus::Requested);

    let requests = credit_service::list_requests(&m.state, &m.wholesaler)
        .await?
        .data
        .expect("requests");
    assert!(requests.items.iter().any(|r| r.id == m.retailer.user_id));

    let not_retailer = credit_service::request_credit(&m.state, &m.wholesaler, None).await;
    assert!(matches!(not_retailer, Err(AppError::Forbidden(_))));

    approve(&m, "500.00").await?;

    let again = credit_service::request_credit(&m.state, &m.retailer, Some(m.store_id)).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let requests = credit_service::list_requests(&m.state, &m.wholesaler)
        .await?
        .data
        .expect("requests");
    assert!(!requests.items.iter().any(|r| r.id == m.retailer.user_id));
    Ok(())
}

#[tokio::test]
async fn approval_by_one_wholesaler_leaves_others_open() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    let (other, other_store) = other_wholesaler(&m.state).await?;

    credit_service::request_credit(&m.state, &m.retailer, None).await?;
    approve(&m, "500.00").await?;

    let retailer = Users::find_by_id(m.retailer.user_id)
        .one(&m.state.orm)
        .await?
        .expect("retailer");
    assert_eq!(retailer.credit_status, CreditStatus::Requested);

    credit_service::request_credit(&m.state, &m.retailer, None).await?;
    credit_service::request_credit(&m.state, &m.retailer, Some(other_store)).await?;
    let to_approved =
        credit_service::request_credit(&m.state, &m.retailer, Some(m.store_id)).await;
    assert!(matches!(to_approved, Err(AppError::Conflict(_))));

    let requests = credit_service::list_requests(&m.state, &other)
        .await?
        .data
        .expect("requests");
    assert!(requests.items.iter().any(|r| r.id == m.retailer.user_id));

    let account = credit_service::approve_credit(
        &m.state,
        &other,
        m.retailer.user_id,
        ApproveCreditRequest {
            credit_limit: dec("300.00"),
        },
    )
    .await?
    .data
    .expect("account");
    assert_eq!(account.credit_status, CreditStatus::Approved);

    let mine = credit_service::my_credit(&m.state, &m.retailer).await?.data.expect("credit");
    assert_eq!(mine.accounts.len(), 2);
    assert_eq!(mine.total_limit, dec("800.00"));
    Ok(())
}

#[tokio::test]
async fn reject_credit_creates_or_updates_the_account() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    let (other, _) = other_wholesaler(&m.state).await?;

    // No account yet: rejection records one with a zero limit.
    let created = credit_service::reject_credit(&m.state, &other, m.retailer.user_id)
        .await?
        .data
        .expect("account");
    assert_eq!(created.credit_status, CreditStatus::Rejected);
    assert_eq!(created.credit_limit, Decimal::ZERO);
    assert_eq!(created.credit_used, Decimal::ZERO);

    approve(&m, "1000.00").await?;
    order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 2, "CREDIT"),
    )
    .await?;

    // Existing account: status flips, the outstanding balance stays.
    let updated = credit_service::reject_credit(&m.state, &m.wholesaler, m.retailer.user_id)
        .await?
        .data
        .expect("account");
    assert_eq!(updated.credit_status, CreditStatus::Rejected);
    assert_eq!(updated.credit_limit, dec("1000.00"));
    assert_eq!(updated.credit_used, dec("200.00"));

    let account = account_of(&m).await?.expect("credit account");
    assert_eq!(account.id, updated.id);
    Ok(())
}

#[tokio::test]
async fn credit_order_against_rejected_account_changes_nothing() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    approve(&m, "1000.00").await?;
    order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 1, "CREDIT"),
    )
    .await?;
    credit_service::reject_credit(&m.state, &m.wholesaler, m.retailer.user_id).await?;

    let result = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 2, "CREDIT"),
    )
    .await;
    assert!(matches!(result, Err(AppError::CreditNotApproved)));
    assert_eq!(orders_placed_by(&m).await?, 1);
    assert_eq!(stock_of(&m).await?, 9);
    assert_eq!(credit_used(&m).await?, dec("100.00"));
    Ok(())
}

#[tokio::test]
async fn accept_rechecks_credit_after_rejection() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };
    approve(&m, "1000.00").await?;
    let placed = order_service::place_order(
        &m.state,
        &m.retailer,
        m.store_id,
        order_of(m.product_id, 3, "CREDIT"),
    )
    .await?
    .data
    .expect("order");
    let order_id = placed.order.id;

    credit_service::reject_credit(&m.state, &m.wholesaler, m.retailer.user_id).await?;

    let result = fulfillment_service::accept_order(&m.state, &m.wholesaler, order_id).await;
    assert!(matches!(result, Err(AppError::CreditNotApproved)));

    let order = Orders::find_by_id(order_id)
        .one(&m.state.orm)
        .await?
        .expect("order row");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(credit_used(&m).await?, dec("300.00"));
    Ok(())
}

#[tokio::test]
async fn duplicate_rows_surface_as_conflict() -> anyhow::Result<()> {
    let Some(m) = setup_market(10).await? else {
        return Ok(());
    };

    // Bypass the service pre-checks, as a concurrent writer would.
    let store_err = StoreActive {
        id: Set(Uuid::new_v4()),
        name: Set("Second Store".into()),
        address: Set("3 Depot Road".into()),
        owner_email: Set(m.wholesaler.email.clone()),
        created_at: NotSet,
    }
    .insert(&m.state.orm)
    .await
    .expect_err("owner already has a store");
    let err = AppError::from(store_err);
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.status(), StatusCode::CONFLICT);

    approve(&m, "500.00").await?;
    let pair_err = CreditActive {
        id: Set(Uuid::new_v4()),
        wholesaler_id: Set(m.wholesaler.user_id),
        retailer_id: Set(m.retailer.user_id),
        credit_limit: Set(dec("100.00")),
        credit_used: Set(Decimal::ZERO),
        credit_status: Set(CreditStatus::Approved),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&m.state.orm)
    .await
    .expect_err("pair already has an account");
    assert!(matches!(AppError::from(pair_err), AppError::Conflict(_)));

    let store_again = catalog_service::create_store(
        &m.state,
        &m.wholesaler,
        CreateStoreRequest {
            name: "Again".into(),
            address: "4 Depot Road".into(),
        },
    )
    .await;
    assert!(matches!(store_again, Err(AppError::Conflict(_))));
    Ok(())
}
