use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::credit,
    dto::credit::{
        ApproveCreditRequest, CreditLine, CreditLineList, CreditRequestList, MyCredit,
        RetailerContact, SelfSettleRequest, SettleCreditRequest,
    },
    entity::{
        credit_accounts::{
            ActiveModel as CreditActive, Column as CreditCol, Entity as CreditAccounts,
            Model as CreditModel,
        },
        enums::{CreditStatus, Role},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_retailer, ensure_wholesaler},
    models::{CreditAccount, User},
    response::{ApiResponse, Meta},
    services::order_access::{find_store, user_by_email},
    state::AppState,
};

async fn find_retailer<C: ConnectionTrait>(conn: &C, retailer_id: Uuid) -> AppResult<UserModel> {
    match Users::find_by_id(retailer_id).one(conn).await? {
        Some(user) if user.role == Role::Retailer => Ok(user),
        _ => Err(AppError::not_found("Retailer")),
    }
}

async fn lock_account(
    txn: &DatabaseTransaction,
    wholesaler_id: Uuid,
    retailer_id: Uuid,
) -> AppResult<Option<CreditModel>> {
    let account = CreditAccounts::find()
        .filter(
            Condition::all()
                .add(CreditCol::WholesalerId.eq(wholesaler_id))
                .add(CreditCol::RetailerId.eq(retailer_id)),
        )
        .lock(LockType::Update)
        .one(txn)
        .await?;
    Ok(account)
}

/// Raise the retailer-level request flag that wholesalers list. Approval is
/// per wholesaler, so the flag stays up after one of them approves. With a
/// `store_id` the call fails when that store's wholesaler already approved.
pub async fn request_credit(
    state: &AppState,
    user: &AuthUser,
    store_id: Option<Uuid>,
) -> AppResult<ApiResponse<User>> {
    ensure_retailer(user)?;
    let retailer = find_retailer(&state.orm, user.user_id).await?;

    if let Some(store_id) = store_id {
        let store = find_store(&state.orm, store_id).await?;
        let wholesaler = user_by_email(&state.orm, &store.owner_email)
            .await?
            .ok_or_else(|| AppError::not_found("Store wholesaler"))?;
        let account = CreditAccounts::find()
            .filter(
                Condition::all()
                    .add(CreditCol::WholesalerId.eq(wholesaler.id))
                    .add(CreditCol::RetailerId.eq(retailer.id)),
            )
            .one(&state.orm)
            .await?;
        if account.is_some_and(|a| a.credit_status == CreditStatus::Approved) {
            return Err(AppError::Conflict("Credit already approved".into()));
        }
    }

    let mut active: UserActive = retailer.into();
    active.credit_status = Set(CreditStatus::Requested);
    let retailer = active.update(&state.orm).await?;

    tracing::info!(retailer = %retailer.email, store_id = ?store_id, "credit requested");
    Ok(ApiResponse::success(
        "Credit request submitted",
        retailer.into(),
        Some(Meta::empty()),
    ))
}

/// Retailers asking for credit that this wholesaler has not yet resolved.
pub async fn list_requests(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CreditRequestList>> {
    ensure_wholesaler(user)?;

    let resolved: HashSet<Uuid> = CreditAccounts::find()
        .filter(CreditCol::WholesalerId.eq(user.user_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|a| a.retailer_id)
        .collect();

    let items = Users::find()
        .filter(
            Condition::all()
                .add(UserCol::Role.eq(Role::Retailer))
                .add(UserCol::CreditStatus.eq(CreditStatus::Requested)),
        )
        .order_by_asc(UserCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter(|retailer| !resolved.contains(&retailer.id))
        .map(RetailerContact::from)
        .collect();

    Ok(ApiResponse::success(
        "Credit requests",
        CreditRequestList { items },
        Some(Meta::empty()),
    ))
}

pub async fn approve_credit(
    state: &AppState,
    user: &AuthUser,
    retailer_id: Uuid,
    payload: ApproveCreditRequest,
) -> AppResult<ApiResponse<CreditAccount>> {
    ensure_wholesaler(user)?;
    let txn = state.orm.begin().await?;
    find_retailer(&txn, retailer_id).await?;
    let existing = lock_account(&txn, user.user_id, retailer_id).await?;

    let account = match existing {
        Some(account) if account.credit_status == CreditStatus::Approved => {
            return Err(AppError::Conflict(
                "Credit already approved for this retailer".into(),
            ));
        }
        Some(account) => {
            // Outstanding balance from an earlier approval carries over.
            credit::check_limit(payload.credit_limit, account.credit_used)?;
            let mut active: CreditActive = account.into();
            active.credit_status = Set(CreditStatus::Approved);
            active.credit_limit = Set(payload.credit_limit);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        None => {
            credit::check_limit(payload.credit_limit, Decimal::ZERO)?;
            CreditActive {
                id: Set(Uuid::new_v4()),
                wholesaler_id: Set(user.user_id),
                retailer_id: Set(retailer_id),
                credit_limit: Set(payload.credit_limit),
                credit_used: Set(Decimal::ZERO),
                credit_status: Set(CreditStatus::Approved),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    tracing::info!(
        account_id = %account.id,
        retailer_id = %retailer_id,
        limit = %account.credit_limit,
        "credit approved"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "credit_approve",
        "credit_accounts",
        serde_json::json!({ "account_id": account.id, "credit_limit": account.credit_limit }),
    )
    .await;

    Ok(ApiResponse::success(
        "Credit approved",
        account.into(),
        Some(Meta::empty()),
    ))
}

pub async fn reject_credit(
    state: &AppState,
    user: &AuthUser,
    retailer_id: Uuid,
) -> AppResult<ApiResponse<CreditAccount>> {
    ensure_wholesaler(user)?;
    let txn = state.orm.begin().await?;
    find_retailer(&txn, retailer_id).await?;

    let account = match lock_account(&txn, user.user_id, retailer_id).await? {
        Some(account) => {
            let mut active: CreditActive = account.into();
            active.credit_status = Set(CreditStatus::Rejected);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        None => {
            CreditActive {
                id: Set(Uuid::new_v4()),
                wholesaler_id: Set(user.user_id),
                retailer_id: Set(retailer_id),
                credit_limit: Set(Decimal::ZERO),
                credit_used: Set(Decimal::ZERO),
                credit_status: Set(CreditStatus::Rejected),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    tracing::info!(account_id = %account.id, retailer_id = %retailer_id, "credit rejected");
    audit::record(
        &state.pool,
        user.user_id,
        "credit_reject",
        "credit_accounts",
        serde_json::json!({ "account_id": account.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Credit rejected",
        account.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_accounts(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CreditLineList>> {
    ensure_wholesaler(user)?;
    let accounts = CreditAccounts::find()
        .filter(
            Condition::all()
                .add(CreditCol::WholesalerId.eq(user.user_id))
                .add(CreditCol::CreditStatus.eq(CreditStatus::Approved)),
        )
        .order_by_asc(CreditCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let retailer_ids: Vec<Uuid> = accounts.iter().map(|a| a.retailer_id).collect();
    let mut retailers: HashMap<Uuid, UserModel> = Users::find()
        .filter(UserCol::Id.is_in(retailer_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let items = accounts
        .into_iter()
        .filter_map(|account| {
            let retailer = retailers.remove(&account.retailer_id)?;
            Some(CreditLine {
                credit_account_id: account.id,
                retailer: retailer.into(),
                credit_limit: account.credit_limit,
                credit_used: account.credit_used,
                available: credit::available(account.credit_limit, account.credit_used),
            })
        })
        .collect();

    Ok(ApiResponse::success(
        "Credit accounts",
        CreditLineList { items },
        Some(Meta::empty()),
    ))
}

pub async fn my_credit(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MyCredit>> {
    ensure_retailer(user)?;
    let retailer = find_retailer(&state.orm, user.user_id).await?;
    let accounts: Vec<CreditAccount> = CreditAccounts::find()
        .filter(CreditCol::RetailerId.eq(user.user_id))
        .order_by_asc(CreditCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CreditAccount::from)
        .collect();

    let (total_limit, total_used) = accounts
        .iter()
        .filter(|a| a.credit_status == CreditStatus::Approved)
        .fold((Decimal::ZERO, Decimal::ZERO), |(limit, used), a| {
            (limit + a.credit_limit, used + a.credit_used)
        });

    Ok(ApiResponse::success(
        "Credit info",
        MyCredit {
            credit_status: retailer.credit_status,
            accounts,
            total_limit,
            total_used,
        },
        Some(Meta::empty()),
    ))
}

async fn apply_settlement(
    txn: &DatabaseTransaction,
    account: CreditModel,
    amount: Decimal,
) -> AppResult<CreditModel> {
    let credit_used = credit::settle(account.credit_used, amount)?;
    let mut active: CreditActive = account.into();
    active.credit_used = Set(credit_used);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

/// Wholesaler records a repayment on one of its accounts.
pub async fn settle_account(
    state: &AppState,
    user: &AuthUser,
    retailer_id: Uuid,
    payload: SettleCreditRequest,
) -> AppResult<ApiResponse<CreditAccount>> {
    ensure_wholesaler(user)?;
    credit::check_amount(payload.amount)?;

    let txn = state.orm.begin().await?;
    let account = lock_account(&txn, user.user_id, retailer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Credit account"))?;
    let account = apply_settlement(&txn, account, payload.amount).await?;
    txn.commit().await?;

    tracing::info!(account_id = %account.id, amount = %payload.amount, "credit settled");
    audit::record(
        &state.pool,
        user.user_id,
        "credit_settle",
        "credit_accounts",
        serde_json::json!({ "account_id": account.id, "amount": payload.amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Credit settled successfully",
        account.into(),
        Some(Meta::empty()),
    ))
}

/// Retailer repays its line with the wholesaler that owns `store_id`.
pub async fn settle_self(
    state: &AppState,
    user: &AuthUser,
    payload: SelfSettleRequest,
) -> AppResult<ApiResponse<CreditAccount>> {
    ensure_retailer(user)?;
    credit::check_amount(payload.amount)?;

    let store = find_store(&state.orm, payload.store_id).await?;
    let wholesaler = user_by_email(&state.orm, &store.owner_email)
        .await?
        .ok_or_else(|| AppError::not_found("Store wholesaler"))?;

    let txn = state.orm.begin().await?;
    let account = lock_account(&txn, wholesaler.id, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Credit account"))?;
    let account = apply_settlement(&txn, account, payload.amount).await?;
    txn.commit().await?;

    tracing::info!(account_id = %account.id, amount = %payload.amount, "credit self-settled");
    audit::record(
        &state.pool,
        user.user_id,
        "credit_self_settle",
        "credit_accounts",
        serde_json::json!({ "account_id": account.id, "amount": payload.amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Credit settled successfully",
        account.into(),
        Some(Meta::empty()),
    ))
}
