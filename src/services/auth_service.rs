use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    config::{jwt_secret, jwt_ttl_hours},
    dto::auth::{
        Claims, LoginRequest, LoginResponse, RegisterAgentRequest, RegisterResponse,
        RegisterRetailerRequest, RegisterWholesalerRequest, UpdateProfileRequest,
    },
    entity::{
        enums::{CreditStatus, Role},
        stores::ActiveModel as StoreActive,
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::order_access::user_by_email,
    state::AppState,
};

/// Registration fields shared by every role.
struct NewUser {
    email: String,
    password: String,
    role: Role,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    business_name: Option<String>,
}

fn required(value: &str, message: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(message.to_string()));
    }
    Ok(value.to_string())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

async fn insert_user<C: ConnectionTrait>(conn: &C, new_user: NewUser) -> AppResult<UserModel> {
    if user_by_email(conn, &new_user.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&new_user.password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(new_user.email),
        password_hash: Set(password_hash),
        role: Set(new_user.role),
        name: Set(new_user.name),
        phone: Set(new_user.phone),
        address: Set(new_user.address),
        business_name: Set(new_user.business_name),
        credit_status: Set(CreditStatus::None),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(user)
}

/// Wholesalers get their store with the account; one store per owner.
pub async fn register_wholesaler(
    state: &AppState,
    payload: RegisterWholesalerRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    const MISSING: &str = "All wholesaler fields are required";
    let new_user = NewUser {
        email: normalize_email(&required(&payload.email, MISSING)?),
        password: required(&payload.password, MISSING)?,
        role: Role::Wholesaler,
        name: required(&payload.name, MISSING)?,
        phone: Some(required(&payload.phone, MISSING)?),
        address: Some(required(&payload.address, MISSING)?),
        business_name: Some(required(&payload.business_name, MISSING)?),
    };
    let store_name = new_user.business_name.clone().unwrap_or_default();
    let store_address = new_user.address.clone().unwrap_or_default();

    let txn = state.orm.begin().await?;
    let user = insert_user(&txn, new_user).await?;
    let store = StoreActive {
        id: Set(Uuid::new_v4()),
        name: Set(store_name),
        address: Set(store_address),
        owner_email: Set(user.email.clone()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role, "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Wholesaler registered successfully",
        RegisterResponse {
            user: user.into(),
            store: Some(store.into()),
        },
        Some(Meta::empty()),
    ))
}

pub async fn register_retailer(
    state: &AppState,
    payload: RegisterRetailerRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    const MISSING: &str = "All retailer fields are required";
    let new_user = NewUser {
        email: normalize_email(&required(&payload.email, MISSING)?),
        password: required(&payload.password, MISSING)?,
        role: Role::Retailer,
        name: required(&payload.name, MISSING)?,
        phone: Some(required(&payload.phone, MISSING)?),
        address: Some(required(&payload.address, MISSING)?),
        business_name: None,
    };
    register(state, new_user, "Retailer registered successfully").await
}

pub async fn register_agent(
    state: &AppState,
    payload: RegisterAgentRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    const MISSING: &str = "All agent fields are required";
    let new_user = NewUser {
        email: normalize_email(&required(&payload.email, MISSING)?),
        password: required(&payload.password, MISSING)?,
        role: Role::Agent,
        name: required(&payload.name, MISSING)?,
        phone: Some(required(&payload.phone, MISSING)?),
        address: None,
        business_name: None,
    };
    register(state, new_user, "Agent registered successfully").await
}

async fn register(
    state: &AppState,
    new_user: NewUser,
    message: &str,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let user = insert_user(&state.orm, new_user).await?;

    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::success(
        message,
        RegisterResponse {
            user: user.into(),
            store: None,
        },
        Some(Meta::empty()),
    ))
}

pub fn issue_token(user: &UserModel) -> AppResult<String> {
    let secret = jwt_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(jwt_ttl_hours()))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = normalize_email(&payload.email);
    let user = match user_by_email(&state.orm, &email).await? {
        Some(u) => u,
        None => return Err(AppError::InvalidRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::InvalidRequest("Invalid email or password".into()));
    }

    let token = issue_token(&user)?;

    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            role: user.role,
        },
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let profile = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::success("You are authenticated", profile.into(), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let profile = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut active: UserActive = profile.into();
    if let Some(name) = payload.name {
        active.name = Set(required(&name, "name must not be empty")?);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone.trim().to_string()));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address.trim().to_string()));
    }
    if let Some(business_name) = payload.business_name {
        active.business_name = Set(Some(business_name.trim().to_string()));
    }
    let profile = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated successfully",
        profile.into(),
        Some(Meta::empty()),
    ))
}
