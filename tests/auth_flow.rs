use axum::{extract::FromRequestParts, http::Request};
use b2b_marketplace_api::{
    db::{create_pool, run_migrations},
    dto::auth::{LoginRequest, RegisterRetailerRequest, RegisterWholesalerRequest},
    entity::{
        enums::{CreditStatus, Role},
        users,
    },
    error::AppError,
    middleware::auth::{AuthUser, ensure_wholesaler},
    services::{auth_service, catalog_service},
    state::AppState,
};
use chrono::Utc;
use uuid::Uuid;

fn set_secret() {
    // Every test writes the same value, so concurrent writes are harmless.
    unsafe { std::env::set_var("JWT_SECRET", "test-secret") };
}

async fn test_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run auth tests.");
            return Ok(None);
        }
    };
    let pool = create_pool(&database_url, 2).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool)))
}

async fn extract(authorization: Option<&str>) -> Result<AuthUser, AppError> {
    let mut builder = Request::builder().uri("/api/me");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let (mut parts, _) = builder.body(()).expect("request").into_parts();
    AuthUser::from_request_parts(&mut parts, &()).await
}

#[tokio::test]
async fn issued_token_round_trips_through_extractor() {
    set_secret();
    let user = users::Model {
        id: Uuid::new_v4(),
        email: "owner@example.com".into(),
        password_hash: "unused".into(),
        role: Role::Wholesaler,
        name: "Owner".into(),
        phone: None,
        address: None,
        business_name: Some("Owner Traders".into()),
        credit_status: CreditStatus::None,
        created_at: Utc::now().into(),
    };
    let token = auth_service::issue_token(&user).expect("token");

    let auth = extract(Some(&format!("Bearer {token}"))).await.expect("valid token");
    assert_eq!(auth.user_id, user.id);
    assert_eq!(auth.email, "owner@example.com");
    assert_eq!(auth.role, Role::Wholesaler);
    assert!(ensure_wholesaler(&auth).is_ok());
}

#[tokio::test]
async fn extractor_rejects_missing_or_bad_tokens() {
    set_secret();
    assert!(matches!(extract(None).await, Err(AppError::Unauthorized(_))));
    assert!(matches!(
        extract(Some("Token abc")).await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        extract(Some("Bearer not-a-jwt")).await,
        Err(AppError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn wholesaler_registration_creates_store_and_login_works() -> anyhow::Result<()> {
    set_secret();
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let email = format!("Owner-{}@Example.com", Uuid::new_v4().simple());

    let registered = auth_service::register_wholesaler(
        &state,
        RegisterWholesalerRequest {
            name: "Owner".into(),
            business_name: "Owner Traders".into(),
            email: email.clone(),
            phone: "9000000001".into(),
            address: "3 Mill Road".into(),
            password: "secret-pass".into(),
        },
    )
    .await?
    .data
    .expect("registration");
    assert_eq!(registered.user.email, email.to_lowercase());
    assert_eq!(registered.user.role, Role::Wholesaler);
    let store = registered.store.expect("store created with the account");
    assert_eq!(store.name, "Owner Traders");
    assert_eq!(store.owner_email, email.to_lowercase());

    let duplicate = auth_service::register_wholesaler(
        &state,
        RegisterWholesalerRequest {
            name: "Owner".into(),
            business_name: "Owner Traders".into(),
            email: email.clone(),
            phone: "9000000001".into(),
            address: "3 Mill Road".into(),
            password: "secret-pass".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "secret-pass".into(),
        },
    )
    .await?
    .data
    .expect("login");
    assert_eq!(login.role, Role::Wholesaler);
    let auth = extract(Some(&login.token)).await?;
    assert_eq!(auth.user_id, registered.user.id);

    let mine = catalog_service::my_store(&state, &auth).await?.data.expect("store");
    assert_eq!(mine.id, store.id);

    let wrong = auth_service::login_user(
        &state,
        LoginRequest {
            email,
            password: "wrong-pass".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::InvalidRequest(_))));
    Ok(())
}

#[tokio::test]
async fn registration_requires_every_field() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let result = auth_service::register_retailer(
        &state,
        RegisterRetailerRequest {
            name: "Shop".into(),
            email: format!("shop-{}@example.com", Uuid::new_v4().simple()),
            phone: "  ".into(),
            address: "5 Bazaar".into(),
            password: "secret-pass".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    Ok(())
}
