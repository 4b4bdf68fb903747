use axum::http::StatusCode;
use b2b_marketplace_api::{
    db::create_pool,
    routes::health::{health_check, readiness},
    state::AppState,
};

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn readiness_reports_database_up() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run readiness test.");
            return Ok(());
        }
    };
    let state = AppState::new(create_pool(&database_url, 1).await?);

    let (status, body) = readiness(axum::extract::State(state)).await;
    assert_eq!(status, StatusCode::OK);
    let data = body.0.data.expect("readiness data");
    assert_eq!(data.database, "up");
    Ok(())
}
