//! Append-only trail of state-changing actions.

use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

async fn insert(
    pool: &DbPool,
    user_id: Uuid,
    action: &str,
    resource: &str,
    metadata: &Value,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;
    Ok(())
}

/// Write one audit row after the business transaction has committed. A
/// failed write is logged and swallowed; the caller's change already stands.
pub async fn record(pool: &DbPool, user_id: Uuid, action: &str, resource: &str, metadata: Value) {
    if let Err(err) = insert(pool, user_id, action, resource, &metadata).await {
        tracing::warn!(error = %err, action, resource, "audit log failed");
    }
}
