//! Append-only audit trail, written after the business transaction commits.

use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, DbErr, Set};
use serde_json::Value;

pub use crate::entity::audit_logs::AuditAction;
use crate::entity::audit_logs::ActiveModel as AuditActive;

async fn insert<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<i64>,
    action: AuditAction,
    metadata: Value,
) -> Result<(), DbErr> {
    AuditActive {
        id: NotSet,
        user_id: Set(user_id),
        action: Set(action),
        resource: Set(action.resource().to_string()),
        metadata: Set(metadata),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Failures are logged and never reach the caller.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<i64>,
    action: AuditAction,
    metadata: Value,
) {
    if let Err(err) = insert(conn, user_id, action, metadata).await {
        tracing::warn!(error = %err, action = ?action, "audit log failed");
    }
}
