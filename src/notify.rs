use crate::{audit::log_audit, db::DbPool};

/// Events a full deployment would fan out to email. Here they land in the
/// log and the audit trail; delivery itself stays outside this service.
#[derive(Debug)]
pub enum Notification {
    UserRegistered {
        user_id: i32,
        email: String,
        token: String,
    },
    OrderPlaced {
        user_id: i32,
        order_id: i32,
    },
}

pub async fn dispatch(pool: &DbPool, event: Notification) {
    match event {
        Notification::UserRegistered {
            user_id,
            email,
            token,
        } => {
            tracing::info!(user_id, email = %email, "registration confirmation issued");
            if let Err(err) = log_audit(
                pool,
                Some(user_id),
                "user_registered",
                Some("users"),
                Some(serde_json::json!({ "email": email, "token": token })),
            )
            .await
            {
                tracing::warn!(error = %err, "audit log failed");
            }
        }
        Notification::OrderPlaced { user_id, order_id } => {
            tracing::info!(user_id, order_id, "order placed");
            if let Err(err) = log_audit(
                pool,
                Some(user_id),
                "order_placed",
                Some("orders"),
                Some(serde_json::json!({ "order_id": order_id })),
            )
            .await
            {
                tracing::warn!(error = %err, "audit log failed");
            }
        }
    }
}
