//! Subscription persistence, behind a trait so the webhook handler can be
//! exercised without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRecord {
    pub provider_subscription_id: String,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub customer_id: u64,
    pub variant_id: u64,
    pub tier: String,
    pub status: String,
    pub renews_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub provider_order_id: String,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub customer_id: u64,
    pub variant_id: u64,
    pub tier: String,
    pub status: String,
    pub total: i64,
    pub currency: String,
}

#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Persists a verified webhook payload for audit.
    async fn record_webhook_event(&self, event_name: &str, payload: &Value) -> Result<(), AppError>;

    /// Inserts or replaces a subscription and syncs the owner's tier.
    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<(), AppError>;

    /// Returns `false` when no subscription with that id is stored.
    async fn set_subscription_status(
        &self,
        provider_subscription_id: &str,
        status: &str,
    ) -> Result<bool, AppError>;

    /// Records a one-off order (idempotent on the order id) and syncs the buyer's tier.
    async fn record_order(&self, order: &OrderRecord) -> Result<(), AppError>;
}

pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn record_webhook_event(&self, event_name: &str, payload: &Value) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO webhook_events (id, event_name, payload, received_at) VALUES ($1, $2, $3, now())",
        )
        .bind(Uuid::new_v4())
        .bind(event_name)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (provider_subscription_id, user_id, user_email, customer_id, variant_id,
                 tier, status, renews_at, ends_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
            ON CONFLICT (provider_subscription_id) DO UPDATE SET
                user_id = COALESCE(EXCLUDED.user_id, subscriptions.user_id),
                user_email = COALESCE(EXCLUDED.user_email, subscriptions.user_email),
                customer_id = EXCLUDED.customer_id,
                variant_id = EXCLUDED.variant_id,
                tier = EXCLUDED.tier,
                status = EXCLUDED.status,
                renews_at = EXCLUDED.renews_at,
                ends_at = EXCLUDED.ends_at,
                updated_at = now()
            "#,
        )
        .bind(&record.provider_subscription_id)
        .bind(record.user_id)
        .bind(&record.user_email)
        .bind(record.customer_id as i64)
        .bind(record.variant_id as i64)
        .bind(&record.tier)
        .bind(&record.status)
        .bind(record.renews_at)
        .bind(record.ends_at)
        .execute(&mut *tx)
        .await?;

        sync_profile_tier(&mut tx, record.user_id, record.user_email.as_deref(), &record.tier)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn set_subscription_status(
        &self,
        provider_subscription_id: &str,
        status: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $1, updated_at = now() WHERE provider_subscription_id = $2",
        )
        .bind(status)
        .bind(provider_subscription_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_order(&self, order: &OrderRecord) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders
                (provider_order_id, user_id, user_email, customer_id, variant_id,
                 tier, status, total, currency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
            ON CONFLICT (provider_order_id) DO NOTHING
            "#,
        )
        .bind(&order.provider_order_id)
        .bind(order.user_id)
        .bind(&order.user_email)
        .bind(order.customer_id as i64)
        .bind(order.variant_id as i64)
        .bind(&order.tier)
        .bind(&order.status)
        .bind(order.total)
        .bind(&order.currency)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Redelivered webhooks must not re-apply the tier.
        if inserted > 0 {
            sync_profile_tier(&mut tx, order.user_id, order.user_email.as_deref(), &order.tier)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Copies the tier onto the owning profile, matched by id first, then by email.
async fn sync_profile_tier(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Option<Uuid>,
    user_email: Option<&str>,
    tier: &str,
) -> Result<(), AppError> {
    match (user_id, user_email) {
        (Some(id), _) => {
            sqlx::query("UPDATE profiles SET subscription_tier = $1, updated_at = now() WHERE id = $2")
                .bind(tier)
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
        (None, Some(email)) => {
            sqlx::query(
                "UPDATE profiles SET subscription_tier = $1, updated_at = now() WHERE lower(email) = lower($2)",
            )
            .bind(tier)
            .bind(email)
            .execute(&mut **tx)
            .await?;
        }
        (None, None) => {
            tracing::warn!(%tier, "no user id or email on billing record; profile tier not updated");
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct MemoryState {
        pub events: Vec<String>,
        pub subscriptions: HashMap<String, SubscriptionRecord>,
        pub orders: Vec<OrderRecord>,
    }

    /// In-memory `BillingStore` for router tests.
    #[derive(Debug, Default)]
    pub struct MemoryBillingStore {
        pub state: Mutex<MemoryState>,
    }

    #[async_trait]
    impl BillingStore for MemoryBillingStore {
        async fn record_webhook_event(&self, event_name: &str, _payload: &Value) -> Result<(), AppError> {
            self.state.lock().unwrap().events.push(event_name.to_string());
            Ok(())
        }

        async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<(), AppError> {
            self.state
                .lock()
                .unwrap()
                .subscriptions
                .insert(record.provider_subscription_id.clone(), record.clone());
            Ok(())
        }

        async fn set_subscription_status(
            &self,
            provider_subscription_id: &str,
            status: &str,
        ) -> Result<bool, AppError> {
            let mut state = self.state.lock().unwrap();
            match state.subscriptions.get_mut(provider_subscription_id) {
                Some(record) => {
                    record.status = status.to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn record_order(&self, order: &OrderRecord) -> Result<(), AppError> {
            let mut state = self.state.lock().unwrap();
            if !state
                .orders
                .iter()
                .any(|o| o.provider_order_id == order.provider_order_id)
            {
                state.orders.push(order.clone());
            }
            Ok(())
        }
    }
}
