use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::billing::events::{BillingEvent, SubscriptionChange, WebhookPayload};
use crate::billing::plans::{PlanCatalog, FREE_TIER};
use crate::billing::signature::verify_signature;
use crate::billing::store::{BillingStore, OrderRecord, SubscriptionRecord};
use crate::errors::AppError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-signature";

/// What applying a webhook did to stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    UnknownVariant(u64),
    UnknownSubscription,
    Ignored,
}

/// POST /api/v1/webhooks/lemon-squeezy
///
/// The raw body is verified against `X-Signature` before anything is parsed or
/// stored.
pub async fn handle_lemon_squeezy_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    let Some(provided) = provided else {
        warn!(body_bytes = body.len(), "webhook rejected: missing signature header");
        return Err(AppError::Unauthorized);
    };
    if !verify_signature(state.config.webhook_secret.as_bytes(), &body, provided) {
        warn!(body_bytes = body.len(), "webhook rejected: signature mismatch");
        return Err(AppError::Unauthorized);
    }

    let raw: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook body: {e}")))?;
    let payload: WebhookPayload = serde_json::from_value(raw.clone())
        .map_err(|e| AppError::Validation(format!("Unexpected webhook shape: {e}")))?;

    let store = state.billing_store.as_ref();
    store
        .record_webhook_event(&payload.meta.event_name, &raw)
        .await?;

    let event = BillingEvent::from_payload(&payload).map_err(|e| {
        AppError::Validation(format!(
            "Invalid attributes for {}: {e}",
            payload.meta.event_name
        ))
    })?;

    let outcome = apply_event(store, &state.config.plans, &payload, event).await?;
    info!(
        event = %payload.meta.event_name,
        data_type = %payload.data.kind,
        data_id = %payload.data.id,
        test_mode = payload.meta.test_mode,
        outcome = ?outcome,
        "webhook processed"
    );

    Ok(Json(json!({ "received": true })))
}

/// Maps a classified event onto store writes.
pub async fn apply_event(
    store: &dyn BillingStore,
    plans: &PlanCatalog,
    payload: &WebhookPayload,
    event: BillingEvent,
) -> Result<EventOutcome, AppError> {
    match event {
        BillingEvent::Subscription {
            change,
            subscription_id,
            attributes,
        } => {
            let tier = if change == SubscriptionChange::Expired {
                FREE_TIER.to_string()
            } else {
                match plans.tier_for(attributes.variant_id) {
                    Some(tier) => tier.to_string(),
                    None => {
                        warn!(
                            variant_id = attributes.variant_id,
                            %subscription_id,
                            "unknown plan variant, subscription left unchanged"
                        );
                        return Ok(EventOutcome::UnknownVariant(attributes.variant_id));
                    }
                }
            };

            store
                .upsert_subscription(&SubscriptionRecord {
                    provider_subscription_id: subscription_id,
                    user_id: payload.user_id(),
                    user_email: attributes.user_email,
                    customer_id: attributes.customer_id,
                    variant_id: attributes.variant_id,
                    tier,
                    status: attributes.status,
                    renews_at: attributes.renews_at,
                    ends_at: attributes.ends_at,
                })
                .await?;
            Ok(EventOutcome::Applied)
        }

        BillingEvent::PaymentSucceeded { subscription_id } => {
            set_status(store, &subscription_id, "active").await
        }
        BillingEvent::PaymentFailed { subscription_id } => {
            set_status(store, &subscription_id, "past_due").await
        }

        BillingEvent::OrderCreated { order_id, attributes } => {
            let variant_id = attributes.first_order_item.variant_id;
            let Some(tier) = plans.tier_for(variant_id) else {
                warn!(variant_id, %order_id, "unknown plan variant on order, not recorded");
                return Ok(EventOutcome::UnknownVariant(variant_id));
            };

            store
                .record_order(&OrderRecord {
                    provider_order_id: order_id,
                    user_id: payload.user_id(),
                    user_email: attributes.user_email,
                    customer_id: attributes.customer_id,
                    variant_id,
                    tier: tier.to_string(),
                    status: attributes.status,
                    total: attributes.total,
                    currency: attributes.currency,
                })
                .await?;
            Ok(EventOutcome::Applied)
        }

        BillingEvent::Ignored => Ok(EventOutcome::Ignored),
    }
}

async fn set_status(
    store: &dyn BillingStore,
    subscription_id: &str,
    status: &str,
) -> Result<EventOutcome, AppError> {
    if store.set_subscription_status(subscription_id, status).await? {
        Ok(EventOutcome::Applied)
    } else {
        warn!(%subscription_id, %status, "payment event for unknown subscription");
        Ok(EventOutcome::UnknownSubscription)
    }
}
