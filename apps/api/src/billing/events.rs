//! Lemon Squeezy webhook payloads.
//!
//! Envelope: `{ "meta": { "event_name", "custom_data" }, "data": { "type", "id", "attributes" } }`.
//! Attributes are decoded lazily per event type, so unknown events never fail parsing.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub meta: WebhookMeta,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMeta {
    pub event_name: String,
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub custom_data: Option<CustomData>,
}

/// Checkout passthrough data set by the front end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomData {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Value,
}

impl WebhookPayload {
    /// Account the checkout was started from, if the front end passed one.
    pub fn user_id(&self) -> Option<Uuid> {
        self.meta
            .custom_data
            .as_ref()
            .and_then(|c| c.user_id.as_deref())
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionAttributes {
    pub customer_id: u64,
    pub variant_id: u64,
    pub status: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub renews_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceAttributes {
    pub subscription_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderAttributes {
    pub customer_id: u64,
    pub status: String,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Minor currency units.
    pub total: i64,
    pub currency: String,
    pub first_order_item: OrderItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub variant_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    Created,
    Updated,
    Resumed,
    Unpaused,
    Paused,
    Cancelled,
    Expired,
}

/// A webhook classified by what it means for stored subscription state.
#[derive(Debug, Clone)]
pub enum BillingEvent {
    Subscription {
        change: SubscriptionChange,
        subscription_id: String,
        attributes: SubscriptionAttributes,
    },
    PaymentSucceeded {
        subscription_id: String,
    },
    PaymentFailed {
        subscription_id: String,
    },
    OrderCreated {
        order_id: String,
        attributes: OrderAttributes,
    },
    Ignored,
}

impl BillingEvent {
    /// Classifies a payload. Fails only when a handled event carries attributes of
    /// the wrong shape.
    pub fn from_payload(payload: &WebhookPayload) -> Result<Self, serde_json::Error> {
        let change = match payload.meta.event_name.as_str() {
            "subscription_created" => Some(SubscriptionChange::Created),
            "subscription_updated" => Some(SubscriptionChange::Updated),
            "subscription_resumed" => Some(SubscriptionChange::Resumed),
            "subscription_unpaused" => Some(SubscriptionChange::Unpaused),
            "subscription_paused" => Some(SubscriptionChange::Paused),
            "subscription_cancelled" => Some(SubscriptionChange::Cancelled),
            "subscription_expired" => Some(SubscriptionChange::Expired),
            _ => None,
        };
        if let Some(change) = change {
            return Ok(BillingEvent::Subscription {
                change,
                subscription_id: payload.data.id.clone(),
                attributes: SubscriptionAttributes::deserialize(&payload.data.attributes)?,
            });
        }

        Ok(match payload.meta.event_name.as_str() {
            "subscription_payment_success" | "subscription_payment_recovered" => {
                let invoice = InvoiceAttributes::deserialize(&payload.data.attributes)?;
                BillingEvent::PaymentSucceeded {
                    subscription_id: invoice.subscription_id.to_string(),
                }
            }
            "subscription_payment_failed" => {
                let invoice = InvoiceAttributes::deserialize(&payload.data.attributes)?;
                BillingEvent::PaymentFailed {
                    subscription_id: invoice.subscription_id.to_string(),
                }
            }
            "order_created" => BillingEvent::OrderCreated {
                order_id: payload.data.id.clone(),
                attributes: OrderAttributes::deserialize(&payload.data.attributes)?,
            },
            _ => BillingEvent::Ignored,
        })
    }
}

#[cfg(test)]
pub(crate) mod samples {
    use serde_json::{json, Value};

    pub const USER_ID: &str = "7f1c2a4e-5b3d-4c8e-9a10-2b3c4d5e6f70";

    pub fn subscription_event(event_name: &str, variant_id: u64, status: &str) -> Value {
        json!({
            "meta": {
                "event_name": event_name,
                "test_mode": true,
                "custom_data": { "user_id": USER_ID }
            },
            "data": {
                "type": "subscriptions",
                "id": "42",
                "attributes": {
                    "store_id": 1,
                    "customer_id": 555,
                    "product_id": 77,
                    "variant_id": variant_id,
                    "status": status,
                    "user_email": "jane@example.com",
                    "renews_at": "2026-11-18T00:00:00.000000Z",
                    "ends_at": null
                }
            }
        })
    }

    pub fn invoice_event(event_name: &str) -> Value {
        json!({
            "meta": { "event_name": event_name },
            "data": {
                "type": "subscription-invoices",
                "id": "inv_9",
                "attributes": { "subscription_id": 42, "status": "paid" }
            }
        })
    }

    pub fn order_event(variant_id: u64) -> Value {
        json!({
            "meta": {
                "event_name": "order_created",
                "custom_data": { "user_id": USER_ID }
            },
            "data": {
                "type": "orders",
                "id": "7",
                "attributes": {
                    "customer_id": 555,
                    "status": "paid",
                    "user_email": "jane@example.com",
                    "total": 4900,
                    "currency": "USD",
                    "first_order_item": { "variant_id": variant_id, "product_id": 77 }
                }
            }
        })
    }
}
