//! Order webhooks from Shopify.
//!
//! Shopify retries any delivery that does not get a 2xx, so once a request
//! is well-formed (headers, signature, JSON body) it is always acknowledged.
//! Downstream failures, panics included, are logged and swallowed.

use std::panic::AssertUnwindSafe;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use futures::FutureExt;
use serde::Serialize;
use tracing::instrument;
use trustloop_core::{OrderEvent, ShopDomain, WebhookTopic};

use super::{method_not_allowed, parse_body};
use crate::error::AppError;
use crate::middleware::webhook_preflight;
use crate::services::{ReviewRequest, SchedulerError};
use crate::shopify::verify_webhook;
use crate::state::AppState;

pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";
pub const TOPIC_HEADER: &str = "x-shopify-topic";
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Build the review webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/review-webhook",
        axum::routing::post(receive)
            .options(webhook_preflight)
            .fallback(method_not_allowed),
    )
}

/// Acknowledgment sent to Shopify.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

/// Errors while handling an accepted webhook. Never reach Shopify.
#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error("Unreadable order payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Receive a Shopify order webhook.
///
/// # Errors
///
/// Returns 400 for missing headers or a non-JSON body, 401 for a bad
/// signature when a webhook secret is configured.
#[instrument(skip(state, headers, body), fields(shop, topic))]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let (Some(shop), Some(topic)) = (
        header(&headers, SHOP_DOMAIN_HEADER),
        header(&headers, TOPIC_HEADER),
    ) else {
        return Err(AppError::Validation("Missing required headers".to_string()));
    };

    let span = tracing::Span::current();
    span.record("shop", shop);
    span.record("topic", topic);

    if let Some(secret) = &state.config().webhooks.secret {
        verify_webhook(secret, &body, header(&headers, HMAC_HEADER)).map_err(|e| {
            tracing::warn!(error = %e, "Rejected webhook signature");
            AppError::Unauthorized("Invalid webhook signature".to_string())
        })?;
    }

    let payload: serde_json::Value = parse_body(&body)?;

    let shop = ShopDomain::normalize(shop);
    let Ok(topic) = topic.parse::<WebhookTopic>();

    tracing::info!("Received webhook");

    let outcome = AssertUnwindSafe(dispatch(&state, shop, &topic, payload))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, topic = %topic, "Webhook processing failed");
        }
        Err(_) => {
            tracing::error!(topic = %topic, "Webhook processing panicked");
        }
    }

    Ok(Json(WebhookAck { success: true }))
}

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn dispatch(
    state: &AppState,
    shop: ShopDomain,
    topic: &WebhookTopic,
    payload: serde_json::Value,
) -> Result<(), DispatchError> {
    match topic {
        WebhookTopic::OrdersFulfilled => {
            let order = serde_json::from_value::<OrderEvent>(payload)?.into_fulfilled(Utc::now());
            tracing::info!(order_id = %order.id, "Order fulfilled");

            let request =
                ReviewRequest::for_order(shop, order, state.config().reviews.request_delay());
            state.scheduler().schedule(request).await?;
        }
        WebhookTopic::OrdersPaid => {
            // Immediate review requests for digital goods hook in here.
            tracing::info!(order_id = %payload.get("id").unwrap_or(&serde_json::Value::Null), "Order paid");
        }
        WebhookTopic::Other(other) => {
            tracing::info!(topic = %other, "Ignoring unhandled webhook topic");
        }
    }

    Ok(())
}
