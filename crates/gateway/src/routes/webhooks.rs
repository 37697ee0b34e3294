//! Webhook registration.

use axum::{Json, Router, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use trustloop_core::{WebhookRegistration, WebhookTopic};

use super::{CredentialFields, MISSING_PARAMETERS, parse_body, post_route, present};
use crate::error::AppError;
use crate::shopify::ShopifyError;
use crate::state::AppState;

const WEBHOOK_EXISTS: &str = "Webhook already exists";

/// Build the webhooks router.
pub fn router() -> Router<AppState> {
    Router::new().route("/shopify-webhooks", post_route(create_webhook))
}

/// Request to subscribe an address to a topic.
#[derive(Debug, Deserialize)]
pub struct CreateWebhookRequest {
    #[serde(flatten)]
    pub credentials: CredentialFields,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateWebhookResponse {
    pub success: bool,
    pub webhook: WebhookRegistration,
}

/// Register a JSON webhook for `topic` at `address`.
///
/// # Errors
///
/// Returns 400 for missing parameters, `already_exists` when the address is
/// already subscribed, or another Shopify rejection.
#[instrument(skip(state, body))]
pub async fn create_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateWebhookResponse>, AppError> {
    let request: CreateWebhookRequest = parse_body(&body)?;
    let credentials = request.credentials.into_credentials()?;

    let (Some(topic), Some(address)) = (present(request.topic), present(request.address)) else {
        return Err(AppError::Validation(MISSING_PARAMETERS.to_string()));
    };

    let Ok(topic) = topic.parse::<WebhookTopic>();
    let registration = WebhookRegistration::new(topic, address);

    let webhook = state
        .shopify()
        .create_webhook(&credentials, registration)
        .await
        .map_err(|e| match e {
            ShopifyError::Conflict(_) => {
                tracing::warn!(shop = %credentials.shop(), "Webhook already registered");
                AppError::Conflict(WEBHOOK_EXISTS.to_string())
            }
            e => AppError::from_shopify(e, "Failed to create webhook"),
        })?;

    tracing::info!(shop = %credentials.shop(), topic = %webhook.topic, address = %webhook.address, "Webhook registered");

    Ok(Json(CreateWebhookResponse {
        success: true,
        webhook,
    }))
}
