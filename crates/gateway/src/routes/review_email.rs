//! Review request email (simulated delivery).

use axum::{Json, Router, body::Bytes, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{parse_body, post_route, present};
use crate::error::AppError;
use crate::services::{EmailError, EmailTemplate, ReviewEmailContext, render};
use crate::state::AppState;

/// Build the review email router.
pub fn router() -> Router<AppState> {
    Router::new().route("/send-review-email", post_route(send_review_email))
}

/// Request to send one review request email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReviewEmailRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub shop_domain: Option<String>,
    #[serde(default)]
    pub review_link: Option<String>,
    #[serde(default)]
    pub template: Option<EmailTemplate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReviewEmailResponse {
    pub success: bool,
    pub message: String,
    pub email_id: String,
    pub sent_at: DateTime<Utc>,
}

/// Render a review request and hand it to the (simulated) mailer.
///
/// # Errors
///
/// Returns 400 when a recipient, customer or product is missing, or the
/// recipient is not a valid address.
#[instrument(skip(state, body))]
pub async fn send_review_email(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SendReviewEmailResponse>, AppError> {
    let request: SendReviewEmailRequest = parse_body(&body)?;

    let (Some(to), Some(customer_name), Some(product_name)) = (
        present(request.to),
        present(request.customer_name),
        present(request.product_name),
    ) else {
        return Err(AppError::Validation(
            "Missing required email parameters".to_string(),
        ));
    };

    let order_number = request.order_number.unwrap_or_default();
    let shop_domain = request.shop_domain.unwrap_or_default();
    let review_link = request.review_link.unwrap_or_default();

    let email = render(
        &request.template.unwrap_or_default(),
        &ReviewEmailContext {
            customer_name: &customer_name,
            product_name: &product_name,
            order_number: &order_number,
            review_link: &review_link,
            shop_domain: &shop_domain,
        },
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let sent = state.email().send(&to, &email).await.map_err(|e| match e {
        EmailError::InvalidAddress(address) => {
            AppError::Validation(format!("Invalid email address: {address}"))
        }
        EmailError::MessageBuild(e) => AppError::Internal(e.to_string()),
        EmailError::Template(e) => AppError::Internal(e.to_string()),
    })?;

    Ok(Json(SendReviewEmailResponse {
        success: true,
        message: "Review request email sent successfully".to_string(),
        email_id: sent.id,
        sent_at: sent.sent_at,
    }))
}
