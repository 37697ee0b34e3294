//! Script tag management: `list`, `create` and `delete` behind one route.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use trustloop_core::{ScriptTag, ScriptTagId};

use super::{CredentialFields, MISSING_PARAMETERS, parse_body, post_route, present};
use crate::error::AppError;
use crate::state::AppState;

/// Build the script tags router.
pub fn router() -> Router<AppState> {
    Router::new().route("/shopify-script-tags", post_route(script_tags))
}

/// Request for a script tag operation.
#[derive(Debug, Deserialize)]
pub struct ScriptTagsRequest {
    #[serde(flatten)]
    pub credentials: CredentialFields,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    /// Tag ID as a JSON number or string.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// Operations the route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptTagAction {
    List,
    Create { src: String },
    Delete { id: ScriptTagId },
}

impl ScriptTagsRequest {
    /// Resolve the requested action and its parameters.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a missing or unknown action, or a
    /// missing action parameter.
    pub fn action(&mut self) -> Result<ScriptTagAction, AppError> {
        let Some(action) = present(self.action.take()) else {
            return Err(AppError::Validation(MISSING_PARAMETERS.to_string()));
        };

        match action.as_str() {
            "list" => Ok(ScriptTagAction::List),
            "create" => present(self.src.take())
                .map(|src| ScriptTagAction::Create { src })
                .ok_or_else(|| {
                    AppError::Validation("src parameter required for create action".to_string())
                }),
            "delete" => {
                let id = self
                    .id
                    .take()
                    .filter(|v| !v.is_null() && v.as_str().is_none_or(|s| !s.trim().is_empty()))
                    .ok_or_else(|| {
                        AppError::Validation(
                            "id parameter required for delete action".to_string(),
                        )
                    })?;
                let id = serde_json::from_value::<ScriptTagId>(id)
                    .map_err(|_| AppError::Validation("Invalid script tag id".to_string()))?;
                Ok(ScriptTagAction::Delete { id })
            }
            _ => Err(AppError::Validation("Invalid action".to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub script_tags: Vec<ScriptTag>,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub script_tag: ScriptTag,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: bool,
}

/// List, create or delete script tags on the shop.
///
/// # Errors
///
/// Returns 400 for missing credentials or parameters, an unknown action, or
/// a Shopify rejection.
#[instrument(skip(state, body))]
pub async fn script_tags(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let mut request: ScriptTagsRequest = parse_body(&body)?;
    let credentials = std::mem::take(&mut request.credentials).into_credentials()?;
    let action = request.action()?;
    let shopify = state.shopify();

    let response = match action {
        ScriptTagAction::List => {
            let script_tags = shopify
                .list_script_tags(&credentials)
                .await
                .map_err(|e| AppError::from_shopify(e, "Failed to list script tags"))?;
            Json(ListResponse {
                success: true,
                script_tags,
            })
            .into_response()
        }
        ScriptTagAction::Create { src } => {
            let script_tag = shopify
                .create_script_tag(&credentials, &src)
                .await
                .map_err(|e| AppError::from_shopify(e, "Failed to create script tag"))?;
            tracing::info!(shop = %credentials.shop(), id = %script_tag.id, src = %script_tag.src, "Script tag created");
            Json(CreateResponse {
                success: true,
                script_tag,
            })
            .into_response()
        }
        ScriptTagAction::Delete { id } => {
            shopify
                .delete_script_tag(&credentials, id)
                .await
                .map_err(|e| AppError::from_shopify(e, "Failed to delete script tag"))?;
            tracing::info!(shop = %credentials.shop(), %id, "Script tag deleted");
            Json(DeleteResponse {
                success: true,
                deleted: true,
            })
            .into_response()
        }
    };

    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{app, post_json, send};
    use super::*;

    fn request(body: serde_json::Value) -> ScriptTagsRequest {
        serde_json::from_value(body).unwrap()
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(message) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(
            request(json!({"action": "list"})).action().unwrap(),
            ScriptTagAction::List
        );
        assert_eq!(
            request(json!({"action": "create", "src": "https://cdn.example/trustloop-all.js"}))
                .action()
                .unwrap(),
            ScriptTagAction::Create {
                src: "https://cdn.example/trustloop-all.js".to_string()
            }
        );
    }

    #[test]
    fn test_delete_accepts_string_or_number_id() {
        for id in [json!(596_726_825), json!("596726825")] {
            assert_eq!(
                request(json!({"action": "delete", "id": id})).action().unwrap(),
                ScriptTagAction::Delete {
                    id: ScriptTagId::new(596_726_825)
                }
            );
        }
    }

    #[test]
    fn test_action_errors() {
        assert_eq!(
            message(request(json!({})).action().unwrap_err()),
            "Missing required parameters"
        );
        assert_eq!(
            message(request(json!({"action": "rename"})).action().unwrap_err()),
            "Invalid action"
        );
        assert_eq!(
            message(request(json!({"action": "create"})).action().unwrap_err()),
            "src parameter required for create action"
        );
        assert_eq!(
            message(request(json!({"action": "delete", "id": ""})).action().unwrap_err()),
            "id parameter required for delete action"
        );
        assert_eq!(
            message(request(json!({"action": "delete", "id": "abc"})).action().unwrap_err()),
            "Invalid script tag id"
        );
    }

    #[tokio::test]
    async fn test_credentials_checked_before_action() {
        let (status, body) = send(
            app(),
            post_json("/shopify-script-tags", r#"{"action":"list"}"#),
        )
        .await;
        assert_eq!(status.as_u16(), 400);
        assert_eq!(
            body,
            json!({"error": "Shop domain and access token are required"})
        );
    }

    #[tokio::test]
    async fn test_missing_src_never_reaches_shopify() {
        let (status, body) = send(
            app(),
            post_json(
                "/shopify-script-tags",
                r#"{"shop":"demo","accessToken":"tok","action":"create"}"#,
            ),
        )
        .await;
        assert_eq!(status.as_u16(), 400);
        assert_eq!(
            body,
            json!({"error": "src parameter required for create action"})
        );
    }
}
