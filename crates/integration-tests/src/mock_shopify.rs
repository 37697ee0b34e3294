//! In-process stand-in for the Shopify Admin REST API.
//!
//! Serves `/{shop}/admin/api/{version}/...` the way the gateway addresses
//! it when `admin_origin` is set. Script tags and webhooks are kept in
//! memory; every request is recorded so tests can assert what reached
//! Shopify, or that nothing did.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use trustloop_core::{ScriptTag, ScriptTagId, WebhookRegistration};
use url::Url;

/// The only access token the mock accepts.
pub const VALID_TOKEN: &str = "tok";

/// The mock's shop.
pub const SHOP: &str = "demo.myshopify.com";

const TIMESTAMP: &str = "2024-01-15T10:30:00-05:00";

/// One request as the mock saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Debug, Default)]
struct Store {
    requests: Vec<RecordedRequest>,
    script_tags: Vec<Value>,
    webhooks: Vec<Value>,
    next_id: i64,
    revoked: bool,
    unavailable: bool,
    failing_delete: Option<i64>,
}

type Shared = Arc<Mutex<Store>>;

/// Handle on a running mock.
#[derive(Clone)]
pub struct MockShopify {
    origin: Url,
    store: Shared,
}

impl MockShopify {
    pub async fn start() -> Self {
        let store: Shared = Arc::new(Mutex::new(Store {
            next_id: 596_726_825,
            ..Store::default()
        }));
        let router = Router::new().fallback(handle).with_state(store.clone());
        let origin = crate::serve(router).await;
        Self { origin, store }
    }

    pub const fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.store.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.store.lock().unwrap().requests.len()
    }

    pub fn script_tags(&self) -> Vec<ScriptTag> {
        let tags = self.store.lock().unwrap().script_tags.clone();
        serde_json::from_value(Value::Array(tags)).unwrap()
    }

    pub fn webhooks(&self) -> Vec<WebhookRegistration> {
        let webhooks = self.store.lock().unwrap().webhooks.clone();
        serde_json::from_value(Value::Array(webhooks)).unwrap()
    }

    /// Add a script tag as if some other app had installed it.
    pub fn seed_script_tag(&self, src: &str) -> ScriptTagId {
        let mut store = self.store.lock().unwrap();
        let tag = store.new_script_tag(src);
        let id = tag["id"].as_i64().unwrap();
        store.script_tags.push(tag);
        ScriptTagId::new(id)
    }

    /// Make every further call fail with 401.
    pub fn revoke_token(&self) {
        self.store.lock().unwrap().revoked = true;
    }

    /// Make every further call fail with 503.
    pub fn go_down(&self) {
        self.store.lock().unwrap().unavailable = true;
    }

    /// Make deleting `id` fail with 500.
    pub fn fail_delete(&self, id: ScriptTagId) {
        self.store.lock().unwrap().failing_delete = Some(id.as_i64());
    }
}

impl Store {
    fn new_script_tag(&mut self, src: &str) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        json!({
            "id": id,
            "src": src,
            "event": "onload",
            "display_scope": "online_store",
            "created_at": TIMESTAMP,
            "updated_at": TIMESTAMP,
        })
    }
}

async fn handle(
    State(store): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut store = store.lock().unwrap();
    store.requests.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
    });

    if store.unavailable {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "errors": "Service Unavailable" })),
        )
            .into_response();
    }

    let token = headers
        .get("x-shopify-access-token")
        .and_then(|v| v.to_str().ok());
    if store.revoked || token != Some(VALID_TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "errors": "[API] Invalid API key or access token (unrecognized login or wrong password)"
            })),
        )
            .into_response();
    }

    let segments: Vec<&str> = uri.path().trim_start_matches('/').split('/').collect();
    let [shop, "admin", "api", _version, resource @ ..] = segments.as_slice() else {
        return not_found();
    };
    if *shop != SHOP {
        return not_found();
    }

    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match (method.as_str(), resource) {
        ("GET", ["shop.json"]) => Json(json!({ "shop": shop_resource() })).into_response(),
        ("GET", ["products.json"]) => {
            let limit = uri
                .query()
                .and_then(|q| q.strip_prefix("limit="))
                .and_then(|l| l.parse::<usize>().ok())
                .unwrap_or(50);
            let products: Vec<Value> = products().into_iter().take(limit).collect();
            Json(json!({ "products": products })).into_response()
        }
        ("GET", ["script_tags.json"]) => {
            Json(json!({ "script_tags": store.script_tags })).into_response()
        }
        ("POST", ["script_tags.json"]) => {
            let Some(src) = body["script_tag"]["src"].as_str() else {
                return unprocessable(json!({ "src": ["can't be blank"] }));
            };
            let tag = store.new_script_tag(src);
            store.script_tags.push(tag.clone());
            (StatusCode::CREATED, Json(json!({ "script_tag": tag }))).into_response()
        }
        ("DELETE", ["script_tags", file]) => {
            let Some(id) = file
                .strip_suffix(".json")
                .and_then(|id| id.parse::<i64>().ok())
            else {
                return not_found();
            };
            if store.failing_delete == Some(id) {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "errors": "Internal Server Error" })),
                )
                    .into_response();
            }
            let before = store.script_tags.len();
            store.script_tags.retain(|tag| tag["id"].as_i64() != Some(id));
            if store.script_tags.len() == before {
                return not_found();
            }
            Json(json!({})).into_response()
        }
        ("POST", ["webhooks.json"]) => {
            let webhook = &body["webhook"];
            let taken = store.webhooks.iter().any(|existing| {
                existing["topic"] == webhook["topic"] && existing["address"] == webhook["address"]
            });
            if taken {
                return unprocessable(json!({ "address": ["for this topic has already been taken"] }));
            }
            let id = store.next_id;
            store.next_id += 1;
            let created = json!({
                "id": id,
                "topic": webhook["topic"],
                "address": webhook["address"],
                "format": webhook["format"],
                "created_at": TIMESTAMP,
            });
            store.webhooks.push(created.clone());
            (StatusCode::CREATED, Json(json!({ "webhook": created }))).into_response()
        }
        _ => not_found(),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "errors": "Not Found" }))).into_response()
}

fn unprocessable(errors: Value) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "errors": errors })),
    )
        .into_response()
}

fn shop_resource() -> Value {
    json!({
        "id": 1,
        "name": "Demo",
        "email": "a@b.com",
        "domain": SHOP,
        "myshopify_domain": SHOP,
        "plan_name": "basic",
        "currency": "USD",
        "timezone": "UTC",
    })
}

fn products() -> Vec<Value> {
    vec![
        json!({
            "id": 632_910_392,
            "title": "Premium Wireless Headphones",
            "handle": "premium-wireless-headphones",
            "body_html": "<p>Crystal clear sound.</p>",
            "status": "active",
            "vendor": "Acme",
            "product_type": "Audio",
            "images": [{ "src": "https://cdn.shopify.com/headphones.jpg" }],
            "variants": [{ "price": "199.99", "compare_at_price": "249.99" }],
            "created_at": TIMESTAMP,
            "updated_at": TIMESTAMP,
        }),
        json!({
            "id": 921_728_736,
            "title": "Travel Case",
            "handle": "travel-case",
            "images": [],
            "variants": [{ "price": "29.00" }],
        }),
        json!({
            "id": 1_071_559_582,
            "title": "Gift Card",
            "variants": [],
        }),
    ]
}
