//! Dashboard installer driving the live gateway.

#![allow(clippy::unwrap_used)]

use trustloop_core::WebhookTopic;
use trustloop_dashboard::{InstallState, InstallTarget, Installer, WebhookOutcome};
use trustloop_integration_tests::TestContext;
use url::Url;

const WIDGET_SRC: &str = "https://widgets.trustloop.app/trustloop-all.js";
const WEBHOOK_ADDRESS: &str = "https://api.trustloop.app/review-webhook";

fn target(with_webhook: bool) -> InstallTarget {
    InstallTarget {
        widget_origin: Url::parse("https://widgets.trustloop.app").unwrap(),
        webhook_address: with_webhook.then(|| Url::parse(WEBHOOK_ADDRESS).unwrap()),
    }
}

#[tokio::test]
async fn test_install_reinstall_uninstall() {
    let ctx = TestContext::new().await;
    let foreign = ctx.shopify.seed_script_tag("https://cdn.other.app/chat.js");
    let mut installer = Installer::new(ctx.dashboard_client(), ctx.credentials());

    assert_eq!(installer.check().await.unwrap(), InstallState::NotInstalled);

    let report = installer.install(&target(true)).await.unwrap();
    assert_eq!(report.primary.src, WIDGET_SRC);
    assert_eq!(report.state, InstallState::Installed);
    let WebhookOutcome::Registered(webhook) = &report.secondary else {
        panic!("expected registered webhook, got {:?}", report.secondary);
    };
    assert_eq!(webhook.topic, WebhookTopic::OrdersFulfilled);
    assert_eq!(webhook.address, WEBHOOK_ADDRESS);

    // A second install adds a duplicate tag; the webhook conflict is benign.
    let again = installer.install(&target(true)).await.unwrap();
    assert_eq!(again.secondary, WebhookOutcome::AlreadyRegistered);
    assert_eq!(again.state, InstallState::Installed);
    assert_eq!(ctx.shopify.script_tags().len(), 3);
    assert_eq!(ctx.shopify.webhooks().len(), 1);

    let removed = installer.uninstall().await.unwrap();
    assert_eq!(removed.removed.len(), 2);
    assert_eq!(removed.state, InstallState::NotInstalled);
    assert_eq!(installer.state(), InstallState::NotInstalled);

    let remaining = ctx.shopify.script_tags();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, foreign);
}

#[tokio::test]
async fn test_install_without_webhook_address() {
    let ctx = TestContext::new().await;
    let mut installer = Installer::new(ctx.dashboard_client(), ctx.credentials());

    let report = installer.install(&target(false)).await.unwrap();

    assert_eq!(report.secondary, WebhookOutcome::Skipped);
    assert!(ctx.shopify.webhooks().is_empty());
    assert_eq!(installer.check().await.unwrap(), InstallState::Installed);
}

#[tokio::test]
async fn test_failed_delete_keeps_installed() {
    let ctx = TestContext::new().await;
    let mut installer = Installer::new(ctx.dashboard_client(), ctx.credentials());

    let first = installer.install(&target(false)).await.unwrap().primary;
    installer.install(&target(false)).await.unwrap();
    ctx.shopify.fail_delete(first.id);

    let err = installer.uninstall().await.unwrap_err();

    assert_eq!(err.message(), "Failed to delete script tag");
    assert_eq!(installer.state(), InstallState::Installed);
    assert!(ctx.shopify.script_tags().iter().any(|tag| tag.id == first.id));
}

#[tokio::test]
async fn test_revoked_token_surfaces_gateway_message() {
    let ctx = TestContext::new().await;
    ctx.shopify.revoke_token();
    let mut installer = Installer::new(ctx.dashboard_client(), ctx.credentials());

    let err = installer.install(&target(true)).await.unwrap_err();

    assert_eq!(
        err.message(),
        "Invalid access token. Please check your private app credentials."
    );
    assert_eq!(installer.state(), InstallState::Unknown);
}

#[tokio::test]
async fn test_origin_with_path_keeps_directory() {
    let ctx = TestContext::new().await;
    let mut installer = Installer::new(ctx.dashboard_client(), ctx.credentials());
    let target = InstallTarget {
        widget_origin: Url::parse("https://cdn.trustloop.app/v2").unwrap(),
        webhook_address: None,
    };

    let report = installer.install(&target).await.unwrap();

    assert_eq!(report.primary.src, "https://cdn.trustloop.app/v2/trustloop-all.js");
    assert_eq!(ctx.shopify.script_tags()[0].src, report.primary.src);
}
