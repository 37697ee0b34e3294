//! Widget installation commands.
//!
//! # Usage
//!
//! ```bash
//! tl-cli install --widget-origin https://widgets.trustloop.app \
//!     --webhook-address https://api.trustloop.app/review-webhook
//! tl-cli uninstall
//! tl-cli snippets --widget-origin https://widgets.trustloop.app
//! ```

use trustloop_dashboard::{InstallTarget, Installer, WebhookOutcome, all_in_one, all_snippets};
use url::Url;

use super::Context;

/// Install the widget script tag and register the fulfillment webhook.
///
/// # Errors
///
/// Returns error if nothing is connected or the script tag cannot be
/// created. Webhook problems are reported, not returned.
pub async fn install(
    ctx: &Context,
    widget_origin: Url,
    webhook_address: Option<Url>,
) -> Result<(), Box<dyn std::error::Error>> {
    let connection = ctx.connection().await?;
    let target = InstallTarget {
        widget_origin,
        webhook_address,
    };
    let mut installer = Installer::new(ctx.gateway.clone(), connection.credentials());

    let report = installer.install(&target).await?;

    let webhook = match &report.secondary {
        WebhookOutcome::Registered(webhook) => format!("registered for {}", webhook.address),
        WebhookOutcome::AlreadyRegistered => "already registered".to_string(),
        WebhookOutcome::Failed(message) => format!("pending ({message})"),
        WebhookOutcome::Skipped => "skipped (no --webhook-address)".to_string(),
    };

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Widget installed on {}: script tag {} ({})",
            connection.shop_domain, report.primary.id, report.primary.src
        );
        println!("  orders/fulfilled webhook: {webhook}");
        println!("  state: {:?}", report.state);
    }
    Ok(())
}

/// Remove every widget script tag.
///
/// # Errors
///
/// Returns error if nothing is connected or a deletion fails.
pub async fn uninstall(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let connection = ctx.connection().await?;
    let mut installer = Installer::new(ctx.gateway.clone(), connection.credentials());

    let report = installer.uninstall().await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Removed {} script tag(s) from {}",
            report.removed.len(),
            connection.shop_domain
        );
        println!("  state: {:?}", report.state);
    }
    Ok(())
}

/// Print the manual-install snippets.
pub fn snippets(widget_origin: &Url) {
    #[allow(clippy::print_stdout)]
    {
        println!("<!-- All widgets -->");
        println!("{}", all_in_one(widget_origin));
        for snippet in all_snippets(widget_origin) {
            println!();
            println!("<!-- {}: {} -->", snippet.name, snippet.description);
            println!("{}", snippet.code);
        }
    }
}
