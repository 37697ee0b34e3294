//! Store connection commands.
//!
//! # Usage
//!
//! ```bash
//! tl-cli connect --shop demo --token shpat_...
//! tl-cli status
//! tl-cli products --limit 10
//! tl-cli disconnect
//! ```

use secrecy::SecretString;
use trustloop_dashboard::Installer;

use super::Context;

/// Verify the token and save the connection.
///
/// # Errors
///
/// Returns error if the gateway rejects the credentials or the store cannot
/// be written.
pub async fn connect(
    ctx: &Context,
    shop: &str,
    token: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let connection = ctx.session().connect(shop, SecretString::from(token)).await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Connected to {} ({})",
            connection.shop_name, connection.shop_domain
        );
        if let Some(plan) = &connection.plan {
            println!("  plan: {plan}");
        }
    }
    Ok(())
}

/// Forget the saved connection.
///
/// # Errors
///
/// Returns error if the store cannot be written.
pub async fn disconnect(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    ctx.session().disconnect().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Disconnected");
    }
    Ok(())
}

/// Show the connection and the widget's install state.
///
/// # Errors
///
/// Returns error if nothing is connected or the gateway cannot be reached.
pub async fn status(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let connection = ctx.connection().await?;
    let mut installer = Installer::new(ctx.gateway.clone(), connection.credentials());
    let state = installer.check().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} ({})", connection.shop_name, connection.shop_domain);
        println!("  connected at: {}", connection.connected_at.to_rfc3339());
        println!("  widget: {state:?}");
        for tag in installer.script_tags() {
            println!("  script tag {}: {}", tag.id, tag.src);
        }
    }
    Ok(())
}

/// List the store's products.
///
/// # Errors
///
/// Returns error if nothing is connected or the gateway rejects the call.
pub async fn products(ctx: &Context, limit: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let connection = ctx.connection().await?;
    let products = ctx
        .gateway
        .list_products(&connection.credentials(), limit)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!("{:>16}  {:>10}  {}", product.id, product.price, product.title);
        }
        println!("{} products", products.len());
    }
    Ok(())
}
