//! TrustLoop CLI - connect a Shopify store and manage the storefront widget.
//!
//! # Usage
//!
//! ```bash
//! # Connect a store (verifies the token through the gateway)
//! tl-cli connect --shop demo --token shpat_...
//!
//! # Install the widget and register the fulfillment webhook
//! tl-cli install --widget-origin https://widgets.trustloop.app \
//!     --webhook-address https://api.trustloop.app/review-webhook
//!
//! # Remove every widget script tag
//! tl-cli uninstall
//! ```
//!
//! # Environment Variables
//!
//! - `TRUSTLOOP_GATEWAY_URL` - Gateway base URL (default `http://127.0.0.1:8787/`)
//! - `TRUSTLOOP_STORE` - JSON file holding the connection (default `trustloop-store.json`)
//! - `TRUSTLOOP_ACCESS_TOKEN` - Access token for `connect`
//! - `TRUSTLOOP_WIDGET_ORIGIN` / `TRUSTLOOP_WEBHOOK_ADDRESS` - Install targets

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(author, version, about = "TrustLoop store connection and widget tools")]
struct Cli {
    /// Gateway base URL
    #[arg(
        long,
        global = true,
        env = "TRUSTLOOP_GATEWAY_URL",
        default_value = "http://127.0.0.1:8787/"
    )]
    gateway_url: Url,

    /// JSON file holding the saved connection
    #[arg(
        long,
        global = true,
        env = "TRUSTLOOP_STORE",
        default_value = "trustloop-store.json"
    )]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a store's access token and save the connection
    Connect {
        /// Shop handle or domain (`demo`, `demo.myshopify.com`, or an admin URL)
        #[arg(short, long)]
        shop: String,

        /// Admin API access token
        #[arg(short, long, env = "TRUSTLOOP_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Forget the saved connection
    Disconnect,
    /// Show the saved connection and whether the widget is installed
    Status,
    /// List the store's products
    Products {
        /// Number of products (1-250, gateway default 50)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Install the widget script tag and the order webhook
    Install {
        /// Origin serving `trustloop-all.js`
        #[arg(long, env = "TRUSTLOOP_WIDGET_ORIGIN")]
        widget_origin: Url,

        /// Callback URL for `orders/fulfilled` webhooks (skipped if absent)
        #[arg(long, env = "TRUSTLOOP_WEBHOOK_ADDRESS")]
        webhook_address: Option<Url>,
    },
    /// Remove every widget script tag
    Uninstall,
    /// Print manual theme snippets
    Snippets {
        /// Origin serving the widget scripts
        #[arg(long, env = "TRUSTLOOP_WIDGET_ORIGIN")]
        widget_origin: Url,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tl_cli=info,trustloop_dashboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new(cli.gateway_url, cli.store)?;

    match cli.command {
        Commands::Connect { shop, token } => commands::shop::connect(&ctx, &shop, token).await?,
        Commands::Disconnect => commands::shop::disconnect(&ctx).await?,
        Commands::Status => commands::shop::status(&ctx).await?,
        Commands::Products { limit } => commands::shop::products(&ctx, limit).await?,
        Commands::Install {
            widget_origin,
            webhook_address,
        } => commands::widget::install(&ctx, widget_origin, webhook_address).await?,
        Commands::Uninstall => commands::widget::uninstall(&ctx).await?,
        Commands::Snippets { widget_origin } => commands::widget::snippets(&widget_origin),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_arguments() {
        let cli = Cli::try_parse_from([
            "tl-cli",
            "--gateway-url",
            "http://localhost:9999/",
            "install",
            "--widget-origin",
            "https://widgets.trustloop.app",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(cli.gateway_url.as_str(), "http://localhost:9999/");
        let Commands::Install {
            widget_origin,
            webhook_address,
        } = cli.command
        else {
            panic!("expected install");
        };
        assert_eq!(widget_origin.as_str(), "https://widgets.trustloop.app/");
        assert!(webhook_address.is_none());
    }
}
