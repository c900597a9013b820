//! relayctl CLI - operator tool
//!
//! Runs chat commands directly against the Hetzner Cloud API, checks the
//! server's health, or simulates an inbound WhatsApp message.

use clap::{Parser, Subcommand};
use relayctl_core::hetzner::DEFAULT_API_URL;
use relayctl_core::{CommandHandler, HetznerClient, HetznerConfig};
use reqwest::Client;
use serde_json::Value;
use std::process;
use std::time::Duration;
use tracing::{error, info};

/// relayctl CLI - Hetzner Cloud command relay tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a chat command locally and print the reply
    Run {
        /// Hetzner Cloud API token
        #[arg(long, env = "HETZNER_API_TOKEN", hide_env_values = true)]
        token: String,

        /// Hetzner Cloud API URL
        #[arg(long, env = "HETZNER_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Request timeout in seconds
        #[arg(long, env = "HETZNER_TIMEOUT_SECS", default_value_t = 10)]
        timeout_secs: u64,

        /// Command words, e.g. `status web-01`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Quick health check (for Docker healthcheck)
    Health {
        /// Server URL to connect to
        #[arg(short, long, default_value = "http://localhost:8080", env = "RELAYCTL_URL")]
        url: String,
    },

    /// Post a simulated WhatsApp message to the webhook
    Webhook {
        /// Server URL to connect to
        #[arg(short, long, default_value = "http://localhost:8080", env = "RELAYCTL_URL")]
        url: String,

        /// Sender number, e.g. +15551234567
        #[arg(short, long)]
        from: String,

        /// Message words
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = Client::new();

    let result = match cli.command {
        Commands::Run {
            token,
            api_url,
            timeout_secs,
            words,
        } => handle_run(token, api_url, timeout_secs, &words).await,
        Commands::Health { url } => handle_health(&client, &url).await,
        Commands::Webhook { url, from, words } => {
            handle_webhook(&client, &url, &from, &words).await
        }
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn handle_run(
    token: String,
    api_url: String,
    timeout_secs: u64,
    words: &[String],
) -> anyhow::Result<()> {
    let config = HetznerConfig::new(token)
        .with_base_url(api_url)
        .with_timeout(Duration::from_secs(timeout_secs));
    let handler = CommandHandler::new(HetznerClient::new(config)?);

    let reply = handler.handle(&words.join(" ")).await;
    println!("{}", reply);
    Ok(())
}

async fn handle_health(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let response = client.get(&url).send().await?;

    if response.status().is_success() {
        let json: Value = response.json().await?;
        println!("{}", serde_json::to_string_pretty(&json)?);
        Ok(())
    } else {
        anyhow::bail!("Health check failed with status: {}", response.status())
    }
}

async fn handle_webhook(
    client: &Client,
    base_url: &str,
    from: &str,
    words: &[String],
) -> anyhow::Result<()> {
    let url = format!("{}/api/webhook/twilio", base_url.trim_end_matches('/'));
    let from = relayctl_core::whatsapp_address(from);
    let body = words.join(" ");

    info!("Posting message to {}", url);
    let response = client
        .post(&url)
        .form(&[("From", from.as_str()), ("Body", body.as_str())])
        .send()
        .await?;

    if response.status().is_success() {
        println!("Accepted; the reply is delivered over WhatsApp");
        Ok(())
    } else {
        anyhow::bail!("Webhook rejected with status: {}", response.status())
    }
}
