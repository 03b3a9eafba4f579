use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use redis::AsyncCommands;

use payment_gateway::command::CommandParser;
use payment_gateway::blockchain::is_valid_address;
use payment_gateway::config::{load_config, GatewayConfig};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the payment gateway", long_about = None)]
struct Cli {
    /// Gateway configuration; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run text through the sanitizer and parser
    Parse {
        /// Raw message text, e.g. "PAY 1.5 0x..."
        text: String,
    },
    /// Publish a request on the bus and wait for the reply
    Send {
        /// Raw message text
        text: String,
        /// Topic to publish on (defaults to the configured request topic)
        #[arg(short, long)]
        topic: Option<String>,
        /// Seconds to wait for the reply
        #[arg(long, default_value_t = 60)]
        wait: u64,
    },
    /// Check the gateway health endpoint
    Health {
        #[arg(short, long, default_value = "http://localhost:5000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    match cli.command {
        Commands::Parse { text } => {
            let parser = CommandParser::from_config(&config.commands);
            match parser.parse(&text, is_valid_address) {
                Ok(command) => println!("{}", serde_json::to_string_pretty(&command)?),
                Err(e) => {
                    eprintln!("Rejected: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Send { text, topic, wait } => {
            let topic = topic.unwrap_or_else(|| config.bus.request_topic.clone());
            let reply = send(&config, &topic, &text, Duration::from_secs(wait)).await?;
            match reply {
                Some(message) => println!("{}", message),
                None => {
                    eprintln!("No reply within {}s", wait);
                    std::process::exit(2);
                }
            }
        }
        Commands::Health { url } => {
            let res = reqwest::get(format!("{}/health", url.trim_end_matches('/'))).await?;
            let status = res.status();
            println!("{} {}", status.as_u16(), res.text().await.unwrap_or_default());
            if !status.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Subscribe to the response topic first so the reply cannot be missed.
async fn send(
    config: &GatewayConfig,
    topic: &str,
    text: &str,
    wait: Duration,
) -> Result<Option<String>, redis::RedisError> {
    let client = redis::Client::open(config.bus.redis_url.as_str())?;

    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(config.bus.response_topic()).await?;

    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: u64 = conn.publish(topic, text).await?;

    let mut messages = pubsub.on_message();
    match tokio::time::timeout(wait, messages.next()).await {
        Ok(Some(msg)) => Ok(Some(msg.get_payload::<String>()?)),
        _ => Ok(None),
    }
}
