//! Payment gateway (v1)
//!
//! Accepts `PAY|TRANSFER <amount> <0xaddress>` over SMS webhooks and a
//! message bus, and answers each request with a transaction id or a reason.
//!
//! # Architecture Overview
//!
//! ```text
//!   SMS provider ──POST──▶ http (webhook) ─┐
//!                                          ├─▶ dispatch ─▶ command (sanitize + parse)
//!   bus topic ──message──▶ bus (listener) ─┘       │
//!                                                  ├─▶ security (sender + rate limit)
//!                                                  ├─▶ blockchain (build, sign, submit)
//!                                                  └─▶ routing (reply)
//!                                                        ├─▶ telephony API
//!                                                        └─▶ bus response topic
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use payment_gateway::bus::BusListener;
use payment_gateway::config::load_config;
use payment_gateway::http::WebhookServer;
use payment_gateway::lifecycle::{build_gateway, drain_deadline, shutdown_on_signal, Shutdown};
use payment_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "payment-gateway")]
#[command(about = "SMS and message-bus payment gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // A missing .env is fine; secrets may come from the real environment.
    let _ = dotenvy::dotenv();

    let config = load_config(&args.config)?;
    logging::init(&config.observability);

    tracing::info!(
        config = %args.config.display(),
        webhook = %config.webhook.bind_address,
        bus_enabled = config.bus.enabled,
        chain_id = config.blockchain.chain_id,
        "payment-gateway v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = build_gateway(&config).await?;
    let shutdown = Shutdown::new();

    let bus_task = if config.bus.enabled {
        let listener = BusListener::new(config.bus.clone(), gateway.dispatcher.clone());
        Some(tokio::spawn(listener.run(shutdown.subscribe())))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.webhook.bind_address).await?;
    let server = WebhookServer::new(config.webhook.clone(), gateway.app_state());
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_on_signal(shutdown.clone()).await;

    server_task.await??;
    if let Some(task) = bus_task {
        task.await?;
    }

    // Adapters are closed; let accepted requests finish and reply.
    if !gateway.dispatcher.drain(drain_deadline(&config)).await {
        tracing::warn!(
            abandoned = gateway.dispatcher.in_flight(),
            "Exiting with requests still in flight"
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
