//! # herd — her daemon
//!
//! Composition root that wires all adapters together and runs the hub.
//!
//! ## Responsibilities
//! - Parse configuration (CLI argument, env vars, config file)
//! - Initialise `tracing`
//! - Construct the MQTT bus, the Telegram notifier and the webhook intake
//! - Hand them to the orchestrator and wait for SIGINT/SIGTERM
//! - Turn the outcome into the process exit code
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no routing logic belongs here.

mod config;
mod os_signals;

use std::error::Error;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use her_adapter_http_axum::{WebhookError, WebhookIntake};
use her_adapter_mqtt::MqttBus;
use her_adapter_telegram::{TelegramError, TelegramNotifier};
use her_app::orchestrator::Hub;
use her_domain::error::HubError;

use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let argument = std::env::args().nth(1);
    if argument.as_deref() == Some("--version") {
        println!("herd {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let path = config::resolve_path(argument, std::env::var("HER_CONFIG").ok());
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("herd: {}", report(&err));
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), config = %path.display(), "starting herd");

    let hub = Hub::new(config.hub_config());
    let result = hub
        .run(
            async { Ok::<_, HubError>(MqttBus::new(&config.mqtt)) },
            async { TelegramNotifier::new(&config.bot.telegram).map_err(TelegramError::into_domain) },
            async {
                WebhookIntake::bind(&config.webhook, config.intents.clone())
                    .await
                    .map_err(WebhookError::into_domain)
            },
            os_signals::shutdown_signal(),
        )
        .await;

    match result {
        Ok(()) => {
            tracing::info!("herd stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %report(&err), "herd failed");
            ExitCode::FAILURE
        }
    }
}

/// Render an error with its whole source chain on one line.
fn report(err: &dyn Error) -> String {
    let mut line = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        line.push_str(": ");
        line.push_str(&cause.to_string());
        source = cause.source();
    }
    line
}
