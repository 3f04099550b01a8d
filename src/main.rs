//! Falcon Assist - demo binary.
//!
//! Wires the real adapters from configuration and runs a single-session
//! conversation loop on stdin. The periodic expiry sweep runs alongside,
//! decoupled from request handling.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use falcon_assist::adapters::ai::{OpenRouterConfig, OpenRouterReasoning};
use falcon_assist::adapters::lookup::{
    HttpDirectoryService, HttpOrderPlacement, HttpProductLookup,
};
use falcon_assist::adapters::store::FileSessionStore;
use falcon_assist::application::{Assistant, AssistantConfig};
use falcon_assist::config::AppConfig;
use falcon_assist::domain::foundation::{SessionId, UserAuth};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let reasoning = Arc::new(OpenRouterReasoning::new(
        OpenRouterConfig::new(config.ai.api_key.clone().unwrap_or_default())
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries),
    ));
    let products = Arc::new(HttpProductLookup::new(
        config.lookup.base_url.clone(),
        config.lookup.timeout(),
    ));
    let directory = Arc::new(HttpDirectoryService::new(
        config.lookup.base_url.clone(),
        config.lookup.timeout(),
    ));
    let orders = Arc::new(HttpOrderPlacement::new(
        config.lookup.base_url.clone(),
        config.lookup.timeout(),
    ));
    let store = Arc::new(FileSessionStore::new(&config.session.store_path));

    let assistant = Arc::new(Assistant::new(
        store,
        reasoning,
        products,
        directory,
        orders,
        AssistantConfig {
            retention_hours: config.session.retention_hours,
            history_window: config.session.history_window,
        },
    ));

    let sweeper = Arc::clone(&assistant);
    let sweep_interval = config.session.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = sweeper.sweep_expired().await {
                tracing::warn!(error = %err, "expiry sweep failed");
            }
        }
    });

    let token = config
        .lookup
        .user_token
        .clone()
        .ok_or("FALCON_ASSIST__LOOKUP__USER_TOKEN is required")?;
    let user_auth = UserAuth::new(token)?;
    let session_id = SessionId::generate();

    println!("falcon-assist ready (session {}). Type a message, or 'exit' to quit.", session_id);
    prompt()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            prompt()?;
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = assistant
            .handle_turn(session_id.clone(), user_auth.clone(), text)
            .await;
        println!("{}\n", reply);
        prompt()?;
    }

    Ok(())
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}
