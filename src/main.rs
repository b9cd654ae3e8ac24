use std::path::{Path, PathBuf};
use std::sync::Arc;

use osint_relay::api::{ApiState, review_routes};
use osint_relay::channels::{MessageSource, TelegramIngestSource, TelegramPublisher};
use osint_relay::classifier::OpenAiClassifier;
use osint_relay::config::{RelayConfig, require_env};
use osint_relay::pipeline::{
    ContentFilter, FilterPolicy, MediaGate, Processor, Runner, Scorer, ScoringPolicy,
};
use osint_relay::store::{ItemStore, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env()?;
    if config.sources.is_empty() {
        eprintln!("Error: RELAY_SOURCES is empty");
        eprintln!("  export RELAY_SOURCES='[{{\"name\":\"somechannel\"}}]'");
        std::process::exit(1);
    }

    let bot_token = require_env("TELEGRAM_BOT_TOKEN")?;
    let output_chat = require_env("TELEGRAM_OUTPUT_CHAT_ID")?;
    let openai_key = require_env("OPENAI_API_KEY")?;

    let api_port: u16 = std::env::var("RELAY_API_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    eprintln!("📡 osint-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Sources: {}", config.sources.len());
    eprintln!("   Database: {}", config.db_path);
    eprintln!("   Review API: http://0.0.0.0:{api_port}/api/items");

    // ── Store ────────────────────────────────────────────────────────
    let store: Arc<dyn ItemStore> = Arc::new(
        LibSqlBackend::new_local(Path::new(&config.db_path))
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
                std::process::exit(1);
            }),
    );

    // ── Collaborators ────────────────────────────────────────────────
    let source: Arc<dyn MessageSource> = Arc::new(TelegramIngestSource::new(bot_token.clone()));
    let publisher = Arc::new(TelegramPublisher::new(bot_token, output_chat));
    let classifier = Arc::new(OpenAiClassifier::new(secrecy::SecretString::from(
        openai_key,
    ))?);

    let processor = Processor::new(
        Arc::clone(&store),
        Arc::clone(&source),
        classifier,
        publisher,
        ContentFilter::new(FilterPolicy::default()),
        Scorer::new(ScoringPolicy::default()),
        MediaGate::new(config.media_threshold),
        PathBuf::from(&config.media_dir),
    );

    // ── Review API ───────────────────────────────────────────────────
    let app = review_routes(ApiState {
        store: Arc::clone(&store),
        retention_days: config.retention_days,
    });
    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{api_port}"))
            .await
            .expect("Failed to bind review API port");
        tracing::info!(port = api_port, "Review API started");
        axum::serve(listener, app).await.ok();
    });

    // ── Ingestion loop ───────────────────────────────────────────────
    let runner = Runner::new(processor, source, store, config);
    runner.run_forever().await;

    Ok(())
}
