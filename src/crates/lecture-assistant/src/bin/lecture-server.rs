//! Lecture research server binary
//!
//! Wires the configured LLM and search clients into the research graph and
//! serves it over the REST API.

use anyhow::Context;
use clap::Parser;
use lecture_assistant::api::create_router;
use lecture_assistant::audit::{AuditSink, JsonlAuditSink};
use lecture_assistant::clients::{HttpPageFetcher, OpenAiChatClient, TavilyClient};
use lecture_assistant::config::{AppConfig, StorageBackend};
use lecture_assistant::prompts::PromptLibrary;
use lecture_assistant::state::RunState;
use lecture_assistant::steps::StepContext;
use lecture_assistant::{build_graph, ResearchService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use workflow_checkpoint::{CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore};

#[derive(Debug, Parser)]
#[command(name = "lecture-server", version, about = "Lecture research assistant API server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::load().context("loading configuration")?,
    };
    config.apply_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    tracing::info!(model = %config.llm.model, "LLM configured");
    tracing::info!(backend = ?config.storage.backend, "Checkpoint storage");

    let llm = OpenAiChatClient::new(
        config.llm.api_key.clone(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.temperature,
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    let search = TavilyClient::new(
        config.search.api_key.clone(),
        config.search.base_url.clone(),
        Duration::from_secs(config.search.timeout_secs),
    )?;
    let fetcher = HttpPageFetcher::new(Duration::from_secs(config.search.fetch_timeout_secs))?;

    let prompts = match &config.prompts.dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Loading prompt overrides");
            PromptLibrary::load_dir(dir).with_context(|| format!("reading prompts from {}", dir.display()))?
        }
        None => PromptLibrary::new(),
    };

    let ctx = StepContext::new(Arc::new(llm), Arc::new(search), Arc::new(fetcher))
        .with_prompts(prompts)
        .with_max_results(config.search.max_results);

    let audit: Option<Arc<dyn AuditSink>> = if config.audit.enabled {
        tracing::info!(dir = %config.audit.dir.display(), "Audit log enabled");
        Some(Arc::new(JsonlAuditSink::new(config.audit.dir.clone())))
    } else {
        None
    };

    let graph = build_graph(&ctx, audit)?;

    let store: Arc<dyn CheckpointStore<RunState>> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryCheckpointStore::new()),
        StorageBackend::File => {
            let path = &config.storage.path;
            tracing::info!(path = %path.display(), "Opening checkpoint directory");
            Arc::new(FileCheckpointStore::open(path.clone()).await?)
        }
    };

    let service = Arc::new(ResearchService::with_store(graph, store));
    let app = create_router(service, &config.server.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    tracing::info!("Starting lecture server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Lecture server shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
