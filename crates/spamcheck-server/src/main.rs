//! spamcheck server
//!
//! Serves the SMS spam classifier over HTTP, and provides offline commands
//! to fit a vocabulary and to classify a single message.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use spamcheck_classifiers::{
    load_corpus, SpamClassificationService, TextNormalizer, TfidfVectorizer, VectorizerOptions,
};
use spamcheck_core::RawText;
use spamcheck_server::{create_router, AppState, ConfigOverrides, ServerConfig};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut overrides = ConfigOverrides {
        model_dir: cli.model_dir.clone(),
        ..Default::default()
    };
    if let Commands::Serve {
        listen,
        port,
        history,
    } = &cli.command
    {
        overrides.listen = listen.clone();
        overrides.port = *port;
        overrides.history_path = history.clone();
    }

    let config = ServerConfig::load(&cli.config, &overrides)?;
    info!("Configuration loaded");

    match cli.command {
        Commands::Serve { .. } => serve(config).await,
        Commands::Fit {
            corpus,
            output,
            min_df,
            sublinear_tf,
            no_smooth_idf,
            norm,
        } => {
            let options = VectorizerOptions {
                smooth_idf: !no_smooth_idf,
                sublinear_tf,
                norm,
                min_df,
            };
            let output = output.unwrap_or_else(|| config.model.vocabulary_path());
            fit(&config, &corpus, &output, options)
        }
        Commands::Classify { text } => classify(config, text),
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    info!("Starting spamcheck server");

    let metrics_handle = init_metrics()?;
    let addr: SocketAddr = config.server.socket_addr()?;

    // Artifact loading is blocking file IO
    let state = tokio::task::spawn_blocking(move || AppState::new(config, metrics_handle)).await?;
    info!(
        "Application state initialized (model loaded: {})",
        state.service.is_ready()
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn fit(
    config: &ServerConfig,
    corpus_path: &std::path::Path,
    output: &std::path::Path,
    options: VectorizerOptions,
) -> Result<()> {
    let corpus = load_corpus(corpus_path)?;
    info!("Fitting vocabulary on {} documents from {}", corpus.len(), corpus_path.display());

    let normalizer = TextNormalizer::from_config(&config.model.preprocessing);
    let vectorizer = TfidfVectorizer::fit(corpus.as_slice(), &normalizer, options)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    vectorizer.save(output)?;

    info!(
        "Wrote vocabulary ({} terms) to {}",
        vectorizer.dimension(),
        output.display()
    );
    Ok(())
}

fn classify(config: ServerConfig, text: String) -> Result<()> {
    let service = SpamClassificationService::new(config.model);
    service.initialize();
    if !service.is_ready() {
        anyhow::bail!(
            "model not loaded: {}",
            service.unready_reason().unwrap_or("unknown reason")
        );
    }

    let text = RawText::new(text, service.max_text_chars())?;
    let result = service.predict(&text)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("spamcheck=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spamcheck=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "spamcheck_requests_total",
        "Total number of API requests by endpoint"
    );
    metrics::describe_counter!(
        "spamcheck_predictions_total",
        "Total number of predictions by label"
    );
    metrics::describe_counter!("spamcheck_cache_hits_total", "Prediction cache hits");
    metrics::describe_counter!("spamcheck_cache_misses_total", "Prediction cache misses");
    metrics::describe_counter!(
        "spamcheck_rate_limited_total",
        "Classify requests rejected by the rate limiter"
    );
    metrics::describe_histogram!(
        "spamcheck_inference_latency_us",
        metrics::Unit::Microseconds,
        "Pipeline execution latency in microseconds"
    );
    metrics::describe_counter!("spamcheck_errors_total", "Total number of errors by kind");

    info!("Metrics exporter initialized");
    Ok(handle)
}
