//! Transdoc - Asynchronous Document Translation Daemon

mod config;

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transdoc_api_http::{router, AppState, HeaderAuthProvider};
use transdoc_core::application::worker::constants::DEFAULT_CLAIM_LIMIT;
use transdoc_core::application::{
    QueueConfig, TranslationQueue, TranslationWorker, WorkerConfig,
};
use transdoc_core::port::id_provider::UuidProvider;
use transdoc_core::port::time_provider::SystemTimeProvider;
use transdoc_infra_pdf::{HttpFontFetcher, LopdfExtractor, PrintpdfRenderer};
use transdoc_infra_sqlite::{create_pool, run_migrations, SqliteJobRepository};
use transdoc_infra_store::LocalDocumentStore;
use transdoc_provider_openai::{OpenAiConfig, OpenAiTranslator};

use config::DaemonConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env();

    // 2. Initialize logging
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("transdoc=info"))
        .expect("Failed to create env filter");

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Transdoc v{} starting...", VERSION);

    // 3. Initialize database
    info!(db_path = %config.db_path, "Initializing database...");
    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let job_repo = Arc::new(SqliteJobRepository::new(pool.clone()));
    let documents = Arc::new(LocalDocumentStore::new(
        pool.clone(),
        config.content_root.clone(),
    ));

    let provider = Arc::new(
        OpenAiTranslator::new(OpenAiConfig {
            api_key: config.provider_api_key.clone(),
            base_url: config.provider_base_url.clone(),
            model: config.provider_model.clone(),
            timeout_secs: config.provider_timeout_secs,
        })
        .map_err(|e| anyhow::anyhow!("Provider init failed: {}", e))?,
    );

    let font_cache = config
        .font_cache_dir
        .clone()
        .map(|dir| dir.join("fallback.ttf"));
    let fonts = Arc::new(
        HttpFontFetcher::new(config.font_url.clone(), font_cache)
            .map_err(|e| anyhow::anyhow!("Font fetcher init failed: {}", e))?,
    );

    let queue = Arc::new(TranslationQueue::new(
        job_repo,
        documents.clone(),
        id_provider,
        time_provider.clone(),
        QueueConfig {
            max_attempts: config.max_attempts,
            stall_threshold_minutes: config.stall_threshold_minutes,
        },
    ));
    let worker = Arc::new(TranslationWorker::new(
        queue.clone(),
        documents,
        provider,
        Arc::new(LopdfExtractor::new()),
        Arc::new(PrintpdfRenderer::new(fonts)),
        time_provider,
        WorkerConfig {
            batch_concurrency: config.batch_concurrency,
        },
    ));

    // 5. Startup stall recovery (jobs abandoned by a previous crash)
    match worker.recover_stalled_jobs().await {
        Ok(count) => info!(recovered_jobs = count, "Startup stall recovery completed"),
        Err(e) => error!(error = %e, "Startup stall recovery failed"),
    }

    // 6. Optional scheduled batch trigger, gated by the persisted run flag
    if config.process_interval_secs > 0 {
        let trigger_worker = worker.clone();
        let trigger_queue = queue.clone();
        let interval_secs = config.process_interval_secs;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;
                match trigger_queue.is_running().await {
                    Ok(true) => {
                        if let Err(e) =
                            trigger_worker.process_pending_jobs(DEFAULT_CLAIM_LIMIT).await
                        {
                            error!(error = %e, "Scheduled batch failed");
                        }
                    }
                    Ok(false) => {}
                    Err(e) => error!(error = %e, "Run-flag check failed"),
                }
            }
        });
        info!(interval_secs, "Scheduled batch trigger enabled");
    }

    // 7. Start HTTP server
    let app = router(AppState {
        queue,
        worker,
        auth: Arc::new(HeaderAuthProvider),
    });
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    // 8. Serve until shutdown signal
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received. Exiting gracefully...");
        })
        .await?;

    info!("Shutdown complete.");
    Ok(())
}
