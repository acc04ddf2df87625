use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use chat_relay_server::{
    build_router,
    config::{Settings, StorageBackend},
    database::{DbPool, PgChatStore},
    services::{
        conversation::{ChatStore, HistoryManager, MemoryChatStore},
        ChatService, LlmService,
    },
    state::AppState,
    utils::logger::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;

    info!("🚀 Starting chat relay server...");

    // Load configuration
    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    // Initialize store
    let (store, db_pool): (Arc<dyn ChatStore>, Option<DbPool>) = match settings.storage.backend {
        StorageBackend::Postgres => {
            let db_pool = DbPool::new(&settings.database).await?;
            db_pool.migrate().await?;
            info!("✅ Database connection established");
            (Arc::new(PgChatStore::new(db_pool.clone())), Some(db_pool))
        }
        StorageBackend::Memory => {
            info!("⚠️ Using in-memory store, history is lost on restart");
            (Arc::new(MemoryChatStore::new()), None)
        }
    };

    // Initialize services
    let history = Arc::new(HistoryManager::new(store, &settings.history));

    let llm_service = LlmService::new(settings.llm.clone())?;
    let options = llm_service.options();

    let chat_service = Arc::new(ChatService::new(
        history.clone(),
        Arc::new(llm_service),
        options,
        settings.prompts.system_prompt.clone(),
    ));

    let state = AppState {
        history,
        chat_service,
        history_config: settings.history.clone(),
    };

    let app = build_router(state);

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db_pool) = db_pool {
        db_pool.close().await;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
