use std::{future::IntoFuture, sync::Arc, time::Duration};

use movie_link_bot::{
    api::{create_router, AppState},
    bot::{build_dispatcher, run_polling},
    config::{Config, UpdateMode},
    db::{CatalogStore, JsonFileStore},
    services::{ChatApi, TelegramClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_link_bot=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        mode = ?config.update_mode,
        scheme = %config.popularity_scheme,
        catalog = %config.catalog_path,
        channel = %config.channel_username,
        "Starting movie link bot"
    );

    let store: Arc<dyn CatalogStore> = Arc::new(JsonFileStore::new(
        config.catalog_path.clone(),
        config.popularity_scheme,
    ));
    let chat: Arc<dyn ChatApi> = Arc::new(TelegramClient::with_timeout(
        config.telegram_api_url.clone(),
        config.bot_token.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?);
    let dispatcher = build_dispatcher(&config, chat.clone(), store);

    let app = create_router(AppState::from_config(dispatcher.clone(), &config));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "HTTP server listening");
    let server = axum::serve(listener, app);

    match config.update_mode {
        UpdateMode::Webhook => {
            server.with_graceful_shutdown(shutdown_signal()).await?;
        }
        UpdateMode::Polling => {
            let timeout = config.poll_timeout_secs;
            tokio::select! {
                result = server.into_future() => result?,
                _ = run_polling(chat.as_ref(), &dispatcher, timeout) => {}
                _ = shutdown_signal() => {}
            }
        }
    }

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
