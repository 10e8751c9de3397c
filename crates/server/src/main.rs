mod config;
mod http;
mod pipeline;
mod state;

use adapter::{AkismetClassifier, SpamCheck};
use anyhow::Context;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use http::router::build_router;
use pipeline::Pipeline;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("no-comment {} starting...", env!("CARGO_PKG_VERSION"));

    let settings = Settings::new().context("Failed to load configuration")?;

    let client = adapter::build_client(settings.timeout()).context("Failed to build HTTP client")?;

    let publisher = adapter::build_publisher(
        settings.publisher_config(),
        settings.git_target(),
        client.clone(),
    );

    // 开启后缺少凭据直接启动失败，而不是每个请求都当作网络错误放行
    let spam: Option<Arc<dyn SpamCheck>> = if settings.spam.enabled {
        let classifier = AkismetClassifier::new(client, settings.akismet_config())
            .context("Spam check is enabled but misconfigured")?;
        info!("Akismet spam check enabled");
        Some(Arc::new(classifier))
    } else {
        info!("Akismet spam check not configured, consider enabling it");
        None
    };

    let state = AppState {
        pipeline: Arc::new(Pipeline::new(spam, publisher, settings.allowed_domains())),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
