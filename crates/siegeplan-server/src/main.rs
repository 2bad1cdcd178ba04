// Proxy server entry point.
//
// Startup sequence:
// 1. Initialize tracing (stdout)
// 2. Load config; a missing credential aborts before binding
// 3. Build the upstream clients and the router
// 4. Bind and serve until Ctrl+C

use anyhow::Context;
use tracing::info;

use siegeplan_server::{api, build_state, config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("siegeplan proxy starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        port = config.server.port,
        model = %config.gemini.model,
        "Config loaded"
    );

    let app = api::router(build_state(&config));

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Proxy listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("siegeplan proxy shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("siegeplan_server=info,tower_http=info,warn")),
        )
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
