// siegeplan entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Build the proxy client from SIEGEPLAN_PROXY_URL
// 3. Create channels and spawn the session loop and the renderer
// 4. Read commands from stdin until `quit` or EOF

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use siegeplan_app::command::{parse_line, Input, HELP};
use siegeplan_app::protocol::UserCommand;
use siegeplan_app::proxy::ProxyClient;
use siegeplan_app::render;
use siegeplan_app::session::{self, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("siegeplan starting up");

    let client = Arc::new(ProxyClient::from_env());
    info!(proxy = client.base_url(), "Using proxy");
    println!("siegeplan: plan Rainbow Six Siege attacks from real player stats.");
    println!("Proxy: {}. Type `help` for commands.\n", client.base_url());

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (event_tx, event_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);

    let session = Session::new(client.clone(), client, event_tx);
    let session_handle = tokio::spawn(async move {
        if let Err(e) = session::run(cmd_rx, event_rx, ui_tx, session).await {
            error!("Session loop error: {}", e);
        }
    });

    let render_handle = tokio::spawn(async move {
        while let Some(update) = ui_rx.recv().await {
            if let Some(text) = render::render_update(&update) {
                println!("{text}");
            }
        }
    });

    let _ = cmd_tx.send(UserCommand::Show).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_line(&line) {
            Ok(Input::Command(cmd)) => {
                let quit = cmd == UserCommand::Quit;
                if cmd_tx.send(cmd).await.is_err() || quit {
                    break;
                }
            }
            Ok(Input::Maps) => println!("{}", render::render_catalog()),
            Ok(Input::Help) => println!("{HELP}"),
            Ok(Input::Empty) => {}
            Err(e) => println!("! {e}"),
        }
    }

    drop(cmd_tx);
    let _ = session_handle.await;
    let _ = render_handle.await;

    info!("siegeplan shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal belongs to the prompt).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("siegeplan.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("siegeplan_app=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
