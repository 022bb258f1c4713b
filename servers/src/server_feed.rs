use anyhow::Result;
use tokio::signal;
use tokio_util::sync::CancellationToken;

mod feed_logic;
use feed_logic::{config, downstream, producer, report, state};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config();
    let log_path = lib_pulse::loggers::setup_logging(&config.log_dir(), config.log_level(), "server_feed")?;
    log::info!("Logging to {}", log_path.display());

    if config.once() {
        let report = report::analyze_video(&config)?;
        for line in report::render(&report) {
            log::info!("{}", line);
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let feed_state = state::FeedState::new(config.history_capacity());

    let producer_handle = tokio::spawn(producer::run(
        config.clone(),
        feed_state.clone(),
        shutdown.child_token(),
    ));

    let downstream_handle = tokio::spawn(downstream::run(
        config.port(),
        feed_state.clone(),
        shutdown.child_token(),
    ));

    wait_for_signal().await;

    // Send shutdown signal to all components
    shutdown.cancel();

    // Wait for components to shut down
    let (produced, served) = tokio::try_join!(producer_handle, downstream_handle)?;
    produced?;
    served?;

    log::info!("Shutdown complete.");
    Ok(())
}

async fn wait_for_signal() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = terminate() => {
            log::info!("SIGTERM received, initiating shutdown.");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut term_signal) => {
            term_signal.recv().await;
        }
        Err(e) => {
            log::error!("Cannot listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    // On non-unix platforms, just wait forever.
    std::future::pending::<()>().await;
}
