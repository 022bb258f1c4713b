use anyhow::{Context, Result};
use lib_pulse::IngestionFacade;
use tokio::signal;
use tokio::time::{Instant, MissedTickBehavior, interval};

mod monitor_logic;
use monitor_logic::{config, report};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config();
    lib_pulse::loggers::setup_logging(&config.log_dir(), config.log_level(), "pulse_monitor")?;

    let ingest = config.ingest_config().context("invalid ingestion settings")?;
    log::info!("Monitoring comment feed at {}", ingest.endpoint);

    let mut facade = IngestionFacade::new(ingest)?;
    let mode = facade.connect();
    log::info!("Ingestion started in {:?} mode.", mode);

    let mut snapshots = facade.subscribe();
    let mut throttle = report::ReportThrottle::new(config.report_interval());
    // Flushes a change the throttle held back once the interval has passed.
    let mut flush = interval(config.report_interval().max(std::time::Duration::from_secs(1)));
    flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending = true;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Ctrl-C received, initiating shutdown.");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    log::warn!("Ingestion stopped publishing.");
                    break;
                }
                pending = true;
            }
            _ = flush.tick() => {}
        }

        if pending && throttle.ready(Instant::now()) {
            let line = report::summarize(&snapshots.borrow_and_update(), &facade.status());
            log::info!("{}", line);
            pending = false;
        }
    }

    facade.shutdown().await;
    log::info!("Shutdown complete.");
    Ok(())
}
