use anyhow::Result;
use chargelog::tracker::{ChargeTracker, TrackerCommand};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Create tracker command channel
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel::<TrackerCommand>();

    // Initialize the tracker with command receiver
    let mut tracker = ChargeTracker::new(cmd_rx)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create tracker: {}", e))?;

    info!(
        "Chargelog charging session tracker {} starting up",
        env!("APP_VERSION")
    );

    // Stop the main loop on ctrl-c
    let shutdown = tracker.shutdown_handle();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(());
        }
    });

    match tracker.run().await {
        Ok(()) => {
            info!("Tracker shutdown complete");
            signal_task.abort();
            Ok(())
        }
        Err(e) => {
            error!("Tracker failed with error: {}", e);
            signal_task.abort();
            Err(anyhow::anyhow!("Tracker error: {}", e))
        }
    }
}
