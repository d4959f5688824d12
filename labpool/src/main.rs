use std::sync::Arc;

use labpool::{ComputeLab, ConsoleSink, LabConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    labpool::telemetry::init_tracing();

    let lab = ComputeLab::new(LabConfig::default(), Arc::new(ConsoleSink::new()))?;

    let shutdown = lab.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, closing the lab");
            shutdown.cancel();
        }
    });

    let report = lab.run().await;
    tracing::info!(report = %serde_json::to_string(&report)?, "Lab closed");

    Ok(())
}
