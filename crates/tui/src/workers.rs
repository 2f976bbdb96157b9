use std::{sync::Arc, time::Duration};

use api::PipelineClient;
use services::services::scanner::ScanService;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::events::AppEvent;

/// Pipeline list refresh period.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Poll the pipeline list for the app's lifetime.
///
/// Each refresh also arms the cache scanner, which gates itself on the
/// cool-down window and on being exclusive with itself, so the effective
/// scan rate stays at most hourly.
pub fn spawn_pipeline_poll(
    client: PipelineClient,
    scanner: Arc<ScanService>,
    tx: UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match client.list(None).await {
                Ok(pipelines) => {
                    if tx.send(AppEvent::Pipelines(Ok(pipelines.clone()))).is_err() {
                        break;
                    }
                    let scanner = scanner.clone();
                    let scan_tx = tx.clone();
                    tokio::spawn(async move {
                        let outcome = scanner.run(&pipelines).await;
                        let _ = scan_tx.send(AppEvent::ScanFinished(outcome));
                    });
                }
                Err(e) => {
                    if tx.send(AppEvent::Pipelines(Err(e))).is_err() {
                        break;
                    }
                }
            }
        }
    })
}
