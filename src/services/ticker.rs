// Author: Dustin Pilgrim
// License: MIT

use crate::core::manager_msg::ManagerMsg;

use tokio::sync::mpsc::Sender;
use tokio::time::{sleep, Duration};

/// Fixed-period timer: sends `make()` every `period` until the receiver is gone
/// or the task is aborted.
pub async fn run_ticker<F>(label: &'static str, period: Duration, tx: Sender<ManagerMsg>, make: F)
where
    F: Fn() -> ManagerMsg + Send + 'static,
{
    tracing::debug!("{label} ticker started ({}ms)", period.as_millis());

    loop {
        sleep(period).await;

        // If the monitor is gone, stop.
        if tx.send(make()).await.is_err() {
            tracing::debug!("{label} ticker stopping (receiver dropped)");
            break;
        }
    }
}
