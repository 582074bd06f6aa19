use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, warn};

use crate::state::{Session, SessionError};

/// Mark `session` as running and spawn its broadcast loop.
///
/// The loop lives until the session's shutdown token is cancelled.
pub async fn start_broadcast_loop(
    session: Arc<Session>,
    period: Duration,
) -> Result<JoinHandle<()>, SessionError> {
    session.mark_running().await?;
    Ok(tokio::spawn(run_broadcast_loop(session, period)))
}

/// Tick every `period`, admitting pending players on each tick.
async fn run_broadcast_loop(session: Arc<Session>, period: Duration) {
    let shutdown = session.shutdown_token();
    let mut ticker = interval_at(Instant::now() + period, period);
    // A tick stalled behind the lock should not trigger a burst of catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        session = %session.code(),
        period_ms = period.as_millis() as u64,
        "broadcast loop started"
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(report) = session.promote_pending().await else {
                    continue;
                };
                if report.failed > 0 {
                    warn!(
                        session = %session.code(),
                        promoted = ?report.promoted,
                        delivered = report.delivered,
                        failed = report.failed,
                        "players admitted with delivery failures"
                    );
                } else {
                    debug!(
                        session = %session.code(),
                        promoted = ?report.promoted,
                        delivered = report.delivered,
                        "players admitted"
                    );
                }
            }
        }
    }

    info!(session = %session.code(), "broadcast loop stopped");
}
