//! 对账调度器
//!
//! Request-triggered updates keep table status correct in response to
//! explicit actions, but elapsed time is not an event: nothing fires when a
//! reservation's window runs out. The reconciler polls on a fixed cadence,
//! expiring elapsed confirmed reservations and re-deriving every table's
//! status, so stored state converges on wall-clock reality.
//!
//! Registered as a `TaskKind::Periodic` background task; also triggered
//! manually through the admin API. Two runs never overlap - the in-progress
//! guard skips (and logs) re-entrant invocations instead of queueing them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::state::SyncHub;
use crate::utils::time;

use super::error::SchedulingResult;
use super::service::{ReconcileReport, ReservationService};

pub struct Reconciler {
    service: ReservationService,
    sync: Arc<SyncHub>,
    interval: Duration,
    tz: Tz,
    running: AtomicBool,
}

impl Reconciler {
    pub fn new(
        service: ReservationService,
        sync: Arc<SyncHub>,
        interval_secs: u64,
        tz: Tz,
    ) -> Self {
        Self {
            service,
            sync,
            interval: Duration::from_secs(interval_secs),
            tz,
            running: AtomicBool::new(false),
        }
    }

    /// 主循环：启动补扫 → 周期触发
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            "Reconciler started (interval: {}s, timezone: {})",
            self.interval.as_secs(),
            self.tz
        );

        // Startup catch-up: one immediate sweep corrects drift accumulated
        // while the server was down
        self.tick().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.tick().await;
                }
                _ = shutdown.cancelled() => {
                    info!("Reconciler received shutdown signal");
                    break;
                }
            }
        }

        info!("Reconciler stopped");
    }

    async fn tick(&self) {
        match self.run_once().await {
            Some(Err(e)) => {
                // Failed pass: logged, process continues, next tick retries
                error!("Reconciliation sweep failed: {}", e);
            }
            Some(Ok(_)) | None => {}
        }
    }

    /// One guarded sweep. Returns `None` when a sweep is already in progress
    /// (skipped, not queued).
    pub async fn run_once(&self) -> Option<SchedulingResult<ReconcileReport>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Reconciliation already in progress, skipping run");
            return None;
        }

        let result = self.sweep().await;
        self.running.store(false, Ordering::SeqCst);
        Some(result)
    }

    async fn sweep(&self) -> SchedulingResult<ReconcileReport> {
        let now = time::local_now(self.tz);
        let report = self.service.reconcile_at(now).await?;

        for id in &report.completed {
            self.sync
                .publish::<()>("reservation", "completed", &id.to_string(), None);
        }
        for change in &report.table_changes {
            self.sync.publish(
                "dining_table",
                "status_changed",
                &change.table_id.to_string(),
                Some(change),
            );
        }

        if report.is_noop() && report.failed_items == 0 {
            debug!("Reconciliation sweep: no drift");
        } else {
            info!(
                completed = report.completed.len(),
                table_changes = report.table_changes.len(),
                failed_items = report.failed_items,
                "Reconciliation sweep applied changes"
            );
        }
        Ok(report)
    }
}
