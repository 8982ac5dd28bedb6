//! Retention sweeper
//!
//! Once a day, at local midnight, deletes audit records older than the
//! retention horizon. A failed sweep is logged and left for the next day.
//! Sweeps are idempotent, so overlapping sweepers in several processes are
//! harmless.

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::store::{AuditLog, AuditStoreError};
use crate::config::MAX_AUDIT_RETENTION_DAYS;

#[derive(Clone)]
pub struct RetentionSweeper {
    log: AuditLog,
    horizon: chrono::Duration,
}

impl RetentionSweeper {
    /// The horizon is clamped to `1..=MAX_AUDIT_RETENTION_DAYS`.
    pub fn new(log: AuditLog, retention_days: i64) -> Self {
        Self {
            log,
            horizon: chrono::Duration::days(retention_days.clamp(1, MAX_AUDIT_RETENTION_DAYS)),
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.horizon
    }

    /// Deletes everything created before `now - horizon`.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<u64, AuditStoreError> {
        let cutoff = self.cutoff(now);
        let deleted = self.log.delete_older_than(cutoff).await?;
        info!(deleted, horizon_days = self.horizon.num_days(), "Audit retention sweep finished");
        Ok(deleted)
    }

    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(horizon_days = self.horizon.num_days(), "Retention sweeper started");
            loop {
                let now = Local::now();
                let wait = (next_midnight_after(now) - now)
                    .to_std()
                    .unwrap_or(std::time::Duration::from_secs(60));

                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("Retention sweeper shutting down");
                        break;
                    }
                    () = tokio::time::sleep(wait) => {
                        if let Err(e) = self.sweep_once(Utc::now()).await {
                            error!(error = %e, "Audit retention sweep failed");
                        }
                    }
                }
            }
        })
    }
}

/// The first local midnight strictly after `now`.
///
/// Where a DST change skips midnight, the earliest valid instant of the next
/// day is used instead.
pub fn next_midnight_after<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut day = now.date_naive();
    loop {
        day = day.checked_add_days(Days::new(1)).unwrap_or(day);
        let midnight = day.and_time(NaiveTime::MIN);
        if let Some(at) = tz.from_local_datetime(&midnight).earliest() {
            return at;
        }
        // Midnight does not exist locally on this date; fall back to 01:00.
        if let Some(at) = tz
            .from_local_datetime(&(midnight + chrono::Duration::hours(1)))
            .earliest()
        {
            return at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::memory::MemoryAuditLogStore;
    use crate::audit::models::NewAuditRecord;
    use chrono::{FixedOffset, Timelike};
    use std::sync::Arc;

    #[test]
    fn test_next_midnight_after() {
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let now = tz.with_ymd_and_hms(2025, 6, 15, 23, 59, 59).unwrap();
        let next = next_midnight_after(now);
        assert_eq!(next, tz.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap());

        let at_midnight = tz.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap();
        let next = next_midnight_after(at_midnight);
        assert_eq!(next.date_naive().to_string(), "2025-06-17");
        assert_eq!(next.hour(), 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_records_past_horizon() {
        let store = MemoryAuditLogStore::new();
        let now = Utc::now();
        let old = store.insert_at(
            NewAuditRecord {
                action: "OLD".into(),
                ..Default::default()
            },
            now - chrono::Duration::days(31),
        );
        store.insert_at(
            NewAuditRecord {
                action: "RECENT".into(),
                ..Default::default()
            },
            now - chrono::Duration::days(10),
        );

        let sweeper = RetentionSweeper::new(AuditLog::new(Arc::new(store.clone())), 30);
        let deleted = sweeper.sweep_once(now).await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 1);
        let log = AuditLog::new(Arc::new(store));
        assert_eq!(log.count_by_action("OLD").await.unwrap(), 0);
        assert_eq!(log.count_by_action("RECENT").await.unwrap(), 1);
        assert_ne!(old.id, uuid::Uuid::nil());
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let store = MemoryAuditLogStore::new();
        let now = Utc::now();
        store.insert_at(
            NewAuditRecord {
                action: "OLD".into(),
                ..Default::default()
            },
            now - chrono::Duration::days(45),
        );

        let sweeper = RetentionSweeper::new(AuditLog::new(Arc::new(store.clone())), 30);
        assert_eq!(sweeper.sweep_once(now).await.unwrap(), 1);
        assert_eq!(sweeper.sweep_once(now).await.unwrap(), 0);
    }

    #[test]
    fn test_oversized_horizon_is_clamped() {
        let log = AuditLog::new(Arc::new(MemoryAuditLogStore::new()));
        let now = Utc::now();
        let sweeper = RetentionSweeper::new(log, i64::MAX);
        assert_eq!(
            sweeper.cutoff(now),
            now - chrono::Duration::days(MAX_AUDIT_RETENTION_DAYS)
        );
    }

    #[tokio::test]
    async fn test_spawned_sweeper_stops_on_cancel() {
        let store = MemoryAuditLogStore::new();
        let sweeper = RetentionSweeper::new(AuditLog::new(Arc::new(store)), 30);
        let cancel = CancellationToken::new();
        let handle = sweeper.spawn(cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
