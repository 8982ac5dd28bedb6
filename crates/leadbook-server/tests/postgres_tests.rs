//! Postgres-backed queue, audit store and call log tests
//!
//! Run with `DATABASE_URL` pointing at a scratch server:
//! `cargo test -p leadbook-server --test postgres_tests -- --ignored`

use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use leadbook_common::{audit_job::AUDIT_QUEUE, Actor};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use leadbook_server::{
    audit::{
        models::NewAuditRecord, AuditFilter, AuditLog, AuditRecorder, AuditWorker,
        PgAuditLogStore, WorkerOptions,
    },
    features::call_logs::{
        commands, queries, BulkDeleteCallLogsCommand, CallType, CreateCallLogCommand,
        ListCallLogsQuery,
    },
    queue::{DeliveryPolicy, MemoryTaskQueue, PgTaskQueue, TaskQueue},
};

fn short_lease(max_attempts: i32) -> DeliveryPolicy {
    DeliveryPolicy {
        visibility_timeout: Duration::from_secs(1),
        max_attempts,
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_pg_queue_delivers_once_under_lease(pool: PgPool) -> sqlx::Result<()> {
    let queue = PgTaskQueue::new(pool.clone(), AUDIT_QUEUE, DeliveryPolicy::default());

    let first = queue.submit("log-action", json!({"n": 1})).await.unwrap();
    let second = queue.submit("log-action", json!({"n": 2})).await.unwrap();

    let a = queue.reserve().await.unwrap().unwrap();
    let b = queue.reserve().await.unwrap().unwrap();
    assert_eq!(a.id, first.id);
    assert_eq!(b.id, second.id);
    assert_eq!(a.attempts, 1);
    assert!(queue.reserve().await.unwrap().is_none());

    queue.complete(a.id).await.unwrap();
    queue.complete(b.id).await.unwrap();

    let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_queue")
        .fetch_one(&pool)
        .await?;
    assert_eq!(left, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_pg_queue_channels_are_isolated(pool: PgPool) -> sqlx::Result<()> {
    let audit = PgTaskQueue::new(pool.clone(), AUDIT_QUEUE, DeliveryPolicy::default());
    let other = PgTaskQueue::new(pool, "emails", DeliveryPolicy::default());

    other.submit("send", json!({})).await.unwrap();

    assert!(audit.reserve().await.unwrap().is_none());
    assert!(other.reserve().await.unwrap().is_some());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_pg_queue_redelivers_then_buries(pool: PgPool) -> sqlx::Result<()> {
    let queue = PgTaskQueue::new(pool.clone(), AUDIT_QUEUE, short_lease(2));
    let handle = queue.submit("log-action", json!({})).await.unwrap();

    let first = queue.reserve().await.unwrap().unwrap();
    assert_eq!(first.attempts, 1);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    let second = queue.reserve().await.unwrap().unwrap();
    assert_eq!(second.id, handle.id);
    assert_eq!(second.attempts, 2);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(queue.reserve().await.unwrap().is_none());

    let status: String = sqlx::query_scalar("SELECT status FROM task_queue WHERE id = $1")
        .bind(handle.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status, "dead");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_pg_pipeline_end_to_end(pool: PgPool) -> sqlx::Result<()> {
    let queue = Arc::new(PgTaskQueue::new(pool.clone(), AUDIT_QUEUE, DeliveryPolicy::default()));
    let log = AuditLog::new(Arc::new(PgAuditLogStore::new(pool.clone())));
    let recorder = AuditRecorder::new(queue.clone());
    let worker = AuditWorker::new(queue, log.clone(), WorkerOptions::default());

    recorder
        .record(
            "HTTP_ERROR",
            Actor::System,
            Some(json!({"method": "GET", "url": "/api/leads", "statusCode": 404, "error": "nope"})),
        )
        .await
        .unwrap();
    recorder
        .record("LEAD_CREATED", Actor::user("user_7"), Some(json!({"leadId": "l1"})))
        .await
        .unwrap();

    assert_eq!(worker.drain().await.unwrap(), 2);

    let errors = log.find_all(AuditFilter::action("HTTP_ERROR")).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].user_id, None);
    assert_eq!(errors[0].status_code, Some(404));
    assert_eq!(errors[0].details.as_ref().unwrap()["error"], "nope");

    let mine = log.find_by_actor("user_7", None).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].action, "LEAD_CREATED");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_pg_store_window_count_and_retention(pool: PgPool) -> sqlx::Result<()> {
    let log = AuditLog::new(Arc::new(PgAuditLogStore::new(pool.clone())));
    for i in 0..20 {
        log.create_log(NewAuditRecord::from_details(
            "CALL_LOG_CREATED",
            Some("user_1".to_string()),
            Some(json!({"seq": i})),
        ))
        .await
        .unwrap();
    }

    assert_eq!(log.count_by_action("CALL_LOG_CREATED").await.unwrap(), 20);
    assert_eq!(log.count_by_action("NEVER_RECORDED").await.unwrap(), 0);

    let all = log.find_all(AuditFilter::default()).await.unwrap();
    assert!(all.windows(2).all(|p| p[0].created_at >= p[1].created_at));

    let window = log
        .find_all(AuditFilter {
            action: None,
            limit: 10,
            offset: 10,
        })
        .await
        .unwrap();
    assert_eq!(window.len(), 10);

    sqlx::query("UPDATE audit_log SET created_at = NOW() - INTERVAL '31 days' WHERE details->>'seq' = '0'")
        .execute(&pool)
        .await?;
    let deleted = log
        .delete_older_than(Utc::now() - chrono::Duration::days(30))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(log.count_by_action("CALL_LOG_CREATED").await.unwrap(), 19);
    Ok(())
}

fn call(name: &str, email: &str, call_type: CallType, day: u32) -> CreateCallLogCommand {
    CreateCallLogCommand {
        name: name.to_string(),
        phone_number: "+91 98765 43210".to_string(),
        call_type,
        duration: Some(60),
        sim_provider: None,
        user_email: email.to_string(),
        call_time: Utc.with_ymd_and_hms(2025, 12, day, 12, 0, 0).single(),
        notes: None,
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_call_log_list_by_user_and_bulk_delete(pool: PgPool) -> sqlx::Result<()> {
    let queue = MemoryTaskQueue::default();
    let recorder = AuditRecorder::new(Arc::new(queue.clone()));
    let actor = || Actor::user("user_1");

    let mut ids = Vec::new();
    for (name, email, ty, day) in [
        ("Anita Rao", "sales@unite.com", CallType::Incoming, 10),
        ("Sumit Patel", "sales@unite.com", CallType::Missed, 12),
        ("Ravi Teja", "admin@unite.com", CallType::Outgoing, 12),
        ("Divya Singh", "admin@unite.com", CallType::Missed, 20),
    ] {
        let log = commands::create::handle(&pool, &recorder, actor(), call(name, email, ty, day))
            .await
            .unwrap();
        ids.push(log.id);
    }

    let december_mid = queries::list::handle(
        &pool,
        ListCallLogsQuery {
            start_date: Some("2025-12-10".to_string()),
            end_date: Some("2025-12-12".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(december_mid.meta.total, 3);
    assert_eq!(december_mid.stats.missed, 1);
    assert_eq!(december_mid.stats.incoming, 1);

    let missed_only = queries::list::handle(
        &pool,
        ListCallLogsQuery {
            call_type: Some(CallType::Missed),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(missed_only.data.len(), 2);
    // Stats ignore the call type filter.
    assert_eq!(missed_only.stats.total, 4);

    let sales = queries::by_user::handle(&pool, "sales@unite.com", None).await?;
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].name, "Sumit Patel");

    let deleted = commands::bulk_delete::handle(
        &pool,
        &recorder,
        actor(),
        BulkDeleteCallLogsCommand {
            ids: vec![ids[0], ids[1], Uuid::new_v4()],
        },
    )
    .await
    .unwrap();
    assert_eq!(deleted.deleted, 2);

    let actions: Vec<_> = queue
        .jobs()
        .iter()
        .map(|j| j.payload["action"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(actions.iter().filter(|a| *a == "CALL_LOG_CREATED").count(), 4);
    assert_eq!(actions.last().map(String::as_str), Some("CALL_LOG_BULK_DELETED"));
    Ok(())
}
