//! Redis Streams queue tests.

use vedit_models::{JobRequest, MediaInfoParams, MediaLocation};
use vedit_queue::{JobQueue, QueueConfig, QueueError, QueueJob};

/// Queue on streams unique to this test run.
async fn test_queue() -> JobQueue {
    dotenvy::dotenv().ok();

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let defaults = QueueConfig::from_env();
    let config = QueueConfig {
        stream_name: format!("vedit:test:jobs:{}", suffix),
        consumer_group: format!("vedit:test:workers:{}", suffix),
        dlq_stream_name: format!("vedit:test:dlq:{}", suffix),
        max_retries: 2,
        ..defaults
    };

    let queue = JobQueue::new(config).expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");
    queue
}

fn media_info_job() -> QueueJob {
    QueueJob::new(JobRequest::MediaInfo(MediaInfoParams {
        input: MediaLocation::remote("videos/in.mp4"),
    }))
}

#[tokio::test]
#[ignore = "requires redis"]
async fn test_enqueue_consume_ack() {
    let queue = test_queue().await;
    let job = media_info_job();

    let message_id = queue.enqueue(&job).await.expect("Failed to enqueue");
    assert_eq!(queue.len().await.expect("len"), 1);

    let jobs = queue
        .consume("test-consumer", 1000, 1)
        .await
        .expect("Failed to consume");
    assert_eq!(jobs.len(), 1);
    let (consumed_id, consumed) = &jobs[0];
    assert_eq!(consumed_id, &message_id);
    assert_eq!(consumed.job_id(), job.job_id());
    assert_eq!(consumed.request, job.request);

    queue.ack(consumed_id).await.expect("Failed to ack");
    assert_eq!(queue.len().await.expect("len"), 0);
}

#[tokio::test]
#[ignore = "requires redis"]
async fn test_duplicate_job_rejected() {
    let queue = test_queue().await;
    let job = media_info_job();

    queue.enqueue(&job).await.expect("Failed to enqueue");
    let err = queue.enqueue(&job).await.expect_err("duplicate accepted");
    assert!(matches!(err, QueueError::Duplicate(_)));

    queue.clear_dedup(&job).await.expect("Failed to clear dedup");
    queue.enqueue(&job).await.expect("resubmission after clear");
}

#[tokio::test]
#[ignore = "requires redis"]
async fn test_invalid_job_never_enqueued() {
    let queue = test_queue().await;
    let mixed = QueueJob::new(
        JobRequest::from_parts(
            "trim",
            serde_json::json!({
                "input": {"local": "/in.mp4"},
                "output": {"remote": "out.mp4"},
                "start_time": "0",
                "end_time": "1"
            }),
        )
        .expect("parse"),
    );

    let err = queue.enqueue(&mixed).await.expect_err("mixed locations");
    assert!(matches!(err, QueueError::InvalidJob(_)));
}

#[tokio::test]
#[ignore = "requires redis"]
async fn test_retry_counter_and_dlq() {
    let queue = test_queue().await;
    let job = media_info_job();
    queue.enqueue(&job).await.expect("Failed to enqueue");

    let jobs = queue.consume("test-consumer", 1000, 1).await.expect("consume");
    let (message_id, consumed) = &jobs[0];

    assert_eq!(queue.increment_retry(message_id).await.expect("retry"), 1);
    assert_eq!(queue.increment_retry(message_id).await.expect("retry"), 2);
    assert_eq!(queue.get_retry_count(message_id).await.expect("count"), 2);

    queue
        .dlq(message_id, consumed, "storage: upload failed")
        .await
        .expect("Failed to dead-letter");
    assert_eq!(queue.dlq_len().await.expect("dlq len"), 1);
    assert_eq!(queue.len().await.expect("len"), 0);
    assert_eq!(queue.get_retry_count(message_id).await.expect("count"), 0);
}

#[tokio::test]
#[ignore = "requires redis"]
async fn test_claim_pending_from_dead_consumer() {
    let queue = test_queue().await;
    let job = media_info_job();
    queue.enqueue(&job).await.expect("Failed to enqueue");

    let consumed = queue.consume("crashed-worker", 1000, 1).await.expect("consume");
    assert_eq!(consumed.len(), 1);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let claimed = queue
        .claim_pending("rescuer", 10, 5)
        .await
        .expect("Failed to claim");
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].1.job_id(), job.job_id());
}

#[tokio::test]
#[ignore = "requires redis"]
async fn test_heartbeat_keeps_running_job_from_claim() {
    let queue = test_queue().await;
    let job = media_info_job();
    queue.enqueue(&job).await.expect("Failed to enqueue");

    let consumed = queue.consume("busy-worker", 1000, 1).await.expect("consume");
    let (message_id, _) = &consumed[0];

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(queue
        .heartbeat("busy-worker", message_id)
        .await
        .expect("Failed to heartbeat"));

    let claimed = queue
        .claim_pending("rescuer", 200, 5)
        .await
        .expect("Failed to claim");
    assert!(claimed.is_empty());

    // Only the owning consumer can refresh the entry.
    assert!(!queue
        .heartbeat("rescuer", message_id)
        .await
        .expect("Failed to heartbeat"));

    queue.ack(message_id).await.expect("Failed to ack");
    assert!(!queue
        .heartbeat("busy-worker", message_id)
        .await
        .expect("Failed to heartbeat"));
}
