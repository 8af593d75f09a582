//! Caching derived task reports keyed by operation and parameters.

use std::sync::Arc;
use std::time::Duration;

use tasktrace::cache::{Cache, CacheKey, InMemoryCache};
use tasktrace::task::{
    adapters::memory::{InMemoryBranchService, InMemoryStore},
    services::{CreateTaskRequest, InitialCodeLocation, TaskLifecycleService},
};
use mockable::DefaultClock;

#[tokio::test(flavor = "multi_thread")]
async fn task_details_are_served_from_cache_until_invalidated() -> eyre::Result<()> {
    let clock = Arc::new(DefaultClock);
    let service = TaskLifecycleService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryBranchService::new()),
        Arc::clone(&clock),
    );
    let cache = InMemoryCache::new(clock);
    let created = service
        .create_task(
            CreateTaskRequest::new("Cached report", 2, 3)
                .with_initial_location(InitialCodeLocation::new("src/report.rs", 3)),
        )
        .await?;
    let task_id = created.task.id();
    let key = CacheKey::new("task_details", [("task_id", task_id)]);

    assert_eq!(cache.get(&key).await?, None);
    let details = service.get_task_with_details(task_id).await?;
    let rendered = serde_json::to_value(&details)?;
    cache
        .set(key.clone(), rendered.clone(), Some(Duration::from_secs(300)))
        .await?;

    assert_eq!(cache.get(&key).await?, Some(rendered));
    assert_eq!(key.as_str(), format!("task_details(task_id={task_id})"));

    service.complete_task(task_id).await?;
    assert!(cache.invalidate(&key).await?);
    assert_eq!(cache.get(&key).await?, None);
    Ok(())
}

#[test]
fn parameter_order_does_not_change_the_key() {
    let first = CacheKey::new("pattern_stats", [("pattern_type", "refactoring"), ("limit", "5")]);
    let second = CacheKey::new("pattern_stats", [("limit", "5"), ("pattern_type", "refactoring")]);

    assert_eq!(first, second);
    assert_eq!(first.as_str(), "pattern_stats(limit=5,pattern_type=refactoring)");
}
