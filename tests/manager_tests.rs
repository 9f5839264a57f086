//! 파티션 관리자 통합 테스트
//!
//! 1. 커버리지 생성: 분기 시나리오, 멱등성, 간격 채우기
//! 2. 은퇴: drop/detach, 활성 경계, 보존 기준일
//! 3. 에러 처리: 이름 충돌, 저장소 에러 fail-fast
//! 4. 동시 실행: 같은 경계를 동시에 생성
//! 5. 간격 단위 변경: 다른 이름의 기존 경계와 겹침

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tokio::sync::Barrier;

use partman::partition::{
    CatalogEntry, IntervalWidth, KeyRange, MemoryStore, PartitionBound, PartitionBoundary, PartitionManager,
    PartitionPolicy, PartitionStore, RetireMode,
};
use partman::{PartitionError, StoreError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn quarterly_policy() -> PartitionPolicy {
    PartitionPolicy::new(IntervalWidth::Quarterly, date(2023, 1, 1))
}

fn quarterly_manager() -> (Arc<MemoryStore>, PartitionManager<Arc<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    let manager = PartitionManager::new(store.clone(), quarterly_policy());
    (store, manager)
}

async fn names<S: PartitionStore>(manager: &PartitionManager<S>) -> Vec<String> {
    manager
        .list_boundaries()
        .await
        .unwrap()
        .iter()
        .map(|b| b.name.clone())
        .collect()
}

// ============================================================================
// Coverage
// ============================================================================

#[tokio::test]
async fn test_quarterly_scenario_from_epoch() {
    let (_, manager) = quarterly_manager();

    let result = manager
        .ensure_coverage(date(2024, 2, 15), Duration::days(90))
        .await
        .unwrap();

    assert_eq!(result.created.len(), 6);
    assert!(result.already_present.is_empty());
    assert_eq!(
        names(&manager).await,
        vec!["2023_Q1", "2023_Q2", "2023_Q3", "2023_Q4", "2024_Q1", "2024_Q2"]
    );

    let catalog = manager.list_boundaries().await.unwrap();
    let q2 = catalog.get("2024_Q2").unwrap();
    assert_eq!(q2.range, KeyRange::new(date(2024, 4, 1), date(2024, 7, 1)).unwrap());
}

#[tokio::test]
async fn test_ensure_coverage_is_idempotent() {
    let (_, manager) = quarterly_manager();

    manager.ensure_coverage(date(2024, 2, 15), Duration::days(90)).await.unwrap();
    let before = names(&manager).await;

    let second = manager.ensure_coverage(date(2024, 2, 15), Duration::days(90)).await.unwrap();
    assert!(second.is_empty());

    // 더 좁은 horizon 도 아무것도 만들지 않음
    let narrower = manager.ensure_coverage(date(2024, 2, 15), Duration::days(10)).await.unwrap();
    assert!(narrower.is_empty());

    assert_eq!(names(&manager).await, before);
}

#[tokio::test]
async fn test_key_on_end_falls_into_next_boundary() {
    let (_, manager) = quarterly_manager();
    manager.ensure_coverage(date(2024, 3, 31), Duration::days(1)).await.unwrap();

    let catalog = manager.list_boundaries().await.unwrap();
    assert_eq!(catalog.covering(date(2024, 3, 31)).unwrap().name, "2024_Q1");
    assert_eq!(catalog.covering(date(2024, 4, 1)).unwrap().name, "2024_Q2");
}

#[tokio::test]
async fn test_retired_history_is_not_recreated() {
    let (_, manager) = quarterly_manager();
    manager.ensure_coverage(date(2024, 2, 15), Duration::days(90)).await.unwrap();

    manager
        .retire("2023_Q1", RetireMode::Drop, date(2025, 1, 1), date(2024, 1, 1))
        .await
        .unwrap();

    let result = manager.ensure_coverage(date(2024, 2, 15), Duration::days(90)).await.unwrap();
    assert!(result.created.is_empty());
    assert!(!names(&manager).await.contains(&"2023_Q1".to_string()));
}

#[tokio::test]
async fn test_default_partition_is_ignored_for_coverage() {
    let store = Arc::new(MemoryStore::with_default("default"));
    let manager = PartitionManager::new(store, quarterly_policy());

    let result = manager.ensure_coverage(date(2023, 1, 10), Duration::days(0)).await.unwrap();

    assert_eq!(result.created.len(), 1);
    let catalog = manager.list_boundaries().await.unwrap();
    assert_eq!(catalog.default_partition(), Some("default"));
    assert_eq!(catalog.len(), 1);
}

fn monthly_entry(y: i32, m: u32) -> CatalogEntry {
    let boundary = PartitionBoundary::for_interval(IntervalWidth::Monthly, date(y, m, 1)).unwrap();
    CatalogEntry::from(&boundary)
}

#[tokio::test]
async fn test_width_change_leaving_hole_is_reported() {
    // 월 단위로 운영하던 테이블을 분기 단위로 전환, 3월 파티션은 없음
    let (store, manager) = quarterly_manager();
    store.insert(monthly_entry(2024, 1)).unwrap();
    store.insert(monthly_entry(2024, 2)).unwrap();

    let err = manager
        .ensure_coverage(date(2024, 2, 15), Duration::days(90))
        .await
        .unwrap_err();

    match err {
        PartitionError::BoundaryConflict {
            name, existing_name, ..
        } => {
            assert_eq!(name, "2024_Q1");
            assert_eq!(existing_name, "2024_M01");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // 겹치지 않는 나머지 경계는 생성됨
    let catalog = manager.list_boundaries().await.unwrap();
    assert!(catalog.covering(date(2024, 3, 15)).is_none());
    assert_eq!(catalog.covering(date(2024, 4, 15)).unwrap().name, "2024_Q2");
}

#[tokio::test]
async fn test_overlap_already_covered_is_skipped() {
    let (store, manager) = quarterly_manager();
    for month in 1..=3 {
        store.insert(monthly_entry(2024, month)).unwrap();
    }

    let plan = manager.plan(date(2024, 2, 15), Duration::days(60)).await.unwrap();
    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].name, "2024_Q1");

    let result = manager.ensure_coverage(date(2024, 2, 15), Duration::days(60)).await.unwrap();
    assert_eq!(result.created.len(), 1);

    let catalog = manager.list_boundaries().await.unwrap();
    let mut key = date(2024, 2, 15);
    while key < date(2024, 4, 15) {
        assert!(catalog.covering(key).is_some(), "{} 을(를) 덮는 경계가 없음", key);
        key = key.succ_opt().unwrap();
    }
    assert!(catalog.gaps().is_empty());
}

// ============================================================================
// Retire
// ============================================================================

#[tokio::test]
async fn test_retire_expired_boundary_with_drop() {
    let (store, manager) = quarterly_manager();
    manager.ensure_coverage(date(2024, 2, 15), Duration::days(90)).await.unwrap();

    let result = manager
        .retire("2023_Q1", RetireMode::Drop, date(2025, 1, 1), date(2024, 1, 1))
        .await
        .unwrap();

    assert_eq!(result.name, "2023_Q1");
    assert_eq!(result.mode, RetireMode::Drop);
    assert!(manager.list_boundaries().await.unwrap().get("2023_Q1").is_none());
    assert!(store.detached().unwrap().is_empty());
}

#[tokio::test]
async fn test_retire_active_boundary_fails() {
    let (_, manager) = quarterly_manager();
    manager.ensure_coverage(date(2024, 11, 1), Duration::days(30)).await.unwrap();

    let err = manager
        .retire("2024_Q4", RetireMode::Drop, date(2024, 11, 1), date(2024, 11, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, PartitionError::ActiveBoundary { ref name, .. } if name == "2024_Q4"));
    assert!(manager.list_boundaries().await.unwrap().get("2024_Q4").is_some());
}

#[tokio::test]
async fn test_retire_respects_retention_cutoff() {
    let (_, manager) = quarterly_manager();
    manager.ensure_coverage(date(2024, 2, 15), Duration::days(90)).await.unwrap();

    // 2023_Q4 는 2024-01-01 에 끝나지만 보존 기준일은 2023-12-01
    let err = manager
        .retire("2023_Q4", RetireMode::Drop, date(2025, 1, 1), date(2023, 12, 1))
        .await
        .unwrap_err();

    match err {
        PartitionError::OutsideRetention { name, end, cutoff } => {
            assert_eq!(name, "2023_Q4");
            assert_eq!(end, date(2024, 1, 1));
            assert_eq!(cutoff, date(2023, 12, 1));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(manager.list_boundaries().await.unwrap().get("2023_Q4").is_some());
}

#[tokio::test]
async fn test_retire_with_detach_preserves_table() {
    let (store, manager) = quarterly_manager();
    manager.ensure_coverage(date(2024, 2, 15), Duration::days(90)).await.unwrap();

    manager
        .retire("2023_Q2", RetireMode::Detach, date(2025, 1, 1), date(2024, 1, 1))
        .await
        .unwrap();

    assert!(manager.list_boundaries().await.unwrap().get("2023_Q2").is_none());
    assert_eq!(store.detached().unwrap(), vec!["2023_Q2".to_string()]);
}

#[tokio::test]
async fn test_retire_unknown_and_default() {
    let store = Arc::new(MemoryStore::with_default("default"));
    let manager = PartitionManager::new(store, quarterly_policy());

    assert!(matches!(
        manager
            .retire("1999_Q1", RetireMode::Drop, date(2025, 1, 1), date(2025, 1, 1))
            .await,
        Err(PartitionError::NotFound(_))
    ));
    assert!(matches!(
        manager
            .retire("default", RetireMode::Detach, date(2025, 1, 1), date(2025, 1, 1))
            .await,
        Err(PartitionError::ActiveBoundary { .. })
    ));
}

// ============================================================================
// Error handling
// ============================================================================

#[tokio::test]
async fn test_name_collision_is_boundary_conflict() {
    let (store, manager) = quarterly_manager();
    // 이름은 2024_Q2 지만 한 달짜리 범위
    store
        .insert(CatalogEntry::range(
            "2024_Q2",
            KeyRange::new(date(2024, 4, 1), date(2024, 5, 1)).unwrap(),
        ))
        .unwrap();

    let err = manager
        .ensure_coverage(date(2024, 4, 10), Duration::days(100))
        .await
        .unwrap_err();

    assert!(matches!(err, PartitionError::BoundaryConflict { ref name, .. } if name == "2024_Q2"));

    // 충돌한 경계만 건너뛰고 나머지(2024_Q3)는 생성됨
    let catalog = manager.list_boundaries().await.unwrap();
    assert!(catalog.get("2024_Q3").is_some());
}

/// N 번째 생성부터 실패하는 저장소
struct FailingStore {
    inner: MemoryStore,
    succeed: usize,
    creates: AtomicUsize,
}

#[async_trait]
impl PartitionStore for FailingStore {
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError> {
        if self.creates.fetch_add(1, Ordering::SeqCst) >= self.succeed {
            return Err(StoreError::backend("permission denied"));
        }
        self.inner.create_partition(boundary).await
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        self.inner.list_partitions().await
    }

    async fn drop_partition(&self, name: &str) -> Result<(), StoreError> {
        self.inner.drop_partition(name).await
    }

    async fn detach_partition(&self, name: &str) -> Result<(), StoreError> {
        self.inner.detach_partition(name).await
    }
}

#[tokio::test]
async fn test_storage_error_stops_with_partial_progress() {
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        succeed: 2,
        creates: AtomicUsize::new(0),
    });
    let manager = PartitionManager::new(store.clone(), quarterly_policy());

    let err = manager
        .ensure_coverage(date(2024, 2, 15), Duration::days(90))
        .await
        .unwrap_err();

    assert!(matches!(err, PartitionError::Storage(StoreError::Backend(_))));
    // 처음 두 경계는 남고 세 번째 시도 이후는 중단
    assert_eq!(names(&manager).await, vec!["2023_Q1", "2023_Q2"]);
    assert_eq!(store.creates.load(Ordering::SeqCst), 3);
}

// ============================================================================
// Concurrency
// ============================================================================

/// 카탈로그를 읽은 직후 다른 인스턴스가 같은 경계를 먼저 만든 상황 재현
struct RacingStore {
    inner: Arc<MemoryStore>,
    raced: HashSet<String>,
}

#[async_trait]
impl PartitionStore for RacingStore {
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError> {
        if self.raced.contains(&boundary.name) {
            // 경쟁 인스턴스의 생성 (이미 있으면 무시)
            let _ = self.inner.create_partition(boundary).await;
        }
        self.inner.create_partition(boundary).await
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        self.inner.list_partitions().await
    }

    async fn drop_partition(&self, name: &str) -> Result<(), StoreError> {
        self.inner.drop_partition(name).await
    }

    async fn detach_partition(&self, name: &str) -> Result<(), StoreError> {
        self.inner.detach_partition(name).await
    }
}

#[tokio::test]
async fn test_benign_duplicate_is_treated_as_success() {
    let inner = Arc::new(MemoryStore::new());
    inner
        .create_partition(&PartitionBoundary::for_interval(IntervalWidth::Quarterly, date(2024, 4, 1)).unwrap())
        .await
        .unwrap();

    let store = RacingStore {
        inner: inner.clone(),
        raced: ["2024_Q3".to_string()].into_iter().collect(),
    };
    let manager = PartitionManager::new(store, quarterly_policy());

    let result = manager
        .ensure_coverage(date(2024, 6, 1), Duration::days(45))
        .await
        .unwrap();

    assert!(result.created.is_empty());
    assert_eq!(result.already_present.len(), 1);
    assert_eq!(result.already_present[0].name, "2024_Q3");

    let listed: Vec<_> = inner.list_partitions().await.unwrap();
    assert_eq!(listed.iter().filter(|e| e.name == "2024_Q3").count(), 1);
}

/// 두 인스턴스가 모두 카탈로그를 읽은 뒤에야 진행하도록 맞추는 저장소
struct LockstepStore {
    inner: MemoryStore,
    barrier: Barrier,
    lists: AtomicUsize,
}

#[async_trait]
impl PartitionStore for LockstepStore {
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError> {
        self.inner.create_partition(boundary).await
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let entries = self.inner.list_partitions().await?;
        if self.lists.fetch_add(1, Ordering::SeqCst) < 2 {
            self.barrier.wait().await;
        }
        Ok(entries)
    }

    async fn drop_partition(&self, name: &str) -> Result<(), StoreError> {
        self.inner.drop_partition(name).await
    }

    async fn detach_partition(&self, name: &str) -> Result<(), StoreError> {
        self.inner.detach_partition(name).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ensure_coverage_creates_no_duplicates() {
    let store = Arc::new(LockstepStore {
        inner: MemoryStore::new(),
        barrier: Barrier::new(2),
        lists: AtomicUsize::new(0),
    });
    store
        .inner
        .create_partition(&PartitionBoundary::for_interval(IntervalWidth::Quarterly, date(2024, 4, 1)).unwrap())
        .await
        .unwrap();

    // 두 작업 모두 2024_Q3 가 없는 카탈로그를 본 상태에서 생성 시도
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let manager = PartitionManager::new(store.clone(), quarterly_policy());
            tokio::spawn(async move { manager.ensure_coverage(date(2024, 6, 1), Duration::days(45)).await })
        })
        .collect();

    let mut created = 0;
    let mut already_present = 0;
    for task in tasks {
        let result = task.await.unwrap().unwrap();
        created += result.created.len();
        already_present += result.already_present.len();
    }
    assert_eq!(created, 1);
    assert_eq!(already_present, 1);

    let entries = store.inner.list_partitions().await.unwrap();
    let q3: Vec<_> = entries.iter().filter(|e| e.name == "2024_Q3").collect();
    assert_eq!(q3.len(), 1);
    assert!(matches!(q3[0].bound, PartitionBound::Range(_)));
}

/// 목록 조회가 끝나지 않는 저장소
struct StalledStore;

#[async_trait]
impl PartitionStore for StalledStore {
    async fn create_partition(&self, _boundary: &PartitionBoundary) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        std::future::pending().await
    }

    async fn drop_partition(&self, _name: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn detach_partition(&self, _name: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_stalled_store_times_out() {
    let manager = PartitionManager::new(StalledStore, quarterly_policy())
        .with_operation_timeout(std::time::Duration::from_millis(20));

    let err = manager
        .ensure_coverage(date(2024, 2, 15), Duration::days(90))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PartitionError::Storage(StoreError::Timeout { operation: "list", .. })
    ));
}
