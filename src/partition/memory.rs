use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use log::debug;

use super::{CatalogEntry, PartitionBound, PartitionBoundary, PartitionStore};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct MemoryState {
    attached: BTreeMap<String, PartitionBound>,
    detached: BTreeMap<String, PartitionBound>,
}

/// 메모리 기반 파티션 저장소
///
/// PostgreSQL 과 같은 규칙을 따른다: 이름 중복과 범위 겹침은 생성 시
/// 거부되고, 확인과 생성은 하나의 잠금 안에서 원자적으로 수행된다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본(default) 파티션을 가진 저장소
    pub fn with_default(name: impl Into<String>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.attached.insert(name.into(), PartitionBound::Default);
        }
        store
    }

    /// 저장소 상태를 직접 채움 (기존 카탈로그 재현용)
    pub fn insert(&self, entry: CatalogEntry) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.attached.insert(entry.name, entry.bound);
        Ok(())
    }

    /// 분리된 파티션 이름 목록
    pub fn detached(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.detached.keys().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::backend(format!("메모리 저장소 잠금 실패: {}", e)))
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError> {
        let mut state = self.lock()?;

        // 분리된 테이블도 같은 이름 공간을 차지함
        if state.attached.contains_key(&boundary.name) || state.detached.contains_key(&boundary.name) {
            return Err(StoreError::AlreadyExists(boundary.name.clone()));
        }

        let overlap = state.attached.iter().find_map(|(name, bound)| match bound {
            PartitionBound::Range(range) if range.overlaps(&boundary.range) => Some(name.clone()),
            _ => None,
        });
        if let Some(other) = overlap {
            return Err(StoreError::backend(format!(
                "파티션 {} 이(가) 기존 파티션 {} 와 겹침",
                boundary.name, other
            )));
        }

        state
            .attached
            .insert(boundary.name.clone(), PartitionBound::Range(boundary.range));
        debug!("메모리 파티션 생성: {}", boundary);
        Ok(())
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .attached
            .iter()
            .map(|(name, bound)| CatalogEntry {
                name: name.clone(),
                bound: bound.clone(),
            })
            .collect())
    }

    async fn drop_partition(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .attached
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn detach_partition(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let bound = state
            .attached
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        state.detached.insert(name.to_string(), bound);
        Ok(())
    }
}
