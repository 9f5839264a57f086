use std::sync::Arc;

use async_trait::async_trait;

use super::{CatalogEntry, PartitionBoundary};
use crate::error::StoreError;

/// 파티션 저장소 - 범위 파티션을 지원하는 데이터베이스
///
/// 관리자는 이 네 가지 작업만 사용하며 행 데이터는 읽거나 쓰지 않는다.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// 범위 파티션 생성. 같은 이름이 이미 있으면 `StoreError::AlreadyExists`
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError>;

    /// 현재 파티션 목록 (이름 + 범위 정의)
    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    /// 파티션과 데이터를 삭제
    async fn drop_partition(&self, name: &str) -> Result<(), StoreError>;

    /// 파티션을 논리 테이블에서 분리하고 독립 테이블로 보존
    async fn detach_partition(&self, name: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: PartitionStore + ?Sized> PartitionStore for Arc<T> {
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError> {
        (**self).create_partition(boundary).await
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        (**self).list_partitions().await
    }

    async fn drop_partition(&self, name: &str) -> Result<(), StoreError> {
        (**self).drop_partition(name).await
    }

    async fn detach_partition(&self, name: &str) -> Result<(), StoreError> {
        (**self).detach_partition(name).await
    }
}

#[async_trait]
impl<T: PartitionStore + ?Sized> PartitionStore for Box<T> {
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError> {
        (**self).create_partition(boundary).await
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        (**self).list_partitions().await
    }

    async fn drop_partition(&self, name: &str) -> Result<(), StoreError> {
        (**self).drop_partition(name).await
    }

    async fn detach_partition(&self, name: &str) -> Result<(), StoreError> {
        (**self).detach_partition(name).await
    }
}
