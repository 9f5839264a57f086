use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace};
use tokio_postgres::error::SqlState;

use super::bound::parse_bound;
use super::pool::DatabasePool;
use crate::config::TableConfig;
use crate::constants::partition;
use crate::error::StoreError;
use crate::partition::{CatalogEntry, PartitionBoundary, PartitionStore};

/// PostgreSQL 선언적 파티셔닝 기반 저장소 (테이블 1개 단위)
///
/// 경계 이름 `2024_Q2` 는 파티션 테이블 `{테이블}_2024_Q2` 로 매핑된다.
pub struct PostgresStore {
    pool: Arc<DatabasePool>,
    schema: String,
    table: String,
    partition_indices: Vec<String>,
}

impl PostgresStore {
    pub fn new(pool: Arc<DatabasePool>, table: &TableConfig) -> Self {
        Self {
            pool,
            schema: table.schema.clone(),
            table: table.name.clone(),
            partition_indices: table.partition_indices.clone(),
        }
    }

    fn partition_table(&self, boundary_name: &str) -> String {
        format!("{}_{}", self.table, boundary_name)
    }

    /// 파티션 테이블 이름에서 경계 이름 추출. 접두사가 없으면 그대로 사용
    fn boundary_name(&self, relname: &str) -> String {
        relname
            .strip_prefix(&self.table)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(relname)
            .to_string()
    }

    /// 부모 테이블이 범위 파티션 테이블인지 확인
    pub async fn verify_parent(&self) -> Result<bool, StoreError> {
        let client = self.pool.get_client().await?;
        let row = client
            .query_one(partition::CHECK_RANGE_PARTITIONED, &[&self.schema, &self.table])
            .await
            .map_err(|e| classify(e, &self.table))?;
        Ok(row.get(0))
    }
}

/// SQLSTATE 로 저장소 에러 분류
fn classify(err: tokio_postgres::Error, name: &str) -> StoreError {
    match err.code() {
        Some(code) if *code == SqlState::DUPLICATE_TABLE => StoreError::AlreadyExists(name.to_string()),
        Some(code) if *code == SqlState::UNDEFINED_TABLE => StoreError::NotFound(name.to_string()),
        _ => StoreError::backend(err),
    }
}

#[async_trait]
impl PartitionStore for PostgresStore {
    async fn create_partition(&self, boundary: &PartitionBoundary) -> Result<(), StoreError> {
        let partition_name = self.partition_table(&boundary.name);
        let mut client = self.pool.get_client().await?;

        // 파티션과 인덱스를 하나의 트랜잭션으로 생성
        let tx = client
            .transaction()
            .await
            .map_err(|e| classify(e, &boundary.name))?;

        let create_sql = partition::create_partition(
            &self.schema,
            &self.table,
            &partition_name,
            boundary.start(),
            boundary.end(),
        );
        trace!("쿼리 실행: {}", create_sql);
        tx.batch_execute(&create_sql)
            .await
            .map_err(|e| classify(e, &boundary.name))?;

        for index_sql in partition::create_partition_indices(&self.schema, &partition_name, &self.partition_indices) {
            trace!("쿼리 실행: {}", index_sql);
            tx.batch_execute(&index_sql)
                .await
                .map_err(|e| classify(e, &boundary.name))?;
        }

        tx.commit().await.map_err(|e| classify(e, &boundary.name))?;

        debug!("파티션 생성 완료: {}.{} {}", self.schema, partition_name, boundary.range);
        Ok(())
    }

    async fn list_partitions(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let client = self.pool.get_client().await?;
        let rows = client
            .query(partition::LIST_PARTITIONS, &[&self.schema, &self.table])
            .await
            .map_err(|e| classify(e, &self.table))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let relname: String = row.try_get(0).map_err(StoreError::backend)?;
            let bound: Option<String> = row.try_get(1).map_err(StoreError::backend)?;

            entries.push(CatalogEntry {
                name: self.boundary_name(&relname),
                bound: parse_bound(bound.as_deref().unwrap_or_default()),
            });
        }

        trace!("{}.{} 파티션 {} 개 조회", self.schema, self.table, entries.len());
        Ok(entries)
    }

    async fn drop_partition(&self, name: &str) -> Result<(), StoreError> {
        let client = self.pool.get_client().await?;
        let sql = partition::drop_partition(&self.schema, &self.partition_table(name));

        trace!("쿼리 실행: {}", sql);
        client.batch_execute(&sql).await.map_err(|e| classify(e, name))
    }

    async fn detach_partition(&self, name: &str) -> Result<(), StoreError> {
        let client = self.pool.get_client().await?;
        let sql = partition::detach_partition(&self.schema, &self.table, &self.partition_table(name));

        trace!("쿼리 실행: {}", sql);
        client.batch_execute(&sql).await.map_err(|e| classify(e, name))
    }
}
