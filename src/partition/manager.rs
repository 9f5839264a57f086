use std::fmt;
use std::future::Future;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use log::{debug, error, info, warn};

use super::plan::{plan_coverage, Conflict, CoveragePlan, PartitionPolicy};
use super::{KeyRange, PartitionBoundary, PartitionCatalog, PartitionStore};
use crate::constants::DEFAULT_OPERATION_TIMEOUT_SECS;
use crate::error::{PartitionError, Result, StoreError};

/// 파티션 은퇴 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireMode {
    /// 파티션과 데이터를 영구 삭제
    Drop,
    /// 논리 테이블에서 분리하고 데이터는 독립 테이블로 보존
    Detach,
}

impl fmt::Display for RetireMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetireMode::Drop => f.write_str("drop"),
            RetireMode::Detach => f.write_str("detach"),
        }
    }
}

/// ensure_coverage 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedBoundaries {
    /// 이번 호출에서 생성한 경계
    pub created: Vec<PartitionBoundary>,
    /// 동시에 실행된 다른 인스턴스가 먼저 만든 경계
    pub already_present: Vec<PartitionBoundary>,
}

impl CreatedBoundaries {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.already_present.is_empty()
    }
}

/// retire 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetireResult {
    pub name: String,
    pub range: KeyRange,
    pub mode: RetireMode,
}

/// 파티션 관리자 구조체
///
/// 카탈로그는 저장소가 유일한 원본이며 호출마다 새로 조회한다.
pub struct PartitionManager<S> {
    store: S,
    policy: PartitionPolicy,
    operation_timeout: StdDuration,
}

impl<S: PartitionStore> PartitionManager<S> {
    /// 새 PartitionManager 인스턴스 생성
    pub fn new(store: S, policy: PartitionPolicy) -> Self {
        Self {
            store,
            policy,
            operation_timeout: StdDuration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }

    /// 저장소 작업별 타임아웃 설정
    pub fn with_operation_timeout(mut self, timeout: StdDuration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &PartitionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 현재 파티션 경계 목록 - 캐시 없이 저장소를 매번 조회
    pub async fn list_boundaries(&self) -> Result<PartitionCatalog> {
        let entries = self
            .bounded("list", "*", self.store.list_partitions())
            .await?;
        Ok(PartitionCatalog::from_entries(entries))
    }

    /// 생성 없이 필요한 경계만 계산
    pub async fn plan(&self, as_of: NaiveDate, horizon: Duration) -> Result<CoveragePlan> {
        let catalog = self.list_boundaries().await?;
        plan_coverage(&catalog, &self.policy, as_of, horizon)
    }

    /// [as_of, as_of + horizon) 범위의 모든 키가 들어갈 파티션 보장
    ///
    /// 이름 충돌은 해당 경계만 건너뛰고 나머지를 처리한 뒤 첫 충돌을 반환한다.
    /// 그 외 저장소 에러는 즉시 중단하며 이미 생성된 경계는 그대로 남는다.
    pub async fn ensure_coverage(&self, as_of: NaiveDate, horizon: Duration) -> Result<CreatedBoundaries> {
        let plan = self.plan(as_of, horizon).await?;
        let mut conflicts: Vec<Conflict> = plan.conflicts;
        let mut result = CreatedBoundaries::default();

        for conflict in &conflicts {
            error!(
                "경계 충돌 - {}: 기존 {} {}, 요청 {}",
                conflict.name, conflict.existing_name, conflict.existing, conflict.requested
            );
        }

        for boundary in plan.missing {
            match self
                .bounded("create", &boundary.name, self.store.create_partition(&boundary))
                .await
            {
                Ok(()) => {
                    debug!("파티션 생성 완료: {}", boundary);
                    result.created.push(boundary);
                }
                Err(StoreError::AlreadyExists(_)) => match self.resolve_duplicate(&boundary).await? {
                    None => {
                        debug!("다른 인스턴스가 먼저 생성한 파티션: {}", boundary);
                        result.already_present.push(boundary);
                    }
                    Some(conflict) => {
                        error!(
                            "경계 충돌 - {}: 기존 {} {}, 요청 {}",
                            conflict.name, conflict.existing_name, conflict.existing, conflict.requested
                        );
                        conflicts.push(conflict);
                    }
                },
                Err(e) => {
                    error!(
                        "파티션 생성 실패 - {}: {} (생성 완료 {} 개 유지)",
                        boundary.name,
                        e,
                        result.created.len()
                    );
                    return Err(e.into());
                }
            }
        }

        if !result.created.is_empty() {
            info!(
                "{} 개의 파티션 생성됨 (as_of {}, horizon {}일)",
                result.created.len(),
                as_of,
                horizon.num_days()
            );
        }

        match conflicts.into_iter().next() {
            Some(conflict) => Err(conflict.into()),
            None => Ok(result),
        }
    }

    /// 생성 시 이름 중복이 보고된 경계 확인
    ///
    /// 같은 이름, 같은 범위면 동시 실행에 의한 정상 상황(None),
    /// 범위가 다르면 충돌.
    async fn resolve_duplicate(&self, boundary: &PartitionBoundary) -> Result<Option<Conflict>> {
        let catalog = self.list_boundaries().await?;

        match catalog.get(&boundary.name) {
            Some(existing) if existing.range == boundary.range => Ok(None),
            Some(existing) => Ok(Some(Conflict {
                name: boundary.name.clone(),
                existing_name: existing.name.clone(),
                existing: existing.range,
                requested: boundary.range,
            })),
            None => {
                // 범위 파티션이 아닌 같은 이름의 테이블 (분리된 파티션 등)
                warn!("이름이 이미 사용 중이지만 카탈로그에 범위가 없음: {}", boundary.name);
                Err(StoreError::AlreadyExists(boundary.name.clone()).into())
            }
        }
    }

    /// 보존 기준일 이전에 끝난 경계를 삭제하거나 분리
    ///
    /// 종료일이 as_of 이후인 경계는 아직 쓰기를 받을 수 있으므로 거부한다.
    pub async fn retire(
        &self,
        name: &str,
        mode: RetireMode,
        as_of: NaiveDate,
        retention_cutoff: NaiveDate,
    ) -> Result<RetireResult> {
        let catalog = self.list_boundaries().await?;

        if catalog.default_partition() == Some(name) {
            return Err(PartitionError::ActiveBoundary {
                name: name.to_string(),
                as_of,
            });
        }

        let boundary = catalog
            .get(name)
            .cloned()
            .ok_or_else(|| PartitionError::NotFound(name.to_string()))?;

        if boundary.end() > as_of {
            return Err(PartitionError::ActiveBoundary {
                name: boundary.name,
                as_of,
            });
        }

        let end = boundary.end();
        if end > retention_cutoff {
            return Err(PartitionError::OutsideRetention {
                name: boundary.name,
                end,
                cutoff: retention_cutoff,
            });
        }

        match mode {
            // 삭제는 중간에 취소하지 않음
            RetireMode::Drop => self.store.drop_partition(name).await?,
            RetireMode::Detach => {
                self.bounded("detach", name, self.store.detach_partition(name))
                    .await?
            }
        }

        info!("파티션 은퇴 완료 ({}): {}", mode, boundary);

        Ok(RetireResult {
            name: boundary.name,
            range: boundary.range,
            mode,
        })
    }

    /// 저장소 작업에 타임아웃 적용
    async fn bounded<T, F>(&self, operation: &'static str, name: &str, fut: F) -> std::result::Result<T, StoreError>
    where
        F: Future<Output = std::result::Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!("파티션 {} 작업 타임아웃 - {}", operation, name);
                Err(StoreError::Timeout {
                    operation,
                    name: name.to_string(),
                })
            }
        }
    }
}
