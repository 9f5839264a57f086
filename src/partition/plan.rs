use chrono::{Duration, NaiveDate};
use log::{debug, warn};

use super::{IntervalWidth, KeyRange, PartitionBoundary, PartitionCatalog};
use crate::error::{PartitionError, Result};

/// 테이블 파티션 정책 (간격 단위 + 시작 기준일)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPolicy {
    pub width: IntervalWidth,
    pub epoch: NaiveDate,
}

impl PartitionPolicy {
    pub fn new(width: IntervalWidth, epoch: NaiveDate) -> Self {
        Self { width, epoch }
    }

    /// 간격 단위에 맞춰 내림한 기준일
    pub fn aligned_epoch(&self) -> NaiveDate {
        self.width.floor(self.epoch)
    }
}

/// 만들 수 없는 경계
///
/// 같은 이름이 다른 범위로 있거나(`existing_name == name`), 다른 이름의
/// 경계와 겹치면서 그 경계가 필요한 구간을 다 덮지 못하는 경우.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: String,
    pub existing_name: String,
    pub existing: KeyRange,
    pub requested: KeyRange,
}

impl From<Conflict> for PartitionError {
    fn from(conflict: Conflict) -> Self {
        PartitionError::BoundaryConflict {
            name: conflict.name,
            existing_name: conflict.existing_name,
            existing: conflict.existing,
            requested: conflict.requested,
        }
    }
}

/// 커버리지 계획 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoveragePlan {
    /// 생성해야 할 경계 (시작일 오름차순)
    pub missing: Vec<PartitionBoundary>,
    /// 이미 존재하는 경계
    pub present: Vec<PartitionBoundary>,
    /// 이름 충돌
    pub conflicts: Vec<Conflict>,
    /// 다른 이름의 기존 경계와 겹치지만 필요한 구간은 이미 덮여 있어 건너뛴 경계
    pub skipped: Vec<PartitionBoundary>,
}

impl CoveragePlan {
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty() && self.conflicts.is_empty()
    }
}

/// [as_of, as_of + horizon) 를 덮는 데 필요한 경계 계산
///
/// 카탈로그가 비어 있으면 기준일(epoch)부터, 아니면 마지막 종료일과
/// as_of 가 속한 간격 중 빠른 쪽부터 시작한다. 생성된 종료일이
/// as_of + horizon 을 넘을 때까지 간격을 이어 붙인다.
pub fn plan_coverage(
    catalog: &PartitionCatalog,
    policy: &PartitionPolicy,
    as_of: NaiveDate,
    horizon: Duration,
) -> Result<CoveragePlan> {
    let width = policy.width;
    let epoch = policy.aligned_epoch();
    let target = as_of
        .checked_add_signed(horizon)
        .ok_or(PartitionError::DateOverflow(as_of))?;

    let mut cursor = match catalog.max_end() {
        None => epoch,
        Some(max_end) => {
            let window_start = width.floor(as_of.max(epoch));
            if max_end <= window_start {
                if !width.is_aligned(max_end) {
                    let name = catalog
                        .iter()
                        .find(|b| b.end() == max_end)
                        .map(|b| b.name.clone())
                        .unwrap_or_default();
                    return Err(PartitionError::Misaligned {
                        name,
                        end: max_end,
                        width,
                    });
                }
                max_end
            } else {
                window_start
            }
        }
    };

    debug!(
        "커버리지 계산: 시작 {} ~ 목표 {} ({} 단위)",
        cursor, target, width
    );

    // 반드시 덮어야 하는 키 구간. horizon 이 0 이어도 as_of 는 포함
    let as_of_end = as_of.succ_opt().ok_or(PartitionError::DateOverflow(as_of))?;
    let required = KeyRange::new(as_of, target.max(as_of_end)).ok_or(PartitionError::DateOverflow(as_of))?;

    let mut plan = CoveragePlan::default();

    loop {
        let candidate = PartitionBoundary::for_interval(width, cursor)?;
        let end = candidate.end();

        match catalog.get(&candidate.name) {
            Some(existing) if existing.range == candidate.range => {
                plan.present.push(candidate);
            }
            Some(existing) => {
                plan.conflicts.push(Conflict {
                    name: candidate.name.clone(),
                    existing_name: existing.name.clone(),
                    existing: existing.range,
                    requested: candidate.range,
                });
            }
            None => match catalog.overlapping(&candidate.range) {
                Some(other) => match first_uncovered(catalog, &candidate.range, &required) {
                    None => {
                        warn!(
                            "경계 {} 가 기존 경계 {} 와 겹쳐 건너뜀",
                            candidate, other
                        );
                        plan.skipped.push(candidate);
                    }
                    Some(key) => {
                        warn!(
                            "경계 {} 가 기존 경계 {} 와 겹치고 {} 을(를) 덮는 경계가 없음",
                            candidate, other, key
                        );
                        plan.conflicts.push(Conflict {
                            name: candidate.name.clone(),
                            existing_name: other.name.clone(),
                            existing: other.range,
                            requested: candidate.range,
                        });
                    }
                },
                None => plan.missing.push(candidate),
            },
        }

        if end > target {
            break;
        }
        cursor = end;
    }

    Ok(plan)
}

/// range 와 required 가 겹치는 구간에서 기존 경계가 덮지 않는 첫 키
fn first_uncovered(catalog: &PartitionCatalog, range: &KeyRange, required: &KeyRange) -> Option<NaiveDate> {
    let mut key = range.start.max(required.start);
    let until = range.end.min(required.end);

    while key < until {
        match catalog.covering(key) {
            Some(boundary) => key = boundary.end(),
            None => return Some(key),
        }
    }
    None
}
