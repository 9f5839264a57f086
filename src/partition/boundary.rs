use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::IntervalWidth;
use crate::error::Result;

/// 반개구간 [start, end) 키 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl KeyRange {
    /// start < end 가 아니면 None
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// end 와 같은 키는 포함하지 않음
    pub fn contains(&self, key: NaiveDate) -> bool {
        self.start <= key && key < self.end
    }

    pub fn overlaps(&self, other: &KeyRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// 파티션 경계: 이름 + 키 범위
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionBoundary {
    pub name: String,
    pub range: KeyRange,
}

impl PartitionBoundary {
    pub fn new(name: impl Into<String>, range: KeyRange) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    /// 날짜가 속한 간격의 경계 생성 (이름은 시작일에서 결정)
    pub fn for_interval(width: IntervalWidth, date: NaiveDate) -> Result<Self> {
        let start = width.floor(date);
        let end = width.next(start)?;
        Ok(Self {
            name: width.boundary_name(start),
            range: KeyRange { start, end },
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end
    }

    pub fn contains(&self, key: NaiveDate) -> bool {
        self.range.contains(key)
    }
}

impl fmt::Display for PartitionBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.range)
    }
}

/// 저장소가 보고하는 파티션 범위 정의
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionBound {
    /// FOR VALUES FROM (..) TO (..)
    Range(KeyRange),
    /// 어떤 범위에도 속하지 않는 키를 받는 기본 파티션
    Default,
    /// 날짜 범위로 해석할 수 없는 정의 (MINVALUE/MAXVALUE 등)
    Other(String),
}

/// 저장소 카탈로그 항목 (이름 + 범위 정의)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub bound: PartitionBound,
}

impl CatalogEntry {
    pub fn range(name: impl Into<String>, range: KeyRange) -> Self {
        Self {
            name: name.into(),
            bound: PartitionBound::Range(range),
        }
    }
}

impl From<&PartitionBoundary> for CatalogEntry {
    fn from(boundary: &PartitionBoundary) -> Self {
        Self::range(boundary.name.clone(), boundary.range)
    }
}
