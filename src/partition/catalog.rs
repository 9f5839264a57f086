use chrono::NaiveDate;
use log::warn;

use super::{CatalogEntry, KeyRange, PartitionBound, PartitionBoundary};

/// 파티션 카탈로그 - 시작일 순으로 정렬된 경계 목록
///
/// 저장소에서 매번 새로 읽어 만들며 따로 저장하지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionCatalog {
    boundaries: Vec<PartitionBoundary>,
    default_partition: Option<String>,
    foreign: Vec<(String, String)>,
}

impl PartitionCatalog {
    /// 저장소 항목들로부터 카탈로그 구성
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::default();

        for entry in entries {
            match entry.bound {
                PartitionBound::Range(range) => {
                    catalog.boundaries.push(PartitionBoundary::new(entry.name, range));
                }
                PartitionBound::Default => {
                    if let Some(existing) = &catalog.default_partition {
                        warn!("기본 파티션이 여러 개 보고됨: {}, {}", existing, entry.name);
                    } else {
                        catalog.default_partition = Some(entry.name);
                    }
                }
                PartitionBound::Other(expr) => {
                    catalog.foreign.push((entry.name, expr));
                }
            }
        }

        catalog
            .boundaries
            .sort_by(|a, b| a.start().cmp(&b.start()).then_with(|| a.name.cmp(&b.name)));
        catalog
    }

    pub fn from_boundaries(boundaries: impl IntoIterator<Item = PartitionBoundary>) -> Self {
        Self::from_entries(boundaries.into_iter().map(|b| CatalogEntry::from(&b)))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PartitionBoundary> {
        self.boundaries.iter()
    }

    pub fn boundaries(&self) -> &[PartitionBoundary] {
        &self.boundaries
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn default_partition(&self) -> Option<&str> {
        self.default_partition.as_deref()
    }

    /// 날짜 범위로 해석되지 않은 파티션 (이름, 범위 정의)
    pub fn foreign(&self) -> &[(String, String)] {
        &self.foreign
    }

    pub fn get(&self, name: &str) -> Option<&PartitionBoundary> {
        self.boundaries.iter().find(|b| b.name == name)
    }

    /// 가장 늦은 종료일
    pub fn max_end(&self) -> Option<NaiveDate> {
        self.boundaries.iter().map(|b| b.end()).max()
    }

    /// 키를 포함하는 경계
    pub fn covering(&self, key: NaiveDate) -> Option<&PartitionBoundary> {
        self.boundaries.iter().find(|b| b.contains(key))
    }

    /// 범위와 겹치는 첫 번째 경계
    pub fn overlapping(&self, range: &KeyRange) -> Option<&PartitionBoundary> {
        self.boundaries.iter().find(|b| b.range.overlaps(range))
    }

    /// 인접한 경계 사이의 빈 구간
    pub fn gaps(&self) -> Vec<KeyRange> {
        let mut gaps = Vec::new();
        let mut cursor: Option<NaiveDate> = None;

        for boundary in &self.boundaries {
            if let Some(end) = cursor {
                if let Some(gap) = KeyRange::new(end, boundary.start()) {
                    gaps.push(gap);
                }
            }
            cursor = Some(cursor.map_or(boundary.end(), |c| c.max(boundary.end())));
        }

        gaps
    }

    /// 종료일이 기준일 이전(같음 포함)인 경계 - 은퇴 가능 후보
    pub fn expired(&self, cutoff: NaiveDate) -> impl Iterator<Item = &PartitionBoundary> + '_ {
        self.boundaries.iter().filter(move |b| b.end() <= cutoff)
    }
}

impl<'a> IntoIterator for &'a PartitionCatalog {
    type Item = &'a PartitionBoundary;
    type IntoIter = std::slice::Iter<'a, PartitionBoundary>;

    fn into_iter(self) -> Self::IntoIter {
        self.boundaries.iter()
    }
}

impl IntoIterator for PartitionCatalog {
    type Item = PartitionBoundary;
    type IntoIter = std::vec::IntoIter<PartitionBoundary>;

    fn into_iter(self) -> Self::IntoIter {
        self.boundaries.into_iter()
    }
}
