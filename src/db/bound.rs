// pg_get_expr(relpartbound) 결과 해석

use chrono::NaiveDate;

use crate::partition::{KeyRange, PartitionBound};

/// 파티션 범위 정의 문자열 해석
///
/// `FOR VALUES FROM ('2024-01-01') TO ('2024-04-01')` 형식의 단일 날짜 범위와
/// `DEFAULT` 만 인식한다. 나머지는 `PartitionBound::Other` 로 남긴다.
pub fn parse_bound(expr: &str) -> PartitionBound {
    let trimmed = expr.trim();

    if trimmed.eq_ignore_ascii_case("DEFAULT") {
        return PartitionBound::Default;
    }

    match parse_range(trimmed) {
        Some(range) => PartitionBound::Range(range),
        None => PartitionBound::Other(trimmed.to_string()),
    }
}

fn parse_range(expr: &str) -> Option<KeyRange> {
    let rest = expr.strip_prefix("FOR VALUES FROM (")?;
    let (from, rest) = rest.split_once(") TO (")?;
    let to = rest.strip_suffix(')')?;

    KeyRange::new(parse_literal(from)?, parse_literal(to)?)
}

/// '2024-01-01' 또는 자정 시각의 timestamp 리터럴
fn parse_literal(literal: &str) -> Option<NaiveDate> {
    let inner = literal.trim().strip_prefix('\'')?.strip_suffix('\'')?;
    if inner.contains('\'') {
        return None;
    }

    let date = NaiveDate::parse_from_str(inner.get(..10)?, "%Y-%m-%d").ok()?;
    let time = inner.get(10..)?.trim();
    if time.is_empty() || time.starts_with("00:00:00") {
        Some(date)
    } else {
        None
    }
}
