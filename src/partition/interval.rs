use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PartitionError, Result};

/// 파티션 간격 단위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalWidth {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl IntervalWidth {
    /// 날짜가 속한 간격의 시작일 (정렬된 시작일)
    pub fn floor(&self, date: NaiveDate) -> NaiveDate {
        match self {
            IntervalWidth::Daily => date,
            IntervalWidth::Weekly => {
                let offset = date.weekday().num_days_from_monday() as u64;
                // 월요일까지 되돌아가는 것은 NaiveDate::MIN 근처가 아니면 실패하지 않음
                date.checked_sub_days(Days::new(offset)).unwrap_or(date)
            }
            IntervalWidth::Monthly => date.with_day(1).unwrap_or(date),
            IntervalWidth::Quarterly => {
                let first_month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date)
            }
            IntervalWidth::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// 간격 시작일에 정렬되어 있는지 확인
    pub fn is_aligned(&self, date: NaiveDate) -> bool {
        self.floor(date) == date
    }

    /// 날짜가 속한 간격의 다음 간격 시작일
    pub fn next(&self, date: NaiveDate) -> Result<NaiveDate> {
        let start = self.floor(date);
        let next = match self {
            IntervalWidth::Daily => start.checked_add_days(Days::new(1)),
            IntervalWidth::Weekly => start.checked_add_days(Days::new(7)),
            IntervalWidth::Monthly => start.checked_add_months(Months::new(1)),
            IntervalWidth::Quarterly => start.checked_add_months(Months::new(3)),
            IntervalWidth::Yearly => start.checked_add_months(Months::new(12)),
        };

        next.ok_or(PartitionError::DateOverflow(start))
    }

    /// 간격 시작일로부터 경계 이름 생성
    ///
    /// 같은 시작일과 간격 단위는 항상 같은 이름을 만든다. 반복 실행 시
    /// 기존 경계를 이름으로 인식하기 위해 필요하다.
    pub fn boundary_name(&self, start: NaiveDate) -> String {
        match self {
            // 일 단위는 기존 일별 파티션과 같은 YYYYMMDD 형식
            IntervalWidth::Daily => format!(
                "{:04}{:02}{:02}",
                start.year(),
                start.month(),
                start.day()
            ),
            IntervalWidth::Weekly => {
                let week = start.iso_week();
                format!("{:04}_W{:02}", week.year(), week.week())
            }
            IntervalWidth::Monthly => format!("{:04}_M{:02}", start.year(), start.month()),
            IntervalWidth::Quarterly => {
                format!("{:04}_Q{}", start.year(), start.month0() / 3 + 1)
            }
            IntervalWidth::Yearly => format!("{:04}", start.year()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalWidth::Daily => "daily",
            IntervalWidth::Weekly => "weekly",
            IntervalWidth::Monthly => "monthly",
            IntervalWidth::Quarterly => "quarterly",
            IntervalWidth::Yearly => "yearly",
        }
    }
}

impl fmt::Display for IntervalWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalWidth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(IntervalWidth::Daily),
            "weekly" | "week" => Ok(IntervalWidth::Weekly),
            "monthly" | "month" => Ok(IntervalWidth::Monthly),
            "quarterly" | "quarter" => Ok(IntervalWidth::Quarterly),
            "yearly" | "year" => Ok(IntervalWidth::Yearly),
            other => Err(format!("알 수 없는 간격 단위: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_quarter_floor_and_next() {
        let q = IntervalWidth::Quarterly;
        assert_eq!(q.floor(date(2024, 2, 15)), date(2024, 1, 1));
        assert_eq!(q.floor(date(2024, 12, 31)), date(2024, 10, 1));
        assert_eq!(q.next(date(2024, 2, 15)).unwrap(), date(2024, 4, 1));
        assert_eq!(q.next(date(2024, 10, 1)).unwrap(), date(2025, 1, 1));
    }

    #[test]
    fn test_boundary_names() {
        assert_eq!(IntervalWidth::Quarterly.boundary_name(date(2024, 4, 1)), "2024_Q2");
        assert_eq!(IntervalWidth::Quarterly.boundary_name(date(2023, 1, 1)), "2023_Q1");
        assert_eq!(IntervalWidth::Monthly.boundary_name(date(2024, 3, 1)), "2024_M03");
        assert_eq!(IntervalWidth::Daily.boundary_name(date(2024, 3, 5)), "20240305");
        assert_eq!(IntervalWidth::Yearly.boundary_name(date(2024, 1, 1)), "2024");
        // 2024-12-30 (월) 은 ISO 기준 2025년 1주차
        assert_eq!(IntervalWidth::Weekly.boundary_name(date(2024, 12, 30)), "2025_W01");
    }

    #[test]
    fn test_weekly_floor_is_monday() {
        let w = IntervalWidth::Weekly;
        // 2024-02-15 는 목요일
        assert_eq!(w.floor(date(2024, 2, 15)), date(2024, 2, 12));
        assert!(w.is_aligned(date(2024, 2, 12)));
        assert!(!w.is_aligned(date(2024, 2, 13)));
        assert_eq!(w.next(date(2024, 2, 12)).unwrap(), date(2024, 2, 19));
    }

    #[test]
    fn test_month_end_advances_to_next_first() {
        let m = IntervalWidth::Monthly;
        assert_eq!(m.next(date(2024, 1, 31)).unwrap(), date(2024, 2, 1));
        assert_eq!(m.next(date(2024, 12, 1)).unwrap(), date(2025, 1, 1));
    }

    #[test]
    fn test_parse_width() {
        assert_eq!("Quarterly".parse::<IntervalWidth>(), Ok(IntervalWidth::Quarterly));
        assert_eq!("month".parse::<IntervalWidth>(), Ok(IntervalWidth::Monthly));
        assert!("hourly".parse::<IntervalWidth>().is_err());
    }
}
