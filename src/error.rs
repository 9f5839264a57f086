// 파티션 관리 에러 타입 정의

use chrono::NaiveDate;
use thiserror::Error;

use crate::partition::{IntervalWidth, KeyRange};

/// 파티션 관리 결과 타입
pub type Result<T> = std::result::Result<T, PartitionError>;

/// 저장소(데이터베이스) 수준 에러
#[derive(Error, Debug)]
pub enum StoreError {
    /// 같은 이름의 파티션이 이미 존재함
    #[error("파티션이 이미 존재함: {0}")]
    AlreadyExists(String),

    /// 파티션을 찾을 수 없음
    #[error("파티션을 찾을 수 없음: {0}")]
    NotFound(String),

    /// 파티션 작업 타임아웃
    #[error("{operation} 작업 타임아웃 - {name}")]
    Timeout { operation: &'static str, name: String },

    /// 기타 저장소 에러 (권한, 디스크, 연결 등)
    #[error("저장소 에러: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError::Backend(err.into())
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// 파티션 수명 주기 관리 에러
#[derive(Error, Debug)]
pub enum PartitionError {
    /// 같은 이름의 경계가 다른 범위로 이미 존재하거나,
    /// 다른 이름의 경계와 겹쳐 필요한 구간을 채울 수 없음
    #[error("경계 충돌 - {name}: 기존 {existing_name} {existing}, 요청 범위 {requested}")]
    BoundaryConflict {
        name: String,
        existing_name: String,
        existing: KeyRange,
        requested: KeyRange,
    },

    /// 저장소 작업 실패
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// 아직 쓰기를 받을 수 있는 경계의 은퇴 요청
    #[error("활성 경계는 은퇴할 수 없음 - {name} (기준일 {as_of})")]
    ActiveBoundary { name: String, as_of: NaiveDate },

    /// 보존 기준일 이후에 끝나는 경계의 은퇴 요청
    #[error("보존 기간 내 경계 - {name}: 종료일 {end} > 보존 기준일 {cutoff}")]
    OutsideRetention {
        name: String,
        end: NaiveDate,
        cutoff: NaiveDate,
    },

    /// 은퇴 대상 경계를 찾을 수 없음
    #[error("경계를 찾을 수 없음: {0}")]
    NotFound(String),

    /// 기존 카탈로그의 마지막 경계가 간격 단위에 정렬되지 않음
    #[error("정렬되지 않은 경계 - {name}: 종료일 {end} 은 {width} 단위 경계가 아님")]
    Misaligned {
        name: String,
        end: NaiveDate,
        width: IntervalWidth,
    },

    /// 날짜 계산 범위 초과
    #[error("날짜 범위 초과: {0}")]
    DateOverflow(NaiveDate),
}

/// 설정 로드/검증 에러
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("설정 파일 읽기 실패 - {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("설정 파일 파싱 실패: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("잘못된 설정 값 - {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("설정된 테이블이 없음: {0}")]
    UnknownTable(String),
}
