//! PostgreSQL 날짜 범위 파티션 수명 주기 관리
//!
//! 고정 간격(일/주/월/분기/연)의 겹치지 않는 파티션을 미리 만들어 두고,
//! 보존 기간이 지난 파티션을 삭제하거나 분리한다.

pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod partition;

pub use error::{ConfigError, PartitionError, Result, StoreError};
