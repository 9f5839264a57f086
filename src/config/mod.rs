use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::partition::partition_index_name;
use crate::constants::{
    DEFAULT_CHECK_INTERVAL_HOURS, DEFAULT_HORIZON_DAYS, DEFAULT_OPERATION_TIMEOUT_SECS, DEFAULT_SCHEMA,
    SCHEDULER_RETRY_DELAY_SECS,
};
use crate::error::ConfigError;
use crate::partition::{IntervalWidth, PartitionPolicy};

pub mod settings;

pub use settings::{ConfigSource, Settings};

// PostgreSQL 식별자 최대 길이
const MAX_IDENTIFIER_LEN: usize = 63;

/// 데이터베이스 연결 설정
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_connection_pool_size")]
    pub max_connections: usize,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

fn default_connection_pool_size() -> usize {
    4
}

fn default_connection_timeout() -> u64 {
    30
}

impl ConnectionConfig {
    /// 연결 제한 시간 설정 가져오기
    pub fn connection_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.connection_timeout_seconds)
    }
}

/// 스케줄러 설정
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 파티션 체크 주기 (예: "24h")
    #[serde(with = "humantime_format", default = "default_check_interval")]
    pub check_interval: StdDuration,
    /// 저장소 작업 1건당 타임아웃 (예: "5s")
    #[serde(with = "humantime_format", default = "default_operation_timeout")]
    pub operation_timeout: StdDuration,
    /// 실패한 실행 후 다음 실행까지 대기 (check_interval 보다 길면 check_interval)
    #[serde(with = "humantime_format", default = "default_retry_delay")]
    pub retry_delay: StdDuration,
}

fn default_check_interval() -> StdDuration {
    StdDuration::from_secs(DEFAULT_CHECK_INTERVAL_HOURS * 3600)
}

fn default_operation_timeout() -> StdDuration {
    StdDuration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS)
}

fn default_retry_delay() -> StdDuration {
    StdDuration::from_secs(SCHEDULER_RETRY_DELAY_SECS)
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            operation_timeout: default_operation_timeout(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// 파티션 테이블 설정
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    /// 파티션된 부모 테이블 이름
    pub name: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// 파티션 키 컬럼 (정보용)
    pub partition_key: String,
    pub interval_width: IntervalWidth,
    /// 첫 경계의 기준일
    pub epoch: NaiveDate,
    /// as_of 이후 파티션을 보장할 기간 (예: "90days")
    #[serde(with = "humantime_format", default = "default_horizon")]
    pub horizon: StdDuration,
    /// 보존 기간 - 은퇴 기준일 기본값 계산에 사용
    #[serde(with = "humantime_option", default)]
    pub retention: Option<StdDuration>,
    /// 파티션마다 생성할 인덱스 컬럼
    #[serde(default)]
    pub partition_indices: Vec<String>,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_horizon() -> StdDuration {
    StdDuration::from_secs(DEFAULT_HORIZON_DAYS * 86400)
}

impl TableConfig {
    pub fn policy(&self) -> PartitionPolicy {
        PartitionPolicy::new(self.interval_width, self.epoch)
    }

    pub fn horizon(&self) -> Result<Duration, ConfigError> {
        to_chrono(&self.horizon, &format!("tables.{}.horizon", self.name))
    }

    /// as_of - retention. 보존 기간이 없으면 None
    pub fn retention_cutoff(&self, as_of: NaiveDate) -> Result<Option<NaiveDate>, ConfigError> {
        let field = format!("tables.{}.retention", self.name);
        match &self.retention {
            None => Ok(None),
            Some(retention) => {
                let retention = to_chrono(retention, &field)?;
                as_of
                    .checked_sub_signed(retention)
                    .map(Some)
                    .ok_or_else(|| ConfigError::Invalid {
                        field,
                        reason: "보존 기간이 너무 김".to_string(),
                    })
            }
        }
    }

    /// 파티션 테이블 이름 ({테이블}_{경계 이름})
    pub fn partition_table(&self, boundary_name: &str) -> String {
        format!("{}_{}", self.name, boundary_name)
    }
}

fn to_chrono(duration: &StdDuration, field: &str) -> Result<Duration, ConfigError> {
    Duration::from_std(*duration).map_err(|e| ConfigError::Invalid {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// 파티션 관리 설정
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartmanConfig {
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub tables: Vec<TableConfig>,
}

impl Default for PartmanConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "rental".to_string(),
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                max_connections: default_connection_pool_size(),
                connection_timeout_seconds: default_connection_timeout(),
            },
            scheduler: SchedulerConfig::default(),
            tables: vec![TableConfig {
                name: "bookings".to_string(),
                schema: default_schema(),
                partition_key: "start_date".to_string(),
                interval_width: IntervalWidth::Quarterly,
                epoch: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
                horizon: default_horizon(),
                retention: None,
                partition_indices: Vec::new(),
            }],
        }
    }
}

impl PartmanConfig {
    /// 설정 파일에서 로드
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("설정 파일 로드: {}", path.display());

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_yaml(&contents)?;
        info!(
            "설정 로드 완료: {}:{}/{} (테이블 {} 개)",
            config.connection.host,
            config.connection.port,
            config.connection.database,
            config.tables.len()
        );

        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: PartmanConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "tables.name".to_string(),
                    reason: "비어 있음".to_string(),
                });
            }

            if !seen.insert((table.schema.as_str(), table.name.as_str())) {
                return Err(ConfigError::Invalid {
                    field: format!("tables.{}", table.name),
                    reason: "중복된 테이블".to_string(),
                });
            }

            // 경계 이름 길이는 간격 단위마다 고정
            let sample = table.partition_table(&table.interval_width.boundary_name(table.epoch));
            if sample.len() > MAX_IDENTIFIER_LEN {
                return Err(ConfigError::Invalid {
                    field: format!("tables.{}.name", table.name),
                    reason: format!("파티션 이름이 {} 자를 넘음: {}", MAX_IDENTIFIER_LEN, sample),
                });
            }

            // 긴 인덱스 이름은 잘려서 서로 충돌할 수 있음
            for column in &table.partition_indices {
                let index = partition_index_name(&sample, column);
                if index.len() > MAX_IDENTIFIER_LEN {
                    return Err(ConfigError::Invalid {
                        field: format!("tables.{}.partition_indices", table.name),
                        reason: format!("인덱스 이름이 {} 자를 넘음: {}", MAX_IDENTIFIER_LEN, index),
                    });
                }
            }

            table.horizon()?;
        }

        if self.scheduler.check_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "scheduler.check_interval".to_string(),
                reason: "0 일 수 없음".to_string(),
            });
        }

        Ok(())
    }

    /// 이름으로 테이블 설정 찾기
    pub fn table(&self, name: &str) -> Result<&TableConfig, ConfigError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ConfigError::UnknownTable(name.to_string()))
    }

    /// 이름이 주어지면 해당 테이블만, 없으면 전체
    pub fn select_tables(&self, name: Option<&str>) -> Result<Vec<&TableConfig>, ConfigError> {
        match name {
            Some(name) => Ok(vec![self.table(name)?]),
            None => Ok(self.tables.iter().collect()),
        }
    }
}

/// "90days", "24h" 형식의 기간 직렬화
mod humantime_format {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        humantime::parse_duration(&value).map_err(serde::de::Error::custom)
    }
}

mod humantime_option {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(value) => humantime::parse_duration(&value)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
