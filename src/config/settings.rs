use std::env;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::PartmanConfig;
use crate::constants::{CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE};
use crate::error::ConfigError;

/// 설정 소스 우선순위
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// 명령행 인자
    CommandLine,
    /// 환경 변수
    Environment,
    /// 설정 파일
    File,
    /// 기본값
    Default,
}

impl ConfigSource {
    fn label(&self) -> &'static str {
        match self {
            ConfigSource::CommandLine => "명령행 인자",
            ConfigSource::Environment => "환경 변수",
            ConfigSource::File => "설정 파일",
            ConfigSource::Default => "기본값",
        }
    }
}

/// 통합 설정 관리자
#[derive(Clone, Debug)]
pub struct Settings {
    pub config: PartmanConfig,
    pub source: ConfigSource,
}

impl Settings {
    /// 설정 로드
    ///
    /// 명령행 경로 → PARTMAN_CONFIG_FILE → ./partman.yml → 기본값 순서.
    /// 명령행으로 지정한 파일은 없거나 잘못되면 에러로 처리한다.
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        // 1. 명령행 인자
        if let Some(path) = cli_path {
            let config = PartmanConfig::load_from_file(path)?;
            return Ok(Self {
                config,
                source: ConfigSource::CommandLine,
            });
        }

        // 2. 환경 변수에서 설정 파일 경로 확인
        if let Ok(path) = env::var(CONFIG_FILE_ENV) {
            info!("환경 변수에서 설정 파일 경로 로드: {}", path);
            let path = PathBuf::from(path);
            if path.exists() {
                match PartmanConfig::load_from_file(&path) {
                    Ok(config) => {
                        return Ok(Self {
                            config,
                            source: ConfigSource::Environment,
                        })
                    }
                    Err(e) => {
                        warn!("환경 변수에 지정된 설정 파일 로드 실패: {}", e);
                    }
                }
            } else {
                warn!("환경 변수에 지정된 설정 파일이 존재하지 않음: {}", path.display());
            }
        }

        // 3. 현재 디렉토리의 partman.yml 파일 확인
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            match PartmanConfig::load_from_file(DEFAULT_CONFIG_FILE) {
                Ok(config) => {
                    return Ok(Self {
                        config,
                        source: ConfigSource::File,
                    })
                }
                Err(e) => {
                    warn!("기본 설정 파일 로드 실패: {}", e);
                }
            }
        }

        // 4. 기본 설정 사용
        info!("설정 파일을 찾을 수 없어 기본 설정 사용");
        Ok(Self {
            config: PartmanConfig::default(),
            source: ConfigSource::Default,
        })
    }

    /// 환경 변수에서 연결 설정 오버라이드
    pub fn override_from_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection = &mut self.config.connection;

        if let Some(host) = lookup("DB_HOST") {
            info!("환경 변수에서 DB 호스트 설정: {}", host);
            connection.host = host;
        }

        if let Some(port) = lookup("DB_PORT") {
            match port.parse::<u16>() {
                Ok(port) => {
                    info!("환경 변수에서 DB 포트 설정: {}", port);
                    connection.port = port;
                }
                Err(_) => warn!("환경 변수 DB_PORT 값이 유효한 포트 번호가 아님: {}", port),
            }
        }

        if let Some(name) = lookup("DB_NAME") {
            info!("환경 변수에서 DB 이름 설정: {}", name);
            connection.database = name;
        }

        if let Some(user) = lookup("DB_USER") {
            info!("환경 변수에서 DB 사용자 설정: {}", user);
            connection.user = user;
        }

        if let Some(password) = lookup("DB_PASSWORD") {
            info!("환경 변수에서 DB 비밀번호 설정");
            connection.password = password;
        }

        if let Some(max_conn) = lookup("DB_MAX_CONNECTIONS") {
            if let Ok(max) = max_conn.parse::<usize>() {
                info!("환경 변수에서 DB 최대 연결 수 설정: {}", max);
                connection.max_connections = max;
            }
        }
    }

    /// 설정 정보 로그 출력
    pub fn log_settings(&self) {
        info!("설정 소스: {}", self.source.label());
        info!(
            "데이터베이스 연결: {}:{}/{}",
            self.config.connection.host, self.config.connection.port, self.config.connection.database
        );
        info!(
            "파티션 체크 주기: {}",
            humantime::format_duration(self.config.scheduler.check_interval)
        );

        for table in &self.config.tables {
            info!(
                "관리 테이블: {}.{} ({} 단위, 키 {}, 기준일 {}, horizon {})",
                table.schema,
                table.name,
                table.interval_width,
                table.partition_key,
                table.epoch,
                humantime::format_duration(table.horizon)
            );
        }
    }
}
