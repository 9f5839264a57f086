// SQL 쿼리 모듈
pub mod partition;

// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_FILE: &str = "partman.yml";

// 설정 파일 경로 환경 변수
pub const CONFIG_FILE_ENV: &str = "PARTMAN_CONFIG_FILE";

// 파티션 작업 타임아웃
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 5;   // 저장소 작업 1건당

// 파티션 체크 주기
pub const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 24;
pub const SCHEDULER_RETRY_DELAY_SECS: u64 = 10;     // 실패한 실행 후 재시도 대기

// 지원하는 최소 PostgreSQL 버전 (server_version_num)
pub const MIN_SERVER_VERSION_NUM: i32 = 110000;

// 기본 파티션 정책
pub const DEFAULT_HORIZON_DAYS: u64 = 90;
pub const DEFAULT_SCHEMA: &str = "public";
