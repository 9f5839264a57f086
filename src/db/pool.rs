use std::error::Error;
use std::sync::Arc;

use deadpool_postgres::{Config, Object, Pool, PoolConfig, PoolError, Runtime};
use log::{debug, info, warn};
use tokio_postgres::NoTls;

use crate::config::ConnectionConfig;
use crate::constants::partition::SERVER_VERSION_NUM;
use crate::constants::MIN_SERVER_VERSION_NUM;

/// 데이터베이스 풀 관리자 구조체
pub struct DatabasePool {
    pool: Pool,
    max_connections: usize,
    server_version: i32,
}

impl DatabasePool {
    /// 클라이언트 가져오기
    pub async fn get_client(&self) -> Result<Object, PoolError> {
        self.pool.get().await
    }

    /// 서버 버전 번호 (예: 160002)
    pub fn server_version(&self) -> i32 {
        self.server_version
    }

    /// 풀 상태 확인
    pub fn get_pool_status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            max_size: self.max_connections,
            available: status.available,
            size: status.size,
        }
    }
}

/// 풀 상태 구조체
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    pub max_size: usize,
    pub available: usize,
    pub size: usize,
}

/// 데이터베이스 연결 풀 생성
pub async fn create_db_pool(conn_config: &ConnectionConfig) -> Result<Arc<DatabasePool>, Box<dyn Error + Send + Sync>> {
    // deadpool-postgres 설정 생성
    let mut cfg = Config::new();
    cfg.host = Some(conn_config.host.clone());
    cfg.port = Some(conn_config.port);
    cfg.user = Some(conn_config.user.clone());
    cfg.password = Some(conn_config.password.clone());
    cfg.dbname = Some(conn_config.database.clone());
    cfg.application_name = Some(env!("CARGO_PKG_NAME").to_string());

    // 최대 연결 수 설정
    cfg.pool = Some(PoolConfig::new(conn_config.max_connections));

    // 연결 제한 시간 설정
    cfg.connect_timeout = Some(conn_config.connection_timeout());

    debug!("DB 연결 풀 생성 중... (최대 연결: {})", conn_config.max_connections);
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

    // 연결 테스트 겸 서버 버전 확인
    let client = pool.get().await?;
    let server_version: i32 = client.query_one(SERVER_VERSION_NUM, &[]).await?.try_get(0)?;
    info!(
        "DB 연결 풀 생성 완료 및 연결 테스트 성공: {}:{}/{} (서버 버전 {})",
        conn_config.host, conn_config.port, conn_config.database, server_version
    );

    // DEFAULT 파티션과 파티션 인덱스는 11 이상에서 지원
    if server_version < MIN_SERVER_VERSION_NUM {
        warn!(
            "PostgreSQL {} 은(는) 지원 최소 버전 {} 보다 낮음",
            server_version, MIN_SERVER_VERSION_NUM
        );
    }

    Ok(Arc::new(DatabasePool {
        pool,
        max_connections: conn_config.max_connections,
        server_version,
    }))
}
