// 데이터베이스 관리 모듈
// 연결 풀 생성과 PostgreSQL 파티션 저장소를 담당합니다.

pub mod bound;
pub mod pool;
pub mod postgres;

// 외부로 노출할 항목들
pub use pool::{create_db_pool, DatabasePool};
pub use postgres::PostgresStore;
