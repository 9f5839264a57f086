// 파티션 관련 SQL 쿼리

use chrono::NaiveDate;

/// 부모 테이블의 파티션 목록과 범위 정의 조회 쿼리
pub const LIST_PARTITIONS: &str = "
    SELECT c.relname, pg_get_expr(c.relpartbound, c.oid)
    FROM pg_inherits i
    JOIN pg_class c ON c.oid = i.inhrelid
    JOIN pg_class p ON p.oid = i.inhparent
    JOIN pg_namespace n ON n.oid = p.relnamespace
    WHERE n.nspname = $1
    AND p.relname = $2
    ORDER BY c.relname
";

/// 부모 테이블이 범위 파티션 테이블인지 확인하는 쿼리
pub const CHECK_RANGE_PARTITIONED: &str = "
    SELECT EXISTS (
        SELECT 1
        FROM pg_partitioned_table pt
        JOIN pg_class c ON c.oid = pt.partrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1
        AND c.relname = $2
        AND pt.partstrat = 'r'
    )
";

/// 서버 버전 번호 조회 쿼리
pub const SERVER_VERSION_NUM: &str = "SELECT current_setting('server_version_num')::int4";

/// 식별자 인용 (큰따옴표 이스케이프)
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// 스키마 포함 테이블 이름
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// 범위 파티션 생성 쿼리
///
/// IF NOT EXISTS 를 쓰지 않는다. 이름 중복은 에러로 받아야
/// 동시 생성과 이름 충돌을 구분할 수 있다.
pub fn create_partition(
    schema: &str,
    table: &str,
    partition: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    format!(
        "CREATE TABLE {} PARTITION OF {} FOR VALUES FROM ('{}') TO ('{}')",
        qualified(schema, partition),
        qualified(schema, table),
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// 파티션 인덱스 이름
pub fn partition_index_name(partition: &str, column: &str) -> String {
    format!("{}_{}_idx", partition, column)
}

/// 파티션별 인덱스 생성 쿼리 - 각 파티션에 개별 적용
pub fn create_partition_indices(schema: &str, partition: &str, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_ident(&partition_index_name(partition, column)),
                qualified(schema, partition),
                quote_ident(column)
            )
        })
        .collect()
}

/// 파티션 삭제 쿼리
pub fn drop_partition(schema: &str, partition: &str) -> String {
    format!("DROP TABLE {}", qualified(schema, partition))
}

/// 파티션 분리 쿼리 - 분리된 테이블은 같은 이름으로 남음
pub fn detach_partition(schema: &str, table: &str, partition: &str) -> String {
    format!(
        "ALTER TABLE {} DETACH PARTITION {}",
        qualified(schema, table),
        qualified(schema, partition)
    )
}
