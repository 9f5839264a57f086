use std::error::Error;
#[cfg(debug_assertions)]
use std::io::Write;
use std::sync::Arc;

#[cfg(debug_assertions)]
use chrono::Local;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use env_logger::Builder;
use log::{debug, error, warn, LevelFilter};

use partman::cli::{Cli, Command};
use partman::config::{PartmanConfig, Settings, TableConfig};
use partman::db::{create_db_pool, DatabasePool, PostgresStore};
use partman::partition::scheduler::{PartitionScheduler, ScheduledTable};
use partman::partition::{PartitionManager, RetireMode};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 로거 초기화
    setup_logger();

    let cli = Cli::parse();

    // 설정 로드 및 환경 변수 오버라이드
    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.override_from_env();
    settings.log_settings();
    let config = settings.config;

    // DB 연결 풀 초기화
    let pool = match create_db_pool(&config.connection).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("데이터베이스 연결 풀 초기화 실패: {}", e);
            return Err(e);
        }
    };
    let status = pool.get_pool_status();
    debug!(
        "DB 풀 상태: 사용 가능 {}/{} (최대 {}), 서버 버전 {}",
        status.available,
        status.size,
        status.max_size,
        pool.server_version()
    );

    match cli.command {
        Command::Ensure {
            table,
            as_of,
            horizon,
            dry_run,
        } => {
            let horizon = match horizon {
                Some(h) => Some(Duration::from_std(h.into())?),
                None => None,
            };
            ensure(&pool, &config, table.as_deref(), as_of.unwrap_or_else(today), horizon, dry_run).await
        }
        Command::List { table } => list(&pool, &config, table.as_deref()).await,
        Command::Expired { table, as_of, cutoff } => {
            expired(&pool, &config, table.as_deref(), as_of.unwrap_or_else(today), cutoff).await
        }
        Command::Retire {
            name,
            table,
            mode,
            as_of,
            cutoff,
        } => {
            let table = config.table(&table)?;
            retire(&pool, &config, table, &name, mode.into(), as_of.unwrap_or_else(today), cutoff).await
        }
        Command::Run => run_scheduler(pool, &config).await,
    }
}

/// 로거 설정
fn setup_logger() {
    #[cfg(debug_assertions)]
    {
        Builder::new()
            .filter(None, LevelFilter::Trace)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {} {}:{}] {}",
                    Local::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .parse_default_env()
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        Builder::new()
            .filter(None, LevelFilter::Info)
            .parse_default_env()
            .init();
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// 테이블별 파티션 관리자 생성
fn manager_for(
    pool: &Arc<DatabasePool>,
    config: &PartmanConfig,
    table: &TableConfig,
) -> PartitionManager<PostgresStore> {
    PartitionManager::new(PostgresStore::new(Arc::clone(pool), table), table.policy())
        .with_operation_timeout(config.scheduler.operation_timeout)
}

/// 보존 기준일 결정: 명령행 값 → as_of - retention
fn resolve_cutoff(table: &TableConfig, as_of: NaiveDate, cutoff: Option<NaiveDate>) -> Result<NaiveDate, BoxError> {
    if let Some(cutoff) = cutoff {
        return Ok(cutoff);
    }

    table
        .retention_cutoff(as_of)?
        .ok_or_else(|| format!("{} 테이블에 retention 설정이 없어 --cutoff 가 필요함", table.name).into())
}

/// 파티션 생성 (또는 계획 출력)
async fn ensure(
    pool: &Arc<DatabasePool>,
    config: &PartmanConfig,
    table: Option<&str>,
    as_of: NaiveDate,
    horizon: Option<Duration>,
    dry_run: bool,
) -> Result<(), BoxError> {
    let mut failed = 0;

    for table in config.select_tables(table)? {
        let manager = manager_for(pool, config, table);
        let horizon = match horizon {
            Some(h) => h,
            None => table.horizon()?,
        };

        if dry_run {
            let plan = manager.plan(as_of, horizon).await?;
            println!("{}: 생성 예정 {} 개, 존재 {} 개", table.name, plan.missing.len(), plan.present.len());
            for boundary in &plan.missing {
                println!("  + {}", boundary);
            }
            for conflict in &plan.conflicts {
                println!(
                    "  ! {} 충돌: 기존 {} {}, 요청 {}",
                    conflict.name, conflict.existing_name, conflict.existing, conflict.requested
                );
            }
            for boundary in &plan.skipped {
                println!("  ~ {} (다른 파티션과 겹침)", boundary);
            }
            continue;
        }

        match manager.ensure_coverage(as_of, horizon).await {
            Ok(result) => {
                println!(
                    "{}: 생성 {} 개, 동시 생성 확인 {} 개",
                    table.name,
                    result.created.len(),
                    result.already_present.len()
                );
                for boundary in &result.created {
                    println!("  + {}", boundary);
                }
            }
            Err(e) => {
                error!("{} 파티션 생성 실패: {}", table.name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} 개 테이블의 파티션 생성 실패", failed).into());
    }
    Ok(())
}

/// 파티션 경계 목록 출력
async fn list(pool: &Arc<DatabasePool>, config: &PartmanConfig, table: Option<&str>) -> Result<(), BoxError> {
    for table in config.select_tables(table)? {
        let catalog = manager_for(pool, config, table).list_boundaries().await?;

        println!("{}.{} ({} 단위, 경계 {} 개)", table.schema, table.name, table.interval_width, catalog.len());
        for boundary in &catalog {
            println!("  {}", boundary);
        }
        if let Some(default) = catalog.default_partition() {
            println!("  {} DEFAULT", default);
        }
        for (name, expr) in catalog.foreign() {
            println!("  {} {}", name, expr);
        }
        for gap in catalog.gaps() {
            println!("  빈 구간 {}", gap);
        }
    }

    Ok(())
}

/// 은퇴 가능한 경계 목록 출력
async fn expired(
    pool: &Arc<DatabasePool>,
    config: &PartmanConfig,
    table: Option<&str>,
    as_of: NaiveDate,
    cutoff: Option<NaiveDate>,
) -> Result<(), BoxError> {
    for table in config.select_tables(table)? {
        let cutoff = match resolve_cutoff(table, as_of, cutoff) {
            Ok(cutoff) => cutoff.min(as_of),
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        let catalog = manager_for(pool, config, table).list_boundaries().await?;
        println!("{} (보존 기준일 {})", table.name, cutoff);
        for boundary in catalog.expired(cutoff) {
            println!("  {}", boundary);
        }
    }

    Ok(())
}

/// 경계 은퇴
async fn retire(
    pool: &Arc<DatabasePool>,
    config: &PartmanConfig,
    table: &TableConfig,
    name: &str,
    mode: RetireMode,
    as_of: NaiveDate,
    cutoff: Option<NaiveDate>,
) -> Result<(), BoxError> {
    let cutoff = resolve_cutoff(table, as_of, cutoff)?;
    let result = manager_for(pool, config, table)
        .retire(name, mode, as_of, cutoff)
        .await?;

    match result.mode {
        RetireMode::Drop => println!("{} 삭제됨 {}", result.name, result.range),
        RetireMode::Detach => println!(
            "{} 분리됨 {} -> {}.{}",
            result.name,
            result.range,
            table.schema,
            table.partition_table(&result.name)
        ),
    }

    Ok(())
}

/// 파티션 자동 생성 스케줄러 실행
async fn run_scheduler(pool: Arc<DatabasePool>, config: &PartmanConfig) -> Result<(), BoxError> {
    let mut tables = Vec::with_capacity(config.tables.len());

    for table in &config.tables {
        let store = PostgresStore::new(Arc::clone(&pool), table);
        match store.verify_parent().await {
            Ok(true) => {}
            Ok(false) => warn!("{}.{} 은(는) 범위 파티션 테이블이 아님", table.schema, table.name),
            Err(e) => warn!("{}.{} 확인 실패: {}", table.schema, table.name, e),
        }

        tables.push(ScheduledTable {
            name: table.name.clone(),
            manager: PartitionManager::new(store, table.policy())
                .with_operation_timeout(config.scheduler.operation_timeout),
            horizon: table.horizon()?,
        });
    }

    let scheduler = PartitionScheduler::new(tables, config.scheduler.check_interval)
        .with_retry_delay(config.scheduler.retry_delay);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("종료 시그널 대기 실패: {}", e);
            std::future::pending::<()>().await;
        }
    };

    // 첫 실행도 스케줄러 루프에서 수행 - 실패하면 재시도 간격으로 다시 실행
    scheduler.run_until(shutdown).await;

    Ok(())
}
