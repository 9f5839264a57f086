use std::future::Future;
use std::time::Duration as StdDuration;

use chrono::{Duration, Local, NaiveDate};
use log::{debug, error, info};

use super::{CreatedBoundaries, PartitionManager, PartitionStore};
use crate::constants::SCHEDULER_RETRY_DELAY_SECS;
use crate::error::Result;

/// 스케줄러가 관리하는 테이블 1개
pub struct ScheduledTable<S> {
    pub name: String,
    pub manager: PartitionManager<S>,
    pub horizon: Duration,
}

/// 테이블별 실행 결과
pub struct TableRun {
    pub table: String,
    pub result: Result<CreatedBoundaries>,
}

/// 파티션 자동 생성 스케줄러
///
/// 주기마다 모든 테이블에 대해 ensure_coverage 만 실행한다. 은퇴는 하지 않는다.
pub struct PartitionScheduler<S> {
    tables: Vec<ScheduledTable<S>>,
    check_interval: StdDuration,
    retry_delay: StdDuration,
}

impl<S: PartitionStore> PartitionScheduler<S> {
    pub fn new(tables: Vec<ScheduledTable<S>>, check_interval: StdDuration) -> Self {
        Self {
            tables,
            check_interval,
            retry_delay: StdDuration::from_secs(SCHEDULER_RETRY_DELAY_SECS).min(check_interval),
        }
    }

    /// 실패한 실행 후 재시도 간격. check_interval 보다 길 수 없음
    pub fn with_retry_delay(mut self, retry_delay: StdDuration) -> Self {
        self.retry_delay = retry_delay.min(self.check_interval);
        self
    }

    /// 실행 결과에 따른 다음 실행까지의 대기 시간
    pub fn next_delay(&self, runs: &[TableRun]) -> StdDuration {
        if runs.iter().any(|run| run.result.is_err()) {
            self.retry_delay
        } else {
            self.check_interval
        }
    }

    /// 모든 테이블에 대해 한 번 실행. 한 테이블의 실패는 다른 테이블에 영향 없음
    pub async fn run_once(&self, as_of: NaiveDate) -> Vec<TableRun> {
        let mut runs = Vec::with_capacity(self.tables.len());

        for table in &self.tables {
            info!("{} 테이블의 파티션 확인 (as_of {})", table.name, as_of);

            let result = table.manager.ensure_coverage(as_of, table.horizon).await;
            match &result {
                Ok(created) if !created.created.is_empty() => {
                    info!("{} 미래 파티션 생성 완료: {} 개", table.name, created.created.len());
                }
                Ok(_) => debug!("{} 파티션이 이미 충분함", table.name),
                Err(e) => error!("{} 파티션 생성 실패: {}", table.name, e),
            }

            runs.push(TableRun {
                table: table.name.clone(),
                result,
            });
        }

        runs
    }

    /// 즉시 한 번 실행한 뒤 shutdown 이 완료될 때까지 주기적으로 실행
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("파티션 자동 생성 스케줄러 시작 (테이블 {} 개)", self.tables.len());
        tokio::pin!(shutdown);

        loop {
            let runs = self.run_once(Local::now().date_naive()).await;

            // 실패한 테이블이 있으면 짧은 간격으로 재시도
            let delay = self.next_delay(&runs);

            let next_run = Local::now() + Duration::from_std(delay).unwrap_or_else(|_| Duration::days(1));
            debug!(
                "다음 파티션 자동 생성 스케줄: {} 후 ({})",
                humantime::format_duration(delay),
                next_run.format("%Y-%m-%d %H:%M:%S")
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("파티션 자동 생성 스케줄러 종료");
                    return;
                }
            }
        }
    }
}
