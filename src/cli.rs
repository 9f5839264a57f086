// 명령행 인자 정의

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::partition::RetireMode;

/// PostgreSQL 범위 파티션 수명 주기 관리 도구
#[derive(Debug, Parser)]
#[command(name = "partman", version, about)]
pub struct Cli {
    /// 설정 파일 경로 (기본: $PARTMAN_CONFIG_FILE 또는 ./partman.yml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// as_of 부터 horizon 까지 파티션이 존재하도록 생성
    Ensure {
        /// 대상 테이블 (생략 시 전체)
        #[arg(long, short)]
        table: Option<String>,
        /// 기준일 (기본: 오늘)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// 설정의 horizon 대신 사용할 기간 (예: 90days)
        #[arg(long)]
        horizon: Option<humantime::Duration>,
        /// 생성하지 않고 계획만 출력
        #[arg(long)]
        dry_run: bool,
    },

    /// 현재 파티션 경계 목록
    List {
        #[arg(long, short)]
        table: Option<String>,
    },

    /// 보존 기준일 이전에 끝난 경계 목록
    Expired {
        #[arg(long, short)]
        table: Option<String>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// 보존 기준일 (기본: as_of - retention)
        #[arg(long)]
        cutoff: Option<NaiveDate>,
    },

    /// 경계를 삭제하거나 분리
    Retire {
        /// 경계 이름 (예: 2023_Q1)
        name: String,
        #[arg(long, short)]
        table: String,
        #[arg(long, value_enum)]
        mode: ModeArg,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// 보존 기준일 (기본: as_of - retention)
        #[arg(long)]
        cutoff: Option<NaiveDate>,
    },

    /// 파티션 자동 생성 스케줄러 실행 (Ctrl-C 로 종료)
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Drop,
    Detach,
}

impl From<ModeArg> for RetireMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Drop => RetireMode::Drop,
            ModeArg::Detach => RetireMode::Detach,
        }
    }
}
