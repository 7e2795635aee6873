//! 대만 증권 일별 시세 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 설정 파일의 종목 조회
//! twquote fetch
//!
//! # 상장/흥궤 종목 직접 지정 + CSV 저장
//! twquote fetch -t 00929:復華台灣科技優息:listed -t 7822:倍力:emerging --csv data/quotes.csv
//!
//! # 5분 주기 감시
//! twquote watch --interval-secs 300
//!
//! # ETF 보유 종목 상위 10개
//! twquote holdings --top 10
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use twquote_cli::commands::fetch::{run_fetch, FetchOptions};
use twquote_cli::commands::holdings::run_holdings;
use twquote_cli::commands::watch::run_watch;
use twquote_cli::commands::{load_config, parse_date};
use twquote_core::{init_logging, LogConfig, TickerSpec, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "twquote")]
#[command(about = "대만 증권 일별 시세 수집기 - 상장(TWSE) / 흥궤(TPEx) 시장", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error). 기본: 설정 값
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 시세 통합 한 번 실행
    Fetch {
        /// 종목 지정 (ID[:NAME[:SOURCE]], 여러 번 지정 가능, 예: 7822:倍力:emerging)
        #[arg(short, long = "ticker")]
        tickers: Vec<TickerSpec>,

        /// 기준일 (YYYY-MM-DD, 기본: 거래소 현지 오늘)
        #[arg(long)]
        as_of: Option<String>,

        /// CSV 출력 경로
        #[arg(long)]
        csv: Option<PathBuf>,

        /// 종목별 상세 행 수 (기본: 설정 export.recent_rows)
        #[arg(short, long)]
        recent: Option<usize>,

        /// 리포트를 JSON으로 출력
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// 주기적으로 시세 갱신 (Ctrl-C로 종료)
    Watch {
        /// 갱신 주기 (초)
        #[arg(long, default_value = "300")]
        interval_secs: u64,
    },

    /// ETF 보유 종목 조회
    Holdings {
        /// 보유 종목 JSON URL (기본: 설정 holdings.proxy_url)
        #[arg(long)]
        url: Option<String>,

        /// 출력할 상위 종목 수
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    // 로깅 초기화
    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!(e))?;

    info!("twquote 시작");

    match cli.command {
        Commands::Fetch {
            tickers,
            as_of,
            csv,
            recent,
            json,
        } => {
            let as_of = as_of.as_deref().map(parse_date).transpose()?;
            let options = FetchOptions {
                tickers,
                as_of,
                csv_path: csv,
                recent,
                json,
            };
            run_fetch(&config, options).await?;
        }
        Commands::Watch { interval_secs } => {
            if interval_secs == 0 {
                anyhow::bail!("--interval-secs는 1 이상이어야 합니다");
            }
            run_watch(&config, Duration::from_secs(interval_secs)).await?;
        }
        Commands::Holdings { url, top } => {
            run_holdings(&config, url, top).await?;
        }
    }

    info!("twquote 종료");
    Ok(())
}
