//! 종합 점수 엔진 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 단일 후보 평가
//! verdict evaluate -i demos/nvda.json --market demos/market.json
//!
//! # 스냅샷 배치 평가 (watchlist / compare / screen / analyze)
//! verdict batch -i demos/snapshot.json -m screen --top-n 2
//!
//! # 설정 검증
//! verdict validate-config -c config/engine.toml
//!
//! # 기본 프리셋 출력
//! verdict dump-config > config/engine.toml
//! ```

use clap::{Parser, Subcommand};
use std::str::FromStr;
use tracing::error;

use verdict_core::{init_logging_from_env, BatchMode};
use verdict_cli::commands::batch::{run_batch, BatchCliConfig};
use verdict_cli::commands::config::{dump_config, validate_config};
use verdict_cli::commands::evaluate::{run_evaluate, EvaluateCliConfig};
use verdict_cli::commands::shared::{parse_symbols, OutputFormat};

#[derive(Parser)]
#[command(name = "verdict")]
#[command(about = "Composite scoring & gating engine CLI - 종합 점수/게이트 평가", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 단일 후보 평가
    Evaluate {
        /// 후보 JSON 파일
        #[arg(short, long)]
        input: String,

        /// 시장 컨텍스트 JSON 파일
        #[arg(long)]
        market: Option<String>,

        /// 엔진 설정 파일 (TOML 또는 JSON, 기본: 내장 프리셋)
        #[arg(short, long)]
        config: Option<String>,

        /// 경험 단계 (beginner, intermediate, advanced)
        #[arg(short, long, conflicts_with = "stage_cap")]
        tier: Option<String>,

        /// 비중 상한 직접 지정 (%)
        #[arg(long)]
        stage_cap: Option<String>,

        /// 잠정 평가 (고비용 분석 생략)
        #[arg(long, default_value = "false")]
        provisional: bool,

        /// 출력 형식 (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// 스냅샷 배치 평가
    Batch {
        /// 스냅샷 JSON 파일
        #[arg(short, long)]
        input: String,

        /// 배치 모드 (analyze, watchlist, compare, screen)
        #[arg(short, long, default_value = "watchlist")]
        mode: String,

        /// 평가할 종목 (쉼표로 구분, 기본: 스냅샷 전체)
        #[arg(short, long)]
        symbols: Option<String>,

        /// 상세 재평가 후보 수
        #[arg(long)]
        top_n: Option<usize>,

        /// 엔진 설정 파일
        #[arg(short, long)]
        config: Option<String>,

        /// 경험 단계 (beginner, intermediate, advanced)
        #[arg(short, long, conflicts_with = "stage_cap")]
        tier: Option<String>,

        /// 비중 상한 직접 지정 (%)
        #[arg(long)]
        stage_cap: Option<String>,

        /// 출력 형식 (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// 설정 파일 검증
    ValidateConfig {
        /// 설정 파일
        #[arg(short, long)]
        config: String,
    },

    /// 기본 프리셋을 TOML로 출력
    DumpConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 로드 후 로깅 초기화
    dotenvy::dotenv().ok();
    init_logging_from_env()?;

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Evaluate {
            input,
            market,
            config,
            tier,
            stage_cap,
            provisional,
            format,
        } => {
            let config = EvaluateCliConfig {
                input,
                market,
                config,
                tier,
                stage_cap,
                provisional,
                format: OutputFormat::parse(&format)?,
            };
            run_evaluate(&config)
        }

        Commands::Batch {
            input,
            mode,
            symbols,
            top_n,
            config,
            tier,
            stage_cap,
            format,
        } => {
            let config = BatchCliConfig {
                input,
                mode: BatchMode::from_str(&mode)?,
                symbols: symbols.as_deref().map(parse_symbols),
                top_n,
                config,
                tier,
                stage_cap,
                format: OutputFormat::parse(&format)?,
            };
            run_batch(&config).await
        }

        Commands::ValidateConfig { config } => validate_config(&config),

        Commands::DumpConfig => dump_config(),
    };

    match output {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            error!("명령 실패: {:#}", e);
            Err(e.into())
        }
    }
}
