//! 단일 후보 평가 명령어.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기본 프리셋으로 평가
//! verdict evaluate -i demos/nvda.json
//!
//! # 시장 컨텍스트 포함, 초보자 상한, JSON 출력
//! verdict evaluate -i demos/nvda.json --market demos/market.json --tier beginner -f json
//! ```

use anyhow::Result;
use tracing::info;

use verdict_core::{AnalysisDepth, Candidate, MarketContext};
use verdict_engine::render::render_result;
use verdict_engine::EvaluationContext;

use crate::commands::shared::{load_engine, read_json, resolve_stage_cap, OutputFormat};

/// 평가 CLI 설정
#[derive(Debug, Clone)]
pub struct EvaluateCliConfig {
    /// 후보 JSON 경로
    pub input: String,
    /// 시장 컨텍스트 JSON 경로 (옵션)
    pub market: Option<String>,
    /// 엔진 설정 파일 (옵션)
    pub config: Option<String>,
    /// 경험 단계
    pub tier: Option<String>,
    /// 직접 지정한 stage cap (%)
    pub stage_cap: Option<String>,
    /// 잠정 평가 여부
    pub provisional: bool,
    /// 출력 형식
    pub format: OutputFormat,
}

/// 후보 하나를 평가하고 출력 문자열을 반환합니다.
pub fn run_evaluate(config: &EvaluateCliConfig) -> Result<String> {
    let engine = load_engine(config.config.as_deref())?;
    let stage_cap = resolve_stage_cap(
        &engine,
        config.tier.as_deref(),
        config.stage_cap.as_deref(),
    )?;

    let candidate: Candidate = read_json(&config.input)?;
    let market = match &config.market {
        Some(path) => Some(read_json::<MarketContext>(path)?.to_indicator_bag()),
        None => None,
    };

    let depth = if config.provisional {
        AnalysisDepth::Provisional
    } else {
        AnalysisDepth::Full
    };
    let mut ctx = EvaluationContext::new(stage_cap).with_depth(depth);
    if let Some(market) = &market {
        ctx = ctx.with_market(market);
    }

    let result = engine.evaluate(&candidate, &ctx);
    info!(
        symbol = %result.candidate_id,
        signal = %result.signal,
        quality = %result.data_quality,
        "평가 완료"
    );

    match config.format {
        OutputFormat::Text => Ok(render_result(&result)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result)?),
    }
}
