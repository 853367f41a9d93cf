//! 배치 평가 명령어.
//!
//! 스냅샷 파일(`{ "market": {...}?, "candidates": [...] }`)을 메모리 수집기로 재생합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 관심 종목 정렬
//! verdict batch -i demos/snapshot.json -m watchlist
//!
//! # 일부 종목만 비교
//! verdict batch -i demos/snapshot.json -m compare --symbols NVDA,AMD
//!
//! # 스크리닝 후 상위 3개 상세 평가
//! verdict batch -i demos/snapshot.json -m screen --top-n 3 -f json
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use verdict_core::BatchMode;
use verdict_engine::render::render_batch;
use verdict_engine::{BatchOrchestrator, BatchRequest, Snapshot};

use crate::commands::shared::{load_engine, resolve_stage_cap, OutputFormat};

/// 배치 CLI 설정
#[derive(Debug, Clone)]
pub struct BatchCliConfig {
    /// 스냅샷 JSON 경로
    pub input: String,
    /// 배치 모드
    pub mode: BatchMode,
    /// 평가할 종목 (없으면 스냅샷 전체)
    pub symbols: Option<Vec<String>>,
    /// 상세 재평가 후보 수
    pub top_n: Option<usize>,
    /// 엔진 설정 파일 (옵션)
    pub config: Option<String>,
    /// 경험 단계
    pub tier: Option<String>,
    /// 직접 지정한 stage cap (%)
    pub stage_cap: Option<String>,
    /// 출력 형식
    pub format: OutputFormat,
}

/// 배치를 실행하고 출력 문자열을 반환합니다.
///
/// Ctrl+C를 받으면 새 후보 작업을 중단하고 이미 끝난 결과만 출력합니다.
pub async fn run_batch(config: &BatchCliConfig) -> Result<String> {
    let engine = load_engine(config.config.as_deref())?;
    let stage_cap = resolve_stage_cap(
        &engine,
        config.tier.as_deref(),
        config.stage_cap.as_deref(),
    )?;

    let content = std::fs::read_to_string(&config.input)
        .with_context(|| format!("스냅샷을 읽을 수 없음: {}", config.input))?;
    let snapshot = Snapshot::from_json(&content)?;
    let symbols = config
        .symbols
        .clone()
        .unwrap_or_else(|| snapshot.symbols());
    info!(
        snapshot = %config.input,
        candidates = symbols.len(),
        mode = %config.mode,
        "스냅샷 로드 완료"
    );

    let orchestrator =
        BatchOrchestrator::new(Arc::new(engine), Arc::new(snapshot.into_collector()));

    let mut request = BatchRequest::new(config.mode, symbols, stage_cap);
    if let Some(n) = config.top_n {
        request = request.with_detail_top_n(n);
    }

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("중단 요청 수신, 남은 후보 생략");
                cancel.cancel();
            }
        }
    });

    let result = orchestrator.run(request, &cancel).await;
    interrupt.abort();
    let result = result?;

    match config.format {
        OutputFormat::Text => Ok(render_batch(&result)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result)?),
    }
}
