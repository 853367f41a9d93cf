//! 배치 오케스트레이터.
//!
//! 후보 집합을 모드별로 평가합니다.
//!
//! | 모드 | 1차 깊이 | 2차 상세 재평가 | 결과 순서 | best-of |
//! |------|---------|----------------|----------|---------|
//! | analyze | FULL | - | 호출 순서 | - |
//! | watchlist | PROVISIONAL | `detail_top_n` 지정 시 | 점수 내림차순 | - |
//! | compare | FULL | - | 호출 순서 | O |
//! | screen | PROVISIONAL | 상위 `screen_top_n` | 점수 내림차순 | - |
//!
//! 시장 컨텍스트는 fan-out 전에 한 번만 수집하여 모든 후보(2차 포함)가 공유합니다.
//! 수집 실패/타임아웃은 해당 후보만 품질 저하로 표시하고 배치를 계속합니다.

use chrono::Utc;
use futures::{future, stream, StreamExt};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use verdict_core::{
    batch_span, AnalysisDepth, BatchMode, BatchResult, BatchSummary, BestOf, BestOfPick, Candidate,
    CompositeResult, DegradedCandidate, IndicatorBag, IndicatorView, MarketContext, VerdictError,
};

use crate::collector::{CollectRequest, CollectorError, SignalCollector};
use crate::config::BestOfSpec;
use crate::pipeline::{EvaluationContext, ScoringEngine};

// ================================================================================================
// Error Types
// ================================================================================================

/// 배치 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// 후보 없음
    #[error("빈 배치 요청")]
    EmptyRequest,

    /// 모든 후보 수집 실패
    #[error("모든 후보의 수집이 실패했습니다 ({attempted}건)")]
    NoData { attempted: usize },
}

impl From<BatchError> for VerdictError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::EmptyRequest => VerdictError::InvalidInput(err.to_string()),
            BatchError::NoData { .. } => VerdictError::NoData(err.to_string()),
        }
    }
}

// ================================================================================================
// 요청
// ================================================================================================

/// 배치 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    /// 후보 종목 (호출 순서)
    pub symbols: Vec<String>,
    /// 배치 모드
    pub mode: BatchMode,
    /// 상세 재평가 후보 수 (screen 기본값: 설정의 `screen_top_n`)
    pub detail_top_n: Option<usize>,
    /// 호출자 경험 단계 상한 (%)
    pub stage_cap_pct: Decimal,
}

impl BatchRequest {
    pub fn new(mode: BatchMode, symbols: Vec<String>, stage_cap_pct: Decimal) -> Self {
        Self {
            symbols,
            mode,
            detail_top_n: None,
            stage_cap_pct,
        }
    }

    pub fn with_detail_top_n(mut self, n: usize) -> Self {
        self.detail_top_n = Some(n);
        self
    }
}

/// 중복 제거 (첫 등장 유지, 공백 제거).
pub fn dedupe_symbols(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

/// 점수 내림차순, 동점은 심볼 오름차순.
fn by_score_desc(a: &CompositeResult, b: &CompositeResult) -> Ordering {
    b.composite_score
        .cmp(&a.composite_score)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

/// 후보 하나의 평가 산출물.
#[derive(Debug, Clone)]
struct Evaluated {
    result: CompositeResult,
    candidate: Candidate,
    collector_error: Option<String>,
}

// ================================================================================================
// 오케스트레이터
// ================================================================================================

/// 배치 오케스트레이터.
pub struct BatchOrchestrator<C: SignalCollector + ?Sized> {
    engine: Arc<ScoringEngine>,
    collector: Arc<C>,
}

impl<C: SignalCollector + ?Sized> BatchOrchestrator<C> {
    pub fn new(engine: Arc<ScoringEngine>, collector: Arc<C>) -> Self {
        Self { engine, collector }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// 배치 실행.
    ///
    /// `cancel`이 취소되면 새 후보 작업을 더 시작하지 않고, 시작하지 못한 후보는
    /// `summary.cancelled`에 기록합니다.
    pub async fn run(
        &self,
        request: BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, BatchError> {
        let symbols = dedupe_symbols(&request.symbols);
        if symbols.is_empty() {
            return Err(BatchError::EmptyRequest);
        }

        let run_id = Uuid::new_v4();
        let span = batch_span!(run_id, request.mode);
        self.execute(run_id, symbols, request, cancel)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        symbols: Vec<String>,
        request: BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, BatchError> {
        let mode = request.mode;
        let depth = mode.initial_depth();
        info!(candidates = symbols.len(), "배치 평가 시작");

        // 공유 입력: fan-out 전에 한 번만 수집
        let shared: OnceCell<Option<MarketContext>> = OnceCell::new();
        let market = self.shared_market(&shared).await;
        let market_bag = market.map(MarketContext::to_indicator_bag);

        // 1차 평가
        let phase_one = self
            .run_phase(
                &symbols,
                depth,
                market_bag.as_ref(),
                request.stage_cap_pct,
                cancel,
            )
            .await;

        let attempted = phase_one.len();
        let failed = phase_one
            .iter()
            .filter(|(_, e)| e.collector_error.is_some())
            .count();
        if attempted > 0 && failed == attempted {
            warn!(attempted, "모든 후보 수집 실패");
            return Err(BatchError::NoData { attempted });
        }

        let issued: HashSet<usize> = phase_one.iter().map(|(idx, _)| *idx).collect();
        let cancelled: Vec<String> = symbols
            .iter()
            .enumerate()
            .filter(|(idx, _)| !issued.contains(idx))
            .map(|(_, s)| s.clone())
            .collect();
        if !cancelled.is_empty() {
            warn!(cancelled = cancelled.len(), "배치 취소로 일부 후보 생략");
        }

        let mut evaluated: Vec<(usize, Evaluated)> = phase_one;
        evaluated.sort_by_key(|(idx, _)| *idx);
        let mut evaluated: Vec<Evaluated> = evaluated.into_iter().map(|(_, e)| e).collect();

        info!(
            evaluated = evaluated.len(),
            failed,
            depth = ?depth,
            "1차 평가 완료"
        );

        // 2차 상세 재평가 (상위 N개)
        let detail_n = match mode {
            BatchMode::Screen => request
                .detail_top_n
                .unwrap_or(self.engine.config().batch.screen_top_n),
            BatchMode::Watchlist => request.detail_top_n.unwrap_or(0),
            BatchMode::Analyze | BatchMode::Compare => 0,
        };
        let mut detailed = Vec::new();
        if depth == AnalysisDepth::Provisional && detail_n > 0 && !cancel.is_cancelled() {
            // 공유 입력 재사용
            let market = self.shared_market(&shared).await;
            let market_bag = market.map(MarketContext::to_indicator_bag);

            let mut ranked: Vec<&Evaluated> = evaluated
                .iter()
                .filter(|e| e.collector_error.is_none())
                .collect();
            ranked.sort_by(|a, b| by_score_desc(&a.result, &b.result));
            let top: Vec<String> = ranked
                .iter()
                .take(detail_n)
                .map(|e| e.result.candidate_id.clone())
                .collect();

            let phase_two = self
                .run_phase(
                    &top,
                    AnalysisDepth::Full,
                    market_bag.as_ref(),
                    request.stage_cap_pct,
                    cancel,
                )
                .await;

            for (idx, refined) in phase_two {
                let symbol = &top[idx];
                if refined.collector_error.is_some() {
                    warn!(symbol = %symbol, "상세 재평가 수집 실패, 잠정 결과 유지");
                    continue;
                }
                if let Some(slot) = evaluated
                    .iter_mut()
                    .find(|e| &e.result.candidate_id == symbol)
                {
                    *slot = refined;
                    detailed.push(symbol.clone());
                }
            }
            detailed.sort();
            info!(detailed = detailed.len(), "상세 재평가 완료");
        }

        // 순서 보장
        if mode.sorts_by_score() {
            evaluated.sort_by(|a, b| by_score_desc(&a.result, &b.result));
        }

        let best_of = if mode == BatchMode::Compare {
            compute_best_of(&self.engine.config().batch.best_of, &evaluated)
        } else {
            Vec::new()
        };

        let degraded: Vec<DegradedCandidate> = evaluated
            .iter()
            .filter(|e| e.result.is_degraded())
            .map(|e| DegradedCandidate {
                symbol: e.result.candidate_id.clone(),
                data_quality: e.result.data_quality,
                skipped: e.result.skipped_analyses.clone(),
                collector_error: e.collector_error.clone(),
            })
            .collect();
        for d in &degraded {
            warn!(symbol = %d.symbol, quality = %d.data_quality, "품질 저하 후보");
        }

        let summary = BatchSummary {
            requested: symbols.len(),
            evaluated: evaluated.len(),
            detailed,
            degraded,
            cancelled,
        };

        info!(
            evaluated = summary.evaluated,
            degraded = summary.degraded.len(),
            cancelled = summary.cancelled.len(),
            "배치 평가 완료"
        );

        Ok(BatchResult {
            run_id,
            mode,
            results: evaluated.into_iter().map(|e| e.result).collect(),
            best_of,
            market_regime: market.map(|m| m.regime),
            summary,
            generated_at: Utc::now(),
        })
    }

    /// 시장 컨텍스트 (배치당 최초 한 번 수집, 이후 재사용).
    async fn shared_market<'a>(
        &self,
        cell: &'a OnceCell<Option<MarketContext>>,
    ) -> Option<&'a MarketContext> {
        cell.get_or_init(|| async {
            match self.collector.market_context().await {
                Ok(market) => market,
                Err(e) => {
                    warn!(error = %e, "시장 컨텍스트 수집 실패, 시장 지표 없이 진행");
                    None
                }
            }
        })
        .await
        .as_ref()
    }

    /// 후보 목록을 병렬로 수집하고 평가합니다. 반환 인덱스는 `symbols` 기준입니다.
    async fn run_phase(
        &self,
        symbols: &[String],
        depth: AnalysisDepth,
        market: Option<&IndicatorBag>,
        stage_cap_pct: Decimal,
        cancel: &CancellationToken,
    ) -> Vec<(usize, Evaluated)> {
        let mut ctx = EvaluationContext::new(stage_cap_pct).with_depth(depth);
        if let Some(market) = market {
            ctx = ctx.with_market(market);
        }
        let parallelism = self.engine.config().batch.parallelism.max(1);

        // 병렬 실행 (parallelism 제한 적용: buffer_unordered 사용)
        stream::iter(symbols.iter().enumerate())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(move |(idx, symbol)| async move {
                let evaluated = match self.collect_one(symbol, depth).await {
                    Ok(candidate) => Evaluated {
                        result: self.engine.evaluate(&candidate, &ctx),
                        candidate,
                        collector_error: None,
                    },
                    Err(err) => {
                        warn!(symbol = %symbol, error = %err, "후보 수집 실패");
                        let candidate = self.failed_candidate(symbol, &err);
                        Evaluated {
                            result: self.engine.evaluate(&candidate, &ctx),
                            candidate,
                            collector_error: Some(err.to_string()),
                        }
                    }
                };
                (idx, evaluated)
            })
            .buffer_unordered(parallelism)
            .collect()
            .await
    }

    async fn collect_one(
        &self,
        symbol: &str,
        depth: AnalysisDepth,
    ) -> Result<Candidate, CollectorError> {
        let request = CollectRequest {
            symbol,
            depth,
            required_inputs: self.engine.required_inputs(depth),
        };
        let timeout_ms = self.engine.config().batch.collector_timeout_ms;

        match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.collector.collect(&request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CollectorError::Timeout {
                symbol: symbol.to_string(),
                timeout_ms,
            }),
        }
    }

    /// 수집 실패 후보: 빈 지표 + 모든 하위 분석 실패 기록.
    fn failed_candidate(&self, symbol: &str, error: &CollectorError) -> Candidate {
        let message = error.to_string();
        self.engine
            .config()
            .rubric
            .components
            .iter()
            .fold(
                Candidate::new(symbol, Utc::now(), IndicatorBag::new()),
                |candidate, component| {
                    candidate.with_failure(component.analysis_name(), message.clone())
                },
            )
    }
}

// ================================================================================================
// best-of
// ================================================================================================

fn metric_value(metric: &str, evaluated: &Evaluated) -> Option<f64> {
    match metric {
        "composite_score" => evaluated.result.composite_score.to_f64(),
        "edge_count" => Some(evaluated.result.edge_count as f64),
        indicator => IndicatorView::new(&evaluated.candidate.indicators, None).number(indicator),
    }
}

/// best-of 필드 계산. 수집 실패 후보는 제외하며, 동점이면 먼저 나온 후보가 이깁니다.
fn compute_best_of(specs: &[BestOfSpec], evaluated: &[Evaluated]) -> Vec<BestOf> {
    specs
        .iter()
        .filter_map(|spec| {
            let mut best: Option<(&str, f64)> = None;
            for e in evaluated.iter().filter(|e| e.collector_error.is_none()) {
                let Some(value) = metric_value(&spec.metric, e) else {
                    continue;
                };
                let better = match (best, spec.pick) {
                    (None, _) => true,
                    (Some((_, current)), BestOfPick::Max) => value > current,
                    (Some((_, current)), BestOfPick::Min) => value < current,
                };
                if better {
                    best = Some((e.result.candidate_id.as_str(), value));
                }
            }
            best.map(|(symbol, value)| BestOf {
                metric: spec.metric.clone(),
                pick: spec.pick,
                symbol: symbol.to_string(),
                value,
            })
        })
        .collect()
}

// ================================================================================================
// 테스트
// ================================================================================================
