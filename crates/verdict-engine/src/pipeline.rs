//! 단일 후보 평가 파이프라인.
//!
//! 컴포넌트 점수 → 하드 게이트 → 소프트 게이트 → 종합 점수 → 신호 분류 → 포지션 크기 순으로
//! 진행하며, 각 단계의 생략/누락을 데이터 품질 추적기에 기록합니다.
//!
//! 평가는 순수 계산입니다. 벽시계를 읽지 않으며 같은 입력에는 항상 같은 결과를 냅니다.

use rust_decimal::Decimal;
use tracing::debug;

use verdict_core::{
    candidate_span, AnalysisDepth, Candidate, CompositeResult, IndicatorBag, IndicatorView,
};

use crate::classifier::{ClassifierInput, SignalClassifier};
use crate::composite::{aggregate, to_decimal};
use crate::config::{ConfigValidationError, EngineConfig, InputRouting};
use crate::edges::present_edges;
use crate::gates::{HardGateEvaluator, SoftGatePenalizer};
use crate::position_sizing::{ExperienceTier, PositionSizer};
use crate::predicate::EvalContext;
use crate::quality::DataQualityTracker;

/// 평가 호출 컨텍스트.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// 분석 깊이
    pub depth: AnalysisDepth,
    /// 호출자 경험 단계 상한 (%)
    pub stage_cap_pct: Decimal,
    /// 배치에서 공유하는 시장 지표
    pub market: Option<&'a IndicatorBag>,
}

impl<'a> EvaluationContext<'a> {
    /// 전체 깊이 평가 컨텍스트.
    pub fn new(stage_cap_pct: Decimal) -> Self {
        Self {
            depth: AnalysisDepth::Full,
            stage_cap_pct,
            market: None,
        }
    }

    pub fn with_depth(mut self, depth: AnalysisDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_market(mut self, market: &'a IndicatorBag) -> Self {
        self.market = Some(market);
        self
    }
}

/// 점수/게이트 엔진.
///
/// 생성 시 설정을 한 번 검증하며, 이후 평가는 실패하지 않습니다.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: EngineConfig,
    routing: InputRouting,
}

impl ScoringEngine {
    /// 설정을 검증하고 엔진을 생성합니다.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        let routing = config.input_routing();
        Ok(Self { config, routing })
    }

    /// 기본 프리셋 엔진.
    pub fn with_defaults() -> Result<Self, ConfigValidationError> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 깊이별 필요 지표.
    pub fn required_inputs(&self, depth: AnalysisDepth) -> &[String] {
        self.routing.for_depth(depth)
    }

    /// 경험 단계 상한 (%).
    pub fn stage_cap_for(&self, tier: ExperienceTier) -> Decimal {
        to_decimal(self.config.sizing.stage_caps.cap_for(tier), 4)
    }

    /// 후보 하나를 평가합니다.
    pub fn evaluate(&self, candidate: &Candidate, ctx: &EvaluationContext<'_>) -> CompositeResult {
        let span = candidate_span!(candidate.symbol, ctx.depth);
        let _enter = span.enter();

        let config = &self.config;
        let view = IndicatorView::new(&candidate.indicators, ctx.market);
        let mut tracker = DataQualityTracker::new();

        // 1. 컴포넌트 점수
        let components = config.rubric.score_all(candidate, &view, ctx.depth);
        for component in &components {
            tracker.record_component(component);
        }

        // 2. 게이트 (하드 → 소프트)
        let rule_ctx = EvalContext::new(view, &components);
        let hard = HardGateEvaluator::new(&config.hard_gates).evaluate(&rule_ctx);
        for skipped in hard.unevaluated {
            tracker.record_unevaluated_gate(skipped);
        }
        let soft = SoftGatePenalizer::new(&config.soft_gates).evaluate(&rule_ctx);

        // 3. 종합 점수
        let composite = aggregate(&components, soft.total_penalty);

        // 4. 엣지
        let edges = present_edges(&config.edges, &rule_ctx);

        // 5. 신호 분류
        let report = tracker.finish();
        let classification = SignalClassifier::new(&config.thresholds, &config.signal_caps)
            .classify(ClassifierInput {
                composite_score: composite.composite_score,
                blocked: hard.blocked,
                soft_gate_trigger_count: soft.trigger_count,
                data_quality: report.level,
            });

        // 6. 포지션 크기
        let position = PositionSizer::new(&config.sizing).recommend(
            classification.signal,
            edges.len(),
            ctx.stage_cap_pct,
        );

        debug!(
            score = %composite.composite_score,
            blocked = hard.blocked,
            soft_triggers = soft.trigger_count,
            signal = %classification.signal,
            edges = edges.len(),
            quality = %report.level,
            final_pct = %position.final_pct,
            "후보 평가 완료"
        );

        let mut gate_results = hard.results;
        gate_results.extend(soft.results);

        CompositeResult {
            candidate_id: candidate.symbol.clone(),
            as_of: candidate.as_of,
            depth: ctx.depth,
            composite_score: composite.composite_score,
            max_attainable_score: composite.max_attainable,
            soft_penalty_total: composite.penalty,
            blocked: hard.blocked,
            blocking_reasons: hard.blocking_reasons,
            signal: classification.signal,
            signal_caps: classification.caps,
            edge_count: edges.len(),
            edges,
            data_quality: report.level,
            skipped_analyses: report.skipped,
            position_recommendation: position,
            component_scores: components,
            gate_results,
        }
    }
}

// ================================================================================================
// 테스트
// ================================================================================================
