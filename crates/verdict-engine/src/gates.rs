//! 하드 게이트 평가와 소프트 게이트 감점.
//!
//! 하드 게이트는 하나라도 발동하면 점수와 무관하게 차단합니다.
//! 모든 게이트를 끝까지 평가하여 차단 사유를 빠짐없이 기록합니다 (short-circuit 없음).
//!
//! 소프트 게이트는 발동 시 고정 감점을 부과하며, 발동 개수는 신호 상한 판정에 쓰입니다.
//!
//! 입력이 없어 판정할 수 없는 게이트는 발동하지 않은 것으로 보고 `evaluated = false`로 기록합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdict_core::{GateKind, GateResult, IndicatorView, SkipReason, SkippedAnalysis};

use crate::composite::to_decimal;
use crate::predicate::{render_reason, EvalContext, Predicate};

/// 하드 게이트 정의.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSpec {
    /// 게이트 ID
    pub id: String,
    /// 발동 사유 템플릿 (`{지표}` 치환)
    pub reason: String,
    /// 발동 조건
    pub when: Predicate,
}

impl GateSpec {
    pub fn new(id: impl Into<String>, reason: impl Into<String>, when: Predicate) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            when,
        }
    }
}

/// 소프트 게이트 정의.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftGateSpec {
    /// 게이트 ID
    pub id: String,
    /// 발동 사유 템플릿
    pub reason: String,
    /// 감점 (양수)
    pub penalty: f64,
    /// 발동 조건
    pub when: Predicate,
}

impl SoftGateSpec {
    pub fn new(
        id: impl Into<String>,
        reason: impl Into<String>,
        penalty: f64,
        when: Predicate,
    ) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            penalty,
            when,
        }
    }
}

/// 판정 불가 사유 (누락 지표 또는 산출 불가 컴포넌트).
fn unknown_inputs(predicate: &Predicate, view: &IndicatorView<'_>) -> Vec<String> {
    let mut names: Vec<String> = predicate
        .requirements()
        .into_iter()
        .filter(|(name, kind)| view.get(name).map(|v| v.kind()) != Some(*kind))
        .map(|(name, _)| name.to_string())
        .collect();
    if names.is_empty() {
        names = predicate
            .component_refs()
            .into_iter()
            .map(str::to_string)
            .collect();
    }
    names.sort();
    names.dedup();
    names
}

fn unevaluated(id: &str, predicate: &Predicate, view: &IndicatorView<'_>) -> SkippedAnalysis {
    SkippedAnalysis {
        name: id.to_string(),
        reason: SkipReason::MissingInput {
            inputs: unknown_inputs(predicate, view),
        },
    }
}

// ================================================================================================
// 하드 게이트
// ================================================================================================

/// 하드 게이트 평가 결과.
#[derive(Debug, Clone, Default)]
pub struct HardGateOutcome {
    /// 게이트별 결과 (선언 순서)
    pub results: Vec<GateResult>,
    /// 차단 여부
    pub blocked: bool,
    /// 발동한 모든 게이트의 사유
    pub blocking_reasons: Vec<String>,
    /// 판정하지 못한 게이트
    pub unevaluated: Vec<SkippedAnalysis>,
}

/// 하드 게이트 평가기.
#[derive(Debug, Clone, Copy)]
pub struct HardGateEvaluator<'a> {
    gates: &'a [GateSpec],
}

impl<'a> HardGateEvaluator<'a> {
    pub fn new(gates: &'a [GateSpec]) -> Self {
        Self { gates }
    }

    /// 모든 하드 게이트 평가.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> HardGateOutcome {
        let mut outcome = HardGateOutcome::default();

        for gate in self.gates {
            let verdict = gate.when.evaluate(ctx);
            let triggered = verdict == Some(true);
            let reason = triggered.then(|| render_reason(&gate.reason, &gate.when, &ctx.view));

            if let Some(reason) = &reason {
                outcome.blocked = true;
                outcome.blocking_reasons.push(reason.clone());
            }
            if verdict.is_none() {
                outcome
                    .unevaluated
                    .push(unevaluated(&gate.id, &gate.when, &ctx.view));
            }

            outcome.results.push(GateResult {
                gate_id: gate.id.clone(),
                kind: GateKind::Hard,
                triggered,
                evaluated: verdict.is_some(),
                reason,
                penalty_points: None,
            });
        }

        outcome
    }
}

// ================================================================================================
// 소프트 게이트
// ================================================================================================

/// 소프트 게이트 평가 결과.
#[derive(Debug, Clone, Default)]
pub struct SoftGateOutcome {
    /// 게이트별 결과 (선언 순서)
    pub results: Vec<GateResult>,
    /// 발동한 게이트의 감점 합계
    pub total_penalty: Decimal,
    /// 발동 개수
    pub trigger_count: usize,
}

/// 소프트 게이트 감점기.
#[derive(Debug, Clone, Copy)]
pub struct SoftGatePenalizer<'a> {
    gates: &'a [SoftGateSpec],
}

impl<'a> SoftGatePenalizer<'a> {
    pub fn new(gates: &'a [SoftGateSpec]) -> Self {
        Self { gates }
    }

    /// 모든 소프트 게이트 평가.
    ///
    /// `penalty_points`에는 설정된 감점을 기록하며, 합계에는 발동한 게이트만 더합니다.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> SoftGateOutcome {
        let mut outcome = SoftGateOutcome::default();

        for gate in self.gates {
            let verdict = gate.when.evaluate(ctx);
            let triggered = verdict == Some(true);
            let penalty = to_decimal(gate.penalty, 2);

            if triggered {
                outcome.total_penalty += penalty;
                outcome.trigger_count += 1;
            }

            outcome.results.push(GateResult {
                gate_id: gate.id.clone(),
                kind: GateKind::Soft,
                triggered,
                evaluated: verdict.is_some(),
                reason: triggered.then(|| render_reason(&gate.reason, &gate.when, &ctx.view)),
                penalty_points: Some(penalty),
            });
        }

        outcome
    }
}

// ================================================================================================
// 테스트
// ================================================================================================
