//! 후보 평가 결과 레코드.
//!
//! `CompositeResult`가 엔진의 외부 공개 산출물입니다.
//! 필드 이름은 직렬화 계약이므로 버전 간에 바꾸지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::quality::{AnalysisDepth, DataQuality, SkipReason, SkippedAnalysis};
use super::signal::SignalLevel;

// ================================================================================================
// 컴포넌트 점수
// ================================================================================================

/// 컴포넌트 점수 값.
///
/// 입력이 없으면 0점이 아니라 `Unscorable`입니다. "데이터 없음"과 "나쁜 데이터"를 구분합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreValue {
    /// 점수 (0 ~ weight_max)
    Scored { points: Decimal },
    /// 점수 산출 불가
    Unscorable { cause: SkipReason },
}

/// 루브릭 차원 하나의 점수.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScore {
    /// 컴포넌트 이름 (예: "trend_stage")
    pub name: String,
    /// 실제로 읽은 원시 지표
    pub raw_inputs_used: Vec<String>,
    /// 최대 배점
    pub weight_max: Decimal,
    /// 점수 값
    pub value: ScoreValue,
    /// 입력이 없어 건너뛴 선택 항목
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_terms: Vec<String>,
}

impl ComponentScore {
    /// 점수 (산출 불가면 `None`).
    pub fn points(&self) -> Option<Decimal> {
        match &self.value {
            ScoreValue::Scored { points } => Some(*points),
            ScoreValue::Unscorable { .. } => None,
        }
    }

    /// 점수 산출 여부.
    pub fn is_scorable(&self) -> bool {
        matches!(self.value, ScoreValue::Scored { .. })
    }

    /// 산출 불가 사유.
    pub fn unscorable_cause(&self) -> Option<&SkipReason> {
        match &self.value {
            ScoreValue::Scored { .. } => None,
            ScoreValue::Unscorable { cause } => Some(cause),
        }
    }
}

// ================================================================================================
// 게이트 결과
// ================================================================================================

/// 게이트 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateKind {
    /// 차단 게이트: 발동 시 점수와 무관하게 AVOID
    Hard,
    /// 감점 게이트: 발동 시 점수 차감
    Soft,
}

/// 게이트 하나의 평가 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// 게이트 ID
    pub gate_id: String,
    /// 게이트 종류
    pub kind: GateKind,
    /// 발동 여부
    pub triggered: bool,
    /// 입력이 모두 있어 평가되었는지 여부
    pub evaluated: bool,
    /// 발동 사유 (발동 시에만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 감점 (소프트 게이트만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_points: Option<Decimal>,
}

// ================================================================================================
// 포지션 추천
// ================================================================================================

/// 포지션 크기를 실제로 제한한 조건.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingConstraint {
    /// 신호가 MONITOR/AVOID라 0으로 강제
    SignalOverride,
    /// REDUCED 신호 배수 적용
    SignalReduced,
    /// 경험 단계 상한
    StageCap,
}

impl fmt::Display for SizingConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SizingConstraint::SignalOverride => "signal_override",
            SizingConstraint::SignalReduced => "signal_reduced",
            SizingConstraint::StageCap => "stage_cap",
        };
        write!(f, "{}", s)
    }
}

/// 포지션 크기 추천 (계좌 대비 %).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecommendation {
    /// 기본 비중
    pub base_pct: Decimal,
    /// 적용된 엣지 보너스 합계
    pub edge_bonus_pct: Decimal,
    /// 최종 비중
    pub final_pct: Decimal,
    /// 호출자 경험 단계 상한
    pub stage_cap_pct: Decimal,
    /// 결과를 제한한 조건 (없으면 null)
    pub capped_by: Option<SizingConstraint>,
}

// ================================================================================================
// 신호 상한
// ================================================================================================

/// 점수 구간 판정 이후 신호 레벨을 끌어내린 상한.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cap", rename_all = "snake_case")]
pub enum SignalCap {
    /// 하드 게이트 차단 → AVOID
    HardGateBlock,
    /// 소프트 게이트 중첩 상한
    SoftGates { triggers: usize, level: SignalLevel },
    /// 데이터 품질 상한
    DataQuality {
        quality: DataQuality,
        level: SignalLevel,
    },
}

// ================================================================================================
// 종합 결과
// ================================================================================================

/// 후보 하나의 종합 평가 결과.
///
/// 불변식: `blocked == true`이면 `signal == AVOID`. 점수는 투명성을 위해 남기지만
/// 차단된 경우 신호를 결정하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResult {
    /// 후보 식별자
    pub candidate_id: String,
    /// 지표 기준 시각
    pub as_of: DateTime<Utc>,
    /// 분석 깊이
    pub depth: AnalysisDepth,
    /// 종합 점수 (0 ~ 100, 감점 반영)
    pub composite_score: Decimal,
    /// 산출 가능한 컴포넌트 배점 합계
    pub max_attainable_score: Decimal,
    /// 소프트 게이트 감점 합계
    pub soft_penalty_total: Decimal,
    /// 하드 게이트 차단 여부
    pub blocked: bool,
    /// 차단 사유 (모든 발동 게이트)
    pub blocking_reasons: Vec<String>,
    /// 신호 레벨
    pub signal: SignalLevel,
    /// 적용된 신호 상한
    #[serde(default)]
    pub signal_caps: Vec<SignalCap>,
    /// 엣지 개수
    pub edge_count: usize,
    /// 충족된 엣지 ID
    #[serde(default)]
    pub edges: Vec<String>,
    /// 데이터 품질
    pub data_quality: DataQuality,
    /// 생략된 하위 분석
    #[serde(default)]
    pub skipped_analyses: Vec<SkippedAnalysis>,
    /// 포지션 추천
    pub position_recommendation: PositionRecommendation,
    /// 컴포넌트별 점수
    pub component_scores: Vec<ComponentScore>,
    /// 게이트 결과 (하드 → 소프트 순)
    pub gate_results: Vec<GateResult>,
}

impl CompositeResult {
    /// 이름으로 컴포넌트 점수 조회.
    pub fn component(&self, name: &str) -> Option<&ComponentScore> {
        self.component_scores.iter().find(|c| c.name == name)
    }

    /// 이름으로 게이트 결과 조회.
    pub fn gate(&self, gate_id: &str) -> Option<&GateResult> {
        self.gate_results.iter().find(|g| g.gate_id == gate_id)
    }

    /// 발동된 소프트 게이트 수.
    pub fn soft_gate_trigger_count(&self) -> usize {
        self.gate_results
            .iter()
            .filter(|g| g.kind == GateKind::Soft && g.triggered)
            .count()
    }

    /// 품질 저하 결과인지 여부.
    pub fn is_degraded(&self) -> bool {
        self.data_quality.is_degraded()
    }
}
