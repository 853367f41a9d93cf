//! 선언형 루브릭 기반 컴포넌트 점수 계산.
//!
//! 각 컴포넌트는 `{name, weight_max, terms}`로 정의되며, 항(term)들의 합을
//! `[0, weight_max]` 범위로 제한한 값이 컴포넌트 점수가 됩니다.
//!
//! # 항 종류
//!
//! | kind | 입력 | 설명 |
//! |------|------|------|
//! | `linear` | 수치 | `from` → `to` 구간을 0 → `points`로 선형 매핑 |
//! | `tiers` | 수치 | 가장 높은 충족 구간의 점수 |
//! | `flag` | 플래그 | 참/거짓 점수 |
//! | `category` | 범주 | 범주별 점수 |
//! | `series_latest` | 순차 수치 | 최신 값에 구간 적용 |
//! | `series_acceleration` | 순차 수치 | 최근 `lookback` 구간의 상승 횟수 × `per_step` |
//!
//! 필수 입력이 없으면 0점이 아니라 `Unscorable`입니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use verdict_core::{
    AnalysisDepth, Candidate, ComponentScore, IndicatorKind, IndicatorView, ScoreValue, SkipReason,
};

use crate::composite::to_decimal;

/// 점수 구간 (`value >= at_least`이면 `points`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub at_least: f64,
    pub points: f64,
}

impl Tier {
    pub fn new(at_least: f64, points: f64) -> Self {
        Self { at_least, points }
    }
}

/// 가장 높은 충족 구간의 점수. 어느 구간도 충족하지 않으면 `below`.
fn tier_points(tiers: &[Tier], value: f64, below: f64) -> f64 {
    tiers
        .iter()
        .filter(|t| value >= t.at_least)
        .max_by(|a, b| a.at_least.total_cmp(&b.at_least))
        .map(|t| t.points)
        .unwrap_or(below)
}

/// 루브릭 항.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    Linear {
        input: String,
        from: f64,
        to: f64,
        points: f64,
        #[serde(default)]
        optional: bool,
    },
    Tiers {
        input: String,
        tiers: Vec<Tier>,
        #[serde(default)]
        below: f64,
        #[serde(default)]
        optional: bool,
    },
    Flag {
        input: String,
        #[serde(default)]
        when_true: f64,
        #[serde(default)]
        when_false: f64,
        #[serde(default)]
        optional: bool,
    },
    Category {
        input: String,
        points: BTreeMap<String, f64>,
        #[serde(default)]
        otherwise: f64,
        #[serde(default)]
        optional: bool,
    },
    SeriesLatest {
        input: String,
        tiers: Vec<Tier>,
        #[serde(default)]
        below: f64,
        #[serde(default)]
        optional: bool,
    },
    SeriesAcceleration {
        input: String,
        lookback: usize,
        per_step: f64,
        #[serde(default)]
        optional: bool,
    },
}

/// 항 하나의 평가 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TermOutcome {
    Points(f64),
    Missing,
    TooShort { required: usize, provided: usize },
}

impl Term {
    /// 참조 지표 이름.
    pub fn input(&self) -> &str {
        match self {
            Term::Linear { input, .. }
            | Term::Tiers { input, .. }
            | Term::Flag { input, .. }
            | Term::Category { input, .. }
            | Term::SeriesLatest { input, .. }
            | Term::SeriesAcceleration { input, .. } => input,
        }
    }

    /// 선택 항 여부.
    pub fn is_optional(&self) -> bool {
        match self {
            Term::Linear { optional, .. }
            | Term::Tiers { optional, .. }
            | Term::Flag { optional, .. }
            | Term::Category { optional, .. }
            | Term::SeriesLatest { optional, .. }
            | Term::SeriesAcceleration { optional, .. } => *optional,
        }
    }

    /// 기대 지표 타입.
    pub fn expected_kind(&self) -> IndicatorKind {
        match self {
            Term::Linear { .. } | Term::Tiers { .. } => IndicatorKind::Number,
            Term::Flag { .. } => IndicatorKind::Flag,
            Term::Category { .. } => IndicatorKind::Category,
            Term::SeriesLatest { .. } | Term::SeriesAcceleration { .. } => IndicatorKind::Series,
        }
    }

    /// 선택 항으로 표시 (빌더).
    pub fn optional(mut self) -> Self {
        match &mut self {
            Term::Linear { optional, .. }
            | Term::Tiers { optional, .. }
            | Term::Flag { optional, .. }
            | Term::Category { optional, .. }
            | Term::SeriesLatest { optional, .. }
            | Term::SeriesAcceleration { optional, .. } => *optional = true,
        }
        self
    }

    /// 항 평가. 순수 함수입니다.
    pub fn evaluate(&self, view: &IndicatorView<'_>) -> TermOutcome {
        match self {
            Term::Linear {
                input,
                from,
                to,
                points,
                ..
            } => match view.number(input) {
                Some(x) => {
                    let span = to - from;
                    let t = if span == 0.0 { 0.0 } else { (x - from) / span };
                    TermOutcome::Points(points * t.clamp(0.0, 1.0))
                }
                None => TermOutcome::Missing,
            },
            Term::Tiers {
                input, tiers, below, ..
            } => match view.number(input) {
                Some(x) => TermOutcome::Points(tier_points(tiers, x, *below)),
                None => TermOutcome::Missing,
            },
            Term::Flag {
                input,
                when_true,
                when_false,
                ..
            } => match view.flag(input) {
                Some(true) => TermOutcome::Points(*when_true),
                Some(false) => TermOutcome::Points(*when_false),
                None => TermOutcome::Missing,
            },
            Term::Category {
                input,
                points,
                otherwise,
                ..
            } => match view.category(input) {
                Some(c) => TermOutcome::Points(points.get(c).copied().unwrap_or(*otherwise)),
                None => TermOutcome::Missing,
            },
            Term::SeriesLatest {
                input, tiers, below, ..
            } => match view.series(input) {
                Some(series) => match series.last() {
                    Some(latest) => TermOutcome::Points(tier_points(tiers, *latest, *below)),
                    None => TermOutcome::TooShort {
                        required: 1,
                        provided: 0,
                    },
                },
                None => TermOutcome::Missing,
            },
            Term::SeriesAcceleration {
                input,
                lookback,
                per_step,
                ..
            } => match view.series(input) {
                Some(series) if series.len() < lookback + 1 => TermOutcome::TooShort {
                    required: lookback + 1,
                    provided: series.len(),
                },
                Some(series) => {
                    let tail = &series[series.len() - (lookback + 1)..];
                    let rising = tail.windows(2).filter(|w| w[1] > w[0]).count();
                    TermOutcome::Points(rising as f64 * per_step)
                }
                None => TermOutcome::Missing,
            },
        }
    }

    /// 항 자체의 값 오류 (설정 검증용).
    pub(crate) fn shape_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        match self {
            Term::Linear {
                input,
                from,
                to,
                points,
                ..
            } => {
                if !from.is_finite() || !to.is_finite() || !points.is_finite() {
                    issues.push(format!("linear term on '{}' has non-finite bounds", input));
                } else if from == to {
                    issues.push(format!("linear term on '{}' has from == to", input));
                }
            }
            Term::Tiers { input, tiers, .. } | Term::SeriesLatest { input, tiers, .. } => {
                if tiers.is_empty() {
                    issues.push(format!("tiers term on '{}' has no tiers", input));
                }
                if tiers
                    .iter()
                    .any(|t| !t.at_least.is_finite() || !t.points.is_finite())
                {
                    issues.push(format!("tiers term on '{}' has non-finite tier", input));
                }
            }
            Term::Category { input, points, .. } if points.is_empty() => {
                issues.push(format!("category term on '{}' maps no categories", input));
            }
            Term::SeriesAcceleration {
                input,
                lookback,
                per_step,
                ..
            } => {
                if *lookback == 0 {
                    issues.push(format!(
                        "series_acceleration on '{}' needs lookback >= 1",
                        input
                    ));
                }
                if !per_step.is_finite() {
                    issues.push(format!("series_acceleration on '{}' has non-finite step", input));
                }
            }
            _ => {}
        }
        issues
    }
}

/// 루브릭 컴포넌트 정의.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// 컴포넌트 이름
    pub name: String,
    /// 최대 배점
    pub weight_max: f64,
    /// 잠정 평가에서 생략되는 고비용 분석 여부
    #[serde(default)]
    pub expensive: bool,
    /// 수집기 하위 분석 이름 (없으면 컴포넌트 이름)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_analysis: Option<String>,
    /// 점수 항
    pub terms: Vec<Term>,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, weight_max: f64) -> Self {
        Self {
            name: name.into(),
            weight_max,
            expensive: false,
            sub_analysis: None,
            terms: Vec::new(),
        }
    }

    /// 고비용 하위 분석으로 표시 (빌더).
    pub fn expensive(mut self, sub_analysis: impl Into<String>) -> Self {
        self.expensive = true;
        self.sub_analysis = Some(sub_analysis.into());
        self
    }

    /// 항 추가 (빌더).
    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// 수집기 하위 분석 이름.
    pub fn analysis_name(&self) -> &str {
        self.sub_analysis.as_deref().unwrap_or(&self.name)
    }

    /// 주어진 깊이에서 평가되는지 여부.
    pub fn runs_at(&self, depth: AnalysisDepth) -> bool {
        !(self.expensive && depth == AnalysisDepth::Provisional)
    }

    /// 컴포넌트 점수 계산.
    pub fn score(
        &self,
        candidate: &Candidate,
        view: &IndicatorView<'_>,
        depth: AnalysisDepth,
    ) -> ComponentScore {
        let weight_max = to_decimal(self.weight_max, 2);

        if !self.runs_at(depth) {
            return ComponentScore {
                name: self.name.clone(),
                raw_inputs_used: Vec::new(),
                weight_max,
                value: ScoreValue::Unscorable {
                    cause: SkipReason::SkippedForSpeed,
                },
                skipped_terms: Vec::new(),
            };
        }

        let mut total = 0.0;
        let mut used = BTreeSet::new();
        let mut missing = BTreeSet::new();
        let mut too_short: Option<(String, usize, usize)> = None;
        let mut skipped_terms = Vec::new();

        for term in &self.terms {
            match term.evaluate(view) {
                TermOutcome::Points(points) => {
                    used.insert(term.input().to_string());
                    total += points;
                }
                outcome if term.is_optional() => {
                    if matches!(outcome, TermOutcome::TooShort { .. }) {
                        used.insert(term.input().to_string());
                    }
                    skipped_terms.push(term.input().to_string());
                }
                TermOutcome::Missing => {
                    missing.insert(term.input().to_string());
                }
                TermOutcome::TooShort { required, provided } => {
                    used.insert(term.input().to_string());
                    if too_short.is_none() {
                        too_short = Some((term.input().to_string(), required, provided));
                    }
                }
            }
        }

        let value = if !missing.is_empty() {
            let cause = match candidate.failure_for(self.analysis_name()) {
                Some(message) => SkipReason::CollectorFailed {
                    message: message.to_string(),
                },
                None => SkipReason::MissingInput {
                    inputs: missing.into_iter().collect(),
                },
            };
            ScoreValue::Unscorable { cause }
        } else if let Some((input, required, provided)) = too_short {
            ScoreValue::Unscorable {
                cause: SkipReason::InsufficientHistory {
                    input,
                    required,
                    provided,
                },
            }
        } else {
            let clamped = total.clamp(0.0, self.weight_max);
            ScoreValue::Scored {
                points: to_decimal(clamped, 2).min(weight_max),
            }
        };

        ComponentScore {
            name: self.name.clone(),
            raw_inputs_used: used.into_iter().collect(),
            weight_max,
            value,
            skipped_terms,
        }
    }
}

/// 선언형 루브릭.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Rubric {
    pub components: Vec<ComponentSpec>,
}

impl Rubric {
    pub fn new(components: Vec<ComponentSpec>) -> Self {
        Self { components }
    }

    /// 배점 합계.
    pub fn total_weight(&self) -> f64 {
        self.components.iter().map(|c| c.weight_max).sum()
    }

    /// 이름으로 컴포넌트 조회.
    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }

    /// 모든 컴포넌트 점수 계산 (선언 순서 유지).
    pub fn score_all(
        &self,
        candidate: &Candidate,
        view: &IndicatorView<'_>,
        depth: AnalysisDepth,
    ) -> Vec<ComponentScore> {
        self.components
            .iter()
            .map(|c| c.score(candidate, view, depth))
            .collect()
    }

    /// 주어진 깊이에서 루브릭이 읽는 지표 이름.
    pub fn required_inputs(&self, depth: AnalysisDepth) -> BTreeSet<String> {
        self.components
            .iter()
            .filter(|c| c.runs_at(depth))
            .flat_map(|c| c.terms.iter().map(|t| t.input().to_string()))
            .collect()
    }
}

// ================================================================================================
// 테스트
// ================================================================================================
