//! 선언형 불리언 규칙.
//!
//! 하드 게이트, 소프트 게이트, 엣지가 모두 같은 규칙 언어를 사용합니다.
//! 평가 결과는 3값 논리입니다: `Some(true)`, `Some(false)`, 입력 누락 시 `None`.
//!
//! ```toml
//! [[hard_gates]]
//! id = "trend_template"
//! reason = "trend template: {trend_pass_count}/8 criteria pass (min 5)"
//! when = { op = "below", input = "trend_pass_count", value = 5 }
//! ```

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use verdict_core::{ComponentScore, IndicatorKind, IndicatorView};

/// 규칙 평가 컨텍스트.
///
/// 후보 지표(및 시장 지표) 뷰와 이미 계산된 컴포넌트 점수를 함께 봅니다.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub view: IndicatorView<'a>,
    pub components: &'a [ComponentScore],
}

impl<'a> EvalContext<'a> {
    /// 새 컨텍스트 생성.
    pub fn new(view: IndicatorView<'a>, components: &'a [ComponentScore]) -> Self {
        Self { view, components }
    }
}

/// 선언형 불리언 규칙.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// 수치 < value
    Below { input: String, value: f64 },
    /// 수치 <= value
    AtMost { input: String, value: f64 },
    /// 수치 > value
    Above { input: String, value: f64 },
    /// 수치 >= value
    AtLeast { input: String, value: f64 },
    /// 플래그가 true
    IsTrue { input: String },
    /// 플래그가 false
    IsFalse { input: String },
    /// 범주가 집합에 포함
    InSet { input: String, values: Vec<String> },
    /// 순차 수치의 마지막 `lookback` 구간이 모두 상승
    SeriesRising { input: String, lookback: usize },
    /// 이미 계산된 컴포넌트 점수 < value
    ComponentBelow { component: String, value: f64 },
    /// 모두 참
    All { of: Vec<Predicate> },
    /// 하나라도 참
    Any { of: Vec<Predicate> },
    /// 부정
    Not { of: Box<Predicate> },
}

impl Predicate {
    pub fn below(input: impl Into<String>, value: f64) -> Self {
        Self::Below {
            input: input.into(),
            value,
        }
    }

    pub fn at_most(input: impl Into<String>, value: f64) -> Self {
        Self::AtMost {
            input: input.into(),
            value,
        }
    }

    pub fn above(input: impl Into<String>, value: f64) -> Self {
        Self::Above {
            input: input.into(),
            value,
        }
    }

    pub fn at_least(input: impl Into<String>, value: f64) -> Self {
        Self::AtLeast {
            input: input.into(),
            value,
        }
    }

    pub fn is_true(input: impl Into<String>) -> Self {
        Self::IsTrue {
            input: input.into(),
        }
    }

    pub fn is_false(input: impl Into<String>) -> Self {
        Self::IsFalse {
            input: input.into(),
        }
    }

    pub fn in_set(input: impl Into<String>, values: &[&str]) -> Self {
        Self::InSet {
            input: input.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn series_rising(input: impl Into<String>, lookback: usize) -> Self {
        Self::SeriesRising {
            input: input.into(),
            lookback,
        }
    }

    pub fn component_below(component: impl Into<String>, value: f64) -> Self {
        Self::ComponentBelow {
            component: component.into(),
            value,
        }
    }

    pub fn all(of: Vec<Predicate>) -> Self {
        Self::All { of }
    }

    pub fn any(of: Vec<Predicate>) -> Self {
        Self::Any { of }
    }

    pub fn not(of: Predicate) -> Self {
        Self::Not { of: Box::new(of) }
    }

    /// 규칙 평가.
    ///
    /// 입력이 없거나 타입이 맞지 않으면 `None` (알 수 없음).
    /// `All`은 하나라도 거짓이면 거짓, `Any`는 하나라도 참이면 참입니다.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Option<bool> {
        match self {
            Predicate::Below { input, value } => ctx.view.number(input).map(|v| v < *value),
            Predicate::AtMost { input, value } => ctx.view.number(input).map(|v| v <= *value),
            Predicate::Above { input, value } => ctx.view.number(input).map(|v| v > *value),
            Predicate::AtLeast { input, value } => ctx.view.number(input).map(|v| v >= *value),
            Predicate::IsTrue { input } => ctx.view.flag(input),
            Predicate::IsFalse { input } => ctx.view.flag(input).map(|b| !b),
            Predicate::InSet { input, values } => ctx
                .view
                .category(input)
                .map(|c| values.iter().any(|v| v == c)),
            Predicate::SeriesRising { input, lookback } => {
                let series = ctx.view.series(input)?;
                if *lookback == 0 || series.len() < lookback + 1 {
                    return None;
                }
                let tail = &series[series.len() - (lookback + 1)..];
                Some(tail.windows(2).all(|w| w[1] > w[0]))
            }
            Predicate::ComponentBelow { component, value } => ctx
                .components
                .iter()
                .find(|c| &c.name == component)
                .and_then(|c| c.points())
                .and_then(|p| p.to_f64())
                .map(|p| p < *value),
            Predicate::All { of } => {
                let mut unknown = false;
                for p in of {
                    match p.evaluate(ctx) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(true)
                }
            }
            Predicate::Any { of } => {
                let mut unknown = false;
                for p in of {
                    match p.evaluate(ctx) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
            Predicate::Not { of } => of.evaluate(ctx).map(|b| !b),
        }
    }

    /// 참조하는 지표와 기대 타입 (설정 검증용).
    pub fn requirements(&self) -> Vec<(&str, IndicatorKind)> {
        let mut out = Vec::new();
        self.collect_requirements(&mut out);
        out
    }

    fn collect_requirements<'s>(&'s self, out: &mut Vec<(&'s str, IndicatorKind)>) {
        match self {
            Predicate::Below { input, .. }
            | Predicate::AtMost { input, .. }
            | Predicate::Above { input, .. }
            | Predicate::AtLeast { input, .. } => out.push((input, IndicatorKind::Number)),
            Predicate::IsTrue { input } | Predicate::IsFalse { input } => {
                out.push((input, IndicatorKind::Flag))
            }
            Predicate::InSet { input, .. } => out.push((input, IndicatorKind::Category)),
            Predicate::SeriesRising { input, .. } => out.push((input, IndicatorKind::Series)),
            Predicate::ComponentBelow { .. } => {}
            Predicate::All { of } | Predicate::Any { of } => {
                for p in of {
                    p.collect_requirements(out);
                }
            }
            Predicate::Not { of } => of.collect_requirements(out),
        }
    }

    /// 참조하는 컴포넌트 이름 (설정 검증용).
    pub fn component_refs(&self) -> Vec<&str> {
        match self {
            Predicate::ComponentBelow { component, .. } => vec![component.as_str()],
            Predicate::All { of } | Predicate::Any { of } => {
                of.iter().flat_map(|p| p.component_refs()).collect()
            }
            Predicate::Not { of } => of.component_refs(),
            _ => Vec::new(),
        }
    }

    /// 규칙 자체의 값 오류 (설정 검증용).
    pub(crate) fn shape_issues(&self) -> Vec<String> {
        match self {
            Predicate::Below { input, value }
            | Predicate::AtMost { input, value }
            | Predicate::Above { input, value }
            | Predicate::AtLeast { input, value }
                if !value.is_finite() =>
            {
                vec![format!("threshold for '{}' is not finite", input)]
            }
            Predicate::SeriesRising { input, lookback } if *lookback == 0 => {
                vec![format!("series_rising on '{}' needs lookback >= 1", input)]
            }
            Predicate::InSet { input, values } if values.is_empty() => {
                vec![format!("in_set on '{}' has no values", input)]
            }
            Predicate::All { of } | Predicate::Any { of } => {
                if of.is_empty() {
                    vec!["all/any with no operands".to_string()]
                } else {
                    of.iter().flat_map(|p| p.shape_issues()).collect()
                }
            }
            Predicate::Not { of } => of.shape_issues(),
            _ => Vec::new(),
        }
    }
}

/// 사유 템플릿의 `{지표}` 자리표시자를 관측값으로 치환합니다.
///
/// 값이 없는 지표의 자리표시자는 그대로 남깁니다.
pub fn render_reason(template: &str, predicate: &Predicate, view: &IndicatorView<'_>) -> String {
    let mut rendered = template.to_string();
    for (input, _) in predicate.requirements() {
        let placeholder = format!("{{{}}}", input);
        if rendered.contains(&placeholder) {
            if let Some(value) = view.get(input) {
                rendered = rendered.replace(&placeholder, &value.to_string());
            }
        }
    }
    rendered
}

// ================================================================================================
// 테스트
// ================================================================================================
