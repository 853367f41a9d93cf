//! 원시 지표 값과 지표 묶음.
//!
//! 시그널 수집기가 후보마다 제공하는 이름 있는 원시 지표를 표현합니다.
//! 엔진은 지표가 어떻게 계산되었는지 알지 못하며, 이름과 타입(kind)만 신뢰합니다.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 원시 지표 값.
///
/// JSON 표현은 타입 태그 없이 값 자체입니다 (`true`, `3`, `[12.5, 30.1]`, `"advancing"`).
/// `null`은 값이 아니라 "없음"으로 취급되어 묶음에서 제외됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    /// 불리언 플래그 (예: pocket_pivot)
    Flag(bool),
    /// 수치 (예: rs_percentile)
    Number(f64),
    /// 순차 수치 (예: 분기별 성장률, 오래된 값 → 최신 값)
    Series(Vec<f64>),
    /// 범주형 상태 (예: stage = "advancing")
    Category(String),
}

impl IndicatorValue {
    /// 값의 타입.
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorValue::Flag(_) => IndicatorKind::Flag,
            IndicatorValue::Number(_) => IndicatorKind::Number,
            IndicatorValue::Series(_) => IndicatorKind::Series,
            IndicatorValue::Category(_) => IndicatorKind::Category,
        }
    }
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Flag(b) => write!(f, "{}", b),
            IndicatorValue::Number(n) => write!(f, "{}", format_number(*n)),
            IndicatorValue::Series(values) => {
                let parts: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            IndicatorValue::Category(c) => write!(f, "{}", c),
        }
    }
}

/// 사유 문자열용 수치 포맷 (정수면 소수점 생략, 아니면 소수 둘째 자리).
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
    }
}

/// 지표 타입 (스키마 선언 및 검증용).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Flag,
    Number,
    Series,
    Category,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndicatorKind::Flag => "flag",
            IndicatorKind::Number => "number",
            IndicatorKind::Series => "series",
            IndicatorKind::Category => "category",
        };
        write!(f, "{}", s)
    }
}

/// 엔진이 기대하는 지표 형태 선언 (이름 → 타입).
///
/// 루브릭/게이트/엣지가 참조하는 모든 지표는 여기에 선언되어야 하며,
/// 선언되지 않은 지표 참조는 설정 검증 단계에서 거부됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSchema(pub BTreeMap<String, IndicatorKind>);

impl IndicatorSchema {
    /// 빈 스키마 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 지표 선언 추가 (빌더).
    pub fn declare(mut self, name: impl Into<String>, kind: IndicatorKind) -> Self {
        self.0.insert(name.into(), kind);
        self
    }

    /// 선언된 타입 조회.
    pub fn kind_of(&self, name: &str) -> Option<IndicatorKind> {
        self.0.get(name).copied()
    }

    /// 선언된 지표 수.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 비어 있는지 여부.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 이름 있는 원시 지표 묶음.
///
/// 결정적 순회를 위해 `BTreeMap`을 사용합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorBag(BTreeMap<String, IndicatorValue>);

impl<'de> Deserialize<'de> for IndicatorBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<IndicatorValue>>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect(),
        ))
    }
}

impl IndicatorBag {
    /// 빈 묶음 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 지표 삽입 (빌더).
    pub fn with(mut self, name: impl Into<String>, value: IndicatorValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// 불리언 지표 삽입 (빌더).
    pub fn with_flag(self, name: impl Into<String>, value: bool) -> Self {
        self.with(name, IndicatorValue::Flag(value))
    }

    /// 수치 지표 삽입 (빌더).
    pub fn with_number(self, name: impl Into<String>, value: f64) -> Self {
        self.with(name, IndicatorValue::Number(value))
    }

    /// 순차 수치 지표 삽입 (빌더).
    pub fn with_series(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.with(name, IndicatorValue::Series(values))
    }

    /// 범주형 지표 삽입 (빌더).
    pub fn with_category(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, IndicatorValue::Category(value.into()))
    }

    /// 지표 삽입.
    pub fn insert(&mut self, name: impl Into<String>, value: IndicatorValue) {
        self.0.insert(name.into(), value);
    }

    /// 지표 제거.
    pub fn remove(&mut self, name: &str) -> Option<IndicatorValue> {
        self.0.remove(name)
    }

    /// 원시 값 조회.
    pub fn get(&self, name: &str) -> Option<&IndicatorValue> {
        self.0.get(name)
    }

    /// 지표 존재 여부.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// 지표 수.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 비어 있는지 여부.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 이름 순회.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// 평가 시점의 지표 조회 뷰.
///
/// 후보 자체의 지표를 먼저 찾고, 없으면 배치 단위로 공유되는 시장 지표를 찾습니다.
/// 복사 없이 두 묶음을 겹쳐 봅니다.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorView<'a> {
    candidate: &'a IndicatorBag,
    market: Option<&'a IndicatorBag>,
}

impl<'a> IndicatorView<'a> {
    /// 새 뷰 생성.
    pub fn new(candidate: &'a IndicatorBag, market: Option<&'a IndicatorBag>) -> Self {
        Self { candidate, market }
    }

    /// 원시 값 조회.
    pub fn get(&self, name: &str) -> Option<&'a IndicatorValue> {
        self.candidate
            .get(name)
            .or_else(|| self.market.and_then(|m| m.get(name)))
    }

    /// 수치 조회. 타입이 다르거나 유한하지 않으면 `None`.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(IndicatorValue::Number(n)) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// 불리언 조회. 타입이 다르면 `None`.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(IndicatorValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    /// 순차 수치 조회. 유한하지 않은 값이 섞여 있으면 `None`.
    pub fn series(&self, name: &str) -> Option<&'a [f64]> {
        match self.get(name) {
            Some(IndicatorValue::Series(values)) if values.iter().all(|v| v.is_finite()) => {
                Some(values.as_slice())
            }
            _ => None,
        }
    }

    /// 범주 조회. 타입이 다르면 `None`.
    pub fn category(&self, name: &str) -> Option<&'a str> {
        match self.get(name) {
            Some(IndicatorValue::Category(c)) => Some(c.as_str()),
            _ => None,
        }
    }
}
