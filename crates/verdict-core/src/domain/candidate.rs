//! 평가 후보.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::indicator::IndicatorBag;

/// 평가 후보 (종목 식별자 + 시점 + 원시 지표 묶음).
///
/// 평가 요청마다 생성되며 점수 계산이 시작되면 변경되지 않습니다.
/// 엔진은 후보를 보관하지 않고 결과만 반환합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// 종목 식별자 (티커)
    pub symbol: String,
    /// 지표 기준 시각
    pub as_of: DateTime<Utc>,
    /// 원시 지표
    #[serde(default)]
    pub indicators: IndicatorBag,
    /// 수집기에서 실패한 하위 분석 목록
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collector_failures: Vec<SubAnalysisFailure>,
}

impl Candidate {
    /// 새 후보 생성.
    pub fn new(symbol: impl Into<String>, as_of: DateTime<Utc>, indicators: IndicatorBag) -> Self {
        Self {
            symbol: symbol.into(),
            as_of,
            indicators,
            collector_failures: Vec::new(),
        }
    }

    /// 수집 실패 기록 추가 (빌더).
    pub fn with_failure(mut self, analysis: impl Into<String>, message: impl Into<String>) -> Self {
        self.collector_failures.push(SubAnalysisFailure {
            analysis: analysis.into(),
            message: message.into(),
        });
        self
    }

    /// 특정 하위 분석의 수집 실패 메시지.
    pub fn failure_for(&self, analysis: &str) -> Option<&str> {
        self.collector_failures
            .iter()
            .find(|f| f.analysis == analysis)
            .map(|f| f.message.as_str())
    }
}

/// 수집기 하위 분석 실패 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAnalysisFailure {
    /// 하위 분석 이름 (예: "earnings_history")
    pub analysis: String,
    /// 실패 사유
    pub message: String,
}
