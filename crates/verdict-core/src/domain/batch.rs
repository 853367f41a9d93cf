//! 배치 평가 결과.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::market::MarketRegime;
use super::quality::{AnalysisDepth, DataQuality, SkippedAnalysis};
use super::result::CompositeResult;

/// 배치 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// 단일 상세 분석 (호출 순서 유지)
    Analyze,
    /// 관심 종목: 잠정 평가 후 점수 내림차순
    Watchlist,
    /// 비교: 전체 평가, 호출 순서 유지, best-of 필드 계산
    Compare,
    /// 스크리닝: 잠정 평가 → 상위 N개 상세 재평가
    Screen,
}

impl BatchMode {
    /// 1차 통과 분석 깊이.
    pub fn initial_depth(self) -> AnalysisDepth {
        match self {
            BatchMode::Analyze | BatchMode::Compare => AnalysisDepth::Full,
            BatchMode::Watchlist | BatchMode::Screen => AnalysisDepth::Provisional,
        }
    }

    /// 결과를 점수 내림차순으로 정렬하는 모드인지 여부.
    pub fn sorts_by_score(self) -> bool {
        matches!(self, BatchMode::Watchlist | BatchMode::Screen)
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchMode::Analyze => "analyze",
            BatchMode::Watchlist => "watchlist",
            BatchMode::Compare => "compare",
            BatchMode::Screen => "screen",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "analyze" => Ok(Self::Analyze),
            "watchlist" => Ok(Self::Watchlist),
            "compare" => Ok(Self::Compare),
            "screen" => Ok(Self::Screen),
            _ => Err(format!(
                "Unknown batch mode: {}. Supported: analyze, watchlist, compare, screen",
                s
            )),
        }
    }
}

/// best-of 선택 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestOfPick {
    Max,
    Min,
}

/// 배치 전체에서 지표 하나의 최댓값/최솟값을 가진 후보.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOf {
    /// 지표 이름 (예: "rs_percentile", "composite_score")
    pub metric: String,
    /// 선택 방향
    pub pick: BestOfPick,
    /// 선택된 후보
    pub symbol: String,
    /// 해당 값
    pub value: f64,
}

/// 품질이 저하된 후보 요약.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedCandidate {
    /// 후보 식별자
    pub symbol: String,
    /// 데이터 품질
    pub data_quality: DataQuality,
    /// 생략된 하위 분석
    pub skipped: Vec<SkippedAnalysis>,
    /// 수집 자체가 실패한 경우 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_error: Option<String>,
}

/// 배치 요약.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    /// 요청된 후보 수 (중복 제거 후)
    pub requested: usize,
    /// 평가 완료 수
    pub evaluated: usize,
    /// 상세 재평가된 후보
    #[serde(default)]
    pub detailed: Vec<String>,
    /// 품질 저하 후보
    #[serde(default)]
    pub degraded: Vec<DegradedCandidate>,
    /// 취소로 평가하지 않은 후보
    #[serde(default)]
    pub cancelled: Vec<String>,
}

/// 배치 평가 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// 배치 실행 ID
    pub run_id: Uuid,
    /// 배치 모드
    pub mode: BatchMode,
    /// 평가 결과 (모드별 순서 보장)
    pub results: Vec<CompositeResult>,
    /// best-of 필드 (compare 모드)
    #[serde(default)]
    pub best_of: Vec<BestOf>,
    /// 배치에서 공유한 시장 레짐
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_regime: Option<MarketRegime>,
    /// 요약
    pub summary: BatchSummary,
    /// 생성 시각
    pub generated_at: DateTime<Utc>,
}

impl BatchResult {
    /// 심볼로 결과 조회.
    pub fn result_for(&self, symbol: &str) -> Option<&CompositeResult> {
        self.results.iter().find(|r| r.candidate_id == symbol)
    }

    /// 지표 이름으로 best-of 조회.
    pub fn best_of(&self, metric: &str) -> Option<&BestOf> {
        self.best_of.iter().find(|b| b.metric == metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("watchlist".parse::<BatchMode>().unwrap(), BatchMode::Watchlist);
        assert_eq!("SCREEN".parse::<BatchMode>().unwrap(), BatchMode::Screen);
        assert!("rank".parse::<BatchMode>().is_err());
    }

    #[test]
    fn test_mode_depth_and_order() {
        assert_eq!(BatchMode::Screen.initial_depth(), AnalysisDepth::Provisional);
        assert_eq!(BatchMode::Compare.initial_depth(), AnalysisDepth::Full);
        assert!(BatchMode::Watchlist.sorts_by_score());
        assert!(!BatchMode::Compare.sorts_by_score());
    }
}
