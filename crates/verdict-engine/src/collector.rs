//! 시그널 수집기 인터페이스.
//!
//! 실제 시장 데이터 조회는 엔진 밖의 책임입니다. 엔진은 필요한 지표 이름을 알려주고
//! 후보별 지표 묶음을 받기만 합니다. 수집기 호출이 배치에서 유일한 I/O 경계입니다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use verdict_core::{AnalysisDepth, Candidate, IndicatorBag, MarketContext, VerdictError};

// ================================================================================================
// Error Types
// ================================================================================================

/// 수집기 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    /// 타임아웃
    #[error("수집 타임아웃: {symbol} ({timeout_ms}ms)")]
    Timeout { symbol: String, timeout_ms: u64 },

    /// 데이터 소스 사용 불가
    #[error("수집기 사용 불가: {0}")]
    Unavailable(String),

    /// 종목 없음
    #[error("종목을 찾을 수 없음: {0}")]
    NotFound(String),
}

impl From<CollectorError> for VerdictError {
    fn from(err: CollectorError) -> Self {
        VerdictError::Collector(err.to_string())
    }
}

// ================================================================================================
// SignalCollector Trait
// ================================================================================================

/// 후보 하나에 대한 수집 요청.
#[derive(Debug, Clone, Copy)]
pub struct CollectRequest<'a> {
    /// 종목 식별자
    pub symbol: &'a str,
    /// 분석 깊이
    pub depth: AnalysisDepth,
    /// 엔진이 읽는 지표 이름
    pub required_inputs: &'a [String],
}

/// 시그널 수집기.
///
/// 하위 분석 일부가 실패하면 에러 대신 `Candidate::collector_failures`에 기록하여
/// 나머지 지표로 평가를 계속할 수 있게 합니다.
#[async_trait]
pub trait SignalCollector: Send + Sync {
    /// 후보 지표 수집.
    async fn collect(&self, request: &CollectRequest<'_>) -> Result<Candidate, CollectorError>;

    /// 시장 전체 컨텍스트 수집 (배치당 한 번 호출).
    ///
    /// 시장 피드가 없는 수집기는 `None`을 반환합니다.
    async fn market_context(&self) -> Result<Option<MarketContext>, CollectorError>;
}

// ================================================================================================
// StaticCollector
// ================================================================================================

/// 메모리 기반 수집기.
///
/// 스냅샷 파일 재생과 테스트에 사용합니다. 요청된 지표만 돌려줍니다.
#[derive(Debug, Default)]
pub struct StaticCollector {
    candidates: HashMap<String, Candidate>,
    market: Option<MarketContext>,
    failures: HashMap<String, CollectorError>,
    delays: HashMap<String, Duration>,
    market_calls: AtomicUsize,
    collect_calls: AtomicUsize,
}

impl StaticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.insert(candidate.symbol.clone(), candidate);
        self
    }

    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = Candidate>) -> Self {
        for candidate in candidates {
            self.candidates.insert(candidate.symbol.clone(), candidate);
        }
        self
    }

    pub fn with_market(mut self, market: MarketContext) -> Self {
        self.market = Some(market);
        self
    }

    /// 특정 종목 수집 실패 주입.
    pub fn with_failure(mut self, symbol: impl Into<String>, error: CollectorError) -> Self {
        self.failures.insert(symbol.into(), error);
        self
    }

    /// 특정 종목 수집 지연 주입.
    pub fn with_delay(mut self, symbol: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(symbol.into(), delay);
        self
    }

    /// `market_context` 호출 횟수.
    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    /// `collect` 호출 횟수.
    pub fn collect_calls(&self) -> usize {
        self.collect_calls.load(Ordering::SeqCst)
    }

    /// 보유 종목 (정렬).
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.candidates.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

#[async_trait]
impl SignalCollector for StaticCollector {
    async fn collect(&self, request: &CollectRequest<'_>) -> Result<Candidate, CollectorError> {
        self.collect_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(request.symbol) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = self.failures.get(request.symbol) {
            return Err(err.clone());
        }

        let stored = self
            .candidates
            .get(request.symbol)
            .ok_or_else(|| CollectorError::NotFound(request.symbol.to_string()))?;

        if request.required_inputs.is_empty() {
            return Ok(stored.clone());
        }

        let wanted: HashSet<&str> = request.required_inputs.iter().map(String::as_str).collect();
        let mut indicators = IndicatorBag::new();
        for name in stored.indicators.names().filter(|n| wanted.contains(n)) {
            if let Some(value) = stored.indicators.get(name) {
                indicators.insert(name, value.clone());
            }
        }

        Ok(Candidate {
            indicators,
            ..stored.clone()
        })
    }

    async fn market_context(&self) -> Result<Option<MarketContext>, CollectorError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.market.clone())
    }
}

// ================================================================================================
// Snapshot
// ================================================================================================

/// 수집 결과 스냅샷 (`{ "market": {...}?, "candidates": [...] }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketContext>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl Snapshot {
    /// JSON 문자열에서 로드.
    pub fn from_json(content: &str) -> Result<Self, VerdictError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 스냅샷 순서대로의 종목 목록.
    pub fn symbols(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.symbol.clone()).collect()
    }

    /// 메모리 수집기로 변환.
    pub fn into_collector(self) -> StaticCollector {
        let collector = StaticCollector::new().with_candidates(self.candidates);
        match self.market {
            Some(market) => collector.with_market(market),
            None => collector,
        }
    }
}

// ================================================================================================
// 테스트
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use verdict_core::MarketRegime;

    fn candidate() -> Candidate {
        Candidate::new(
            "AAPL",
            Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
            IndicatorBag::new()
                .with_number("rs_percentile", 88.0)
                .with_category("base_quality", "sound"),
        )
    }

    #[tokio::test]
    async fn test_collect_filters_to_required_inputs() {
        let collector = StaticCollector::new().with_candidate(candidate());
        let required = vec!["rs_percentile".to_string()];
        let collected = collector
            .collect(&CollectRequest {
                symbol: "AAPL",
                depth: AnalysisDepth::Provisional,
                required_inputs: &required,
            })
            .await
            .unwrap();

        assert!(collected.indicators.contains("rs_percentile"));
        assert!(!collected.indicators.contains("base_quality"));
        assert_eq!(collector.collect_calls(), 1);
    }

    #[tokio::test]
    async fn test_collect_unknown_symbol() {
        let collector = StaticCollector::new();
        let err = collector
            .collect(&CollectRequest {
                symbol: "ZZZZ",
                depth: AnalysisDepth::Full,
                required_inputs: &[],
            })
            .await
            .unwrap_err();

        assert_eq!(err, CollectorError::NotFound("ZZZZ".to_string()));
        let verdict: VerdictError = err.into();
        assert!(verdict.is_recoverable());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let collector = StaticCollector::new()
            .with_candidate(candidate())
            .with_failure("AAPL", CollectorError::Unavailable("feed down".to_string()));
        let result = collector
            .collect(&CollectRequest {
                symbol: "AAPL",
                depth: AnalysisDepth::Full,
                required_inputs: &[],
            })
            .await;

        assert!(matches!(result, Err(CollectorError::Unavailable(_))));
    }

    #[test]
    fn test_snapshot_from_json() {
        let snapshot = Snapshot::from_json(
            r#"{
                "market": {"as_of": "2026-03-02T00:00:00Z", "regime": "correction"},
                "candidates": [
                    {"symbol": "AAPL", "as_of": "2026-03-02T00:00:00Z",
                     "indicators": {"rs_percentile": 88, "pocket_pivot": true}},
                    {"symbol": "TSLA", "as_of": "2026-03-02T00:00:00Z",
                     "collector_failures": [{"analysis": "earnings_history", "message": "timeout"}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.symbols(), vec!["AAPL".to_string(), "TSLA".to_string()]);
        assert_eq!(
            snapshot.market.as_ref().map(|m| m.regime),
            Some(MarketRegime::Correction)
        );
        assert_eq!(
            snapshot.candidates[1].failure_for("earnings_history"),
            Some("timeout")
        );

        let collector = snapshot.into_collector();
        assert_eq!(collector.symbols(), vec!["AAPL".to_string(), "TSLA".to_string()]);
    }
}
