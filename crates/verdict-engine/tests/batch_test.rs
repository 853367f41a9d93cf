//! 배치 오케스트레이터 통합 테스트.
//!
//! 메모리 수집기(StaticCollector)로 다음을 검증합니다:
//! - 모드별 결과 순서 (watchlist/screen 점수순, analyze/compare 호출 순서)
//! - 시장 컨텍스트 단일 수집
//! - screen 상위 N개 상세 재평가
//! - compare best-of 필드
//! - 수집 실패/타임아웃 격리, 전체 실패, 취소

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use verdict_core::{
    AnalysisDepth, BatchMode, BestOfPick, Candidate, DataQuality, IndicatorBag, IndicatorKind,
    MarketContext, MarketRegime, SignalLevel, SkipReason,
};
use verdict_engine::{
    BatchError, BatchOrchestrator, BatchRequest, BestOfSpec, CollectorError, EngineConfig,
    ScoringEngine, StaticCollector,
};

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

/// 만점 지표.
fn max_indicators() -> IndicatorBag {
    IndicatorBag::new()
        .with_number("trend_pass_count", 8.0)
        .with_category("stage", "advancing")
        .with_series("growth_rates", vec![20.0, 30.0, 45.0])
        .with_flag("accumulation_dominant", true)
        .with_flag("pocket_pivot", true)
        .with_flag("volume_dry_up", true)
        .with_flag("distribution_cluster", false)
        .with_flag("weak_construction", false)
        .with_flag("institutional_footprint", true)
        .with_number("rs_percentile", 95.0)
        .with_category("base_quality", "textbook")
        .with_number("pivot_distance_pct", 0.0)
        .with_number("extension_pct", 5.0)
        .with_number("days_to_earnings", 40.0)
        .with_flag("dilution", false)
        .with_category("margin_direction", "expanding")
}

fn candidate(symbol: &str, indicators: IndicatorBag) -> Candidate {
    Candidate::new(
        symbol,
        Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap(),
        indicators,
    )
}

/// 잠정 점수 70 / 65 / 64가 되는 세 후보.
fn watchlist_collector() -> StaticCollector {
    StaticCollector::new().with_candidates(vec![
        candidate("BBB", max_indicators().with_number("rs_percentile", 50.0)),
        candidate("AAA", max_indicators()),
        candidate("CCC", max_indicators().with_number("trend_pass_count", 6.0)),
    ])
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn orchestrator(
    collector: StaticCollector,
) -> (BatchOrchestrator<StaticCollector>, Arc<StaticCollector>) {
    let collector = Arc::new(collector);
    let engine = Arc::new(ScoringEngine::with_defaults().unwrap());
    (BatchOrchestrator::new(engine, collector.clone()), collector)
}

fn order(result: &verdict_core::BatchResult) -> Vec<&str> {
    result.results.iter().map(|r| r.candidate_id.as_str()).collect()
}

// ============================================================================
// 모드별 동작
// ============================================================================

#[tokio::test]
async fn test_watchlist_sorted_by_score_provisional() {
    let (orch, collector) = orchestrator(watchlist_collector());
    let request = BatchRequest::new(
        BatchMode::Watchlist,
        symbols(&["BBB", "AAA", "CCC"]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(order(&result), vec!["AAA", "CCC", "BBB"]);
    let scores: Vec<_> = result.results.iter().map(|r| r.composite_score).collect();
    assert_eq!(scores, vec![dec!(70), dec!(65), dec!(64)]);
    for r in &result.results {
        assert_eq!(r.depth, AnalysisDepth::Provisional);
        assert_eq!(r.data_quality, DataQuality::Provisional);
        assert!(r.signal <= SignalLevel::Standard);
    }

    // 잠정 결과는 모두 품질 저하로 표시
    assert_eq!(result.summary.degraded.len(), 3);
    assert!(result.summary.detailed.is_empty());
    assert_eq!(collector.market_calls(), 1);
}

#[tokio::test]
async fn test_provisional_skips_are_reported() {
    let (orch, _) = orchestrator(watchlist_collector());
    let request = BatchRequest::new(BatchMode::Watchlist, symbols(&["AAA"]), dec!(20));

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();
    let aaa = result.result_for("AAA").unwrap();

    let mut skipped: Vec<&str> = aaa.skipped_analyses.iter().map(|s| s.name.as_str()).collect();
    skipped.sort();
    assert_eq!(skipped, vec!["growth", "setup"]);
    assert!(aaa
        .skipped_analyses
        .iter()
        .all(|s| s.reason == SkipReason::SkippedForSpeed));
}

#[tokio::test]
async fn test_screen_details_top_n() {
    let (orch, collector) = orchestrator(watchlist_collector());
    let request = BatchRequest::new(
        BatchMode::Screen,
        symbols(&["BBB", "AAA", "CCC"]),
        dec!(25),
    )
    .with_detail_top_n(1);

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.summary.detailed, vec!["AAA".to_string()]);
    let aaa = result.result_for("AAA").unwrap();
    assert_eq!(aaa.depth, AnalysisDepth::Full);
    assert_eq!(aaa.composite_score, dec!(100));
    assert_eq!(aaa.data_quality, DataQuality::Full);
    assert_eq!(aaa.signal, SignalLevel::Aggressive);

    assert_eq!(
        result.result_for("CCC").map(|r| r.depth),
        Some(AnalysisDepth::Provisional)
    );
    assert_eq!(order(&result), vec!["AAA", "CCC", "BBB"]);

    // 2차 통과도 같은 시장 컨텍스트 사용
    assert_eq!(collector.market_calls(), 1);
    assert_eq!(collector.collect_calls(), 4);
}

#[tokio::test]
async fn test_analyze_preserves_caller_order() {
    let (orch, _) = orchestrator(watchlist_collector());
    let request = BatchRequest::new(
        BatchMode::Analyze,
        symbols(&["CCC", "BBB", "AAA"]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(order(&result), vec!["CCC", "BBB", "AAA"]);
    assert!(result.results.iter().all(|r| r.depth == AnalysisDepth::Full));
    assert!(result.best_of.is_empty());
}

#[tokio::test]
async fn test_compare_best_of() {
    let collector = StaticCollector::new().with_candidates(vec![
        candidate("NVDA", max_indicators()),
        candidate(
            "AMD",
            max_indicators()
                .with_number("rs_percentile", 85.0)
                .with_number("extension_pct", 3.0),
        ),
        candidate(
            "SMCI",
            max_indicators()
                .with_number("rs_percentile", 90.0)
                .with_number("extension_pct", 30.0),
        ),
    ]);
    let (orch, _) = orchestrator(collector);
    let request = BatchRequest::new(
        BatchMode::Compare,
        symbols(&["SMCI", "AMD", "NVDA"]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(order(&result), vec!["SMCI", "AMD", "NVDA"]);

    let best_score = result.best_of("composite_score").unwrap();
    assert_eq!(best_score.symbol, "NVDA");
    assert_eq!(best_score.value, 100.0);

    let best_rs = result.best_of("rs_percentile").unwrap();
    assert_eq!(best_rs.symbol, "NVDA");

    let least_extended = result.best_of("extension_pct").unwrap();
    assert_eq!(least_extended.pick, BestOfPick::Min);
    assert_eq!(least_extended.symbol, "AMD");
    assert_eq!(least_extended.value, 3.0);
}

#[tokio::test]
async fn test_compare_best_of_tie_goes_to_earlier_candidate() {
    let collector = StaticCollector::new().with_candidates(vec![
        candidate("AAA", max_indicators()),
        candidate("BBB", max_indicators()),
    ]);
    let (orch, _) = orchestrator(collector);
    let request = BatchRequest::new(BatchMode::Compare, symbols(&["BBB", "AAA"]), dec!(20));

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(order(&result), vec!["BBB", "AAA"]);
    assert_eq!(result.best_of("composite_score").unwrap().symbol, "BBB");
    assert_eq!(result.best_of("rs_percentile").unwrap().symbol, "BBB");
    assert_eq!(result.best_of("extension_pct").unwrap().symbol, "BBB");
}

#[tokio::test]
async fn test_compare_best_of_schema_only_metric() {
    let mut config = EngineConfig::default();
    config.schema = config.schema.declare("market_cap_b", IndicatorKind::Number);
    config.batch.best_of.push(BestOfSpec::max("market_cap_b"));
    let engine = Arc::new(ScoringEngine::new(config).unwrap());
    let collector = Arc::new(StaticCollector::new().with_candidates(vec![
        candidate("AAA", max_indicators().with_number("market_cap_b", 10.0)),
        candidate("BBB", max_indicators().with_number("market_cap_b", 900.0)),
    ]));
    let orch = BatchOrchestrator::new(engine, collector);
    let request = BatchRequest::new(BatchMode::Compare, symbols(&["AAA", "BBB"]), dec!(20));

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    let largest = result.best_of("market_cap_b").unwrap();
    assert_eq!(largest.symbol, "BBB");
    assert_eq!(largest.value, 900.0);
}

#[tokio::test]
async fn test_shared_market_context() {
    let collector = watchlist_collector().with_market(MarketContext::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap(),
        MarketRegime::Correction,
    ));
    let (orch, collector) = orchestrator(collector);
    let request = BatchRequest::new(
        BatchMode::Analyze,
        symbols(&["AAA", "BBB", "CCC"]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.market_regime, Some(MarketRegime::Correction));
    let aaa = result.result_for("AAA").unwrap();
    assert_eq!(aaa.composite_score, dec!(95));
    assert!(aaa.gate("weak_market").map(|g| g.triggered).unwrap_or(false));
    assert_eq!(collector.market_calls(), 1);
}

#[tokio::test]
async fn test_duplicate_symbols_evaluated_once() {
    let (orch, collector) = orchestrator(watchlist_collector());
    let request = BatchRequest::new(
        BatchMode::Analyze,
        symbols(&["AAA", " AAA ", "BBB", ""]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.summary.requested, 2);
    assert_eq!(order(&result), vec!["AAA", "BBB"]);
    assert_eq!(collector.collect_calls(), 2);
}

// ============================================================================
// 실패 격리
// ============================================================================

#[tokio::test]
async fn test_collector_failure_is_isolated() {
    let collector = watchlist_collector()
        .with_failure("BBB", CollectorError::Unavailable("feed down".to_string()));
    let (orch, _) = orchestrator(collector);
    let request = BatchRequest::new(
        BatchMode::Analyze,
        symbols(&["AAA", "BBB"]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.summary.evaluated, 2);
    let bbb = result.result_for("BBB").unwrap();
    assert_eq!(bbb.data_quality, DataQuality::Minimal);
    assert_eq!(bbb.composite_score, dec!(0));
    assert_eq!(bbb.signal, SignalLevel::Avoid);

    let degraded: Vec<_> = result
        .summary
        .degraded
        .iter()
        .filter(|d| d.collector_error.is_some())
        .collect();
    assert_eq!(degraded.len(), 1);
    assert_eq!(degraded[0].symbol, "BBB");
    assert!(degraded[0]
        .collector_error
        .as_deref()
        .unwrap()
        .contains("feed down"));

    assert_eq!(
        result.result_for("AAA").map(|r| r.data_quality),
        Some(DataQuality::Full)
    );
}

#[tokio::test]
async fn test_failed_candidates_excluded_from_best_of() {
    let collector = watchlist_collector()
        .with_failure("AAA", CollectorError::Unavailable("feed down".to_string()));
    let (orch, _) = orchestrator(collector);
    let request = BatchRequest::new(
        BatchMode::Compare,
        symbols(&["AAA", "CCC"]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.best_of("composite_score").unwrap().symbol, "CCC");
}

#[tokio::test(start_paused = true)]
async fn test_collector_timeout() {
    let collector = watchlist_collector().with_delay("CCC", Duration::from_secs(60));
    let (orch, _) = orchestrator(collector);
    let request = BatchRequest::new(
        BatchMode::Analyze,
        symbols(&["AAA", "CCC"]),
        dec!(20),
    );

    let result = orch.run(request, &CancellationToken::new()).await.unwrap();

    let ccc = result
        .summary
        .degraded
        .iter()
        .find(|d| d.symbol == "CCC")
        .unwrap();
    assert!(ccc.collector_error.as_deref().unwrap().contains("5000ms"));
    assert_eq!(
        result.result_for("AAA").map(|r| r.data_quality),
        Some(DataQuality::Full)
    );
}

#[tokio::test(start_paused = true)]
async fn test_custom_timeout_from_config() {
    let mut config = EngineConfig::default();
    config.batch.collector_timeout_ms = 100;
    let engine = Arc::new(ScoringEngine::new(config).unwrap());
    let collector = Arc::new(watchlist_collector().with_delay("AAA", Duration::from_millis(500)));
    let orch = BatchOrchestrator::new(engine, collector);

    let err = orch
        .run(
            BatchRequest::new(BatchMode::Analyze, symbols(&["AAA"]), dec!(20)),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, BatchError::NoData { attempted: 1 });
}

#[tokio::test]
async fn test_all_failures_is_no_data() {
    let (orch, _) = orchestrator(StaticCollector::new());
    let request = BatchRequest::new(
        BatchMode::Watchlist,
        symbols(&["XXX", "YYY"]),
        dec!(20),
    );

    let err = orch.run(request, &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err, BatchError::NoData { attempted: 2 });
}

#[tokio::test]
async fn test_empty_request() {
    let (orch, _) = orchestrator(watchlist_collector());
    let request = BatchRequest::new(BatchMode::Compare, symbols(&[" ", ""]), dec!(20));

    let err = orch.run(request, &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err, BatchError::EmptyRequest);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let (orch, collector) = orchestrator(watchlist_collector());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let request = BatchRequest::new(
        BatchMode::Screen,
        symbols(&["AAA", "BBB"]),
        dec!(20),
    );

    let result = orch.run(request, &cancel).await.unwrap();

    assert!(result.results.is_empty());
    assert_eq!(
        result.summary.cancelled,
        vec!["AAA".to_string(), "BBB".to_string()]
    );
    assert_eq!(collector.collect_calls(), 0);
}
