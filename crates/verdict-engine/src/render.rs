//! 최소 텍스트 출력.
//!
//! 어떤 표현 계층이든 반드시 노출해야 하는 항목:
//! 종합 점수, 차단 여부와 사유, 신호, 엣지 수, 최종 비중, 데이터 품질.
//! 품질이 저하된 결과는 명시적으로 표시하고 생략된 분석을 나열합니다.

use std::fmt::Write;

use verdict_core::{BatchResult, CompositeResult, DataQuality};

/// 품질 저하 경고 문구.
fn quality_banner(quality: DataQuality) -> Option<&'static str> {
    match quality {
        DataQuality::Full => None,
        DataQuality::Partial => Some("⚠️ PARTIAL: 일부 분석 생략 - 방향성 신호만 유효"),
        DataQuality::Provisional => Some("⚠️ PROVISIONAL: 잠정 평가 - 상세 분석 전 참고용"),
        DataQuality::Minimal => Some("⚠️ MINIMAL: 이력 부족 - 신뢰도 낮음"),
    }
}

/// 후보 하나의 최소 출력.
pub fn render_result(result: &CompositeResult) -> String {
    let mut out = String::new();
    let rec = &result.position_recommendation;

    let _ = writeln!(out, "[{}] {} {}", result.candidate_id, result.signal.icon(), result.signal);
    if let Some(banner) = quality_banner(result.data_quality) {
        let _ = writeln!(out, "  {}", banner);
    }
    let _ = writeln!(
        out,
        "  종합 점수: {} / 100 (산출 가능 {}, 감점 {})",
        result.composite_score, result.max_attainable_score, result.soft_penalty_total
    );
    if result.blocked {
        let _ = writeln!(out, "  차단: 예");
        for reason in &result.blocking_reasons {
            let _ = writeln!(out, "    - {}", reason);
        }
    } else {
        let _ = writeln!(out, "  차단: 아니오");
    }
    let _ = writeln!(out, "  엣지: {}", result.edge_count);
    match rec.capped_by {
        Some(constraint) => {
            let _ = writeln!(out, "  최종 비중: {}% (제한: {})", rec.final_pct, constraint);
        }
        None => {
            let _ = writeln!(out, "  최종 비중: {}%", rec.final_pct);
        }
    }
    let _ = writeln!(out, "  데이터 품질: {}", result.data_quality);
    for skipped in &result.skipped_analyses {
        let _ = writeln!(out, "    생략: {} ({})", skipped.name, skipped.reason);
    }

    out
}

/// 배치 결과 출력.
pub fn render_batch(batch: &BatchResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "배치 {} ({})", batch.run_id, batch.mode);
    if let Some(regime) = batch.market_regime {
        let _ = writeln!(out, "시장 레짐: {}", regime);
    }
    let _ = writeln!(
        out,
        "요청 {} / 평가 {} / 상세 {} / 품질 저하 {}",
        batch.summary.requested,
        batch.summary.evaluated,
        batch.summary.detailed.len(),
        batch.summary.degraded.len()
    );
    if !batch.summary.cancelled.is_empty() {
        let _ = writeln!(out, "취소됨: {}", batch.summary.cancelled.join(", "));
    }
    let _ = writeln!(out);

    for result in &batch.results {
        out.push_str(&render_result(result));
    }

    if !batch.best_of.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "best-of:");
        for best in &batch.best_of {
            let _ = writeln!(
                out,
                "  {} ({:?}): {} = {}",
                best.metric, best.pick, best.symbol, best.value
            );
        }
    }

    for degraded in &batch.summary.degraded {
        if let Some(error) = &degraded.collector_error {
            let _ = writeln!(out, "수집 실패: {} - {}", degraded.symbol, error);
        }
    }

    out
}
