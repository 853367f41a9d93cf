//! 데이터 품질 추적.
//!
//! 파이프라인 각 단계에서 계산된 분석과 생략된 분석을 모아 품질 레벨을 결정합니다.
//! 가장 심각한 사유가 이깁니다: MINIMAL > PROVISIONAL > PARTIAL > FULL.

use verdict_core::{ComponentScore, DataQuality, DataQualityReport, SkipReason, SkippedAnalysis};

/// 후보 하나의 데이터 품질 추적기.
#[derive(Debug, Clone, Default)]
pub struct DataQualityTracker {
    level: DataQuality,
    available: Vec<String>,
    skipped: Vec<SkippedAnalysis>,
    scorable_components: usize,
}

impl DataQualityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 컴포넌트 점수 결과 기록.
    pub fn record_component(&mut self, score: &ComponentScore) {
        match score.unscorable_cause() {
            None => {
                self.scorable_components += 1;
                self.available.push(score.name.clone());
            }
            Some(cause) => self.record_skip(score.name.clone(), cause.clone()),
        }
    }

    /// 판정하지 못한 하드 게이트 기록 (최소 PARTIAL).
    pub fn record_unevaluated_gate(&mut self, skipped: SkippedAnalysis) {
        self.level = self.level.worst(DataQuality::Partial);
        self.skipped.push(skipped);
    }

    fn record_skip(&mut self, name: String, reason: SkipReason) {
        self.level = self.level.worst(reason.implied_quality());
        self.skipped.push(SkippedAnalysis { name, reason });
    }

    /// 현재 품질 레벨.
    pub fn level(&self) -> DataQuality {
        if self.scorable_components == 0 {
            DataQuality::Minimal
        } else {
            self.level
        }
    }

    /// 보고서 생성.
    pub fn finish(self) -> DataQualityReport {
        DataQualityReport {
            level: self.level(),
            available: self.available,
            skipped: self.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use verdict_core::ScoreValue;

    fn component(name: &str, value: ScoreValue) -> ComponentScore {
        ComponentScore {
            name: name.to_string(),
            raw_inputs_used: vec![],
            weight_max: dec!(10),
            value,
            skipped_terms: vec![],
        }
    }

    #[test]
    fn test_full_when_everything_scored() {
        let mut tracker = DataQualityTracker::new();
        tracker.record_component(&component("setup", ScoreValue::Scored { points: dec!(5) }));

        let report = tracker.finish();
        assert_eq!(report.level, DataQuality::Full);
        assert_eq!(report.available, vec!["setup".to_string()]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_most_severe_wins() {
        let mut tracker = DataQualityTracker::new();
        tracker.record_component(&component("trend_stage", ScoreValue::Scored { points: dec!(5) }));
        tracker.record_component(&component(
            "fundamentals",
            ScoreValue::Unscorable {
                cause: SkipReason::MissingInput {
                    inputs: vec!["margin_direction".to_string()],
                },
            },
        ));
        assert_eq!(tracker.level(), DataQuality::Partial);

        tracker.record_component(&component(
            "growth",
            ScoreValue::Unscorable {
                cause: SkipReason::SkippedForSpeed,
            },
        ));
        assert_eq!(tracker.level(), DataQuality::Provisional);

        let report = tracker.finish();
        assert_eq!(report.skipped_names(), vec!["fundamentals", "growth"]);
    }

    #[test]
    fn test_unevaluated_gate_is_partial() {
        let mut tracker = DataQualityTracker::new();
        tracker.record_component(&component("trend_stage", ScoreValue::Scored { points: dec!(5) }));
        tracker.record_unevaluated_gate(SkippedAnalysis {
            name: "no_institutional_footprint".to_string(),
            reason: SkipReason::MissingInput {
                inputs: vec!["institutional_footprint".to_string()],
            },
        });

        assert_eq!(tracker.level(), DataQuality::Partial);
    }

    #[test]
    fn test_nothing_scorable_is_minimal() {
        let mut tracker = DataQualityTracker::new();
        tracker.record_component(&component(
            "trend_stage",
            ScoreValue::Unscorable {
                cause: SkipReason::CollectorFailed {
                    message: "timeout".to_string(),
                },
            },
        ));

        assert_eq!(tracker.finish().level, DataQuality::Minimal);
    }
}
