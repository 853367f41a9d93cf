//! 신호 레벨 분류.
//!
//! `(composite_score, blocked, soft_gate_trigger_count, data_quality)`의 순수 함수입니다.
//! 호출 간 상태를 보존하지 않습니다.
//!
//! # 우선순위
//!
//! 1. 하드 게이트 차단 → AVOID (무조건)
//! 2. 점수 구간 판정 (AGGRESSIVE ≥ 80, STANDARD ≥ 65, REDUCED ≥ 50, MONITOR ≥ 35, 그 외 AVOID)
//! 3. 소프트 게이트 2개 이상 → REDUCED 이하
//! 4. 데이터 품질 상한 (PARTIAL/PROVISIONAL → STANDARD, MINIMAL → REDUCED)
//!
//! 상한은 레벨을 올리지 않고 끌어내리기만 하므로 2~4의 적용 순서는 결과에 영향이 없습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdict_core::{DataQuality, SignalCap, SignalLevel};

use crate::composite::to_decimal;

/// 점수 구간 임계값 (이상).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub aggressive: f64,
    pub standard: f64,
    pub reduced: f64,
    pub monitor: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            aggressive: 80.0,
            standard: 65.0,
            reduced: 50.0,
            monitor: 35.0,
        }
    }
}

impl SignalThresholds {
    /// 점수만으로 결정되는 레벨.
    pub fn bucket(&self, score: Decimal) -> SignalLevel {
        if score >= to_decimal(self.aggressive, 4) {
            SignalLevel::Aggressive
        } else if score >= to_decimal(self.standard, 4) {
            SignalLevel::Standard
        } else if score >= to_decimal(self.reduced, 4) {
            SignalLevel::Reduced
        } else if score >= to_decimal(self.monitor, 4) {
            SignalLevel::Monitor
        } else {
            SignalLevel::Avoid
        }
    }

    /// 설정 값 오류.
    pub(crate) fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let ordered = [self.aggressive, self.standard, self.reduced, self.monitor];

        if ordered.iter().any(|t| !t.is_finite() || *t < 0.0 || *t > 100.0) {
            issues.push("signal thresholds must be within 0..=100".to_string());
        }
        if !ordered.windows(2).all(|w| w[0] > w[1]) {
            issues.push(
                "signal thresholds must be strictly descending: aggressive > standard > reduced > monitor"
                    .to_string(),
            );
        }
        issues
    }
}

/// 점수 구간 판정 이후 적용되는 신호 상한.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalCapConfig {
    /// 이 개수 이상 소프트 게이트가 발동하면 상한 적용
    pub soft_gate_trigger_limit: usize,
    /// 소프트 게이트 중첩 상한 레벨
    pub soft_gate_level: SignalLevel,
    /// PARTIAL 결과 상한
    pub partial: SignalLevel,
    /// PROVISIONAL 결과 상한
    pub provisional: SignalLevel,
    /// MINIMAL 결과 상한
    pub minimal: SignalLevel,
}

impl Default for SignalCapConfig {
    fn default() -> Self {
        Self {
            soft_gate_trigger_limit: 2,
            soft_gate_level: SignalLevel::Reduced,
            partial: SignalLevel::Standard,
            provisional: SignalLevel::Standard,
            minimal: SignalLevel::Reduced,
        }
    }
}

impl SignalCapConfig {
    /// 데이터 품질별 상한 (FULL은 상한 없음).
    pub fn quality_cap(&self, quality: DataQuality) -> Option<SignalLevel> {
        match quality {
            DataQuality::Full => None,
            DataQuality::Partial => Some(self.partial),
            DataQuality::Provisional => Some(self.provisional),
            DataQuality::Minimal => Some(self.minimal),
        }
    }

    pub(crate) fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.soft_gate_trigger_limit == 0 {
            issues.push("soft_gate_trigger_limit must be >= 1".to_string());
        }
        if self.soft_gate_level > SignalLevel::Reduced {
            issues.push("soft_gate_level must be REDUCED or lower".to_string());
        }
        if self.partial > SignalLevel::Standard {
            issues.push("partial results cannot reach AGGRESSIVE".to_string());
        }
        if self.provisional > SignalLevel::Standard {
            issues.push("provisional results cannot reach AGGRESSIVE".to_string());
        }
        if self.minimal > SignalLevel::Standard {
            issues.push("minimal results cannot reach AGGRESSIVE".to_string());
        }
        issues
    }
}

/// 분류 입력.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierInput {
    pub composite_score: Decimal,
    pub blocked: bool,
    pub soft_gate_trigger_count: usize,
    pub data_quality: DataQuality,
}

/// 분류 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// 최종 신호
    pub signal: SignalLevel,
    /// 점수만으로 결정된 레벨
    pub score_level: SignalLevel,
    /// 실제로 레벨을 끌어내린 상한
    pub caps: Vec<SignalCap>,
}

/// 신호 분류기.
#[derive(Debug, Clone, Copy)]
pub struct SignalClassifier<'a> {
    thresholds: &'a SignalThresholds,
    caps: &'a SignalCapConfig,
}

impl<'a> SignalClassifier<'a> {
    pub fn new(thresholds: &'a SignalThresholds, caps: &'a SignalCapConfig) -> Self {
        Self { thresholds, caps }
    }

    /// 신호 분류.
    pub fn classify(&self, input: ClassifierInput) -> Classification {
        let score_level = self.thresholds.bucket(input.composite_score);

        // 1. 차단 (최우선)
        if input.blocked {
            return Classification {
                signal: SignalLevel::Avoid,
                score_level,
                caps: vec![SignalCap::HardGateBlock],
            };
        }

        let mut signal = score_level;
        let mut caps = Vec::new();

        // 2. 소프트 게이트 중첩
        if input.soft_gate_trigger_count >= self.caps.soft_gate_trigger_limit
            && signal > self.caps.soft_gate_level
        {
            signal = self.caps.soft_gate_level;
            caps.push(SignalCap::SoftGates {
                triggers: input.soft_gate_trigger_count,
                level: self.caps.soft_gate_level,
            });
        }

        // 3. 데이터 품질
        if let Some(level) = self.caps.quality_cap(input.data_quality) {
            if signal > level {
                signal = level;
                caps.push(SignalCap::DataQuality {
                    quality: input.data_quality,
                    level,
                });
            }
        }

        Classification {
            signal,
            score_level,
            caps,
        }
    }
}

// ================================================================================================
// 테스트
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(score: Decimal) -> ClassifierInput {
        ClassifierInput {
            composite_score: score,
            blocked: false,
            soft_gate_trigger_count: 0,
            data_quality: DataQuality::Full,
        }
    }

    fn classify(input: ClassifierInput) -> Classification {
        let thresholds = SignalThresholds::default();
        let caps = SignalCapConfig::default();
        SignalClassifier::new(&thresholds, &caps).classify(input)
    }

    #[test]
    fn test_score_buckets() {
        assert_eq!(classify(input(dec!(82))).signal, SignalLevel::Aggressive);
        assert_eq!(classify(input(dec!(80))).signal, SignalLevel::Aggressive);
        assert_eq!(classify(input(dec!(79.99))).signal, SignalLevel::Standard);
        assert_eq!(classify(input(dec!(50))).signal, SignalLevel::Reduced);
        assert_eq!(classify(input(dec!(35))).signal, SignalLevel::Monitor);
        assert_eq!(classify(input(dec!(0))).signal, SignalLevel::Avoid);
    }

    #[test]
    fn test_blocked_always_avoid() {
        let result = classify(ClassifierInput {
            blocked: true,
            ..input(dec!(100))
        });
        assert_eq!(result.signal, SignalLevel::Avoid);
        assert_eq!(result.score_level, SignalLevel::Aggressive);
        assert_eq!(result.caps, vec![SignalCap::HardGateBlock]);
    }

    #[test]
    fn test_two_soft_gates_cap_at_reduced() {
        let result = classify(ClassifierInput {
            soft_gate_trigger_count: 2,
            ..input(dec!(93))
        });
        assert_eq!(result.signal, SignalLevel::Reduced);
        assert_eq!(
            result.caps,
            vec![SignalCap::SoftGates {
                triggers: 2,
                level: SignalLevel::Reduced
            }]
        );

        // 이미 낮은 레벨이면 상한을 기록하지 않음
        let result = classify(ClassifierInput {
            soft_gate_trigger_count: 3,
            ..input(dec!(40))
        });
        assert_eq!(result.signal, SignalLevel::Monitor);
        assert!(result.caps.is_empty());
    }

    #[test]
    fn test_quality_caps() {
        let provisional = classify(ClassifierInput {
            data_quality: DataQuality::Provisional,
            ..input(dec!(95))
        });
        assert_eq!(provisional.signal, SignalLevel::Standard);

        let minimal = classify(ClassifierInput {
            data_quality: DataQuality::Minimal,
            ..input(dec!(95))
        });
        assert_eq!(minimal.signal, SignalLevel::Reduced);

        let partial_low = classify(ClassifierInput {
            data_quality: DataQuality::Partial,
            ..input(dec!(66))
        });
        assert_eq!(partial_low.signal, SignalLevel::Standard);
        assert!(partial_low.caps.is_empty());
    }

    #[test]
    fn test_threshold_issues() {
        assert!(SignalThresholds::default().issues().is_empty());

        let inverted = SignalThresholds {
            aggressive: 60.0,
            standard: 65.0,
            ..Default::default()
        };
        assert_eq!(inverted.issues().len(), 1);
    }

    #[test]
    fn test_cap_config_issues() {
        assert!(SignalCapConfig::default().issues().is_empty());

        let loose_soft = SignalCapConfig {
            soft_gate_level: SignalLevel::Aggressive,
            ..Default::default()
        };
        assert_eq!(
            loose_soft.issues(),
            vec!["soft_gate_level must be REDUCED or lower".to_string()]
        );

        let standard_soft = SignalCapConfig {
            soft_gate_level: SignalLevel::Standard,
            ..Default::default()
        };
        assert_eq!(standard_soft.issues().len(), 1);

        let loose_partial = SignalCapConfig {
            partial: SignalLevel::Aggressive,
            ..Default::default()
        };
        assert_eq!(
            loose_partial.issues(),
            vec!["partial results cannot reach AGGRESSIVE".to_string()]
        );

        // 더 엄격한 상한은 허용
        let strict = SignalCapConfig {
            soft_gate_level: SignalLevel::Monitor,
            partial: SignalLevel::Reduced,
            ..Default::default()
        };
        assert!(strict.issues().is_empty());
    }
}
