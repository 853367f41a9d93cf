//! 종합 점수 집계.
//!
//! `composite_score = clamp(sum(component_scores) - sum(soft_penalties), 0, 100)`
//!
//! 산출 불가 컴포넌트는 합계에서 빠지며, 남은 컴포넌트 기준으로 재조정하지 않습니다.
//! 대신 `max_attainable_score`로 산출 가능한 배점 합계를 함께 보고합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use verdict_core::ComponentScore;

/// 종합 점수 상한.
pub const MAX_COMPOSITE: Decimal = dec!(100);

/// f64 → Decimal 변환 (소수 `dp`자리 반올림, 변환 불가 시 0).
pub fn to_decimal(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(dp)
        .normalize()
}

/// 집계 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// 감점 전 컴포넌트 합계
    pub raw_total: Decimal,
    /// 소프트 게이트 감점 합계
    pub penalty: Decimal,
    /// 최종 종합 점수 (0 ~ 100)
    pub composite_score: Decimal,
    /// 산출 가능한 컴포넌트의 배점 합계
    pub max_attainable: Decimal,
}

/// 컴포넌트 점수와 감점을 종합 점수로 집계.
pub fn aggregate(components: &[ComponentScore], soft_penalty: Decimal) -> CompositeScore {
    let raw_total: Decimal = components.iter().filter_map(|c| c.points()).sum();
    let max_attainable: Decimal = components
        .iter()
        .filter(|c| c.is_scorable())
        .map(|c| c.weight_max)
        .sum();

    let composite_score = (raw_total - soft_penalty)
        .max(Decimal::ZERO)
        .min(MAX_COMPOSITE)
        .normalize();

    CompositeScore {
        raw_total,
        penalty: soft_penalty,
        composite_score,
        max_attainable,
    }
}

// ================================================================================================
// 테스트
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{ScoreValue, SkipReason};

    fn scored(name: &str, weight: Decimal, points: Decimal) -> ComponentScore {
        ComponentScore {
            name: name.to_string(),
            raw_inputs_used: vec![],
            weight_max: weight,
            value: ScoreValue::Scored { points },
            skipped_terms: vec![],
        }
    }

    fn unscorable(name: &str, weight: Decimal) -> ComponentScore {
        ComponentScore {
            name: name.to_string(),
            raw_inputs_used: vec![],
            weight_max: weight,
            value: ScoreValue::Unscorable {
                cause: SkipReason::MissingInput {
                    inputs: vec!["margin_direction".to_string()],
                },
            },
            skipped_terms: vec![],
        }
    }

    #[test]
    fn test_aggregate_with_penalty() {
        let components = vec![
            scored("trend_stage", dec!(30), dec!(30)),
            scored("growth", dec!(20), dec!(20)),
        ];
        let result = aggregate(&components, dec!(8));

        assert_eq!(result.raw_total, dec!(50));
        assert_eq!(result.composite_score, dec!(42));
        assert_eq!(result.max_attainable, dec!(50));
    }

    #[test]
    fn test_aggregate_clamps_at_zero() {
        let components = vec![scored("setup", dec!(10), dec!(2))];
        let result = aggregate(&components, dec!(13));

        assert_eq!(result.composite_score, Decimal::ZERO);
    }

    #[test]
    fn test_unscorable_excluded_without_rescaling() {
        let components = vec![
            scored("trend_stage", dec!(30), dec!(30)),
            unscorable("fundamentals", dec!(10)),
        ];
        let result = aggregate(&components, Decimal::ZERO);

        assert_eq!(result.composite_score, dec!(30));
        assert_eq!(result.max_attainable, dec!(30));
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(17.5, 4), dec!(17.5));
        assert_eq!(to_decimal(1.0 / 3.0, 2), dec!(0.33));
        assert_eq!(to_decimal(f64::NAN, 2), Decimal::ZERO);
    }
}
