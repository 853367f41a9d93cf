//! 기본 제공 설정 프리셋.
//!
//! `trend_growth`: 추세 템플릿 + 성장 가속 + 거래량/기관 확인 + 베이스 품질 + 재무 건전성.
//! 배점 30/20/15/15/10/10.

use std::collections::BTreeMap;

use verdict_core::{IndicatorKind, IndicatorSchema, MARKET_REGIME_KEY};

use crate::classifier::{SignalCapConfig, SignalThresholds};
use crate::config::{BatchSettings, EngineConfig};
use crate::edges::EdgeSpec;
use crate::gates::{GateSpec, SoftGateSpec};
use crate::position_sizing::SizingConfig;
use crate::predicate::Predicate;
use crate::rubric::{ComponentSpec, Rubric, Term, Tier};

/// 기본 프리셋 이름.
pub const TREND_GROWTH: &str = "trend_growth";

fn flag(input: &str, when_true: f64, when_false: f64) -> Term {
    Term::Flag {
        input: input.to_string(),
        when_true,
        when_false,
        optional: false,
    }
}

fn category(input: &str, points: &[(&str, f64)]) -> Term {
    Term::Category {
        input: input.to_string(),
        points: points
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
        otherwise: 0.0,
        optional: false,
    }
}

fn tiers(pairs: &[(f64, f64)]) -> Vec<Tier> {
    pairs.iter().map(|(at, pts)| Tier::new(*at, *pts)).collect()
}

/// 지표 스키마.
pub fn trend_growth_schema() -> IndicatorSchema {
    IndicatorSchema::new()
        .declare("trend_pass_count", IndicatorKind::Number)
        .declare("stage", IndicatorKind::Category)
        .declare("growth_rates", IndicatorKind::Series)
        .declare("accumulation_dominant", IndicatorKind::Flag)
        .declare("pocket_pivot", IndicatorKind::Flag)
        .declare("volume_dry_up", IndicatorKind::Flag)
        .declare("distribution_cluster", IndicatorKind::Flag)
        .declare("weak_construction", IndicatorKind::Flag)
        .declare("institutional_footprint", IndicatorKind::Flag)
        .declare("rs_percentile", IndicatorKind::Number)
        .declare("base_quality", IndicatorKind::Category)
        .declare("pivot_distance_pct", IndicatorKind::Number)
        .declare("extension_pct", IndicatorKind::Number)
        .declare("days_to_earnings", IndicatorKind::Number)
        .declare("dilution", IndicatorKind::Flag)
        .declare("margin_direction", IndicatorKind::Category)
        .declare(MARKET_REGIME_KEY, IndicatorKind::Category)
}

/// 점수 루브릭 (30/20/15/15/10/10).
pub fn trend_growth_rubric() -> Rubric {
    Rubric::new(vec![
        ComponentSpec::new("trend_stage", 30.0)
            .term(Term::Linear {
                input: "trend_pass_count".to_string(),
                from: 0.0,
                to: 8.0,
                points: 20.0,
                optional: false,
            })
            .term(category(
                "stage",
                &[
                    ("advancing", 10.0),
                    ("basing", 4.0),
                    ("topping", 1.0),
                    ("declining", 0.0),
                ],
            )),
        ComponentSpec::new("growth", 20.0)
            .expensive("earnings_history")
            .term(Term::SeriesLatest {
                input: "growth_rates".to_string(),
                tiers: tiers(&[(40.0, 12.0), (25.0, 9.0), (10.0, 5.0), (1.0, 2.0)]),
                below: 0.0,
                optional: false,
            })
            .term(
                Term::SeriesAcceleration {
                    input: "growth_rates".to_string(),
                    lookback: 2,
                    per_step: 4.0,
                    optional: false,
                }
                .optional(),
            ),
        ComponentSpec::new("volume", 15.0)
            .term(flag("accumulation_dominant", 7.0, 0.0))
            .term(flag("pocket_pivot", 4.0, 0.0).optional())
            .term(flag("volume_dry_up", 4.0, 0.0).optional())
            .term(flag("distribution_cluster", -5.0, 0.0).optional()),
        ComponentSpec::new("institutional", 15.0)
            .term(flag("institutional_footprint", 7.0, 0.0))
            .term(Term::Tiers {
                input: "rs_percentile".to_string(),
                tiers: tiers(&[(90.0, 8.0), (80.0, 6.0), (70.0, 4.0), (50.0, 2.0)]),
                below: 0.0,
                optional: false,
            }),
        ComponentSpec::new("setup", 10.0)
            .expensive("base_pattern")
            .term(category(
                "base_quality",
                &[
                    ("textbook", 7.0),
                    ("sound", 5.0),
                    ("loose", 2.0),
                    ("faulty", 0.0),
                ],
            ))
            .term(
                Term::Linear {
                    input: "pivot_distance_pct".to_string(),
                    from: 10.0,
                    to: 0.0,
                    points: 3.0,
                    optional: false,
                }
                .optional(),
            ),
        ComponentSpec::new("fundamentals", 10.0)
            .term(category(
                "margin_direction",
                &[("expanding", 5.0), ("stable", 3.0), ("contracting", 0.0)],
            ))
            .term(flag("dilution", 0.0, 5.0)),
    ])
}

/// 하드 게이트.
pub fn trend_growth_hard_gates() -> Vec<GateSpec> {
    vec![
        GateSpec::new(
            "trend_template",
            "trend template: {trend_pass_count}/8 criteria pass (min 5)",
            Predicate::below("trend_pass_count", 5.0),
        ),
        GateSpec::new(
            "lifecycle_stage",
            "lifecycle stage is {stage}",
            Predicate::in_set("stage", &["topping", "declining"]),
        ),
        GateSpec::new(
            "no_institutional_footprint",
            "no institutional footprint detected",
            Predicate::is_false("institutional_footprint"),
        ),
        GateSpec::new(
            "distribution_on_weak_construction",
            "distribution cluster on weak price construction",
            Predicate::all(vec![
                Predicate::is_true("distribution_cluster"),
                Predicate::is_true("weak_construction"),
            ]),
        ),
    ]
}

/// 소프트 게이트.
pub fn trend_growth_soft_gates() -> Vec<SoftGateSpec> {
    vec![
        SoftGateSpec::new(
            "extreme_extension",
            "extended {extension_pct}% above the 50-day line",
            3.0,
            Predicate::above("extension_pct", 25.0),
        ),
        SoftGateSpec::new(
            "weak_construction",
            "weak price construction without a full distribution cluster",
            5.0,
            Predicate::all(vec![
                Predicate::is_true("weak_construction"),
                Predicate::is_false("distribution_cluster"),
            ]),
        ),
        SoftGateSpec::new(
            "earnings_imminent",
            "earnings in {days_to_earnings} days",
            4.0,
            Predicate::all(vec![
                Predicate::at_least("days_to_earnings", 0.0),
                Predicate::below("days_to_earnings", 5.0),
            ]),
        ),
        SoftGateSpec::new(
            "share_dilution",
            "share dilution detected",
            3.0,
            Predicate::is_true("dilution"),
        ),
        SoftGateSpec::new(
            "weak_market",
            "market regime is {market_regime}",
            5.0,
            Predicate::in_set(MARKET_REGIME_KEY, &["correction", "downtrend"]),
        ),
    ]
}

/// 엣지.
pub fn trend_growth_edges() -> Vec<EdgeSpec> {
    vec![
        EdgeSpec::new("pocket_pivot", Predicate::is_true("pocket_pivot")),
        EdgeSpec::new("volume_dry_up", Predicate::is_true("volume_dry_up")),
        EdgeSpec::new("accumulation", Predicate::is_true("accumulation_dominant")),
        EdgeSpec::new("rs_leader", Predicate::at_least("rs_percentile", 90.0)),
        EdgeSpec::new(
            "growth_acceleration",
            Predicate::series_rising("growth_rates", 2),
        ),
        EdgeSpec::new(
            "margin_expansion",
            Predicate::in_set("margin_direction", &["expanding"]),
        ),
    ]
}

/// `trend_growth` 프리셋.
pub fn trend_growth() -> EngineConfig {
    EngineConfig {
        name: TREND_GROWTH.to_string(),
        schema: trend_growth_schema(),
        rubric: trend_growth_rubric(),
        hard_gates: trend_growth_hard_gates(),
        soft_gates: trend_growth_soft_gates(),
        edges: trend_growth_edges(),
        thresholds: SignalThresholds::default(),
        signal_caps: SignalCapConfig::default(),
        sizing: SizingConfig::default(),
        batch: BatchSettings::default(),
    }
}

/// 이름으로 프리셋 조회.
pub fn by_name(name: &str) -> Option<EngineConfig> {
    match name {
        TREND_GROWTH => Some(trend_growth()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_100() {
        let weights: Vec<f64> = trend_growth_rubric()
            .components
            .iter()
            .map(|c| c.weight_max)
            .collect();
        assert_eq!(weights, vec![30.0, 20.0, 15.0, 15.0, 10.0, 10.0]);
    }

    #[test]
    fn test_by_name() {
        assert!(by_name("trend_growth").is_some());
        assert!(by_name("unknown").is_none());
    }

    #[test]
    fn test_toml_roundtrip_preserves_preset() {
        let preset = trend_growth();
        let text = toml::to_string(&preset).unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();

        assert_eq!(parsed, preset);
    }
}
