//! 엣지 기반 포지션 크기 추천.
//!
//! `final_pct = min(base_pct + edge_bonus_pct * min(edge_count, max_edges), stage_cap_pct)`
//!
//! - AVOID/MONITOR 신호는 엣지 개수와 무관하게 0%
//! - REDUCED 신호는 `reduced_multiplier` 배수 적용
//! - 경험 단계 상한(`stage_cap_pct`)과 100%를 넘지 않음

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use verdict_core::{PositionRecommendation, SignalLevel, SizingConstraint};

use crate::composite::to_decimal;

/// 호출자 경험 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl fmt::Display for ExperienceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExperienceTier::Beginner => "beginner",
            ExperienceTier::Intermediate => "intermediate",
            ExperienceTier::Advanced => "advanced",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ExperienceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(format!(
                "Unknown experience tier: {}. Supported: beginner, intermediate, advanced",
                s
            )),
        }
    }
}

/// 경험 단계별 최대 비중 (%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageCaps {
    pub beginner: f64,
    pub intermediate: f64,
    pub advanced: f64,
}

impl Default for StageCaps {
    fn default() -> Self {
        Self {
            beginner: 10.0,
            intermediate: 20.0,
            advanced: 25.0,
        }
    }
}

impl StageCaps {
    /// 단계별 상한.
    pub fn cap_for(&self, tier: ExperienceTier) -> f64 {
        match tier {
            ExperienceTier::Beginner => self.beginner,
            ExperienceTier::Intermediate => self.intermediate,
            ExperienceTier::Advanced => self.advanced,
        }
    }
}

/// 포지션 사이징 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// 기본 비중 (기본값: 10%)
    pub base_pct: f64,
    /// 엣지당 보너스 (기본값: 2.5%)
    pub edge_bonus_pct: f64,
    /// 보너스를 받는 최대 엣지 수 (기본값: 4)
    pub max_edges: usize,
    /// REDUCED 신호 배수 (기본값: 0.5)
    pub reduced_multiplier: f64,
    /// 경험 단계별 상한
    pub stage_caps: StageCaps,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            base_pct: 10.0,
            edge_bonus_pct: 2.5,
            max_edges: 4,
            reduced_multiplier: 0.5,
            stage_caps: StageCaps::default(),
        }
    }
}

impl SizingConfig {
    pub(crate) fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.base_pct.is_finite() || self.base_pct < 0.0 {
            issues.push("base_pct must be >= 0".to_string());
        }
        if !self.edge_bonus_pct.is_finite() || self.edge_bonus_pct < 0.0 {
            issues.push("edge_bonus_pct must be >= 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.reduced_multiplier) {
            issues.push("reduced_multiplier must be between 0 and 1".to_string());
        }
        for (name, cap) in [
            ("beginner", self.stage_caps.beginner),
            ("intermediate", self.stage_caps.intermediate),
            ("advanced", self.stage_caps.advanced),
        ] {
            if !(cap > 0.0 && cap <= 100.0) {
                issues.push(format!("stage cap '{}' must be in (0, 100]", name));
            }
        }
        issues
    }
}

/// 포지션 사이저.
#[derive(Debug, Clone, Copy)]
pub struct PositionSizer<'a> {
    config: &'a SizingConfig,
}

impl<'a> PositionSizer<'a> {
    pub fn new(config: &'a SizingConfig) -> Self {
        Self { config }
    }

    /// 포지션 크기 추천.
    ///
    /// # 인자
    ///
    /// * `signal` - 최종 신호 레벨
    /// * `edge_count` - 충족된 엣지 수
    /// * `stage_cap_pct` - 호출자 경험 단계 상한 (%)
    pub fn recommend(
        &self,
        signal: SignalLevel,
        edge_count: usize,
        stage_cap_pct: Decimal,
    ) -> PositionRecommendation {
        let base_pct = to_decimal(self.config.base_pct, 4);
        let counted = edge_count.min(self.config.max_edges);
        let edge_bonus_pct = to_decimal(self.config.edge_bonus_pct, 4) * Decimal::from(counted);
        let stage_cap_pct = stage_cap_pct.max(Decimal::ZERO).min(dec!(100));
        let raw = base_pct + edge_bonus_pct;

        let (sized, mut capped_by) = match signal {
            SignalLevel::Avoid | SignalLevel::Monitor => {
                return PositionRecommendation {
                    base_pct,
                    edge_bonus_pct,
                    final_pct: Decimal::ZERO,
                    stage_cap_pct,
                    capped_by: Some(SizingConstraint::SignalOverride),
                };
            }
            SignalLevel::Reduced => {
                let multiplier = to_decimal(self.config.reduced_multiplier, 4);
                let reduced = (raw * multiplier).round_dp(4);
                let constraint = (reduced < raw).then_some(SizingConstraint::SignalReduced);
                (reduced, constraint)
            }
            SignalLevel::Standard | SignalLevel::Aggressive => (raw, None),
        };

        let final_pct = if sized > stage_cap_pct {
            capped_by = Some(SizingConstraint::StageCap);
            stage_cap_pct
        } else {
            sized
        };

        PositionRecommendation {
            base_pct,
            edge_bonus_pct,
            final_pct: final_pct.normalize(),
            stage_cap_pct,
            capped_by,
        }
    }
}

// ================================================================================================
// 테스트
// ================================================================================================
