//! 시장 전체 컨텍스트.
//!
//! 후보와 무관하게 배치 전체에 공통으로 적용되는 입력입니다.
//! 배치당 한 번만 계산되어 모든 후보 평가에서 재사용됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::indicator::{IndicatorBag, IndicatorValue};

/// 시장 레짐 지표 이름.
pub const MARKET_REGIME_KEY: &str = "market_regime";

/// 시장 전체 추세 레짐.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    /// 강한 상승 추세 (신규 진입 우호적)
    StrongUptrend,
    /// 바닥 반등 시도
    BottomBounce,
    /// 박스권 / 중립
    #[default]
    Sideways,
    /// 상승 후 조정
    Correction,
    /// 하락 / 약세
    Downtrend,
}

impl MarketRegime {
    /// 지표 묶음에 들어가는 범주 문자열.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongUptrend => "strong_uptrend",
            Self::BottomBounce => "bottom_bounce",
            Self::Sideways => "sideways",
            Self::Correction => "correction",
            Self::Downtrend => "downtrend",
        }
    }

    /// 신규 진입 우호적 여부.
    pub fn is_entry_friendly(self) -> bool {
        matches!(self, Self::StrongUptrend | Self::BottomBounce)
    }

    /// 주의 필요 여부.
    pub fn needs_caution(self) -> bool {
        matches!(self, Self::Correction | Self::Downtrend)
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 배치 단위 시장 컨텍스트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// 기준 시각
    pub as_of: DateTime<Utc>,
    /// 시장 레짐
    pub regime: MarketRegime,
    /// 추가 시장 지표 (예: breadth)
    #[serde(default)]
    pub indicators: IndicatorBag,
}

impl MarketContext {
    /// 새 컨텍스트 생성.
    pub fn new(as_of: DateTime<Utc>, regime: MarketRegime) -> Self {
        Self {
            as_of,
            regime,
            indicators: IndicatorBag::new(),
        }
    }

    /// 후보 지표 뷰에 겹쳐질 지표 묶음으로 변환.
    ///
    /// 레짐은 `market_regime` 범주 지표로 노출됩니다.
    pub fn to_indicator_bag(&self) -> IndicatorBag {
        let mut bag = self.indicators.clone();
        bag.insert(
            MARKET_REGIME_KEY,
            IndicatorValue::Category(self.regime.as_str().to_string()),
        );
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_regime_flags() {
        assert!(MarketRegime::StrongUptrend.is_entry_friendly());
        assert!(!MarketRegime::Correction.is_entry_friendly());
        assert!(MarketRegime::Downtrend.needs_caution());
        assert!(!MarketRegime::Sideways.needs_caution());
    }

    #[test]
    fn test_context_bag_exposes_regime() {
        let as_of = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let mut context = MarketContext::new(as_of, MarketRegime::Correction);
        context.indicators.insert("breadth", IndicatorValue::Number(0.35));

        let bag = context.to_indicator_bag();
        assert_eq!(
            bag.get(MARKET_REGIME_KEY),
            Some(&IndicatorValue::Category("correction".to_string()))
        );
        assert_eq!(bag.get("breadth"), Some(&IndicatorValue::Number(0.35)));
    }

    #[test]
    fn test_regime_serde_roundtrip_names() {
        let json = serde_json::to_string(&MarketRegime::StrongUptrend).unwrap();
        assert_eq!(json, "\"strong_uptrend\"");
    }
}
