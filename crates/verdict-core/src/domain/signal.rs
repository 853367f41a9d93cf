//! SignalLevel - 후보의 이산 신호 레벨.
//!
//! 가장 보수적인 레벨부터 가장 공격적인 레벨까지 순서가 있는 5단계입니다.
//! `Ord` 순서는 `Avoid < Monitor < Reduced < Standard < Aggressive` 입니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 5단계 신호 레벨.
///
/// # 레벨 설명
///
/// - **Aggressive**: 적극 진입 - 최대 비중 허용
/// - **Standard**: 표준 진입
/// - **Reduced**: 축소 진입 - 리스크 요인 중첩 또는 점수 부족
/// - **Monitor**: 관찰 - 포지션 없음
/// - **Avoid**: 회피 - 하드 게이트 차단 또는 점수 미달
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLevel {
    Avoid,
    Monitor,
    Reduced,
    Standard,
    Aggressive,
}

impl SignalLevel {
    /// 가장 공격적인 레벨부터 나열.
    pub const DESCENDING: [SignalLevel; 5] = [
        SignalLevel::Aggressive,
        SignalLevel::Standard,
        SignalLevel::Reduced,
        SignalLevel::Monitor,
        SignalLevel::Avoid,
    ];

    /// 포지션 진입을 허용하는 레벨인지 여부.
    pub fn allows_position(self) -> bool {
        matches!(
            self,
            SignalLevel::Aggressive | SignalLevel::Standard | SignalLevel::Reduced
        )
    }

    /// 레벨 상한 적용 (둘 중 보수적인 쪽).
    pub fn capped_at(self, cap: SignalLevel) -> SignalLevel {
        self.min(cap)
    }

    /// 레벨의 아이콘 (텍스트 출력용).
    pub fn icon(self) -> &'static str {
        match self {
            SignalLevel::Aggressive => "🚀",
            SignalLevel::Standard => "✅",
            SignalLevel::Reduced => "⚠️",
            SignalLevel::Monitor => "👀",
            SignalLevel::Avoid => "⛔",
        }
    }
}

impl fmt::Display for SignalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalLevel::Aggressive => "AGGRESSIVE",
            SignalLevel::Standard => "STANDARD",
            SignalLevel::Reduced => "REDUCED",
            SignalLevel::Monitor => "MONITOR",
            SignalLevel::Avoid => "AVOID",
        };
        write!(f, "{}", s)
    }
}
