//! 데이터 품질 분류.
//!
//! 후보마다 어떤 하위 분석이 계산되었고 어떤 분석이 생략되었는지를 기록합니다.
//! 품질이 낮은 결과는 반드시 표시되어야 하며 FULL과 같은 신뢰도로 제시되면 안 됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 분석 깊이.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    /// 모든 하위 분석 수행
    #[default]
    Full,
    /// 배치 1차 통과용: 비용이 큰 하위 분석 생략
    Provisional,
}

/// 데이터 품질 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataQuality {
    /// 모든 분석 수행
    #[default]
    Full,
    /// 일부 생략 - 방향성 신호만 유효
    Partial,
    /// 배치 모드에서 속도를 위해 고비용 분석을 의도적으로 생략
    Provisional,
    /// 특정 컴포넌트를 평가할 이력조차 부족
    Minimal,
}

impl DataQuality {
    /// 심각도 (높을수록 나쁨).
    ///
    /// MINIMAL > PROVISIONAL > PARTIAL > FULL
    pub fn severity(self) -> u8 {
        match self {
            DataQuality::Full => 0,
            DataQuality::Partial => 1,
            DataQuality::Provisional => 2,
            DataQuality::Minimal => 3,
        }
    }

    /// 둘 중 더 심각한 품질.
    pub fn worst(self, other: DataQuality) -> DataQuality {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// 품질 저하 여부 (FULL이 아님).
    pub fn is_degraded(self) -> bool {
        self != DataQuality::Full
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataQuality::Full => "FULL",
            DataQuality::Partial => "PARTIAL",
            DataQuality::Provisional => "PROVISIONAL",
            DataQuality::Minimal => "MINIMAL",
        };
        write!(f, "{}", s)
    }
}

/// 분석이 생략되었거나 점수를 매길 수 없는 사유.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// 필수 지표 누락
    MissingInput { inputs: Vec<String> },
    /// 이력 부족 (예: 분기 성장률 개수 부족)
    InsufficientHistory {
        input: String,
        required: usize,
        provided: usize,
    },
    /// 배치 1차 통과에서 속도를 위해 생략
    SkippedForSpeed,
    /// 수집기 하위 분석 실패
    CollectorFailed { message: String },
}

impl SkipReason {
    /// 이 사유가 유발하는 최소 품질 레벨.
    pub fn implied_quality(&self) -> DataQuality {
        match self {
            SkipReason::MissingInput { .. } | SkipReason::CollectorFailed { .. } => {
                DataQuality::Partial
            }
            SkipReason::SkippedForSpeed => DataQuality::Provisional,
            SkipReason::InsufficientHistory { .. } => DataQuality::Minimal,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingInput { inputs } => write!(f, "missing input: {}", inputs.join(", ")),
            SkipReason::InsufficientHistory {
                input,
                required,
                provided,
            } => write!(
                f,
                "insufficient history: {} ({} of {} required)",
                input, provided, required
            ),
            SkipReason::SkippedForSpeed => write!(f, "skipped for speed"),
            SkipReason::CollectorFailed { message } => write!(f, "collector failed: {}", message),
        }
    }
}

/// 생략된 하위 분석.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAnalysis {
    /// 하위 분석 이름 (컴포넌트 또는 게이트)
    pub name: String,
    /// 생략 사유
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// 후보별 데이터 품질 보고서.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataQualityReport {
    /// 품질 레벨
    pub level: DataQuality,
    /// 계산된 하위 분석
    pub available: Vec<String>,
    /// 생략된 하위 분석
    pub skipped: Vec<SkippedAnalysis>,
}

impl DataQualityReport {
    /// 생략된 분석 이름 목록.
    pub fn skipped_names(&self) -> Vec<&str> {
        self.skipped.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst() {
        assert_eq!(
            DataQuality::Full.worst(DataQuality::Partial),
            DataQuality::Partial
        );
        assert_eq!(
            DataQuality::Minimal.worst(DataQuality::Provisional),
            DataQuality::Minimal
        );
        assert_eq!(
            DataQuality::Provisional.worst(DataQuality::Partial),
            DataQuality::Provisional
        );
    }

    #[test]
    fn test_implied_quality() {
        assert_eq!(
            SkipReason::SkippedForSpeed.implied_quality(),
            DataQuality::Provisional
        );
        assert_eq!(
            SkipReason::InsufficientHistory {
                input: "growth_rates".to_string(),
                required: 1,
                provided: 0
            }
            .implied_quality(),
            DataQuality::Minimal
        );
    }

    #[test]
    fn test_skipped_analysis_json_shape() {
        let skipped = SkippedAnalysis {
            name: "growth".to_string(),
            reason: SkipReason::MissingInput {
                inputs: vec!["growth_rates".to_string()],
            },
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["name"], "growth");
        assert_eq!(json["reason"], "missing_input");
        assert_eq!(json["inputs"][0], "growth_rates");
    }
}
