//! 엔진 설정.
//!
//! 루브릭, 지표 스키마, 게이트, 엣지, 신호 임계값, 사이징, 배치 설정을 하나로 묶습니다.
//! 수치 임계값은 엔진 로직이 아니라 설정입니다. 기본값은 [`presets::trend_growth`] 프리셋입니다.
//!
//! # 로드 순서
//!
//! 1. 프리셋 기본값 (`#[serde(default)]`)
//! 2. 설정 파일 (TOML/JSON)
//! 3. 환경 변수 (`VERDICT_` 접두사, `__` 구분자, 예: `VERDICT_THRESHOLDS__AGGRESSIVE=85`)
//!
//! 검증은 시작 시점에 한 번만 수행하며, 후보 평가 중에는 설정 에러가 발생하지 않습니다.
//!
//! [`presets::trend_growth`]: crate::presets::trend_growth

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use verdict_core::{AnalysisDepth, BestOfPick, IndicatorKind, IndicatorSchema, VerdictError};

use crate::classifier::{SignalCapConfig, SignalThresholds};
use crate::edges::EdgeSpec;
use crate::gates::{GateSpec, SoftGateSpec};
use crate::position_sizing::SizingConfig;
use crate::predicate::Predicate;
use crate::presets;
use crate::rubric::Rubric;

/// 배점 합계 허용 오차.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// 지표가 아닌 내장 best-of 지표.
pub const BUILTIN_METRICS: [&str; 2] = ["composite_score", "edge_count"];

// ================================================================================================
// 배치 설정
// ================================================================================================

/// compare 모드 best-of 필드 정의.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestOfSpec {
    /// 지표 이름 (내장 지표 또는 수치 지표)
    pub metric: String,
    /// 선택 방향
    pub pick: BestOfPick,
}

impl BestOfSpec {
    pub fn max(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            pick: BestOfPick::Max,
        }
    }

    pub fn min(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            pick: BestOfPick::Min,
        }
    }
}

/// 배치 오케스트레이터 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// 동시 수집 후보 수 (기본값: 8)
    pub parallelism: usize,
    /// 후보별 수집 타임아웃 (기본값: 5000ms)
    pub collector_timeout_ms: u64,
    /// screen 모드 상세 재평가 후보 수 (기본값: 5)
    pub screen_top_n: usize,
    /// compare 모드 best-of 필드
    pub best_of: Vec<BestOfSpec>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            parallelism: 8,
            collector_timeout_ms: 5_000,
            screen_top_n: 5,
            best_of: vec![
                BestOfSpec::max("composite_score"),
                BestOfSpec::max("rs_percentile"),
                BestOfSpec::min("extension_pct"),
            ],
        }
    }
}

// ================================================================================================
// 엔진 설정
// ================================================================================================

/// 엔진 전체 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 프리셋 이름
    pub name: String,
    /// 지표 스키마
    pub schema: IndicatorSchema,
    /// 점수 루브릭
    pub rubric: Rubric,
    /// 하드 게이트
    pub hard_gates: Vec<GateSpec>,
    /// 소프트 게이트
    pub soft_gates: Vec<SoftGateSpec>,
    /// 엣지
    pub edges: Vec<EdgeSpec>,
    /// 신호 임계값
    pub thresholds: SignalThresholds,
    /// 신호 상한
    pub signal_caps: SignalCapConfig,
    /// 포지션 사이징
    pub sizing: SizingConfig,
    /// 배치 설정
    pub batch: BatchSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        presets::trend_growth()
    }
}

/// 분석 깊이별 필요 지표 조회 테이블.
///
/// 수집기에 요청과 함께 전달됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRouting {
    pub full: Vec<String>,
    pub provisional: Vec<String>,
}

impl InputRouting {
    pub fn for_depth(&self, depth: AnalysisDepth) -> &[String] {
        match depth {
            AnalysisDepth::Full => &self.full,
            AnalysisDepth::Provisional => &self.provisional,
        }
    }
}

impl EngineConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigValidationError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("VERDICT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 미적용).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigValidationError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// 설정 검증. 발견된 모든 문제를 보고합니다.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut issues = self.issues();
        match issues.len() {
            0 => Ok(()),
            1 => Err(issues.remove(0)),
            _ => Err(ConfigValidationError::Multiple(issues)),
        }
    }

    /// 발견된 모든 설정 문제.
    pub fn issues(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        self.check_rubric(&mut issues);
        self.check_predicates(&mut issues);
        self.check_ids(&mut issues);

        for gate in &self.soft_gates {
            if !gate.penalty.is_finite() || gate.penalty <= 0.0 {
                issues.push(ConfigValidationError::InvalidValue(format!(
                    "soft gate '{}' penalty must be > 0",
                    gate.id
                )));
            }
        }

        for metric in &self.batch.best_of {
            if !BUILTIN_METRICS.contains(&metric.metric.as_str()) {
                self.check_indicator(
                    &metric.metric,
                    IndicatorKind::Number,
                    "batch.best_of",
                    &mut issues,
                );
            }
        }

        let value_issues = self
            .thresholds
            .issues()
            .into_iter()
            .chain(self.signal_caps.issues())
            .chain(self.sizing.issues());
        issues.extend(value_issues.map(ConfigValidationError::InvalidValue));

        if self.batch.parallelism == 0 {
            issues.push(ConfigValidationError::InvalidValue(
                "batch.parallelism must be >= 1".to_string(),
            ));
        }
        if self.batch.collector_timeout_ms == 0 {
            issues.push(ConfigValidationError::InvalidValue(
                "batch.collector_timeout_ms must be > 0".to_string(),
            ));
        }

        issues
    }

    fn check_rubric(&self, issues: &mut Vec<ConfigValidationError>) {
        if self.rubric.components.is_empty() {
            issues.push(ConfigValidationError::InvalidValue(
                "rubric has no components".to_string(),
            ));
            return;
        }

        let total = self.rubric.total_weight();
        if (total - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            issues.push(ConfigValidationError::WeightSum { total });
        }

        let mut names = HashSet::new();
        for component in &self.rubric.components {
            if !names.insert(component.name.as_str()) {
                issues.push(ConfigValidationError::DuplicateId {
                    id: component.name.clone(),
                    section: "rubric".to_string(),
                });
            }
            if !component.weight_max.is_finite() || component.weight_max <= 0.0 {
                issues.push(ConfigValidationError::InvalidValue(format!(
                    "component '{}' weight_max must be > 0",
                    component.name
                )));
            }
            if component.terms.is_empty() {
                issues.push(ConfigValidationError::InvalidValue(format!(
                    "component '{}' has no terms",
                    component.name
                )));
            }

            let location = format!("rubric.{}", component.name);
            for term in &component.terms {
                self.check_indicator(term.input(), term.expected_kind(), &location, issues);
                issues.extend(
                    term.shape_issues()
                        .into_iter()
                        .map(|msg| ConfigValidationError::InvalidValue(format!("{}: {}", location, msg))),
                );
            }
        }
    }

    fn check_predicates(&self, issues: &mut Vec<ConfigValidationError>) {
        let predicates = self
            .hard_gates
            .iter()
            .map(|g| (format!("hard_gates.{}", g.id), &g.when))
            .chain(
                self.soft_gates
                    .iter()
                    .map(|g| (format!("soft_gates.{}", g.id), &g.when)),
            )
            .chain(self.edges.iter().map(|e| (format!("edges.{}", e.id), &e.when)));

        for (location, predicate) in predicates {
            self.check_predicate(&location, predicate, issues);
        }
    }

    fn check_predicate(
        &self,
        location: &str,
        predicate: &Predicate,
        issues: &mut Vec<ConfigValidationError>,
    ) {
        for (input, kind) in predicate.requirements() {
            self.check_indicator(input, kind, location, issues);
        }
        for component in predicate.component_refs() {
            if self.rubric.component(component).is_none() {
                issues.push(ConfigValidationError::UnknownComponent {
                    component: component.to_string(),
                    location: location.to_string(),
                });
            }
        }
        issues.extend(
            predicate
                .shape_issues()
                .into_iter()
                .map(|msg| ConfigValidationError::InvalidValue(format!("{}: {}", location, msg))),
        );
    }

    fn check_indicator(
        &self,
        indicator: &str,
        expected: IndicatorKind,
        location: &str,
        issues: &mut Vec<ConfigValidationError>,
    ) {
        match self.schema.kind_of(indicator) {
            None => issues.push(ConfigValidationError::UndefinedIndicator {
                indicator: indicator.to_string(),
                location: location.to_string(),
            }),
            Some(declared) if declared != expected => {
                issues.push(ConfigValidationError::KindMismatch {
                    indicator: indicator.to_string(),
                    location: location.to_string(),
                    expected,
                    declared,
                })
            }
            Some(_) => {}
        }
    }

    fn check_ids(&self, issues: &mut Vec<ConfigValidationError>) {
        let sections: [(&str, Vec<&str>); 3] = [
            (
                "hard_gates",
                self.hard_gates.iter().map(|g| g.id.as_str()).collect(),
            ),
            (
                "soft_gates",
                self.soft_gates.iter().map(|g| g.id.as_str()).collect(),
            ),
            ("edges", self.edges.iter().map(|e| e.id.as_str()).collect()),
        ];

        for (section, ids) in sections {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    issues.push(ConfigValidationError::DuplicateId {
                        id: id.to_string(),
                        section: section.to_string(),
                    });
                }
            }
        }
    }

    /// 분석 깊이별 필요 지표 테이블.
    ///
    /// 루브릭 입력(깊이별)과 게이트/엣지/best-of 입력(항상)을 합칩니다.
    pub fn input_routing(&self) -> InputRouting {
        let best_of_inputs = self
            .batch
            .best_of
            .iter()
            .map(|spec| spec.metric.as_str())
            .filter(|metric| !BUILTIN_METRICS.contains(metric))
            .map(str::to_string);

        let shared_inputs: BTreeSet<String> = self
            .hard_gates
            .iter()
            .map(|g| &g.when)
            .chain(self.soft_gates.iter().map(|g| &g.when))
            .chain(self.edges.iter().map(|e| &e.when))
            .flat_map(|p| p.requirements().into_iter().map(|(name, _)| name.to_string()))
            .chain(best_of_inputs)
            .collect();

        let table = |depth| -> Vec<String> {
            let mut inputs = self.rubric.required_inputs(depth);
            inputs.extend(shared_inputs.iter().cloned());
            inputs.into_iter().collect()
        };

        InputRouting {
            full: table(AnalysisDepth::Full),
            provisional: table(AnalysisDepth::Provisional),
        }
    }
}

// ================================================================================================
// 검증 에러
// ================================================================================================

/// 설정 검증 오류.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("루브릭 배점 합계가 100이 아닙니다: {total}")]
    WeightSum { total: f64 },

    #[error("선언되지 않은 지표 참조: {indicator} ({location})")]
    UndefinedIndicator { indicator: String, location: String },

    #[error("지표 타입 불일치: {indicator} ({location}) - 기대 {expected}, 선언 {declared}")]
    KindMismatch {
        indicator: String,
        location: String,
        expected: IndicatorKind,
        declared: IndicatorKind,
    },

    #[error("알 수 없는 컴포넌트 참조: {component} ({location})")]
    UnknownComponent { component: String, location: String },

    #[error("중복 ID: {id} ({section})")]
    DuplicateId { id: String, section: String },

    #[error("잘못된 설정 값: {0}")]
    InvalidValue(String),

    #[error("설정 로드 실패: {0}")]
    Load(String),

    #[error("설정 검증 실패 ({}건): {}", .0.len(), join_issues(.0))]
    Multiple(Vec<ConfigValidationError>),
}

fn join_issues(issues: &[ConfigValidationError]) -> String {
    issues
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigValidationError {
    /// 개별 문제 목록으로 펼치기.
    pub fn flatten(&self) -> Vec<&ConfigValidationError> {
        match self {
            ConfigValidationError::Multiple(issues) => issues.iter().collect(),
            other => vec![other],
        }
    }
}

impl From<config::ConfigError> for ConfigValidationError {
    fn from(err: config::ConfigError) -> Self {
        ConfigValidationError::Load(err.to_string())
    }
}

impl From<ConfigValidationError> for VerdictError {
    fn from(err: ConfigValidationError) -> Self {
        VerdictError::Config(err.to_string())
    }
}

// ================================================================================================
// 테스트
// ================================================================================================
