//! 종합 점수/게이트 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 선언형 루브릭 기반 컴포넌트 점수 계산
//! - 하드 게이트 (차단) / 소프트 게이트 (감점) 평가
//! - 종합 점수 집계와 신호 레벨 분류
//! - 엣지 기반 포지션 크기 추천
//! - 데이터 품질 추적
//! - 배치 오케스트레이터 (analyze / watchlist / compare / screen)
//!
//! # 예시
//!
//! ```rust,ignore
//! use verdict_engine::{EvaluationContext, ScoringEngine};
//! use rust_decimal_macros::dec;
//!
//! let engine = ScoringEngine::with_defaults()?;
//! let result = engine.evaluate(&candidate, &EvaluationContext::new(dec!(20)));
//! println!("{}", verdict_engine::render::render_result(&result));
//! ```

pub mod batch;
pub mod classifier;
pub mod collector;
pub mod composite;
pub mod config;
pub mod edges;
pub mod gates;
pub mod pipeline;
pub mod position_sizing;
pub mod predicate;
pub mod presets;
pub mod quality;
pub mod render;
pub mod rubric;

pub use batch::{dedupe_symbols, BatchError, BatchOrchestrator, BatchRequest};
pub use classifier::{
    Classification, ClassifierInput, SignalCapConfig, SignalClassifier, SignalThresholds,
};
pub use collector::{CollectRequest, CollectorError, SignalCollector, Snapshot, StaticCollector};
pub use composite::{aggregate, CompositeScore};
pub use self::config::{BatchSettings, BestOfSpec, ConfigValidationError, EngineConfig, InputRouting};
pub use edges::EdgeSpec;
pub use gates::{
    GateSpec, HardGateEvaluator, HardGateOutcome, SoftGateOutcome, SoftGatePenalizer, SoftGateSpec,
};
pub use pipeline::{EvaluationContext, ScoringEngine};
pub use position_sizing::{ExperienceTier, PositionSizer, SizingConfig, StageCaps};
pub use predicate::{EvalContext, Predicate};
pub use quality::DataQualityTracker;
pub use rubric::{ComponentSpec, Rubric, Term, TermOutcome, Tier};
