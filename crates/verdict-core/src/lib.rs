//! # Verdict Core
//!
//! 종합 점수/게이트 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 후보 종목과 원시 지표 묶음
//! - 시장 전체 컨텍스트 (배치 단위 공유 입력)
//! - 신호 레벨과 데이터 품질 분류
//! - 평가 결과 레코드 (컴포넌트 점수, 게이트 결과, 포지션 추천, 배치 결과)
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;

pub use domain::*;
pub use error::*;
pub use logging::*;
