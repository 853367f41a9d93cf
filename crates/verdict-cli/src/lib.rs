//! 종합 점수 엔진 CLI 도구.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 단일 후보 평가 (`evaluate`)
//! - 스냅샷 기반 배치 평가 (`batch`)
//! - 설정 검증 및 기본 프리셋 출력 (`validate-config`, `dump-config`)

pub mod commands;
