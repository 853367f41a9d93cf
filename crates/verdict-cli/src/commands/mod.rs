//! CLI 명령어 구현 모듈.

pub mod batch;
pub mod config;
pub mod evaluate;
pub mod shared;
