//! 명령어 공통 유틸리티.

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;

use verdict_engine::{ConfigValidationError, EngineConfig, ExperienceTier, ScoringEngine};

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(anyhow!("Invalid format: {}. Use: text, json", s)),
        }
    }
}

/// 검증 에러를 한 줄에 하나씩 나열.
pub fn describe_issues(err: &ConfigValidationError) -> String {
    err.flatten()
        .iter()
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 설정 파일 로드 (경로가 없으면 기본 프리셋).
pub fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("설정 로드 실패: {}", path))
        }
        None => Ok(EngineConfig::default()),
    }
}

/// 설정을 검증하고 엔진을 생성합니다.
pub fn load_engine(path: Option<&str>) -> Result<ScoringEngine> {
    let config = load_config(path)?;
    ScoringEngine::new(config)
        .map_err(|e| anyhow!("설정 검증 실패:\n{}", describe_issues(&e)))
}

/// 경험 단계 또는 직접 지정한 상한으로 stage cap 결정.
///
/// 둘 다 없으면 기본 단계(intermediate)의 상한을 사용합니다.
pub fn resolve_stage_cap(
    engine: &ScoringEngine,
    tier: Option<&str>,
    stage_cap: Option<&str>,
) -> Result<Decimal> {
    if let Some(raw) = stage_cap {
        let cap = Decimal::from_str(raw.trim())
            .map_err(|_| anyhow!("Invalid stage cap: {}", raw))?;
        if cap <= Decimal::ZERO || cap > Decimal::ONE_HUNDRED {
            return Err(anyhow!("stage cap must be in (0, 100]: {}", raw));
        }
        return Ok(cap);
    }

    let tier = match tier {
        Some(t) => ExperienceTier::from_str(t).map_err(|e| anyhow!(e))?,
        None => ExperienceTier::default(),
    };
    Ok(engine.stage_cap_for(tier))
}

/// JSON 파일 읽기.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("파일을 읽을 수 없음: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("JSON 파싱 실패: {}", path.display()))
}

/// 쉼표 구분 종목 목록 파싱.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
