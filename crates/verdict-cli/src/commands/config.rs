//! 설정 검증 / 기본 프리셋 출력 명령어.

use anyhow::{anyhow, Result};

use verdict_engine::EngineConfig;

use crate::commands::shared::{describe_issues, load_config};

/// 설정 파일을 로드하고 검증합니다.
///
/// 문제가 하나라도 있으면 모든 문제를 나열한 에러를 반환합니다.
pub fn validate_config(path: &str) -> Result<String> {
    let config = load_config(Some(path))?;

    match config.validate() {
        Ok(()) => Ok(format!(
            "✅ 설정 유효: {} (컴포넌트 {}개, 하드 게이트 {}개, 소프트 게이트 {}개, 엣지 {}개)",
            config.name,
            config.rubric.components.len(),
            config.hard_gates.len(),
            config.soft_gates.len(),
            config.edges.len()
        )),
        Err(e) => Err(anyhow!(
            "❌ 설정 검증 실패: {}\n{}",
            path,
            describe_issues(&e)
        )),
    }
}

/// 기본 프리셋을 TOML로 출력합니다.
pub fn dump_config() -> Result<String> {
    Ok(toml::to_string_pretty(&EngineConfig::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_config_roundtrip() {
        let text = dump_config().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();

        assert_eq!(parsed, EngineConfig::default());
        assert!(text.contains("trend_growth"));
    }
}
