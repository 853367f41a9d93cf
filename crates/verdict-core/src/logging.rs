//! 로깅 초기화와 평가 span 매크로.
//!
//! 평가 결과는 stdout으로 출력되므로 로그는 항상 stderr로 보냅니다.
//!
//! 환경 변수:
//! - `VERDICT_LOG`: 필터 (없으면 `RUST_LOG`, 둘 다 없으면 `warn`)
//! - `VERDICT_LOG_FORMAT`: `text` | `json`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 기본 필터. CLI 출력에 진행 로그가 섞이지 않도록 경고 이상만 보입니다.
const DEFAULT_FILTER: &str = "warn";

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 사람이 읽는 한 줄 형식
    #[default]
    Text,
    /// 배치 실행 로그 수집용 JSON
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "compact" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LogSettings {
    /// 프로세스 환경 변수에서 설정을 읽습니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 변수 조회 함수로 설정을 만듭니다. 잘못된 형식 값은 기본값으로 대체합니다.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup("VERDICT_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = lookup("VERDICT_LOG_FORMAT")
            .and_then(|f| f.parse().ok())
            .unwrap_or_default();

        Self { filter, format }
    }
}

/// 로깅 시스템 초기화.
///
/// 전역 subscriber가 이미 설치되어 있으면 에러를 반환합니다.
pub fn init_logging(settings: &LogSettings) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(&settings.filter)?;

    let layer = match settings.format {
        LogFormat::Text => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    tracing::debug!(filter = %settings.filter, format = ?settings.format, "로깅 초기화");
    Ok(())
}

/// 환경 변수에서 로깅을 초기화합니다.
pub fn init_logging_from_env() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LogSettings::from_env())
}

/// 후보 하나의 평가 span.
#[macro_export]
macro_rules! candidate_span {
    ($symbol:expr, $depth:expr) => {
        tracing::info_span!("evaluate", symbol = %$symbol, depth = ?$depth)
    };
}

/// 배치 실행 span. 배치 안에서 발생하는 로그에 실행 ID와 모드가 붙습니다.
#[macro_export]
macro_rules! batch_span {
    ($run_id:expr, $mode:expr) => {
        tracing::info_span!("batch", run_id = %$run_id, mode = %$mode)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" TEXT ".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_settings_default_when_unset() {
        assert_eq!(LogSettings::from_lookup(lookup(&[])), LogSettings::default());
    }

    #[test]
    fn test_verdict_log_wins_over_rust_log() {
        let settings = LogSettings::from_lookup(lookup(&[
            ("VERDICT_LOG", "verdict_engine=debug"),
            ("RUST_LOG", "info"),
            ("VERDICT_LOG_FORMAT", "json"),
        ]));

        assert_eq!(settings.filter, "verdict_engine=debug");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_bad_format_falls_back() {
        let settings = LogSettings::from_lookup(lookup(&[
            ("RUST_LOG", "info"),
            ("VERDICT_LOG_FORMAT", "yaml"),
        ]));

        assert_eq!(settings.filter, "info");
        assert_eq!(settings.format, LogFormat::Text);
    }
}
