//! 엔진 전반의 에러 타입.
//!
//! 후보 단위의 입력 누락은 에러가 아니라 데이터 품질 저하로 처리됩니다.
//! 이 모듈의 에러는 설정 오류, 수집 실패, 배치 전체 실패처럼
//! 호출자에게 전달되어야 하는 상황만 표현합니다.

use thiserror::Error;

/// 엔진 최상위 에러.
#[derive(Debug, Error)]
pub enum VerdictError {
    /// 설정 에러 (시작 시점에만 발생)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 시그널 수집기 에러
    #[error("수집 에러: {0}")]
    Collector(String),

    /// 배치 전체 데이터 없음
    #[error("데이터 없음: {0}")]
    NoData(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 엔진 작업을 위한 Result 타입.
pub type VerdictResult<T> = Result<T, VerdictError>;

impl VerdictError {
    /// 후보 단위로 복구 가능한 에러인지 확인합니다.
    ///
    /// 수집기 에러는 해당 후보를 품질 저하로 표시하고 배치를 계속 진행합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VerdictError::Collector(_))
    }

    /// 시작 자체를 막아야 하는 치명적 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VerdictError::Config(_))
    }
}

impl From<serde_json::Error> for VerdictError {
    fn from(err: serde_json::Error) -> Self {
        VerdictError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverable() {
        let collector_err = VerdictError::Collector("timeout".to_string());
        assert!(collector_err.is_recoverable());

        let config_err = VerdictError::Config("weights".to_string());
        assert!(!config_err.is_recoverable());
    }

    #[test]
    fn test_error_fatal() {
        assert!(VerdictError::Config("weights".to_string()).is_fatal());
        assert!(!VerdictError::NoData("empty".to_string()).is_fatal());
    }

    #[test]
    fn test_from_serde_json() {
        let err: VerdictError = serde_json::from_str::<u32>("not a number")
            .unwrap_err()
            .into();
        assert!(matches!(err, VerdictError::Serialization(_)));
    }
}
