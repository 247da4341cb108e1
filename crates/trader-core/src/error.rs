//! 핵심 도메인 에러 타입.

use thiserror::Error;

/// 도메인 타입 파싱/설정 로딩 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 문자열 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
