//! 과거 데이터 요청 오류 타입.
//!
//! 구조/설정 오류(`InvalidRequest`, `InvalidState`)는 전략 정의의 실수를 뜻하므로
//! 즉시 호출자에게 전달되며 재시도하지 않습니다. 데이터 부족은 오류가 아닙니다.

use chrono::Duration;
use thiserror::Error;
use trader_core::{DataType, Resolution, Symbol};

/// 잘못된 과거 데이터 요청.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    /// 요청한 타입과 일치하는 구독이 없음
    #[error(
        "The specified security is not of the requested type. Symbol: {symbol} Requested Type: {requested} Actual Type: {}{}",
        .actual.map(|t| t.to_string()).unwrap_or_else(|| "none".to_string()),
        .resolution.map(|r| format!(" Requested Resolution.{}", r.name())).unwrap_or_default()
    )]
    TypeMismatch {
        symbol: Symbol,
        requested: DataType,
        actual: Option<DataType>,
        resolution: Option<Resolution>,
    },

    /// 바 개수 기반 요청에 틱 해상도 사용
    #[error("History functions that accept a 'periods' parameter can not be used with Resolution.Tick")]
    TickResolutionPeriods,

    /// 체결 바 요청에 틱 해상도 사용
    #[error("Trade bar history can not be requested with Resolution.Tick; request Tick data or use slice history instead")]
    TickTradeBarHistory,

    /// 조회 기간이 표현 가능한 시각 범위를 벗어남
    #[error("History span {span} reaches outside the supported time range")]
    SpanOutOfRange { span: Duration },

    /// 알려지지 않은 티커
    #[error("Cannot create history for the given ticker '{0}'. Either use a symbol object or add the security before making the history request")]
    UnknownTicker(String),
}

/// 과거 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// 잘못된 요청
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),

    /// 잘못된 상태 (예: 초기화 종료 후 워밍업 변경)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 데이터 제공자 오류
    #[error("Provider error: {0}")]
    Provider(String),
}

impl HistoryError {
    /// 잘못된 요청 오류인지 확인합니다.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, HistoryError::InvalidRequest(_))
    }

    /// 잘못된 상태 오류인지 확인합니다.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, HistoryError::InvalidState(_))
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = InvalidRequest::TypeMismatch {
            symbol: Symbol::equity("SPY"),
            requested: DataType::QuoteBar,
            actual: Some(DataType::TradeBar),
            resolution: Some(Resolution::Daily),
        };
        let msg = err.to_string();
        assert!(msg.contains("Symbol: SPY"));
        assert!(msg.contains("Requested Type: QuoteBar"));
        assert!(msg.contains("Actual Type: TradeBar"));
        assert!(msg.ends_with("Requested Resolution.Daily"));

        let err = InvalidRequest::TypeMismatch {
            symbol: Symbol::equity("SPY"),
            requested: DataType::OpenInterest,
            actual: None,
            resolution: None,
        };
        assert!(err.to_string().ends_with("Actual Type: none"));
    }

    #[test]
    fn test_error_kinds() {
        let err: HistoryError = InvalidRequest::TickResolutionPeriods.into();
        assert!(err.is_invalid_request());
        assert!(!err.is_invalid_state());
        assert!(HistoryError::InvalidState("locked".to_string()).is_invalid_state());
    }
}
