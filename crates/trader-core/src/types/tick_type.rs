//! 관측 유형(틱 타입)과 데이터 타입 정의.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 관측 유형.
///
/// 전순서가 없으며, 증권 유형별 우선순위는 구독 카탈로그가 제공합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickType {
    /// 체결
    Trade,
    /// 호가
    Quote,
    /// 미결제약정
    OpenInterest,
}

impl fmt::Display for TickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickType::Trade => write!(f, "trade"),
            TickType::Quote => write!(f, "quote"),
            TickType::OpenInterest => write!(f, "open_interest"),
        }
    }
}

/// 구독/요청이 다루는 데이터 타입.
///
/// `Base`는 모든 데이터 타입을 포괄하는 일반 타입입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 일반 타입 (모든 타입의 상위)
    Base,
    /// 체결 바
    TradeBar,
    /// 호가 바
    QuoteBar,
    /// 틱
    Tick,
    /// 미결제약정
    OpenInterest,
}

impl DataType {
    /// `other` 타입의 데이터를 이 타입으로 받을 수 있는지 확인합니다.
    pub fn is_assignable_from(&self, other: DataType) -> bool {
        *self == DataType::Base || *self == other
    }

    /// 해상도와 관측 유형에 맞는 기본 데이터 타입을 반환합니다.
    pub fn for_tick_type(tick_type: TickType, tick_resolution: bool) -> DataType {
        match (tick_type, tick_resolution) {
            (TickType::OpenInterest, _) => DataType::OpenInterest,
            (_, true) => DataType::Tick,
            (TickType::Trade, false) => DataType::TradeBar,
            (TickType::Quote, false) => DataType::QuoteBar,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Base => "BaseData",
            DataType::TradeBar => "TradeBar",
            DataType::QuoteBar => "QuoteBar",
            DataType::Tick => "Tick",
            DataType::OpenInterest => "OpenInterest",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignable() {
        assert!(DataType::Base.is_assignable_from(DataType::QuoteBar));
        assert!(DataType::TradeBar.is_assignable_from(DataType::TradeBar));
        assert!(!DataType::TradeBar.is_assignable_from(DataType::QuoteBar));
    }

    #[test]
    fn test_default_data_type() {
        assert_eq!(DataType::for_tick_type(TickType::Trade, false), DataType::TradeBar);
        assert_eq!(DataType::for_tick_type(TickType::Quote, true), DataType::Tick);
        assert_eq!(
            DataType::for_tick_type(TickType::OpenInterest, true),
            DataType::OpenInterest
        );
    }
}
