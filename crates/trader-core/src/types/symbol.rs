//! 심볼 및 증권 유형 정의.
//!
//! 이 모듈은 과거 데이터 요청에 쓰이는 심볼 관련 타입을 정의합니다:
//! - `SecurityType` - 증권 유형 (주식, 외환, 선물, 옵션 등)
//! - `Symbol` - 거래 가능한 상품(또는 canonical 체인/연속 계약)을 나타내는 심볼

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 증권 유형 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityType {
    /// 주식
    Equity,
    /// 외환
    Forex,
    /// 차액 결제 거래
    Cfd,
    /// 암호화폐
    Crypto,
    /// 지수
    Index,
    /// 선물
    Future,
    /// 주식 옵션
    Option,
    /// 지수 옵션
    IndexOption,
    /// 선물 옵션
    FutureOption,
}

impl SecurityType {
    /// 체결 데이터가 없는(호가만 존재하는) 유형인지 확인합니다.
    pub fn is_quote_only(&self) -> bool {
        matches!(self, SecurityType::Forex | SecurityType::Cfd)
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SecurityType::Equity => "equity",
            SecurityType::Forex => "forex",
            SecurityType::Cfd => "cfd",
            SecurityType::Crypto => "crypto",
            SecurityType::Index => "index",
            SecurityType::Future => "future",
            SecurityType::Option => "option",
            SecurityType::IndexOption => "index_option",
            SecurityType::FutureOption => "future_option",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SecurityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equity" => Ok(SecurityType::Equity),
            "forex" => Ok(SecurityType::Forex),
            "cfd" => Ok(SecurityType::Cfd),
            "crypto" => Ok(SecurityType::Crypto),
            "index" => Ok(SecurityType::Index),
            "future" => Ok(SecurityType::Future),
            "option" => Ok(SecurityType::Option),
            "index_option" => Ok(SecurityType::IndexOption),
            "future_option" => Ok(SecurityType::FutureOption),
            _ => Err(CoreError::Parse(format!("Unknown security type: {}", s))),
        }
    }
}

/// 거래 가능한 상품을 나타내는 심볼.
///
/// `canonical` 심볼은 옵션 체인이나 연속 선물 계약처럼 그 자체로는
/// 호가가 존재하지 않는 자리표시자입니다. 과거 데이터 요청 대상에서 항상 제외됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    /// 티커 (예: SPY, EURUSD, ES)
    pub ticker: String,
    /// 증권 유형
    pub security_type: SecurityType,
    /// 시장 (예: usa, oanda, cme)
    pub market: String,
    /// canonical(체인/연속 계약) 여부
    #[serde(default)]
    pub canonical: bool,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(
        ticker: impl Into<String>,
        security_type: SecurityType,
        market: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            security_type,
            market: market.into().to_lowercase(),
            canonical: false,
        }
    }

    /// 미국 주식 심볼을 생성합니다.
    pub fn equity(ticker: impl Into<String>) -> Self {
        Self::new(ticker, SecurityType::Equity, "usa")
    }

    /// 외환 심볼을 생성합니다.
    pub fn forex(pair: impl Into<String>) -> Self {
        Self::new(pair, SecurityType::Forex, "oanda")
    }

    /// 암호화폐 심볼을 생성합니다.
    pub fn crypto(pair: impl Into<String>, market: impl Into<String>) -> Self {
        Self::new(pair, SecurityType::Crypto, market)
    }

    /// 지수 심볼을 생성합니다.
    pub fn index(ticker: impl Into<String>) -> Self {
        Self::new(ticker, SecurityType::Index, "usa")
    }

    /// 개별 선물 계약 심볼을 생성합니다.
    pub fn future(ticker: impl Into<String>, market: impl Into<String>) -> Self {
        Self::new(ticker, SecurityType::Future, market)
    }

    /// 연속 선물 계약(canonical) 심볼을 생성합니다.
    pub fn continuous_future(ticker: impl Into<String>, market: impl Into<String>) -> Self {
        Self::future(ticker, market).into_canonical()
    }

    /// canonical 표시를 붙인 심볼로 변환합니다.
    pub fn into_canonical(mut self) -> Self {
        self.canonical = true;
        self
    }

    /// canonical 심볼인지 확인합니다.
    pub fn is_canonical(&self) -> bool {
        self.canonical
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.canonical {
            write!(f, "/{}", self.ticker)
        } else {
            write!(f, "{}", self.ticker)
        }
    }
}
