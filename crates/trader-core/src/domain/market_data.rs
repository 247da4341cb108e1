//! 시장 데이터 타입 및 구조체.
//!
//! 이 모듈은 과거 데이터 제공자가 돌려주는 관측 타입을 정의합니다:
//! - `TradeBar` - 체결 OHLCV 바
//! - `QuoteBar` - 매수/매도 호가 바
//! - `Tick` - 체결/호가 틱
//! - `OpenInterest` - 미결제약정
//! - `MarketData` - 통합 관측 값
//! - `Slice` - 같은 시각에 도착한 관측 묶음

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DataType, Symbol, TickType};

/// 체결 OHLCV 바.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeBar {
    /// 심볼
    pub symbol: Symbol,
    /// 바 시작 시각
    pub time: DateTime<Utc>,
    /// 바 종료 시각
    pub end_time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: Decimal,
}

/// 한쪽 호가의 OHLC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Bar {
    /// 네 가격이 모두 같은 바를 생성합니다.
    pub fn flat(price: Decimal) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }
}

/// 매수/매도 호가 바.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBar {
    /// 심볼
    pub symbol: Symbol,
    /// 바 시작 시각
    pub time: DateTime<Utc>,
    /// 바 종료 시각
    pub end_time: DateTime<Utc>,
    /// 매수 호가 바
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<Bar>,
    /// 매도 호가 바
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<Bar>,
}

impl QuoteBar {
    /// 종가 기준 중간 가격을 반환합니다. 한쪽만 있으면 그 값을 반환합니다.
    pub fn close(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid.close + ask.close) / Decimal::from(2)),
            (Some(bid), None) => Some(bid.close),
            (None, Some(ask)) => Some(ask.close),
            (None, None) => None,
        }
    }
}

/// 체결 또는 호가 틱.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// 심볼
    pub symbol: Symbol,
    /// 시각
    pub time: DateTime<Utc>,
    /// 관측 유형 (체결/호가)
    pub tick_type: TickType,
    /// 가격 (호가 틱이면 중간 가격)
    pub value: Decimal,
    /// 체결 수량
    #[serde(default)]
    pub quantity: Decimal,
    /// 매수 호가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_price: Option<Decimal>,
    /// 매도 호가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask_price: Option<Decimal>,
}

/// 미결제약정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterest {
    /// 심볼
    pub symbol: Symbol,
    /// 시각
    pub time: DateTime<Utc>,
    /// 미결제약정 수량
    pub value: Decimal,
}

/// 다양한 관측 타입을 위한 통합 래퍼.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketData {
    /// 체결 바
    TradeBar(TradeBar),
    /// 호가 바
    QuoteBar(QuoteBar),
    /// 틱
    Tick(Tick),
    /// 미결제약정
    OpenInterest(OpenInterest),
}

impl MarketData {
    /// 관측 대상 심볼을 반환합니다.
    pub fn symbol(&self) -> &Symbol {
        match self {
            MarketData::TradeBar(b) => &b.symbol,
            MarketData::QuoteBar(b) => &b.symbol,
            MarketData::Tick(t) => &t.symbol,
            MarketData::OpenInterest(o) => &o.symbol,
        }
    }

    /// 관측 시작 시각을 반환합니다.
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            MarketData::TradeBar(b) => b.time,
            MarketData::QuoteBar(b) => b.time,
            MarketData::Tick(t) => t.time,
            MarketData::OpenInterest(o) => o.time,
        }
    }

    /// 관측이 완결되는 시각을 반환합니다. 틱과 미결제약정은 시작 시각과 같습니다.
    pub fn end_time(&self) -> DateTime<Utc> {
        match self {
            MarketData::TradeBar(b) => b.end_time,
            MarketData::QuoteBar(b) => b.end_time,
            MarketData::Tick(t) => t.time,
            MarketData::OpenInterest(o) => o.time,
        }
    }

    /// 데이터 타입을 반환합니다.
    pub fn data_type(&self) -> DataType {
        match self {
            MarketData::TradeBar(_) => DataType::TradeBar,
            MarketData::QuoteBar(_) => DataType::QuoteBar,
            MarketData::Tick(_) => DataType::Tick,
            MarketData::OpenInterest(_) => DataType::OpenInterest,
        }
    }

    /// 관측 유형을 반환합니다.
    pub fn tick_type(&self) -> TickType {
        match self {
            MarketData::TradeBar(_) => TickType::Trade,
            MarketData::QuoteBar(_) => TickType::Quote,
            MarketData::Tick(t) => t.tick_type,
            MarketData::OpenInterest(_) => TickType::OpenInterest,
        }
    }

    /// 이 관측의 대표 가격을 반환합니다.
    pub fn price(&self) -> Option<Decimal> {
        match self {
            MarketData::TradeBar(b) => Some(b.close),
            MarketData::QuoteBar(b) => b.close(),
            MarketData::Tick(t) => Some(t.value),
            MarketData::OpenInterest(o) => Some(o.value),
        }
    }
}

/// 같은 시각에 도착한 관측 묶음.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// 슬라이스 시각
    pub time: DateTime<Utc>,
    /// 관측 목록 (도착 순서)
    pub data: Vec<MarketData>,
}

impl Slice {
    /// 빈 슬라이스를 생성합니다.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            data: Vec::new(),
        }
    }

    /// 관측을 추가합니다.
    pub fn push(&mut self, data: MarketData) {
        self.data.push(data);
    }

    /// 슬라이스가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 심볼과 데이터 타입이 일치하는 마지막 관측을 반환합니다.
    pub fn get(&self, symbol: &Symbol, data_type: DataType) -> Option<&MarketData> {
        self.data
            .iter()
            .rev()
            .find(|d| d.symbol() == symbol && data_type.is_assignable_from(d.data_type()))
    }

    /// 데이터 타입이 일치하는 관측을 순서대로 반환합니다.
    pub fn of_type(&self, data_type: DataType) -> impl Iterator<Item = &MarketData> + '_ {
        self.data
            .iter()
            .filter(move |d| data_type.is_assignable_from(d.data_type()))
    }
}
