//! 통합 테스트 공용 픽스처.

#![allow(dead_code)] // 테스트 파일마다 쓰는 헬퍼가 다름

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use trader_core::{
    Bar, ExchangeHours, HistoryConfig, MarketData, QuoteBar, Resolution, SubscriptionDescriptor,
    Symbol, TickType, TradeBar,
};
use trader_history::{
    ExchangeCalendar, HistoryApi, InMemoryHistoryProvider, InMemoryMarketHoursDatabase,
    InMemorySubscriptionCatalog, SimClock,
};

/// 기본 시뮬레이션 시각 (금요일 장중).
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap()
}

/// `end - periods * 바 길이`를 시작 시각으로 돌려주는 달력. 호출 인자를 기록합니다.
#[derive(Default)]
pub struct LinearCalendar {
    pub calls: Mutex<Vec<(Symbol, usize, Resolution)>>,
}

impl ExchangeCalendar for LinearCalendar {
    fn start_time_for_bar_count(
        &self,
        symbol: &Symbol,
        periods: usize,
        resolution: Resolution,
        _exchange_hours: &ExchangeHours,
        _data_time_zone: Tz,
        end: DateTime<Utc>,
    ) -> DateTime<Utc> {
        self.calls.lock().push((symbol.clone(), periods, resolution));
        end - resolution.bar_duration() * periods as i32
    }
}

/// API와 협력자 묶음.
pub struct Harness {
    pub catalog: Arc<InMemorySubscriptionCatalog>,
    pub provider: Arc<InMemoryHistoryProvider>,
    pub calendar: Arc<LinearCalendar>,
    pub clock: Arc<SimClock>,
    pub api: HistoryApi,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        let catalog = Arc::new(InMemorySubscriptionCatalog::new());
        let provider = Arc::new(InMemoryHistoryProvider::new());
        let calendar = Arc::new(LinearCalendar::default());
        let clock = Arc::new(SimClock::new(now()));

        let api = HistoryApi::new(
            config,
            catalog.clone(),
            Arc::new(InMemoryMarketHoursDatabase::always_open()),
            calendar.clone(),
            clock.clone(),
        )
        .with_provider(provider.clone());

        Self {
            catalog,
            provider,
            calendar,
            clock,
            api,
        }
    }

    /// 구독을 등록하고 증권을 알려진 목록에 추가합니다.
    pub fn subscribe(&mut self, symbol: &Symbol, resolution: Resolution, tick_type: TickType) {
        self.api.securities_mut().add(symbol.clone());
        self.catalog.add(SubscriptionDescriptor::new(
            symbol.clone(),
            resolution,
            tick_type,
            chrono_tz::UTC,
        ));
    }
}

pub fn trade_bar(
    symbol: &Symbol,
    time: DateTime<Utc>,
    resolution: Resolution,
    close: Decimal,
) -> MarketData {
    MarketData::TradeBar(TradeBar {
        symbol: symbol.clone(),
        time,
        end_time: time + resolution.bar_duration(),
        open: close,
        high: close,
        low: close,
        close,
        volume: Decimal::from(100),
    })
}

pub fn quote_bar(
    symbol: &Symbol,
    time: DateTime<Utc>,
    resolution: Resolution,
    bid: Decimal,
    ask: Decimal,
) -> MarketData {
    MarketData::QuoteBar(QuoteBar {
        symbol: symbol.clone(),
        time,
        end_time: time + resolution.bar_duration(),
        bid: Some(Bar::flat(bid)),
        ask: Some(Bar::flat(ask)),
    })
}
