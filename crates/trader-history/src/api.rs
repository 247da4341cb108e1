//! 전략용 과거 데이터 API.
//!
//! 협력자(구독 카탈로그, 시장 운영 시간, 거래소 달력, 시계, 데이터 제공자)를 묶어
//! 전략 계층이 호출하는 연산을 제공합니다.
//!
//! # 동작 흐름
//!
//! ```text
//! 전략 호출 (심볼, 기간 | 바 개수, 해상도)
//!         │
//!         ▼
//! ┌───────────────────┐
//! │ 1. 요청 생성        │ ← 구독 해석 + 거래소 달력
//! └─────────┬─────────┘
//!           │
//! ┌─────────▼─────────┐
//! │ 2. 미래 시각 차단   │ ← 유니버스 심볼 제거 포함
//! └─────────┬─────────┘
//!           │
//! ┌─────────▼─────────┐
//! │ 3. 데이터 제공자    │
//! └─────────┬─────────┘
//!           │
//!           ▼
//!   슬라이스 / 타입별 관측
//! ```

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, instrument};
use trader_core::{
    DataType, HistoryConfig, HistoryRequest, MarketData, Resolution, Slice, Symbol, TradeBar,
};

use crate::builder::{span_start, RequestBuilder, RequestOverrides};
use crate::calendar::ExchangeCalendar;
use crate::catalog::SubscriptionCatalog;
use crate::clock::Clock;
use crate::dispatch::Dispatcher;
use crate::error::{HistoryError, InvalidRequest, Result};
use crate::last_price::{LastKnownPriceResolver, LookbackPolicy};
use crate::market_hours::MarketHoursDatabase;
use crate::provider::HistoryProvider;
use crate::resolver::SubscriptionResolver;
use crate::securities::SecurityRegistry;
use crate::warmup::{WarmUpObserver, WarmUpScheduler, WarmUpSpec};

/// 타입 지정 조회 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    /// 현재 시각 기준 과거 기간
    Span(Duration),
    /// 바 개수
    Periods(usize),
    /// 명시적 시작/종료
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// 과거 데이터 API.
pub struct HistoryApi {
    config: HistoryConfig,
    catalog: Arc<dyn SubscriptionCatalog>,
    market_hours: Arc<dyn MarketHoursDatabase>,
    calendar: Arc<dyn ExchangeCalendar>,
    clock: Arc<dyn Clock>,
    provider: Option<Arc<dyn HistoryProvider>>,
    securities: SecurityRegistry,
    warm_up: WarmUpScheduler,
    lookback: LookbackPolicy,
}

impl HistoryApi {
    /// 데이터 제공자 없이 생성합니다. [`with_provider`](Self::with_provider)로 설정합니다.
    pub fn new(
        config: HistoryConfig,
        catalog: Arc<dyn SubscriptionCatalog>,
        market_hours: Arc<dyn MarketHoursDatabase>,
        calendar: Arc<dyn ExchangeCalendar>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lookback = LookbackPolicy::from(&config.last_known_price);
        Self {
            config,
            catalog,
            market_hours,
            calendar,
            clock,
            provider: None,
            securities: SecurityRegistry::new(),
            warm_up: WarmUpScheduler::new(),
            lookback,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn HistoryProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn securities(&self) -> &SecurityRegistry {
        &self.securities
    }

    pub fn securities_mut(&mut self) -> &mut SecurityRegistry {
        &mut self.securities
    }

    /// 현재 시뮬레이션 시각.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc_now()
    }

    /// 현재 알려진 모든 심볼.
    pub fn known_symbols(&self) -> Vec<Symbol> {
        self.securities.symbols().cloned().collect()
    }

    /// 요청 생성기.
    pub fn builder(&self) -> RequestBuilder<'_> {
        let resolver = SubscriptionResolver::new(
            self.catalog.as_ref(),
            self.market_hours.as_ref(),
            &self.securities,
            &self.config.universe,
        );
        RequestBuilder::new(resolver, self.calendar.as_ref())
    }

    fn dispatcher(&self) -> Option<Dispatcher<'_>> {
        self.provider.as_deref().map(|provider| {
            Dispatcher::new(provider, &self.securities, self.config.time_zone, self.now())
        })
    }

    fn require_dispatcher(&self) -> Result<Dispatcher<'_>> {
        self.dispatcher()
            .ok_or_else(|| HistoryError::Provider("no history provider configured".to_string()))
    }

    /// 티커로 등록된 증권의 심볼을 찾습니다.
    pub fn symbol_for(&self, ticker: &str) -> Result<Symbol> {
        self.securities
            .find_by_ticker(ticker)
            .cloned()
            .ok_or_else(|| InvalidRequest::UnknownTicker(ticker.to_string()).into())
    }

    // ==================== 워밍업 ====================

    /// 바 개수 기반 워밍업을 설정합니다.
    pub fn set_warm_up_bar_count(
        &mut self,
        bars: usize,
        resolution: Option<Resolution>,
    ) -> Result<()> {
        self.warm_up.set_bar_count(bars, resolution)
    }

    /// 기간 기반 워밍업을 설정합니다.
    pub fn set_warm_up_time_span(
        &mut self,
        span: Duration,
        resolution: Option<Resolution>,
    ) -> Result<()> {
        self.warm_up.set_time_span(span, resolution)
    }

    pub fn warm_up_spec(&self) -> Option<WarmUpSpec> {
        self.warm_up.spec()
    }

    /// 초기화 단계를 끝내고 거래 단계로 넘어갑니다.
    pub fn lock(&mut self) {
        self.warm_up.lock();
    }

    pub fn is_warming_up(&self) -> bool {
        self.warm_up.is_warming_up()
    }

    pub fn subscribe_warm_up(&mut self, observer: Arc<dyn WarmUpObserver>) {
        self.warm_up.subscribe(observer);
    }

    pub fn finish_warm_up(&mut self) {
        self.warm_up.finish();
    }

    /// 워밍업 요청 (미래 시각 차단 전).
    pub fn warm_up_requests(&self) -> Result<Vec<HistoryRequest>> {
        Ok(self
            .warm_up
            .requests(self.builder(), self.known_symbols(), self.now())?
            .collect())
    }

    /// 워밍업 데이터를 조회합니다.
    pub async fn warm_up_history(&self) -> Result<Vec<Slice>> {
        let requests = self.warm_up_requests()?;
        self.history_requests(requests).await
    }

    // ==================== 여러 심볼 조회 ====================

    /// `[now - span, now]` 구간 조회.
    pub async fn history_span(
        &self,
        symbols: Vec<Symbol>,
        span: Duration,
        resolution: Option<Resolution>,
    ) -> Result<Vec<Slice>> {
        let now = self.now();
        let start = span_start(now, span)?;
        self.history_range(symbols, start, now, resolution, RequestOverrides::none())
            .await
    }

    /// 심볼별 바 개수 조회. 틱 해상도는 허용하지 않습니다.
    pub async fn history_periods(
        &self,
        symbols: Vec<Symbol>,
        periods: usize,
        resolution: Option<Resolution>,
    ) -> Result<Vec<Slice>> {
        let requests: Vec<_> = self
            .builder()
            .bar_count_requests(symbols, periods, resolution, self.now())?
            .collect();
        self.history_requests(requests).await
    }

    /// 시작/종료 구간 조회.
    pub async fn history_range(
        &self,
        symbols: Vec<Symbol>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: Option<Resolution>,
        overrides: RequestOverrides,
    ) -> Result<Vec<Slice>> {
        let requests: Vec<_> = self
            .builder()
            .date_range_requests(symbols, start, end, resolution, overrides)
            .collect();
        self.history_requests(requests).await
    }

    /// 요청 목록을 실행합니다.
    #[instrument(skip_all, fields(requests = requests.len()))]
    pub async fn history_requests(&self, requests: Vec<HistoryRequest>) -> Result<Vec<Slice>> {
        self.require_dispatcher()?.dispatch(requests).await
    }

    // ==================== 타입 지정 조회 ====================

    /// 단일 심볼의 특정 타입 관측을 조회합니다.
    ///
    /// 요청 타입과 일치하는 구독이 없으면 `InvalidRequest`로 실패합니다.
    pub async fn history_of(
        &self,
        symbol: &Symbol,
        data_type: DataType,
        window: HistoryWindow,
        resolution: Option<Resolution>,
    ) -> Result<Vec<MarketData>> {
        let builder = self.builder();
        let now = self.now();
        let request = match window {
            HistoryWindow::Span(span) => builder.typed_date_range_request(
                symbol,
                data_type,
                span_start(now, span)?,
                now,
                resolution,
            )?,
            HistoryWindow::Periods(periods) => {
                builder.typed_bar_count_request(symbol, data_type, periods, resolution, now)?
            }
            HistoryWindow::Range { start, end } => {
                builder.typed_date_range_request(symbol, data_type, start, end, resolution)?
            }
        };

        let slices = self.history_requests(vec![request]).await?;
        Ok(project(&slices, symbol, data_type).cloned().collect())
    }

    /// 여러 심볼의 특정 타입 관측을 조회합니다.
    ///
    /// 타입이 일치하는 구독이 없는 심볼은 실패 없이 건너뜁니다.
    /// 결과 슬라이스에는 요청 타입의 관측만 남습니다.
    pub async fn typed_history(
        &self,
        symbols: Vec<Symbol>,
        data_type: DataType,
        window: HistoryWindow,
        resolution: Option<Resolution>,
    ) -> Result<Vec<Slice>> {
        let builder = self.builder();
        let now = self.now();
        let requests: Vec<_> = match window {
            HistoryWindow::Span(span) => builder
                .typed_date_range_requests(
                    symbols,
                    data_type,
                    span_start(now, span)?,
                    now,
                    resolution,
                )
                .collect(),
            HistoryWindow::Periods(periods) => builder
                .typed_bar_count_requests(symbols, data_type, periods, resolution, now)?
                .collect(),
            HistoryWindow::Range { start, end } => builder
                .typed_date_range_requests(symbols, data_type, start, end, resolution)
                .collect(),
        };

        let slices = self.history_requests(requests).await?;
        Ok(slices
            .iter()
            .filter_map(|slice| {
                let mut typed = Slice::new(slice.time);
                for data in slice.of_type(data_type) {
                    typed.push(data.clone());
                }
                (!typed.is_empty()).then_some(typed)
            })
            .collect())
    }

    /// 체결 바 조회.
    ///
    /// 외환/CFD는 체결 데이터가 없어 빈 결과가 나오므로 오류를 기록합니다.
    pub async fn trade_bars(
        &self,
        symbol: &Symbol,
        window: HistoryWindow,
        resolution: Option<Resolution>,
    ) -> Result<Vec<TradeBar>> {
        if symbol.security_type.is_quote_only() {
            error!(
                symbol = %symbol,
                "Trade bar history on a Forex or CFD security returns an empty result, \
                 request QuoteBar data instead"
            );
        }

        let builder = self.builder();
        let resolution = builder.resolver().effective_resolution(symbol, resolution);
        if resolution.is_tick() {
            return Err(InvalidRequest::TickTradeBarHistory.into());
        }

        let now = self.now();
        let (start, end) = match window {
            HistoryWindow::Span(span) => (span_start(now, span)?, now),
            HistoryWindow::Periods(periods) => {
                (builder.start_for_periods(symbol, periods, Some(resolution), now)?, now)
            }
            HistoryWindow::Range { start, end } => (start, end),
        };

        let requests: Vec<_> = builder
            .date_range_requests(
                vec![symbol.clone()],
                start,
                end,
                Some(resolution),
                RequestOverrides::none(),
            )
            .collect();
        let slices = self.history_requests(requests).await?;

        Ok(project(&slices, symbol, DataType::TradeBar)
            .filter_map(|data| match data {
                MarketData::TradeBar(bar) => Some(bar.clone()),
                _ => None,
            })
            .collect())
    }

    // ==================== 마지막 알려진 가격 ====================

    fn last_price_resolver(&self) -> LastKnownPriceResolver<'_> {
        LastKnownPriceResolver::new(self.builder(), self.dispatcher(), &self.lookback)
    }

    /// 관측 유형별 마지막 관측 (시간 오름차순). 실패하지 않습니다.
    pub async fn last_known_prices(&self, symbol: &Symbol) -> Vec<MarketData> {
        self.last_price_resolver().last_known_prices(symbol).await
    }

    /// 우선순위가 가장 높은 관측 유형의 마지막 관측.
    pub async fn last_known_price(&self, symbol: &Symbol) -> Option<MarketData> {
        self.last_price_resolver().last_known_price(symbol).await
    }
}

/// 슬라이스에서 심볼/타입이 일치하는 관측만 시간순으로 꺼냅니다.
fn project<'s>(
    slices: &'s [Slice],
    symbol: &'s Symbol,
    data_type: DataType,
) -> impl Iterator<Item = &'s MarketData> + 's {
    slices
        .iter()
        .flat_map(|slice| slice.data.iter())
        .filter(move |data| {
            data.symbol() == symbol && data_type.is_assignable_from(data.data_type())
        })
}
