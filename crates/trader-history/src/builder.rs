//! 과거 데이터 요청 생성기.
//!
//! 전략의 선언적 요청을 데이터 제공자가 실행할 수 있는 [`HistoryRequest`]로 바꿉니다.
//!
//! - 기간 모드: `(심볼들, 시작, 종료)` → 심볼별 일치 구독마다 요청 하나
//! - 바 개수 모드: `(심볼들, 바 개수)` → 거래소 달력으로 시작 시각을 계산한 뒤 동일
//!
//! 여러 심볼에 대한 요청은 심볼 단위로 지연 생성됩니다. 호출자가 순회를 중단하면
//! 나머지 심볼의 구독 해석과 달력 계산은 일어나지 않습니다.
//! canonical 심볼은 항상 제외됩니다.
//!
//! 타입 지정 요청은 두 가지입니다. 단일 심볼 요청은 일치하는 구독이 없으면 실패하고,
//! 여러 심볼 요청은 그런 심볼을 건너뜁니다.
//!
//! 생성된 요청은 아직 미래 시각 차단을 거치지 않았습니다. 차단은 디스패치 직전에
//! [`LookAheadGuard`](crate::guard::LookAheadGuard)가 수행합니다.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use trader_core::{
    history_span, DataType, ExchangeHours, HistoryRequest, Resolution, SubscriptionDescriptor,
    Symbol,
};

use crate::calendar::ExchangeCalendar;
use crate::error::InvalidRequest;
use crate::precedence::{Layered, SettingSource};
use crate::resolver::SubscriptionResolver;

/// 호출별 오버라이드.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOverrides {
    /// `Some(true)`면 유효 해상도로 fill-forward, `Some(false)`면 끔
    pub fill_forward: Option<bool>,
    /// 연장 거래 시간 포함 여부
    pub extended_hours: Option<bool>,
}

impl RequestOverrides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_fill_forward(mut self, fill_forward: bool) -> Self {
        self.fill_forward = Some(fill_forward);
        self
    }

    pub fn with_extended_hours(mut self, extended_hours: bool) -> Self {
        self.extended_hours = Some(extended_hours);
        self
    }
}

/// `[now - span, now]` 구간의 시작 시각.
///
/// 결과가 표현 가능한 시각 범위를 벗어나면 `SpanOutOfRange`로 실패합니다.
pub fn span_start(now: DateTime<Utc>, span: Duration) -> Result<DateTime<Utc>, InvalidRequest> {
    now.checked_sub_signed(span)
        .ok_or(InvalidRequest::SpanOutOfRange { span })
}

/// 요청 생성기.
#[derive(Clone, Copy)]
pub struct RequestBuilder<'a> {
    resolver: SubscriptionResolver<'a>,
    calendar: &'a dyn ExchangeCalendar,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(resolver: SubscriptionResolver<'a>, calendar: &'a dyn ExchangeCalendar) -> Self {
        Self { resolver, calendar }
    }

    pub fn resolver(&self) -> SubscriptionResolver<'a> {
        self.resolver
    }

    /// 기간 모드 요청을 생성합니다.
    pub fn date_range_requests<I>(
        self,
        symbols: I,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: Option<Resolution>,
        overrides: RequestOverrides,
    ) -> impl Iterator<Item = HistoryRequest> + 'a
    where
        I: IntoIterator<Item = Symbol>,
        I::IntoIter: 'a,
    {
        symbols
            .into_iter()
            .filter(|symbol| !symbol.is_canonical())
            .flat_map(move |symbol| {
                self.symbol_date_range_requests(&symbol, start, end, resolution, overrides)
            })
    }

    fn symbol_date_range_requests(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: Option<Resolution>,
        overrides: RequestOverrides,
    ) -> Vec<HistoryRequest> {
        let _span = history_span!("date_range_requests", symbol).entered();
        let exchange_hours = self.resolver.market_hours(symbol).exchange_hours;
        let effective = self.resolver.effective_resolution(symbol, resolution);

        self.resolver
            .resolve(symbol, DataType::Base, resolution)
            .iter()
            .map(|descriptor| {
                self.create_request(
                    descriptor,
                    start,
                    end,
                    &exchange_hours,
                    resolution,
                    effective,
                    overrides,
                )
            })
            .collect()
    }

    /// 바 개수 모드 요청을 생성합니다.
    ///
    /// `end`는 현재 시뮬레이션 시각입니다. 틱 해상도를 명시하면 실패합니다.
    pub fn bar_count_requests<I>(
        self,
        symbols: I,
        periods: usize,
        resolution: Option<Resolution>,
        end: DateTime<Utc>,
    ) -> Result<impl Iterator<Item = HistoryRequest> + 'a, InvalidRequest>
    where
        I: IntoIterator<Item = Symbol>,
        I::IntoIter: 'a,
    {
        if resolution == Some(Resolution::Tick) {
            return Err(InvalidRequest::TickResolutionPeriods);
        }

        Ok(symbols
            .into_iter()
            .filter(|symbol| !symbol.is_canonical())
            .flat_map(move |symbol| {
                self.symbol_bar_count_requests(&symbol, periods, resolution, end)
            }))
    }

    fn symbol_bar_count_requests(
        &self,
        symbol: &Symbol,
        periods: usize,
        resolution: Option<Resolution>,
        end: DateTime<Utc>,
    ) -> Vec<HistoryRequest> {
        let effective = self.resolver.effective_resolution(symbol, resolution);
        let _span = history_span!("bar_count_requests", symbol, effective).entered();
        let exchange_hours = self.resolver.market_hours(symbol).exchange_hours;
        let descriptors = self.resolver.resolve(symbol, DataType::Base, resolution);
        let Some(first) = descriptors.first() else {
            return Vec::new();
        };

        let start = self.start_time_for_bar_count(
            symbol,
            periods,
            effective,
            &exchange_hours,
            first.data_time_zone,
            end,
        );

        descriptors
            .iter()
            .map(|descriptor| {
                self.create_request(
                    descriptor,
                    start,
                    end,
                    &exchange_hours,
                    Some(effective),
                    effective,
                    RequestOverrides::none(),
                )
            })
            .collect()
    }

    /// 단일 심볼/타입 기간 요청. 요청 타입과 일치하는 구독이 있어야 합니다.
    pub fn typed_date_range_request(
        &self,
        symbol: &Symbol,
        data_type: DataType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: Option<Resolution>,
    ) -> Result<HistoryRequest, InvalidRequest> {
        let descriptor = self.resolver.resolve_one(symbol, data_type, resolution)?;
        Ok(self.typed_range_request(symbol, &descriptor, start, end, resolution))
    }

    /// 단일 심볼/타입 바 개수 요청.
    pub fn typed_bar_count_request(
        &self,
        symbol: &Symbol,
        data_type: DataType,
        periods: usize,
        resolution: Option<Resolution>,
        end: DateTime<Utc>,
    ) -> Result<HistoryRequest, InvalidRequest> {
        if resolution == Some(Resolution::Tick) {
            return Err(InvalidRequest::TickResolutionPeriods);
        }

        let descriptor = self.resolver.resolve_one(symbol, data_type, resolution)?;
        Ok(self.typed_periods_request(symbol, &descriptor, periods, resolution, end))
    }

    /// 여러 심볼의 타입 지정 기간 요청.
    ///
    /// 심볼마다 주 구독 하나로 요청을 만들며, 타입이 일치하는 구독이 없는 심볼은 건너뜁니다.
    pub fn typed_date_range_requests<I>(
        self,
        symbols: I,
        data_type: DataType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: Option<Resolution>,
    ) -> impl Iterator<Item = HistoryRequest> + 'a
    where
        I: IntoIterator<Item = Symbol>,
        I::IntoIter: 'a,
    {
        symbols
            .into_iter()
            .filter(|symbol| !symbol.is_canonical())
            .filter_map(move |symbol| {
                let descriptor = self.primary_or_skip(&symbol, data_type, resolution)?;
                Some(self.typed_range_request(&symbol, &descriptor, start, end, resolution))
            })
    }

    /// 여러 심볼의 타입 지정 바 개수 요청. 틱 해상도를 명시하면 실패합니다.
    pub fn typed_bar_count_requests<I>(
        self,
        symbols: I,
        data_type: DataType,
        periods: usize,
        resolution: Option<Resolution>,
        end: DateTime<Utc>,
    ) -> Result<impl Iterator<Item = HistoryRequest> + 'a, InvalidRequest>
    where
        I: IntoIterator<Item = Symbol>,
        I::IntoIter: 'a,
    {
        if resolution == Some(Resolution::Tick) {
            return Err(InvalidRequest::TickResolutionPeriods);
        }

        Ok(symbols
            .into_iter()
            .filter(|symbol| !symbol.is_canonical())
            .filter_map(move |symbol| {
                let descriptor = self.primary_or_skip(&symbol, data_type, resolution)?;
                Some(self.typed_periods_request(&symbol, &descriptor, periods, resolution, end))
            }))
    }

    fn primary_or_skip(
        &self,
        symbol: &Symbol,
        data_type: DataType,
        resolution: Option<Resolution>,
    ) -> Option<SubscriptionDescriptor> {
        let primary = self
            .resolver
            .resolve(symbol, data_type, resolution)
            .into_iter()
            .next();
        if primary.is_none() {
            debug!(
                symbol = %symbol,
                data_type = %data_type,
                "No subscription of the requested type, skipping symbol"
            );
        }
        primary
    }

    fn typed_range_request(
        &self,
        symbol: &Symbol,
        descriptor: &SubscriptionDescriptor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: Option<Resolution>,
    ) -> HistoryRequest {
        let exchange_hours = self.resolver.market_hours(symbol).exchange_hours;
        let effective = self.resolver.effective_resolution(symbol, resolution);

        self.create_request(
            descriptor,
            start,
            end,
            &exchange_hours,
            resolution,
            effective,
            RequestOverrides::none(),
        )
    }

    fn typed_periods_request(
        &self,
        symbol: &Symbol,
        descriptor: &SubscriptionDescriptor,
        periods: usize,
        resolution: Option<Resolution>,
        end: DateTime<Utc>,
    ) -> HistoryRequest {
        let exchange_hours = self.resolver.market_hours(symbol).exchange_hours;
        let effective = self.resolver.effective_resolution(symbol, resolution);
        let start = self.start_time_for_bar_count(
            symbol,
            periods,
            effective,
            &exchange_hours,
            descriptor.data_time_zone,
            end,
        );

        self.create_request(
            descriptor,
            start,
            end,
            &exchange_hours,
            resolution,
            effective,
            RequestOverrides::none(),
        )
    }

    /// 심볼의 바 개수 기반 시작 시각. 시장 운영 시간 데이터베이스의 데이터 시간대를 씁니다.
    pub fn start_for_periods(
        &self,
        symbol: &Symbol,
        periods: usize,
        resolution: Option<Resolution>,
        end: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, InvalidRequest> {
        if resolution == Some(Resolution::Tick) {
            return Err(InvalidRequest::TickResolutionPeriods);
        }
        let effective = self.resolver.effective_resolution(symbol, resolution);
        let entry = self.resolver.market_hours(symbol);
        Ok(self.start_time_for_bar_count(
            symbol,
            periods,
            effective,
            &entry.exchange_hours,
            entry.data_time_zone,
            end,
        ))
    }

    /// 달력에 바 개수 기반 시작 시각을 묻습니다.
    ///
    /// 틱 구독에서 온 암묵적 틱 해상도는 초 단위 바로 셉니다.
    fn start_time_for_bar_count(
        &self,
        symbol: &Symbol,
        periods: usize,
        resolution: Resolution,
        exchange_hours: &ExchangeHours,
        data_time_zone: chrono_tz::Tz,
        end: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let counted = resolution.coarser(Resolution::Second);
        let start = self.calendar.start_time_for_bar_count(
            symbol,
            periods,
            counted,
            exchange_hours,
            data_time_zone,
            end,
        );
        debug!(
            symbol = %symbol,
            periods,
            resolution = %counted,
            start = %start,
            "Computed bar count start time"
        );
        start
    }

    /// 구독 설명자 하나로 요청을 만듭니다.
    ///
    /// fill-forward는 호출 오버라이드 → 구독 → 유니버스 순으로 결정됩니다.
    /// 호출 오버라이드로 켠 경우에만 유효 해상도를 사용합니다.
    #[allow(clippy::too_many_arguments)]
    fn create_request(
        &self,
        descriptor: &SubscriptionDescriptor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exchange_hours: &ExchangeHours,
        resolution: Option<Resolution>,
        effective: Resolution,
        overrides: RequestOverrides,
    ) -> HistoryRequest {
        let universe = self.resolver.universe();
        let resolution = resolution.unwrap_or(descriptor.resolution);

        let fill_forward_resolution = match Layered::new(universe.fill_forward)
            .subscription(Some(descriptor.fill_forward))
            .call(overrides.fill_forward)
            .resolve_with_source()
        {
            (true, SettingSource::CallOverride) => Some(effective),
            (true, _) => Some(resolution),
            (false, _) => None,
        };

        let include_extended_hours = Layered::new(universe.extended_market_hours)
            .subscription(Some(descriptor.extended_hours))
            .call(overrides.extended_hours)
            .resolve();

        HistoryRequest {
            start_time_utc: start,
            end_time_utc: end,
            data_type: descriptor.data_type,
            symbol: descriptor.symbol.clone(),
            resolution,
            exchange_hours: exchange_hours.clone(),
            data_time_zone: descriptor.data_time_zone,
            fill_forward_resolution,
            include_extended_hours,
            is_custom_data: descriptor.is_custom_data,
            normalization_mode: descriptor.normalization_mode,
            tick_type: descriptor.tick_type,
        }
    }
}
