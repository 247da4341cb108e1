//! 구독 해석기.
//!
//! (심볼, 요청 데이터 타입, 요청 해상도) 조합에 가장 잘 맞는 구독 설명자를 고릅니다.
//! 맞는 구독이 없으면 유니버스 기본값으로 설명자를 합성합니다.
//!
//! # 정렬 규칙
//!
//! 1. 해상도가 촘촘한 것 먼저
//! 2. 증권 유형별 관측 유형 우선순위가 높은 것 먼저 (체결/호가가 미결제약정보다 앞)
//! 3. 내부 피드는 마지막
//!
//! 같은 키끼리는 카탈로그 등록 순서를 유지합니다.

use tracing::debug;
use trader_core::{
    DataType, Resolution, SecurityType, SubscriptionDescriptor, Symbol, TickType, UniverseSettings,
};

use crate::catalog::{tick_type_rank, SubscriptionCatalog};
use crate::error::InvalidRequest;
use crate::market_hours::{MarketHoursDatabase, MarketHoursEntry};
use crate::precedence::Layered;
use crate::securities::SecurityRegistry;

/// 구독 해석기.
#[derive(Clone, Copy)]
pub struct SubscriptionResolver<'a> {
    catalog: &'a dyn SubscriptionCatalog,
    market_hours: &'a dyn MarketHoursDatabase,
    securities: &'a SecurityRegistry,
    universe: &'a UniverseSettings,
}

impl<'a> SubscriptionResolver<'a> {
    pub fn new(
        catalog: &'a dyn SubscriptionCatalog,
        market_hours: &'a dyn MarketHoursDatabase,
        securities: &'a SecurityRegistry,
        universe: &'a UniverseSettings,
    ) -> Self {
        Self {
            catalog,
            market_hours,
            securities,
            universe,
        }
    }

    pub fn catalog(&self) -> &'a dyn SubscriptionCatalog {
        self.catalog
    }

    pub fn universe(&self) -> &'a UniverseSettings {
        self.universe
    }

    /// 심볼의 시장 운영 시간 항목 (증권별 사용자 정의 운영 시간 반영).
    pub fn market_hours(&self, symbol: &Symbol) -> MarketHoursEntry {
        self.securities.market_hours(self.market_hours, symbol)
    }

    /// 실제로 사용할 해상도를 결정합니다.
    ///
    /// 명시적 인자 → (등록된 증권이면) 현재 가장 촘촘한 구독 해상도 → 유니버스 기본값.
    pub fn effective_resolution(
        &self,
        symbol: &Symbol,
        explicit: Option<Resolution>,
    ) -> Resolution {
        let subscribed = if self.securities.contains(symbol) {
            self.catalog.highest_resolution(symbol)
        } else {
            None
        };

        Layered::new(self.universe.resolution)
            .subscription(subscribed)
            .call(explicit)
            .resolve()
    }

    /// 일치하는 구독 설명자를 우선순위 순으로 반환합니다.
    ///
    /// 첫 번째 원소가 단일 결과를 원하는 호출자가 쓰는 "주" 구독입니다.
    /// 기본 데이터 타입 중에도 일치하는 것이 없을 때(예: canonical 심볼)만 비어 있습니다.
    pub fn resolve(
        &self,
        symbol: &Symbol,
        requested: DataType,
        resolution: Option<Resolution>,
    ) -> Vec<SubscriptionDescriptor> {
        let mut descriptors = self.catalog.descriptors(symbol, true);
        let priorities = self.catalog.available_tick_types(symbol.security_type);
        descriptors.sort_by_key(|d| {
            (
                d.resolution,
                tick_type_rank(&priorities, d.tick_type),
                d.is_internal_feed,
            )
        });

        let matching: Vec<_> = descriptors
            .into_iter()
            .filter(|d| type_filter(requested, d.data_type))
            .filter(|d| !excludes_equity_quotes(symbol.security_type, resolution, d.tick_type))
            .collect();

        if !matching.is_empty() {
            return matching;
        }

        self.synthesize(symbol, requested, resolution)
    }

    /// 주 구독 하나를 반환하며, 요청 타입과 일치하는 구독이 없으면 실패합니다.
    pub fn resolve_one(
        &self,
        symbol: &Symbol,
        requested: DataType,
        resolution: Option<Resolution>,
    ) -> Result<SubscriptionDescriptor, InvalidRequest> {
        if let Some(primary) = self.resolve(symbol, requested, resolution).into_iter().next() {
            return Ok(primary);
        }

        let actual = self
            .resolve(symbol, DataType::Base, None)
            .first()
            .map(|d| d.data_type);
        Err(InvalidRequest::TypeMismatch {
            symbol: symbol.clone(),
            requested,
            actual,
            resolution,
        })
    }

    /// 유니버스 기본값으로 구독 설명자를 합성합니다.
    fn synthesize(
        &self,
        symbol: &Symbol,
        requested: DataType,
        resolution: Option<Resolution>,
    ) -> Vec<SubscriptionDescriptor> {
        let entry = self.market_hours(symbol);
        let resolution = self.effective_resolution(symbol, resolution);

        let synthesized: Vec<_> = self
            .catalog
            .default_data_types(symbol.security_type, resolution, symbol.is_canonical())
            .into_iter()
            .filter(|(data_type, _)| type_filter(requested, *data_type))
            .map(|(data_type, tick_type)| {
                SubscriptionDescriptor::new(
                    symbol.clone(),
                    resolution,
                    tick_type,
                    entry.exchange_hours.time_zone,
                )
                .with_data_type(data_type)
                .with_data_time_zone(entry.data_time_zone)
                .with_fill_forward(self.universe.fill_forward)
                .with_extended_hours(self.universe.extended_market_hours)
                .with_normalization_mode(self.universe.normalization_mode)
                // 사용자가 구독한 것이 아니므로 내부 피드로 표시
                .internal()
            })
            .collect();

        debug!(
            symbol = %symbol,
            requested = %requested,
            resolution = %resolution,
            count = synthesized.len(),
            "No matching subscription, synthesized defaults"
        );

        synthesized
    }
}

/// 일반 타입 요청에서는 미결제약정을 명시적으로 요청해야만 포함합니다.
fn type_filter(requested: DataType, candidate: DataType) -> bool {
    requested.is_assignable_from(candidate)
        && !(requested == DataType::Base && candidate == DataType::OpenInterest)
}

/// 주식의 시간봉/일봉 과거 데이터는 체결 기반입니다.
fn excludes_equity_quotes(
    security_type: SecurityType,
    resolution: Option<Resolution>,
    tick_type: TickType,
) -> bool {
    security_type == SecurityType::Equity
        && matches!(resolution, Some(Resolution::Daily) | Some(Resolution::Hour))
        && tick_type == TickType::Quote
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemorySubscriptionCatalog;
    use crate::market_hours::InMemoryMarketHoursDatabase;
    use chrono_tz::America::New_York;

    struct Fixture {
        catalog: InMemorySubscriptionCatalog,
        db: InMemoryMarketHoursDatabase,
        securities: SecurityRegistry,
        universe: UniverseSettings,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: InMemorySubscriptionCatalog::new(),
                db: InMemoryMarketHoursDatabase::always_open(),
                securities: SecurityRegistry::new(),
                universe: UniverseSettings::default(),
            }
        }

        fn subscribe(&mut self, descriptor: SubscriptionDescriptor) {
            self.securities.add(descriptor.symbol.clone());
            self.catalog.add(descriptor);
        }

        fn resolver(&self) -> SubscriptionResolver<'_> {
            SubscriptionResolver::new(&self.catalog, &self.db, &self.securities, &self.universe)
        }
    }

    fn sub(symbol: &Symbol, resolution: Resolution, tick_type: TickType) -> SubscriptionDescriptor {
        SubscriptionDescriptor::new(symbol.clone(), resolution, tick_type, New_York)
    }

    #[test]
    fn test_finest_resolution_first() {
        let spy = Symbol::equity("SPY");
        let mut fx = Fixture::new();
        fx.subscribe(sub(&spy, Resolution::Daily, TickType::Trade));
        fx.subscribe(sub(&spy, Resolution::Second, TickType::Trade));
        fx.subscribe(sub(&spy, Resolution::Minute, TickType::Trade));

        let resolved = fx.resolver().resolve(&spy, DataType::Base, None);
        let resolutions: Vec<_> = resolved.iter().map(|d| d.resolution).collect();
        assert_eq!(
            resolutions,
            vec![Resolution::Second, Resolution::Minute, Resolution::Daily]
        );
    }

    #[test]
    fn test_tick_type_priority_and_internal_last() {
        let es = Symbol::future("ESH4", "cme");
        let mut fx = Fixture::new();
        fx.subscribe(sub(&es, Resolution::Minute, TickType::OpenInterest));
        fx.subscribe(sub(&es, Resolution::Minute, TickType::Trade).internal());
        fx.subscribe(sub(&es, Resolution::Minute, TickType::Trade));
        fx.subscribe(sub(&es, Resolution::Minute, TickType::Quote));

        let resolved = fx.resolver().resolve(&es, DataType::Base, None);
        // 일반 타입 요청에서 미결제약정 제외
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].tick_type, TickType::Quote);
        assert_eq!(resolved[1].tick_type, TickType::Trade);
        assert!(!resolved[1].is_internal_feed);
        assert!(resolved[2].is_internal_feed);

        let oi = fx.resolver().resolve(&es, DataType::OpenInterest, None);
        assert_eq!(oi.len(), 1);
        assert_eq!(oi[0].tick_type, TickType::OpenInterest);
    }

    #[test]
    fn test_equity_daily_excludes_quotes() {
        let spy = Symbol::equity("SPY");
        let mut fx = Fixture::new();
        fx.subscribe(sub(&spy, Resolution::Minute, TickType::Trade));
        fx.subscribe(sub(&spy, Resolution::Minute, TickType::Quote));

        for resolution in [Resolution::Daily, Resolution::Hour] {
            let resolved = fx.resolver().resolve(&spy, DataType::Base, Some(resolution));
            assert!(resolved.iter().all(|d| d.tick_type != TickType::Quote));
            assert!(!resolved.is_empty());
        }

        let minute = fx
            .resolver()
            .resolve(&spy, DataType::Base, Some(Resolution::Minute));
        assert_eq!(minute.len(), 2);
    }

    #[test]
    fn test_equity_quote_only_subscription_falls_back_to_trade_defaults() {
        let spy = Symbol::equity("SPY");
        let mut fx = Fixture::new();
        fx.subscribe(sub(&spy, Resolution::Minute, TickType::Quote));

        let resolved = fx
            .resolver()
            .resolve(&spy, DataType::Base, Some(Resolution::Daily));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].data_type, DataType::TradeBar);
        assert_eq!(resolved[0].resolution, Resolution::Daily);
    }

    #[test]
    fn test_synthesized_defaults_use_universe_settings() {
        let mut fx = Fixture::new();
        fx.universe.fill_forward = false;
        fx.universe.extended_market_hours = true;
        fx.universe.resolution = Resolution::Hour;

        let eurusd = Symbol::forex("EURUSD");
        let resolved = fx.resolver().resolve(&eurusd, DataType::Base, None);
        assert_eq!(resolved.len(), 1);
        let d = &resolved[0];
        assert_eq!(d.data_type, DataType::QuoteBar);
        assert_eq!(d.tick_type, TickType::Quote);
        assert_eq!(d.resolution, Resolution::Hour);
        assert!(!d.fill_forward);
        assert!(d.extended_hours);
        assert_eq!(d.data_time_zone, chrono_tz::UTC);
        assert!(d.is_internal_feed);
        assert!(!d.is_custom_data);
        assert_eq!(d.normalization_mode, fx.universe.normalization_mode);
    }

    #[test]
    fn test_effective_resolution_precedence() {
        let spy = Symbol::equity("SPY");
        let qqq = Symbol::equity("QQQ");
        let mut fx = Fixture::new();
        fx.subscribe(sub(&spy, Resolution::Second, TickType::Trade));
        // 등록되지 않은 증권의 구독은 무시
        fx.catalog.add(sub(&qqq, Resolution::Tick, TickType::Trade));

        let resolver = fx.resolver();
        assert_eq!(
            resolver.effective_resolution(&spy, Some(Resolution::Daily)),
            Resolution::Daily
        );
        assert_eq!(resolver.effective_resolution(&spy, None), Resolution::Second);
        assert_eq!(resolver.effective_resolution(&qqq, None), Resolution::Minute);
    }

    #[test]
    fn test_resolve_one_type_mismatch() {
        let spx = Symbol::index("SPX");
        let mut fx = Fixture::new();
        fx.subscribe(sub(&spx, Resolution::Minute, TickType::Trade));

        let err = fx
            .resolver()
            .resolve_one(&spx, DataType::QuoteBar, Some(Resolution::Minute))
            .unwrap_err();
        assert_eq!(
            err,
            InvalidRequest::TypeMismatch {
                symbol: spx.clone(),
                requested: DataType::QuoteBar,
                actual: Some(DataType::TradeBar),
                resolution: Some(Resolution::Minute),
            }
        );

        let ok = fx.resolver().resolve_one(&spx, DataType::TradeBar, None).unwrap();
        assert_eq!(ok.resolution, Resolution::Minute);
    }
}
