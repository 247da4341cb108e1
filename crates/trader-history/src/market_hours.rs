//! 시장 운영 시간 데이터베이스.

use chrono_tz::Tz;
use std::collections::HashMap;
use trader_core::{ExchangeHours, SecurityType, Symbol};

/// 심볼의 데이터 시간대와 거래소 운영 시간.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketHoursEntry {
    /// 원천 데이터 시간대
    pub data_time_zone: Tz,
    /// 거래소 운영 시간
    pub exchange_hours: ExchangeHours,
}

impl MarketHoursEntry {
    pub fn new(data_time_zone: Tz, exchange_hours: ExchangeHours) -> Self {
        Self {
            data_time_zone,
            exchange_hours,
        }
    }
}

/// 시장 운영 시간 데이터베이스 trait.
pub trait MarketHoursDatabase: Send + Sync {
    /// 심볼의 운영 시간 항목을 반환합니다.
    fn entry(&self, symbol: &Symbol) -> MarketHoursEntry;
}

/// 메모리 기반 시장 운영 시간 데이터베이스.
///
/// 조회 순서: 심볼별 항목 → (시장, 증권 유형)별 항목 → 기본 항목.
pub struct InMemoryMarketHoursDatabase {
    default_entry: MarketHoursEntry,
    by_market: HashMap<(String, SecurityType), MarketHoursEntry>,
    by_symbol: HashMap<Symbol, MarketHoursEntry>,
}

impl InMemoryMarketHoursDatabase {
    /// 기본 항목으로 데이터베이스를 생성합니다.
    pub fn new(default_entry: MarketHoursEntry) -> Self {
        Self {
            default_entry,
            by_market: HashMap::new(),
            by_symbol: HashMap::new(),
        }
    }

    /// 항상 열려 있는 UTC 거래소를 기본값으로 하는 데이터베이스를 생성합니다.
    pub fn always_open() -> Self {
        Self::new(MarketHoursEntry::new(
            chrono_tz::UTC,
            ExchangeHours::always_open(chrono_tz::UTC),
        ))
    }

    /// 시장/증권 유형 항목을 등록합니다.
    pub fn with_market(
        mut self,
        market: impl Into<String>,
        security_type: SecurityType,
        entry: MarketHoursEntry,
    ) -> Self {
        self.by_market
            .insert((market.into().to_lowercase(), security_type), entry);
        self
    }

    /// 심볼 항목을 등록합니다.
    pub fn with_symbol(mut self, symbol: Symbol, entry: MarketHoursEntry) -> Self {
        self.by_symbol.insert(symbol, entry);
        self
    }
}

impl MarketHoursDatabase for InMemoryMarketHoursDatabase {
    fn entry(&self, symbol: &Symbol) -> MarketHoursEntry {
        self.by_symbol
            .get(symbol)
            .or_else(|| {
                self.by_market
                    .get(&(symbol.market.clone(), symbol.security_type))
            })
            .unwrap_or(&self.default_entry)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use chrono_tz::America::{Chicago, New_York};

    #[test]
    fn test_entry_lookup_order() {
        let nyse = MarketHoursEntry::new(
            New_York,
            ExchangeHours::regular(
                New_York,
                NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            ),
        );
        let special = MarketHoursEntry::new(Chicago, ExchangeHours::always_open(Chicago));

        let db = InMemoryMarketHoursDatabase::always_open()
            .with_market("usa", SecurityType::Equity, nyse.clone())
            .with_symbol(Symbol::equity("GME"), special.clone());

        assert_eq!(db.entry(&Symbol::equity("SPY")), nyse);
        assert_eq!(db.entry(&Symbol::equity("GME")), special);
        assert_eq!(db.entry(&Symbol::forex("EURUSD")).data_time_zone, chrono_tz::UTC);
    }
}
