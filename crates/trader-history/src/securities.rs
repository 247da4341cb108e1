//! 현재 알려진 증권 목록.
//!
//! 워밍업과 "전체 심볼" 과거 데이터 요청의 대상이 되는 심볼을 보관합니다.
//! 순회 순서는 심볼 정렬 순서로 고정되어 같은 입력이 항상 같은 요청 순서를 만듭니다.

use std::collections::{BTreeMap, BTreeSet};
use trader_core::{ExchangeHours, Symbol};

use crate::market_hours::{MarketHoursDatabase, MarketHoursEntry};

/// 증권 레지스트리.
#[derive(Debug, Clone, Default)]
pub struct SecurityRegistry {
    /// 심볼 → 사용자 정의 거래소 운영 시간
    securities: BTreeMap<Symbol, Option<ExchangeHours>>,
    /// 유니버스 선택용 자리표시자 심볼
    universe_symbols: BTreeSet<Symbol>,
}

impl SecurityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 증권을 추가합니다.
    pub fn add(&mut self, symbol: Symbol) {
        self.securities.entry(symbol).or_insert(None);
    }

    /// 사용자 정의 거래소 운영 시간과 함께 증권을 추가합니다.
    pub fn add_with_hours(&mut self, symbol: Symbol, hours: ExchangeHours) {
        self.securities.insert(symbol, Some(hours));
    }

    /// 증권을 제거합니다.
    pub fn remove(&mut self, symbol: &Symbol) -> bool {
        self.securities.remove(symbol).is_some()
    }

    /// 증권이 등록되어 있는지 확인합니다.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.securities.contains_key(symbol)
    }

    /// 등록된 심볼을 정렬 순서로 반환합니다.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.securities.keys()
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    /// 티커로 등록된 심볼을 찾습니다. canonical이 아닌 심볼을 우선합니다.
    pub fn find_by_ticker(&self, ticker: &str) -> Option<&Symbol> {
        let ticker = ticker.to_uppercase();
        let mut matches = self.securities.keys().filter(|s| s.ticker == ticker);
        let first = matches.next()?;
        if !first.is_canonical() {
            return Some(first);
        }
        matches.find(|s| !s.is_canonical()).or(Some(first))
    }

    /// 유니버스 자리표시자 심볼을 등록합니다.
    pub fn add_universe_symbol(&mut self, symbol: Symbol) {
        self.universe_symbols.insert(symbol);
    }

    /// 유니버스 자리표시자 심볼인지 확인합니다.
    pub fn is_universe_symbol(&self, symbol: &Symbol) -> bool {
        self.universe_symbols.contains(symbol)
    }

    /// 심볼의 시장 운영 시간 항목을 반환합니다.
    ///
    /// 사용자 정의 운영 시간이 등록된 증권은 데이터베이스 값을 덮어씁니다.
    /// 데이터 시간대는 항상 데이터베이스 값을 따릅니다.
    pub fn market_hours(&self, db: &dyn MarketHoursDatabase, symbol: &Symbol) -> MarketHoursEntry {
        let entry = db.entry(symbol);
        match self.securities.get(symbol) {
            Some(Some(hours)) => MarketHoursEntry::new(entry.data_time_zone, hours.clone()),
            _ => entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_hours::InMemoryMarketHoursDatabase;
    use chrono_tz::America::New_York;

    #[test]
    fn test_deterministic_order() {
        let mut registry = SecurityRegistry::new();
        registry.add(Symbol::equity("SPY"));
        registry.add(Symbol::equity("AAPL"));
        registry.add(Symbol::equity("MSFT"));
        registry.add(Symbol::equity("AAPL"));

        let tickers: Vec<_> = registry.symbols().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "SPY"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_find_by_ticker_prefers_tradable() {
        let mut registry = SecurityRegistry::new();
        registry.add(Symbol::continuous_future("ES", "cme"));
        registry.add(Symbol::future("ES", "cme"));

        let found = registry.find_by_ticker("es").unwrap();
        assert!(!found.is_canonical());
        assert!(registry.find_by_ticker("NQ").is_none());
    }

    #[test]
    fn test_custom_hours_override() {
        let db = InMemoryMarketHoursDatabase::always_open();
        let spy = Symbol::equity("SPY");
        let custom = ExchangeHours::always_open(New_York);

        let mut registry = SecurityRegistry::new();
        registry.add(spy.clone());
        assert_eq!(registry.market_hours(&db, &spy).exchange_hours.time_zone, chrono_tz::UTC);

        registry.add_with_hours(spy.clone(), custom.clone());
        let entry = registry.market_hours(&db, &spy);
        assert_eq!(entry.exchange_hours, custom);
        assert_eq!(entry.data_time_zone, chrono_tz::UTC);
    }
}
