//! 거래소 달력 제공자.
//!
//! 바 개수를 시작 시각으로 바꾸는 외부 협력자입니다. 구현은 이 crate 밖에 있습니다.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use trader_core::{ExchangeHours, Resolution, Symbol};

/// 거래소 달력 trait.
pub trait ExchangeCalendar: Send + Sync {
    /// `end` 시점까지 정확히 `periods`개의 거래 가능한 바가 존재하도록 하는 시작 시각을 계산합니다.
    fn start_time_for_bar_count(
        &self,
        symbol: &Symbol,
        periods: usize,
        resolution: Resolution,
        exchange_hours: &ExchangeHours,
        data_time_zone: Tz,
        end: DateTime<Utc>,
    ) -> DateTime<Utc>;
}
