//! 거래소 운영 시간.
//!
//! 달력 계산(바 개수 → 시작 시각)은 외부 거래소 달력이 담당합니다.
//! 이 타입은 그 계산에 넘겨지는 값 객체입니다.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// 거래소 운영 시간.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeHours {
    /// 거래소 시간대
    pub time_zone: Tz,
    /// 정규장 시작 (거래소 현지 시각)
    pub market_open: NaiveTime,
    /// 정규장 종료 (거래소 현지 시각, `market_open`보다 작으면 자정을 넘김)
    pub market_close: NaiveTime,
    /// 주말 휴장 여부
    pub closed_on_weekends: bool,
    /// 휴장일
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl ExchangeHours {
    /// 정규장 운영 시간을 생성합니다.
    pub fn regular(time_zone: Tz, market_open: NaiveTime, market_close: NaiveTime) -> Self {
        Self {
            time_zone,
            market_open,
            market_close,
            closed_on_weekends: true,
            holidays: Vec::new(),
        }
    }

    /// 항상 열려 있는 거래소(암호화폐 등)를 생성합니다.
    pub fn always_open(time_zone: Tz) -> Self {
        Self {
            time_zone,
            market_open: NaiveTime::MIN,
            market_close: NaiveTime::MIN,
            closed_on_weekends: false,
            holidays: Vec::new(),
        }
    }

    /// 휴장일을 추가합니다.
    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }

    /// 항상 열려 있는 거래소인지 확인합니다.
    pub fn is_always_open(&self) -> bool {
        !self.closed_on_weekends
            && self.holidays.is_empty()
            && self.market_open == self.market_close
    }

    /// 주어진 날짜(현지)가 거래일인지 확인합니다.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        if self.closed_on_weekends && matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.holidays.contains(&date)
    }

    /// 주어진 시각에 거래소가 열려 있는지 확인합니다.
    pub fn is_open(&self, t: DateTime<Utc>) -> bool {
        let local = t.with_timezone(&self.time_zone);
        if !self.is_trading_day(local.date_naive()) {
            return false;
        }
        if self.market_open == self.market_close {
            return true;
        }
        let time = local.time();
        if self.market_open < self.market_close {
            time >= self.market_open && time < self.market_close
        } else {
            // 자정을 넘기는 세션
            time >= self.market_open || time < self.market_close
        }
    }
}
