//! 과거 데이터 해상도 정의.
//!
//! 해상도는 가장 촘촘한 `Tick`부터 가장 성긴 `Daily`까지 전순서를 가집니다.
//! `Ord` 비교에서 작은 값이 더 촘촘한(높은) 해상도입니다.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 바 해상도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// 틱 단위 (바 아님)
    Tick,
    /// 초봉
    Second,
    /// 분봉
    Minute,
    /// 시간봉
    Hour,
    /// 일봉
    Daily,
}

impl Resolution {
    /// 바 하나의 길이를 반환합니다. 틱은 길이가 없습니다.
    pub fn bar_duration(&self) -> Duration {
        match self {
            Resolution::Tick => Duration::zero(),
            Resolution::Second => Duration::seconds(1),
            Resolution::Minute => Duration::minutes(1),
            Resolution::Hour => Duration::hours(1),
            Resolution::Daily => Duration::days(1),
        }
    }

    /// 두 해상도 중 더 성긴 쪽을 반환합니다.
    pub fn coarser(self, other: Resolution) -> Resolution {
        self.max(other)
    }

    /// 틱 해상도인지 확인합니다.
    pub fn is_tick(&self) -> bool {
        matches!(self, Resolution::Tick)
    }

    /// 진단 메시지용 이름 (`Daily`, `Minute` 등).
    pub fn name(&self) -> &'static str {
        match self {
            Resolution::Tick => "Tick",
            Resolution::Second => "Second",
            Resolution::Minute => "Minute",
            Resolution::Hour => "Hour",
            Resolution::Daily => "Daily",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resolution::Tick => "tick",
            Resolution::Second => "second",
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
            Resolution::Daily => "daily",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tick" => Ok(Resolution::Tick),
            "second" | "1s" => Ok(Resolution::Second),
            "minute" | "1m" => Ok(Resolution::Minute),
            "hour" | "1h" => Ok(Resolution::Hour),
            "daily" | "day" | "1d" => Ok(Resolution::Daily),
            _ => Err(CoreError::Parse(format!("Invalid resolution: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        assert!(Resolution::Tick < Resolution::Second);
        assert!(Resolution::Minute < Resolution::Daily);
        assert!(Resolution::Hour < Resolution::Daily);
        assert_eq!(Resolution::Second.coarser(Resolution::Minute), Resolution::Minute);
        assert_eq!(Resolution::Daily.coarser(Resolution::Minute), Resolution::Daily);
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("Daily".parse::<Resolution>().unwrap(), Resolution::Daily);
        assert_eq!("1m".parse::<Resolution>().unwrap(), Resolution::Minute);
        assert!("weekly".parse::<Resolution>().is_err());
        assert_eq!(Resolution::Hour.bar_duration(), Duration::hours(1));
        assert_eq!(Resolution::Daily.to_string(), "daily");
        assert_eq!(Resolution::Daily.name(), "Daily");
    }
}
