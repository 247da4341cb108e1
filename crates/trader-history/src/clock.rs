//! 시뮬레이션 시계.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// 현재 시뮬레이션 시각을 제공하는 trait.
pub trait Clock: Send + Sync {
    /// 현재 UTC 시각.
    fn utc_now(&self) -> DateTime<Utc>;
}

/// 백테스트 드라이버가 직접 설정/전진시키는 시계.
pub struct SimClock {
    cur: RwLock<DateTime<Utc>>,
}

impl SimClock {
    /// `start` 시각에서 시작하는 시계를 생성합니다.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            cur: RwLock::new(start),
        }
    }

    /// 시각을 `t`로 설정합니다.
    pub fn set(&self, t: DateTime<Utc>) {
        *self.cur.write() = t;
    }

    /// 시각을 `by`만큼 전진시킵니다.
    pub fn advance(&self, by: Duration) {
        let mut w = self.cur.write();
        *w += by;
    }
}

impl Clock for SimClock {
    fn utc_now(&self) -> DateTime<Utc> {
        *self.cur.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sim_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        let clock = SimClock::new(start);
        assert_eq!(clock.utc_now(), start);

        clock.advance(Duration::minutes(5));
        assert_eq!(clock.utc_now(), start + Duration::minutes(5));

        clock.set(start);
        assert_eq!(clock.utc_now(), start);
    }
}
