//! 미래 데이터 차단.
//!
//! 시뮬레이션 현재 시각 이후로 뻗은 요청을 잘라, 재생 중인 전략에 미래 데이터가
//! 흘러들지 않게 합니다. 요청을 데이터 제공자에 넘기기 직전에 한 번 적용됩니다.

use chrono::{DateTime, Utc};
use tracing::debug;
use trader_core::HistoryRequest;

/// 차단을 거친 요청 묶음.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedBatch {
    /// 입력과 같은 순서의 요청
    pub requests: Vec<HistoryRequest>,
    /// 잘린 요청 수
    pub clipped: usize,
}

/// 미래 시각 차단기.
#[derive(Debug, Clone, Copy)]
pub struct LookAheadGuard {
    now: DateTime<Utc>,
}

impl LookAheadGuard {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// 요청 하나를 자릅니다. 자를 필요가 없으면 `None`.
    ///
    /// 종료가 현재 이후면 종료를 현재로, 시작까지 현재 이후면 시작도 현재로 옮겨
    /// 범위가 뒤집히지 않은 빈 요청을 만듭니다.
    pub fn clip(&self, request: &HistoryRequest) -> Option<HistoryRequest> {
        if request.end_time_utc <= self.now {
            return None;
        }
        let start = request.start_time_utc.min(self.now);
        Some(request.with_time_range(start, self.now))
    }

    /// 요청 묶음 전체에 적용합니다. 순서는 유지됩니다.
    ///
    /// 잘린 요청이 하나라도 있으면 묶음당 한 번만 알립니다.
    pub fn apply<I>(&self, requests: I) -> GuardedBatch
    where
        I: IntoIterator<Item = HistoryRequest>,
    {
        let mut clipped = 0;
        let requests = requests
            .into_iter()
            .map(|request| match self.clip(&request) {
                Some(rewritten) => {
                    if clipped == 0 {
                        debug!(
                            now = %self.now,
                            request = %request,
                            "Request end time is in the future, clipping to current time"
                        );
                    }
                    clipped += 1;
                    rewritten
                }
                None => request,
            })
            .collect();

        GuardedBatch { requests, clipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;
    use trader_core::{
        DataNormalizationMode, DataType, ExchangeHours, Resolution, Symbol, TickType,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap()
    }

    fn request(ticker: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> HistoryRequest {
        HistoryRequest {
            start_time_utc: start,
            end_time_utc: end,
            data_type: DataType::TradeBar,
            symbol: Symbol::equity(ticker),
            resolution: Resolution::Minute,
            exchange_hours: ExchangeHours::always_open(chrono_tz::UTC),
            data_time_zone: chrono_tz::UTC,
            fill_forward_resolution: Some(Resolution::Minute),
            include_extended_hours: false,
            is_custom_data: false,
            normalization_mode: DataNormalizationMode::Adjusted,
            tick_type: TickType::Trade,
        }
    }

    #[test]
    fn test_end_in_future_is_clipped() {
        let guard = LookAheadGuard::new(now());
        let start = now() - Duration::hours(2);
        let clipped = guard
            .clip(&request("SPY", start, now() + Duration::hours(1)))
            .unwrap();

        assert_eq!(clipped.start_time_utc, start);
        assert_eq!(clipped.end_time_utc, now());
    }

    #[test]
    fn test_start_in_future_becomes_empty_range() {
        let guard = LookAheadGuard::new(now());
        let clipped = guard
            .clip(&request("SPY", now() + Duration::hours(1), now() + Duration::hours(2)))
            .unwrap();

        assert_eq!(clipped.start_time_utc, now());
        assert_eq!(clipped.end_time_utc, now());
        assert!(clipped.is_empty_range());
    }

    #[test]
    fn test_past_request_untouched() {
        let guard = LookAheadGuard::new(now());
        assert!(guard.clip(&request("SPY", now() - Duration::days(1), now())).is_none());
    }

    #[test]
    fn test_batch_preserves_order() {
        let guard = LookAheadGuard::new(now());
        let batch = guard.apply(vec![
            request("AAPL", now() - Duration::days(1), now() + Duration::days(1)),
            request("MSFT", now() - Duration::days(1), now()),
            request("SPY", now() + Duration::days(1), now() + Duration::days(2)),
        ]);

        assert_eq!(batch.clipped, 2);
        let tickers: Vec<_> = batch
            .requests
            .iter()
            .map(|r| r.symbol.ticker.as_str())
            .collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "SPY"]);
    }

    /// 이 모듈이 낸 이벤트 수를 센다.
    struct GuardEvents(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for GuardEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target().starts_with("trader_history::guard") {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn apply_counting_events(requests: Vec<HistoryRequest>) -> (GuardedBatch, usize) {
        let events = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(GuardEvents(events.clone()));
        let batch = tracing::subscriber::with_default(subscriber, || {
            LookAheadGuard::new(now()).apply(requests)
        });
        (batch, events.load(Ordering::SeqCst))
    }

    #[test]
    fn test_single_notice_per_batch() {
        let (batch, events) = apply_counting_events(vec![
            request("AAPL", now() - Duration::hours(1), now() + Duration::hours(1)),
            request("MSFT", now() - Duration::hours(1), now()),
            request("SPY", now() + Duration::hours(1), now() + Duration::hours(2)),
        ]);
        assert_eq!(batch.clipped, 2);
        assert_eq!(events, 1);

        let (batch, events) = apply_counting_events(vec![request(
            "SPY",
            now() - Duration::hours(1),
            now(),
        )]);
        assert_eq!(batch.clipped, 0);
        assert_eq!(events, 0);
    }

    proptest! {
        #[test]
        fn prop_no_request_reaches_past_now(
            ranges in prop::collection::vec((-10_000i64..10_000, 0i64..10_000), 0..20)
        ) {
            let guard = LookAheadGuard::new(now());
            let input: Vec<_> = ranges
                .iter()
                .map(|(offset, width)| {
                    let start = now() + Duration::minutes(*offset);
                    request("SPY", start, start + Duration::minutes(*width))
                })
                .collect();

            let batch = guard.apply(input.clone());
            prop_assert_eq!(batch.requests.len(), input.len());

            for (unclipped, guarded) in input.iter().zip(&batch.requests) {
                prop_assert!(guarded.end_time_utc <= now());
                prop_assert!(guarded.start_time_utc <= guarded.end_time_utc);
                if unclipped.end_time_utc <= now() {
                    prop_assert_eq!(unclipped, guarded);
                } else if unclipped.start_time_utc <= now() {
                    prop_assert_eq!(guarded.start_time_utc, unclipped.start_time_utc);
                }
            }
        }
    }
}
