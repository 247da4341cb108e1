//! 워밍업 스케줄러.
//!
//! 전략이 거래를 시작하기 전에 내부 상태를 채울 과거 데이터 구간을 설정하고,
//! 현재 알려진 모든 심볼에 대한 요청으로 펼칩니다.
//!
//! 설정은 초기화 단계에서만 바꿀 수 있습니다. [`WarmUpScheduler::lock`] 이후의 변경은
//! `InvalidState`로 거부됩니다.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use trader_core::{HistoryRequest, Resolution, Symbol};

use crate::builder::{span_start, RequestBuilder, RequestOverrides};
use crate::error::{HistoryError, Result};

/// 워밍업 구간 설정. 바 개수와 기간 중 하나만 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmUpSpec {
    /// 심볼별 바 개수
    BarCount {
        bars: usize,
        resolution: Option<Resolution>,
    },
    /// 현재 시각 기준 과거 기간
    TimeSpan {
        span: Duration,
        resolution: Option<Resolution>,
    },
}

impl WarmUpSpec {
    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            WarmUpSpec::BarCount { resolution, .. } | WarmUpSpec::TimeSpan { resolution, .. } => {
                *resolution
            }
        }
    }
}

impl fmt::Display for WarmUpSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarmUpSpec::BarCount { bars, .. } => write!(f, "{} bars", bars)?,
            WarmUpSpec::TimeSpan { span, .. } => write!(f, "{}s", span.num_seconds())?,
        }
        if let Some(resolution) = self.resolution() {
            write!(f, " @ {}", resolution)?;
        }
        Ok(())
    }
}

/// 워밍업 종료 알림을 받는 trait.
pub trait WarmUpObserver: Send + Sync {
    /// 워밍업이 끝났을 때 한 번 호출됩니다.
    fn on_warm_up_finished(&self);
}

/// 워밍업 스케줄러.
pub struct WarmUpScheduler {
    spec: Option<WarmUpSpec>,
    locked: bool,
    warming_up: bool,
    observers: Vec<Arc<dyn WarmUpObserver>>,
}

impl Default for WarmUpScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl WarmUpScheduler {
    pub fn new() -> Self {
        Self {
            spec: None,
            locked: false,
            warming_up: true,
            observers: Vec::new(),
        }
    }

    /// 현재 설정.
    pub fn spec(&self) -> Option<WarmUpSpec> {
        self.spec
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_warming_up(&self) -> bool {
        self.warming_up
    }

    /// 바 개수 기반 워밍업을 설정합니다. 기존 기간 설정은 사라집니다.
    pub fn set_bar_count(&mut self, bars: usize, resolution: Option<Resolution>) -> Result<()> {
        self.set(WarmUpSpec::BarCount { bars, resolution })
    }

    /// 기간 기반 워밍업을 설정합니다. 기존 바 개수 설정은 사라집니다.
    pub fn set_time_span(&mut self, span: Duration, resolution: Option<Resolution>) -> Result<()> {
        self.set(WarmUpSpec::TimeSpan { span, resolution })
    }

    fn set(&mut self, spec: WarmUpSpec) -> Result<()> {
        if self.locked {
            return Err(HistoryError::InvalidState(
                "warm up cannot be changed after initialization".to_string(),
            ));
        }
        debug!(spec = %spec, "Warm up configured");
        self.spec = Some(spec);
        Ok(())
    }

    /// 초기화 단계를 끝냅니다. 이후 설정 변경은 실패합니다.
    pub fn lock(&mut self) {
        if !self.locked {
            self.locked = true;
            debug!("Warm up configuration locked");
        }
    }

    /// 워밍업 종료 관찰자를 등록합니다.
    pub fn subscribe(&mut self, observer: Arc<dyn WarmUpObserver>) {
        self.observers.push(observer);
    }

    /// 워밍업 요청을 생성합니다. 설정이 없으면 비어 있습니다.
    ///
    /// `now`는 현재 시뮬레이션 시각이며 기간 모드의 종료 시각이 됩니다.
    pub fn requests<'a>(
        &self,
        builder: RequestBuilder<'a>,
        symbols: Vec<Symbol>,
        now: DateTime<Utc>,
    ) -> Result<Box<dyn Iterator<Item = HistoryRequest> + 'a>> {
        match self.spec {
            Some(WarmUpSpec::BarCount { bars, resolution }) => Ok(Box::new(
                builder.bar_count_requests(symbols, bars, resolution, now)?,
            )),
            Some(WarmUpSpec::TimeSpan { span, resolution }) => Ok(Box::new(
                builder.date_range_requests(
                    symbols,
                    span_start(now, span)?,
                    now,
                    resolution,
                    RequestOverrides::none(),
                ),
            )),
            None => Ok(Box::new(std::iter::empty())),
        }
    }

    /// 워밍업을 끝냅니다. 관찰자에게는 처음 한 번만 알립니다.
    pub fn finish(&mut self) {
        if !self.warming_up {
            return;
        }
        self.warming_up = false;
        info!(observers = self.observers.len(), "Warm up finished");
        for observer in &self.observers {
            observer.on_warm_up_finished();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl WarmUpObserver for CountingObserver {
        fn on_warm_up_finished(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_modes_are_exclusive() {
        let mut scheduler = WarmUpScheduler::new();
        scheduler.set_bar_count(200, None).unwrap();
        scheduler
            .set_time_span(Duration::days(1), Some(Resolution::Hour))
            .unwrap();

        assert_eq!(
            scheduler.spec(),
            Some(WarmUpSpec::TimeSpan {
                span: Duration::days(1),
                resolution: Some(Resolution::Hour)
            })
        );
    }

    #[test]
    fn test_set_after_lock_fails() {
        let mut scheduler = WarmUpScheduler::new();
        scheduler.set_bar_count(10, None).unwrap();
        scheduler.lock();

        let err = scheduler.set_bar_count(20, None).unwrap_err();
        assert!(err.is_invalid_state());
        assert!(scheduler.set_time_span(Duration::hours(1), None).is_err());
        assert_eq!(
            scheduler.spec(),
            Some(WarmUpSpec::BarCount {
                bars: 10,
                resolution: None
            })
        );
    }

    #[test]
    fn test_finish_notifies_once() {
        let observer = Arc::new(CountingObserver::default());
        let mut scheduler = WarmUpScheduler::new();
        scheduler.subscribe(observer.clone());
        assert!(scheduler.is_warming_up());

        scheduler.finish();
        scheduler.finish();

        assert!(!scheduler.is_warming_up());
        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_warm_up_display() {
        let spec = WarmUpSpec::BarCount {
            bars: 50,
            resolution: Some(Resolution::Daily),
        };
        assert_eq!(spec.to_string(), "50 bars @ daily");
    }
}
