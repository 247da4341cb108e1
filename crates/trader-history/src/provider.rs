//! 과거 데이터 제공자.
//!
//! 요청 목록을 실행해 시간순 슬라이스를 돌려주는 외부 협력자입니다.
//! 이 서브시스템에서 유일하게 대기가 일어나는 경계입니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use trader_core::{HistoryRequest, MarketData, Resolution, Slice, Symbol};

use crate::error::{HistoryError, Result};

/// 과거 데이터 제공자 trait.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// 제공자 이름.
    fn name(&self) -> &str;

    /// 요청을 실행합니다.
    ///
    /// 결과 슬라이스는 시간 오름차순이며, 같은 시각의 관측은 요청 순서를 따릅니다.
    /// `time_zone`은 전략 시간대입니다.
    async fn get_history(&self, requests: &[HistoryRequest], time_zone: Tz) -> Result<Vec<Slice>>;
}

/// 메모리에 적재된 관측을 재생하는 제공자.
///
/// 관측은 (심볼, 해상도)별로 종료 시각 순서로 보관되며, 요청의 `(start, end]` 구간에
/// 종료 시각이 들어오고 데이터 타입/관측 유형이 일치하는 것만 돌려줍니다.
/// 일중 해상도에서 연장 거래 시간을 포함하지 않는 요청은 정규장 관측만 받습니다.
#[derive(Default)]
pub struct InMemoryHistoryProvider {
    data: RwLock<HashMap<(Symbol, Resolution), BTreeMap<DateTime<Utc>, Vec<MarketData>>>>,
    /// 받은 요청 배치 기록
    batches: Mutex<Vec<Vec<HistoryRequest>>>,
    /// 설정되면 모든 호출이 이 메시지로 실패
    failure: Mutex<Option<String>>,
}

impl InMemoryHistoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 해상도별 관측을 적재합니다.
    pub fn load(
        &self,
        resolution: Resolution,
        observations: impl IntoIterator<Item = MarketData>,
    ) {
        let mut data = self.data.write();
        let mut loaded = 0usize;
        for observation in observations {
            data.entry((observation.symbol().clone(), resolution))
                .or_default()
                .entry(observation.end_time())
                .or_default()
                .push(observation);
            loaded += 1;
        }
        debug!(resolution = %resolution, loaded, "Observations loaded");
    }

    /// 이후 호출이 실패하도록 설정합니다. `None`이면 해제.
    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.lock() = message;
    }

    /// 지금까지 받은 요청 배치.
    pub fn batches(&self) -> Vec<Vec<HistoryRequest>> {
        self.batches.lock().clone()
    }

    /// 지금까지 받은 요청을 하나의 목록으로.
    pub fn requests(&self) -> Vec<HistoryRequest> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    fn matching(&self, request: &HistoryRequest) -> Vec<MarketData> {
        if request.is_empty_range() {
            return Vec::new();
        }

        let data = self.data.read();
        let Some(series) = data.get(&(request.symbol.clone(), request.resolution)) else {
            return Vec::new();
        };

        let hours = &request.exchange_hours;
        let regular_only = !request.include_extended_hours
            && request.resolution < Resolution::Daily
            && !hours.is_always_open();

        series
            .range(request.start_time_utc..=request.end_time_utc)
            .filter(|(end_time, _)| **end_time > request.start_time_utc)
            .flat_map(|(_, observations)| observations.iter())
            .filter(|o| {
                request.data_type.is_assignable_from(o.data_type())
                    && o.tick_type() == request.tick_type
            })
            .filter(|o| !regular_only || hours.is_open(o.time()))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoryProvider for InMemoryHistoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn get_history(
        &self,
        requests: &[HistoryRequest],
        _time_zone: Tz,
    ) -> Result<Vec<Slice>> {
        self.batches.lock().push(requests.to_vec());

        if let Some(message) = self.failure.lock().clone() {
            return Err(HistoryError::Provider(message));
        }

        let mut slices: BTreeMap<DateTime<Utc>, Slice> = BTreeMap::new();
        for request in requests {
            for observation in self.matching(request) {
                let time = observation.end_time();
                slices
                    .entry(time)
                    .or_insert_with(|| Slice::new(time))
                    .push(observation);
            }
        }

        Ok(slices.into_values().collect())
    }
}
