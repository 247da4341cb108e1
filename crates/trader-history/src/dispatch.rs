//! 요청 디스패치.
//!
//! 생성된 요청을 데이터 제공자에 넘기기 직전 단계입니다.
//!
//! 1. 유니버스 자리표시자 심볼 요청 제거
//! 2. 미래 시각 차단 ([`LookAheadGuard`])
//! 3. 제공자 호출
//!
//! 요청 순서는 끝까지 유지됩니다.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, instrument};
use trader_core::{HistoryRequest, Slice};

use crate::error::Result;
use crate::guard::{GuardedBatch, LookAheadGuard};
use crate::provider::HistoryProvider;
use crate::securities::SecurityRegistry;

/// 요청 디스패처.
#[derive(Clone, Copy)]
pub struct Dispatcher<'a> {
    provider: &'a dyn HistoryProvider,
    securities: &'a SecurityRegistry,
    time_zone: Tz,
    now: DateTime<Utc>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        provider: &'a dyn HistoryProvider,
        securities: &'a SecurityRegistry,
        time_zone: Tz,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            provider,
            securities,
            time_zone,
            now,
        }
    }

    /// 현재 시뮬레이션 시각.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// 제공자에 넘길 최종 요청을 준비합니다.
    pub fn prepare<I>(&self, requests: I) -> GuardedBatch
    where
        I: IntoIterator<Item = HistoryRequest>,
    {
        let securities = self.securities;
        LookAheadGuard::new(self.now).apply(
            requests
                .into_iter()
                .filter(|request| !securities.is_universe_symbol(&request.symbol)),
        )
    }

    /// 요청을 준비한 뒤 제공자를 호출합니다.
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn dispatch<I>(&self, requests: I) -> Result<Vec<Slice>>
    where
        I: IntoIterator<Item = HistoryRequest>,
    {
        let batch = self.prepare(requests);
        debug!(
            requests = batch.requests.len(),
            clipped = batch.clipped,
            "Dispatching history requests"
        );
        self.provider.get_history(&batch.requests, self.time_zone).await
    }
}
