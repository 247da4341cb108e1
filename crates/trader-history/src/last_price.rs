//! 마지막 알려진 가격 조회.
//!
//! 유동성이 낮은 종목도 워밍업/초기 가격 설정에 쓸 관측을 얻도록, 관측 유형별
//! 최신 관측을 점점 넓은 조회 구간으로 찾습니다. 데이터가 없거나 일부만 있는 것은
//! 오류가 아니며 빈/부분 결과로 돌아옵니다.

use std::collections::HashMap;
use tracing::{debug, warn};
use trader_core::{LastKnownPriceConfig, LookbackBudget, MarketData, Resolution, Symbol, TickType};

use crate::builder::RequestBuilder;
use crate::catalog::tick_type_rank;
use crate::dispatch::Dispatcher;

/// 조회 구간 정책.
///
/// 첫 시도는 `initial_periods`개 바, 재시도는 해상도별 예산 목록에서 처음 일치하는 항목을
/// 쓰고 없으면 `default_escalation_periods`를 씁니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookbackPolicy {
    pub initial_periods: usize,
    pub minimum_resolution: Resolution,
    pub escalation: Vec<LookbackBudget>,
    pub default_escalation_periods: usize,
}

impl Default for LookbackPolicy {
    fn default() -> Self {
        Self::from(&LastKnownPriceConfig::default())
    }
}

impl From<&LastKnownPriceConfig> for LookbackPolicy {
    fn from(config: &LastKnownPriceConfig) -> Self {
        Self {
            initial_periods: config.initial_periods,
            minimum_resolution: config.minimum_resolution,
            escalation: config.escalation.clone(),
            default_escalation_periods: config.default_escalation_periods,
        }
    }
}

impl LookbackPolicy {
    /// 조회 해상도. 구독 중 가장 촘촘한 해상도와 하한 중 더 성긴 쪽입니다.
    pub fn base_resolution(&self, highest_subscribed: Option<Resolution>) -> Resolution {
        highest_subscribed.map_or(self.minimum_resolution, |r| r.coarser(self.minimum_resolution))
    }

    /// 재시도 바 개수.
    pub fn escalated_periods(&self, resolution: Resolution) -> usize {
        self.escalation
            .iter()
            .find(|budget| budget.resolution == resolution)
            .map(|budget| budget.periods)
            .unwrap_or(self.default_escalation_periods)
    }
}

/// 마지막 알려진 가격 조회기.
pub struct LastKnownPriceResolver<'a> {
    builder: RequestBuilder<'a>,
    dispatcher: Option<Dispatcher<'a>>,
    policy: &'a LookbackPolicy,
}

impl<'a> LastKnownPriceResolver<'a> {
    /// `dispatcher`가 없으면 (제공자 미설정) 항상 빈 결과를 돌려줍니다.
    pub fn new(
        builder: RequestBuilder<'a>,
        dispatcher: Option<Dispatcher<'a>>,
        policy: &'a LookbackPolicy,
    ) -> Self {
        Self {
            builder,
            dispatcher,
            policy,
        }
    }

    /// 관측 유형별 최신 관측을 시간 오름차순으로 반환합니다.
    pub async fn last_known_prices(&self, symbol: &Symbol) -> Vec<MarketData> {
        let Some(dispatcher) = self.dispatcher else {
            return Vec::new();
        };
        if symbol.is_canonical() {
            return Vec::new();
        }

        let catalog = self.builder.resolver().catalog();
        let resolution = self.policy.base_resolution(catalog.highest_resolution(symbol));
        let mut found = HashMap::new();

        if !self
            .attempt(&dispatcher, symbol, self.policy.initial_periods, resolution, &mut found)
            .await
        {
            // 비유동 종목일 수 있으므로 조회 구간을 넓혀 누락된 관측 유형만 재시도
            let periods = self.policy.escalated_periods(resolution);
            debug!(
                symbol = %symbol,
                resolution = %resolution,
                periods,
                found = found.len(),
                "Escalating last known price lookback"
            );
            self.attempt(&dispatcher, symbol, periods, resolution, &mut found)
                .await;
        }

        let priorities = catalog.available_tick_types(symbol.security_type);
        let mut prices: Vec<_> = found.into_values().collect();
        prices.sort_by_key(|data| (data.time(), tick_type_rank(&priorities, data.tick_type())));
        prices
    }

    /// 우선순위가 가장 높은 관측 유형의 마지막 관측 하나를 반환합니다.
    pub async fn last_known_price(&self, symbol: &Symbol) -> Option<MarketData> {
        let priorities = self
            .builder
            .resolver()
            .catalog()
            .available_tick_types(symbol.security_type);
        self.last_known_prices(symbol)
            .await
            .into_iter()
            .min_by_key(|data| tick_type_rank(&priorities, data.tick_type()))
    }

    /// 조회 한 번. 요청한 모든 관측 유형을 찾았으면 true.
    async fn attempt(
        &self,
        dispatcher: &Dispatcher<'a>,
        symbol: &Symbol,
        periods: usize,
        resolution: Resolution,
        found: &mut HashMap<TickType, MarketData>,
    ) -> bool {
        let requests = match self.builder.bar_count_requests(
            vec![symbol.clone()],
            periods,
            Some(resolution),
            dispatcher.now(),
        ) {
            Ok(requests) => requests
                .filter(|request| !found.contains_key(&request.tick_type))
                .map(|mut request| {
                    // 합성 바가 "데이터 없음"을 가리지 않도록 fill-forward 끔
                    request.fill_forward_resolution = None;
                    request
                })
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "마지막 가격 요청 생성 실패");
                return false;
            }
        };

        if requests.is_empty() {
            return true;
        }

        let slices = match dispatcher.dispatch(requests.clone()).await {
            Ok(slices) => slices,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "마지막 가격 조회 실패, 부분 결과 사용");
                return false;
            }
        };

        for slice in &slices {
            for request in &requests {
                let latest = slice.data.iter().rev().find(|data| {
                    data.symbol() == symbol
                        && request.data_type.is_assignable_from(data.data_type())
                        && data.tick_type() == request.tick_type
                });
                if let Some(data) = latest {
                    found.insert(request.tick_type, data.clone());
                }
            }
        }

        requests.iter().all(|request| found.contains_key(&request.tick_type))
    }
}
