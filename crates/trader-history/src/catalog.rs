//! 구독 카탈로그.
//!
//! 심볼별 활성 구독 설명자 목록을 제공하는 외부 협력자입니다.
//! 이 crate는 카탈로그를 읽기만 합니다.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use trader_core::{DataType, Resolution, SecurityType, SubscriptionDescriptor, Symbol, TickType};

/// 증권 유형별 기본 관측 유형 (앞쪽일수록 우선순위가 높음).
pub fn default_tick_types(security_type: SecurityType) -> Vec<TickType> {
    match security_type {
        SecurityType::Index => vec![TickType::Trade],
        SecurityType::Forex | SecurityType::Cfd => vec![TickType::Quote],
        SecurityType::Equity | SecurityType::Crypto => vec![TickType::Trade, TickType::Quote],
        SecurityType::Future
        | SecurityType::Option
        | SecurityType::IndexOption
        | SecurityType::FutureOption => {
            vec![TickType::Quote, TickType::Trade, TickType::OpenInterest]
        }
    }
}

/// 우선순위 목록에서의 위치. 목록에 없으면 가장 뒤.
pub fn tick_type_rank(priorities: &[TickType], tick_type: TickType) -> usize {
    priorities
        .iter()
        .position(|t| *t == tick_type)
        .unwrap_or(priorities.len())
}

/// 구독 카탈로그 trait.
pub trait SubscriptionCatalog: Send + Sync {
    /// 심볼에 등록된 구독 설명자를 반환합니다.
    ///
    /// `include_internal`이 참이면 내부/보조 피드도 포함합니다.
    fn descriptors(&self, symbol: &Symbol, include_internal: bool) -> Vec<SubscriptionDescriptor>;

    /// 심볼의 현재 가장 촘촘한 구독 해상도를 반환합니다. 구독이 없으면 `None`.
    fn highest_resolution(&self, symbol: &Symbol) -> Option<Resolution> {
        self.descriptors(symbol, false)
            .iter()
            .map(|d| d.resolution)
            .min()
    }

    /// 증권 유형이 지원하는 관측 유형을 우선순위 순으로 반환합니다.
    fn available_tick_types(&self, security_type: SecurityType) -> Vec<TickType> {
        default_tick_types(security_type)
    }

    /// 구독이 없는 심볼에 사용할 기본 (데이터 타입, 관측 유형) 조합을 반환합니다.
    fn default_data_types(
        &self,
        security_type: SecurityType,
        resolution: Resolution,
        canonical: bool,
    ) -> Vec<(DataType, TickType)> {
        if canonical {
            return Vec::new();
        }

        self.available_tick_types(security_type)
            .into_iter()
            .filter(|tick_type| is_valid_configuration(security_type, resolution, *tick_type))
            .map(|tick_type| (DataType::for_tick_type(tick_type, resolution.is_tick()), tick_type))
            .collect()
    }
}

/// 주식의 시간봉/일봉은 체결 데이터만 존재합니다.
pub fn is_valid_configuration(
    security_type: SecurityType,
    resolution: Resolution,
    tick_type: TickType,
) -> bool {
    !(security_type == SecurityType::Equity
        && matches!(resolution, Resolution::Hour | Resolution::Daily)
        && tick_type == TickType::Quote)
}

/// 메모리 기반 구독 카탈로그.
#[derive(Default)]
pub struct InMemorySubscriptionCatalog {
    subscriptions: RwLock<HashMap<Symbol, Vec<SubscriptionDescriptor>>>,
    tick_types: HashMap<SecurityType, Vec<TickType>>,
}

impl InMemorySubscriptionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 증권 유형의 관측 유형 우선순위를 재정의합니다.
    pub fn with_tick_types(
        mut self,
        security_type: SecurityType,
        tick_types: Vec<TickType>,
    ) -> Self {
        self.tick_types.insert(security_type, tick_types);
        self
    }

    /// 구독을 등록합니다. 동일한 설명자가 이미 있으면 무시합니다.
    pub fn add(&self, descriptor: SubscriptionDescriptor) {
        let mut subscriptions = self.subscriptions.write();
        let entry = subscriptions.entry(descriptor.symbol.clone()).or_default();
        if !entry.contains(&descriptor) {
            debug!(subscription = %descriptor, "Subscription added");
            entry.push(descriptor);
        }
    }

    /// 심볼의 모든 구독을 제거합니다.
    pub fn remove(&self, symbol: &Symbol) -> usize {
        self.subscriptions
            .write()
            .remove(symbol)
            .map(|removed| removed.len())
            .unwrap_or(0)
    }
}

impl SubscriptionCatalog for InMemorySubscriptionCatalog {
    fn descriptors(&self, symbol: &Symbol, include_internal: bool) -> Vec<SubscriptionDescriptor> {
        self.subscriptions
            .read()
            .get(symbol)
            .map(|all| {
                all.iter()
                    .filter(|d| include_internal || !d.is_internal_feed)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn available_tick_types(&self, security_type: SecurityType) -> Vec<TickType> {
        self.tick_types
            .get(&security_type)
            .cloned()
            .unwrap_or_else(|| default_tick_types(security_type))
    }
}
