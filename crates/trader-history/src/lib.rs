//! # Trader History
//!
//! 전략의 과거 데이터 요청을 실행 가능한 요청으로 바꾸는 엔진입니다.
//!
//! - [`resolver`]: 심볼별 구독 중 요청에 맞는 구독 선택 (없으면 기본값 합성)
//! - [`builder`]: 기간/바 개수 요청을 [`HistoryRequest`](trader_core::HistoryRequest)로 변환
//! - [`guard`]: 현재 시뮬레이션 시각 이후 데이터 차단
//! - [`warmup`]: 워밍업 설정과 요청 생성
//! - [`last_price`]: 관측 유형별 마지막 알려진 가격 조회
//! - [`api`]: 위 구성요소를 묶은 전략용 API
//!
//! 같은 입력은 항상 같은 순서의 같은 요청을 만듭니다.

pub mod api;
pub mod builder;
pub mod calendar;
pub mod catalog;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod last_price;
pub mod market_hours;
pub mod precedence;
pub mod provider;
pub mod resolver;
pub mod securities;
pub mod warmup;

pub use api::{HistoryApi, HistoryWindow};
pub use builder::{span_start, RequestBuilder, RequestOverrides};
pub use calendar::ExchangeCalendar;
pub use catalog::{default_tick_types, InMemorySubscriptionCatalog, SubscriptionCatalog};
pub use clock::{Clock, SimClock};
pub use dispatch::Dispatcher;
pub use error::{HistoryError, InvalidRequest, Result};
pub use guard::{GuardedBatch, LookAheadGuard};
pub use last_price::{LastKnownPriceResolver, LookbackPolicy};
pub use market_hours::{InMemoryMarketHoursDatabase, MarketHoursDatabase, MarketHoursEntry};
pub use precedence::{Layered, SettingSource, PRECEDENCE};
pub use provider::{HistoryProvider, InMemoryHistoryProvider};
pub use resolver::SubscriptionResolver;
pub use securities::SecurityRegistry;
pub use warmup::{WarmUpObserver, WarmUpScheduler, WarmUpSpec};
