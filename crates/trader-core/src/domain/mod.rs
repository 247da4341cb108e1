//! 과거 데이터 요청을 위한 도메인 모델.

mod exchange_hours;
mod history_request;
mod market_data;
mod subscription;

pub use exchange_hours::*;
pub use history_request::*;
pub use market_data::*;
pub use subscription::*;
