//! 과거 데이터 요청 전반에서 사용되는 공통 타입.

mod resolution;
mod symbol;
mod tick_type;

pub use resolution::*;
pub use symbol::*;
pub use tick_type::*;
