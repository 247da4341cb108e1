//! # Trader Core
//!
//! 과거 데이터 요청 엔진이 공유하는 도메인 모델 및 타입을 제공합니다:
//! - 심볼, 해상도, 관측 유형, 데이터 타입
//! - 구독 설명자와 과거 데이터 요청
//! - 거래소 운영 시간
//! - 시장 데이터 관측과 슬라이스
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
