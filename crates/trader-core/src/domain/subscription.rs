//! 구독 설명자.
//!
//! 심볼을 구독할 때 생성되며 이후에는 읽기 전용입니다.
//! 소유권은 구독 카탈로그에 있습니다.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{DataType, Resolution, Symbol, TickType};

/// 가격 정규화 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataNormalizationMode {
    /// 원시 가격
    Raw,
    /// 분할/배당 모두 반영
    #[default]
    Adjusted,
    /// 분할만 반영
    SplitAdjusted,
    /// 총수익 기준
    TotalReturn,
}

impl fmt::Display for DataNormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataNormalizationMode::Raw => write!(f, "raw"),
            DataNormalizationMode::Adjusted => write!(f, "adjusted"),
            DataNormalizationMode::SplitAdjusted => write!(f, "split_adjusted"),
            DataNormalizationMode::TotalReturn => write!(f, "total_return"),
        }
    }
}

/// 활성 구독 하나를 설명하는 값.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionDescriptor {
    /// 데이터 타입
    pub data_type: DataType,
    /// 심볼
    pub symbol: Symbol,
    /// 해상도
    pub resolution: Resolution,
    /// 원천 데이터의 시간대
    pub data_time_zone: Tz,
    /// 거래소 시간대
    pub exchange_time_zone: Tz,
    /// fill-forward 사용 여부
    pub fill_forward: bool,
    /// 연장 거래 시간 포함 여부
    pub extended_hours: bool,
    /// 사용자 정의 데이터 여부
    pub is_custom_data: bool,
    /// 내부(보조) 피드 여부
    pub is_internal_feed: bool,
    /// 관측 유형
    pub tick_type: TickType,
    /// 가격 정규화 방식
    pub normalization_mode: DataNormalizationMode,
}

impl SubscriptionDescriptor {
    /// 기본 옵션으로 새 구독 설명자를 생성합니다.
    ///
    /// 데이터 타입은 관측 유형과 해상도로부터 결정되며,
    /// 두 시간대는 모두 `time_zone`으로 설정됩니다.
    pub fn new(symbol: Symbol, resolution: Resolution, tick_type: TickType, time_zone: Tz) -> Self {
        Self {
            data_type: DataType::for_tick_type(tick_type, resolution.is_tick()),
            symbol,
            resolution,
            data_time_zone: time_zone,
            exchange_time_zone: time_zone,
            fill_forward: true,
            extended_hours: false,
            is_custom_data: false,
            is_internal_feed: false,
            tick_type,
            normalization_mode: DataNormalizationMode::Adjusted,
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_fill_forward(mut self, fill_forward: bool) -> Self {
        self.fill_forward = fill_forward;
        self
    }

    pub fn with_extended_hours(mut self, extended_hours: bool) -> Self {
        self.extended_hours = extended_hours;
        self
    }

    pub fn with_data_time_zone(mut self, data_time_zone: Tz) -> Self {
        self.data_time_zone = data_time_zone;
        self
    }

    pub fn with_normalization_mode(mut self, mode: DataNormalizationMode) -> Self {
        self.normalization_mode = mode;
        self
    }

    /// 내부 피드로 표시합니다.
    pub fn internal(mut self) -> Self {
        self.is_internal_feed = true;
        self
    }

    /// 사용자 정의 데이터로 표시합니다.
    pub fn custom(mut self) -> Self {
        self.is_custom_data = true;
        self
    }
}

impl fmt::Display for SubscriptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}{}",
            self.symbol,
            self.data_type,
            self.resolution,
            self.tick_type,
            if self.is_internal_feed { ",internal" } else { "" }
        )
    }
}
