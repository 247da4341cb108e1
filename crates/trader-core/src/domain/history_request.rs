//! 과거 데이터 요청.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{DataNormalizationMode, ExchangeHours};
use crate::types::{DataType, Resolution, Symbol, TickType};

/// 데이터 제공자가 실행할 수 있는 정규화된 과거 데이터 요청.
///
/// 호출마다 새로 만들어지는 값 객체입니다. 시간 범위 조정이 필요하면
/// [`HistoryRequest::with_time_range`]로 새 인스턴스를 만듭니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// 시작 시각 (UTC)
    pub start_time_utc: DateTime<Utc>,
    /// 종료 시각 (UTC)
    pub end_time_utc: DateTime<Utc>,
    /// 데이터 타입
    pub data_type: DataType,
    /// 심볼
    pub symbol: Symbol,
    /// 해상도
    pub resolution: Resolution,
    /// 거래소 운영 시간
    pub exchange_hours: ExchangeHours,
    /// 원천 데이터 시간대
    pub data_time_zone: Tz,
    /// fill-forward 해상도 (`None`이면 fill-forward 하지 않음)
    pub fill_forward_resolution: Option<Resolution>,
    /// 연장 거래 시간 포함 여부
    pub include_extended_hours: bool,
    /// 사용자 정의 데이터 여부
    pub is_custom_data: bool,
    /// 가격 정규화 방식
    pub normalization_mode: DataNormalizationMode,
    /// 관측 유형
    pub tick_type: TickType,
}

impl HistoryRequest {
    /// 시간 범위만 바꾼 새 요청을 반환합니다.
    pub fn with_time_range(
        &self,
        start_time_utc: DateTime<Utc>,
        end_time_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            start_time_utc,
            end_time_utc,
            ..self.clone()
        }
    }

    /// 요청 구간이 비어 있는지(시작 ≥ 종료) 확인합니다.
    pub fn is_empty_range(&self) -> bool {
        self.start_time_utc >= self.end_time_utc
    }
}

impl fmt::Display for HistoryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} [{} .. {}]",
            self.symbol,
            self.data_type,
            self.tick_type,
            self.resolution,
            self.start_time_utc.format("%Y-%m-%d %H:%M:%S"),
            self.end_time_utc.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}
