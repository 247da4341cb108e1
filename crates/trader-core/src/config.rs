//! 설정 관리.
//!
//! 과거 데이터 요청 엔진의 전역 설정을 정의하고 로드합니다.
//! 파일(TOML) 위에 `HISTORY__` 접두사 환경 변수가 덮어씁니다.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::DataNormalizationMode;
use crate::error::CoreResult;
use crate::types::Resolution;

/// 과거 데이터 엔진 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// 유니버스 기본값
    #[serde(default)]
    pub universe: UniverseSettings,
    /// 마지막 알려진 가격 조회 정책
    #[serde(default)]
    pub last_known_price: LastKnownPriceConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 전략 시간대 (데이터 제공자에 전달)
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            universe: UniverseSettings::default(),
            last_known_price: LastKnownPriceConfig::default(),
            logging: LoggingConfig::default(),
            time_zone: default_time_zone(),
        }
    }
}

fn default_time_zone() -> Tz {
    chrono_tz::America::New_York
}

/// 유니버스 전체에 적용되는 구독 기본값.
///
/// 구독이 없는 심볼의 설명자를 합성할 때와, 호출/구독 어디에도 값이 없을 때 쓰입니다.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UniverseSettings {
    /// 기본 해상도
    #[serde(default = "default_resolution")]
    pub resolution: Resolution,
    /// fill-forward 사용 여부
    #[serde(default = "default_true")]
    pub fill_forward: bool,
    /// 연장 거래 시간 포함 여부
    #[serde(default)]
    pub extended_market_hours: bool,
    /// 가격 정규화 방식
    #[serde(default)]
    pub normalization_mode: DataNormalizationMode,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            fill_forward: true,
            extended_market_hours: false,
            normalization_mode: DataNormalizationMode::Adjusted,
        }
    }
}

fn default_resolution() -> Resolution {
    Resolution::Minute
}

fn default_true() -> bool {
    true
}

/// 해상도별 확장 조회 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LookbackBudget {
    /// 적용 해상도
    pub resolution: Resolution,
    /// 바 개수
    pub periods: usize,
}

/// 마지막 알려진 가격 조회 정책.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LastKnownPriceConfig {
    /// 첫 시도의 바 개수
    #[serde(default = "default_initial_periods")]
    pub initial_periods: usize,
    /// 조회 해상도 하한 (이보다 촘촘하게 조회하지 않음)
    #[serde(default = "default_resolution")]
    pub minimum_resolution: Resolution,
    /// 재시도 시 해상도별 바 개수 (앞에서부터 일치하는 첫 항목 사용)
    #[serde(default = "default_escalation")]
    pub escalation: Vec<LookbackBudget>,
    /// `escalation`에 없는 해상도의 재시도 바 개수
    #[serde(default = "default_escalation_periods")]
    pub default_escalation_periods: usize,
}

impl Default for LastKnownPriceConfig {
    fn default() -> Self {
        Self {
            initial_periods: default_initial_periods(),
            minimum_resolution: default_resolution(),
            escalation: default_escalation(),
            default_escalation_periods: default_escalation_periods(),
        }
    }
}

fn default_initial_periods() -> usize {
    5
}

// 약 3 거래일
fn default_escalation() -> Vec<LookbackBudget> {
    vec![
        LookbackBudget {
            resolution: Resolution::Daily,
            periods: 3,
        },
        LookbackBudget {
            resolution: Resolution::Hour,
            periods: 24,
        },
    ]
}

fn default_escalation_periods() -> usize {
    1440
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl HistoryConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("HISTORY")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// TOML 문자열에서 설정을 로드합니다.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HistoryConfig::default();
        assert_eq!(config.universe.resolution, Resolution::Minute);
        assert!(config.universe.fill_forward);
        assert_eq!(config.last_known_price.initial_periods, 5);
        assert_eq!(config.last_known_price.default_escalation_periods, 1440);
        assert_eq!(config.time_zone, chrono_tz::America::New_York);
    }

    #[test]
    fn test_from_toml_str() {
        let toml = r#"
            time_zone = "UTC"

            [universe]
            resolution = "hour"
            fill_forward = false
            normalization_mode = "raw"

            [last_known_price]
            initial_periods = 10
            escalation = [{ resolution = "daily", periods = 5 }]
        "#;

        let config = HistoryConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.time_zone, chrono_tz::UTC);
        assert_eq!(config.universe.resolution, Resolution::Hour);
        assert!(!config.universe.fill_forward);
        assert!(!config.universe.extended_market_hours);
        assert_eq!(config.universe.normalization_mode, DataNormalizationMode::Raw);
        assert_eq!(config.last_known_price.initial_periods, 10);
        assert_eq!(config.last_known_price.escalation.len(), 1);
        assert_eq!(config.last_known_price.minimum_resolution, Resolution::Minute);
        assert_eq!(config.logging.level, "info");
    }
}
