//! 설정 우선순위 체인.
//!
//! 호출별 오버라이드, 심볼 구독, 유니버스 기본값이 겹칠 때 어떤 값을 쓸지 결정합니다.
//! 우선순위는 [`PRECEDENCE`] 배열 하나에만 정의됩니다.

use std::fmt;

/// 설정 값의 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingSource {
    /// 호출 인자로 전달된 오버라이드
    CallOverride,
    /// 심볼의 활성 구독
    Subscription,
    /// 유니버스 기본값
    Universe,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingSource::CallOverride => write!(f, "call"),
            SettingSource::Subscription => write!(f, "subscription"),
            SettingSource::Universe => write!(f, "universe"),
        }
    }
}

/// 가장 구체적인 출처가 먼저 옵니다.
pub const PRECEDENCE: [SettingSource; 3] = [
    SettingSource::CallOverride,
    SettingSource::Subscription,
    SettingSource::Universe,
];

/// 출처별 후보 값을 모은 설정 하나.
///
/// 유니버스 값은 항상 존재하므로 해석은 실패하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layered<T> {
    call: Option<T>,
    subscription: Option<T>,
    universe: T,
}

impl<T: Copy> Layered<T> {
    /// 유니버스 기본값으로 시작합니다.
    pub fn new(universe: T) -> Self {
        Self {
            call: None,
            subscription: None,
            universe,
        }
    }

    /// 호출별 오버라이드를 설정합니다.
    pub fn call(mut self, value: Option<T>) -> Self {
        self.call = value;
        self
    }

    /// 구독에서 온 값을 설정합니다.
    pub fn subscription(mut self, value: Option<T>) -> Self {
        self.subscription = value;
        self
    }

    fn layer(&self, source: SettingSource) -> Option<T> {
        match source {
            SettingSource::CallOverride => self.call,
            SettingSource::Subscription => self.subscription,
            SettingSource::Universe => Some(self.universe),
        }
    }

    /// 우선순위에 따라 값을 결정하고 그 출처를 함께 반환합니다.
    pub fn resolve_with_source(&self) -> (T, SettingSource) {
        PRECEDENCE
            .iter()
            .find_map(|source| self.layer(*source).map(|value| (value, *source)))
            .unwrap_or((self.universe, SettingSource::Universe))
    }

    /// 우선순위에 따라 값을 결정합니다.
    pub fn resolve(&self) -> T {
        self.resolve_with_source().0
    }
}
