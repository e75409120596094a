//! 설정 계층
//!
//! 하나의 평면 옵션 집합([`ConfigOptions`])을 타입이 있는 계층으로 나눕니다.
//! 각 계층은 자신이 인식하는 키를 꺼내 가고, 마지막 계층 이후에 남은 키는
//! [`DriverError::UnknownConfigurationOption`]이 됩니다. 오타가 난 옵션은
//! 조용히 무시되지 않고 드라이버 생성 시점에 드러납니다.
//!
//! | 계층 | 타입 | 생성 시점 |
//! |------|------|-----------|
//! | 풀 | [`PoolConfig`] | 드라이버 생성 |
//! | 워크스페이스 | [`WorkspaceConfig`] | 드라이버 생성 |
//! | 세션 | [`SessionConfig`](super::SessionConfig) | 세션 생성 |
//!
//! # 예시
//!
//! ```rust
//! use bolt_connect::driver::{consume_chain, ConfigOptions, PoolConfig, WorkspaceConfig};
//!
//! let options = ConfigOptions::new()
//!     .with("max_connection_pool_size", 50)
//!     .with("database", "movies");
//!
//! let (pool, workspace): (PoolConfig, WorkspaceConfig) = consume_chain(options).unwrap();
//! assert_eq!(pool.max_connection_pool_size, 50);
//! assert_eq!(workspace.database.as_deref(), Some("movies"));
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{DriverError, DriverResult};
use super::types::Value;

/// 옵션 키 이름
pub mod keys {
    /// TLS 암호화 여부
    pub const ENCRYPTED: &str = "encrypted";
    /// 신뢰할 인증서 목록
    pub const TRUSTED_CERTIFICATES: &str = "trusted_certificates";
    /// 연결 타임아웃 (초)
    pub const CONNECTION_TIMEOUT: &str = "connection_timeout";
    /// 라우팅 테이블 갱신 타임아웃 (초)
    pub const UPDATE_ROUTING_TABLE_TIMEOUT: &str = "update_routing_table_timeout";
    /// Keep-Alive
    pub const KEEP_ALIVE: &str = "keep_alive";
    /// 연결 최대 수명 (초)
    pub const MAX_CONNECTION_LIFETIME: &str = "max_connection_lifetime";
    /// 연결 풀 최대 크기
    pub const MAX_CONNECTION_POOL_SIZE: &str = "max_connection_pool_size";
    /// User Agent
    pub const USER_AGENT: &str = "user_agent";

    /// 연결 획득 타임아웃 (초)
    pub const CONNECTION_ACQUISITION_TIMEOUT: &str = "connection_acquisition_timeout";
    /// 최대 트랜잭션 재시도 시간 (초)
    pub const MAX_TRANSACTION_RETRY_TIME: &str = "max_transaction_retry_time";
    /// 첫 재시도 지연 (초)
    pub const INITIAL_RETRY_DELAY: &str = "initial_retry_delay";
    /// 재시도 지연 배수
    pub const RETRY_DELAY_MULTIPLIER: &str = "retry_delay_multiplier";
    /// 재시도 지연 지터 비율
    pub const RETRY_DELAY_JITTER_FACTOR: &str = "retry_delay_jitter_factor";
    /// 데이터베이스 이름
    pub const DATABASE: &str = "database";
    /// Fetch Size
    pub const FETCH_SIZE: &str = "fetch_size";
    /// 임퍼손트 사용자
    pub const IMPERSONATED_USER: &str = "impersonated_user";

    /// 북마크
    pub const BOOKMARKS: &str = "bookmarks";
    /// 기본 접근 모드
    pub const DEFAULT_ACCESS_MODE: &str = "default_access_mode";
}

// ============================================================================
// ConfigOptions - 평면 옵션 집합
// ============================================================================

/// 평면 옵션 집합
///
/// serde로 역직렬화할 수 있어 설정 파일에서 그대로 읽어 올 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigOptions {
    entries: BTreeMap<String, Value>,
}

impl ConfigOptions {
    /// 빈 옵션 집합 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 옵션 추가 (빌더)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// 옵션 추가. 이전 값을 반환합니다.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// 키가 없을 때만 추가
    ///
    /// 추가했으면 true를 반환합니다.
    pub fn insert_default(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_string(), value.into());
        true
    }

    /// 옵션 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// 키 존재 여부
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 옵션 제거
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// 키 목록 (정렬됨)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// 옵션 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 빈 집합 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 남은 키가 없는지 확인
    pub fn ensure_consumed(&self) -> DriverResult<()> {
        if self.entries.is_empty() {
            Ok(())
        } else {
            Err(DriverError::unknown_options(self.keys()))
        }
    }

    fn take_with<T>(
        &mut self,
        key: &str,
        expected: &str,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> DriverResult<Option<T>> {
        match self.entries.remove(key) {
            None => Ok(None),
            Some(value) => convert(&value).map(Some).ok_or_else(|| {
                DriverError::configuration(format!(
                    "Config option '{}' expects {}, got {}",
                    key, expected, value
                ))
            }),
        }
    }

    pub(crate) fn take_bool(&mut self, key: &str) -> DriverResult<Option<bool>> {
        self.take_with(key, "a boolean", Value::as_bool)
    }

    pub(crate) fn take_int(&mut self, key: &str) -> DriverResult<Option<i64>> {
        self.take_with(key, "an integer", Value::as_int)
    }

    pub(crate) fn take_usize(&mut self, key: &str) -> DriverResult<Option<usize>> {
        self.take_with(key, "a non-negative integer", |v| {
            v.as_int().and_then(|i| usize::try_from(i).ok())
        })
    }

    pub(crate) fn take_float(&mut self, key: &str) -> DriverResult<Option<f64>> {
        self.take_with(key, "a number", Value::as_float)
    }

    pub(crate) fn take_duration(&mut self, key: &str) -> DriverResult<Option<Duration>> {
        self.take_with(key, "a non-negative number of seconds", Value::as_duration)
    }

    pub(crate) fn take_string(&mut self, key: &str) -> DriverResult<Option<String>> {
        self.take_with(key, "a string", |v| v.as_str().map(str::to_string))
    }

    /// 문자열 또는 null. null은 "설정 안 함"입니다.
    pub(crate) fn take_optional_string(&mut self, key: &str) -> DriverResult<Option<Option<String>>> {
        self.take_with(key, "a string or null", |v| match v {
            Value::Null => Some(None),
            Value::String(s) => Some(Some(s.clone())),
            _ => None,
        })
    }

    /// 문자열 목록. 단일 문자열은 한 원소 목록으로 취급합니다.
    pub(crate) fn take_string_list(&mut self, key: &str) -> DriverResult<Option<Vec<String>>> {
        self.take_with(key, "a list of strings", |v| match v {
            Value::String(s) => Some(vec![s.clone()]),
            Value::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for ConfigOptions {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

// ============================================================================
// ConfigLayer - 설정 계층
// ============================================================================

/// 설정 계층
pub trait ConfigLayer: Sized {
    /// 이 계층이 인식하는 키
    const KEYS: &'static [&'static str];

    /// 인식하는 키를 모두 꺼내 계층을 만듭니다. 남은 키는 검사하지 않습니다.
    fn take_from(options: &mut ConfigOptions) -> DriverResult<Self>;

    /// 단일 계층으로 소비. 남은 키가 있으면 오류입니다.
    fn consume(mut options: ConfigOptions) -> DriverResult<Self> {
        let layer = Self::take_from(&mut options)?;
        options.ensure_consumed()?;
        Ok(layer)
    }
}

/// 순서가 있는 계층 체인
///
/// 튜플 원소 순서대로 소비합니다. 앞 계층이 꺼낸 키는 뒤 계층에 보이지 않습니다.
pub trait ConfigChain: Sized {
    /// 체인의 모든 계층이 키를 꺼냅니다.
    fn take_chain(options: &mut ConfigOptions) -> DriverResult<Self>;
}

macro_rules! impl_config_chain {
    ($($layer:ident),+) => {
        impl<$($layer: ConfigLayer),+> ConfigChain for ($($layer,)+) {
            fn take_chain(options: &mut ConfigOptions) -> DriverResult<Self> {
                Ok(($($layer::take_from(options)?,)+))
            }
        }
    };
}

impl_config_chain!(A);
impl_config_chain!(A, B);
impl_config_chain!(A, B, C);

/// 옵션 집합을 계층 체인으로 나눕니다.
///
/// 마지막 계층 이후 남은 키가 있으면
/// [`DriverError::UnknownConfigurationOption`]을 반환합니다.
pub fn consume_chain<C: ConfigChain>(mut options: ConfigOptions) -> DriverResult<C> {
    let layers = C::take_chain(&mut options)?;
    options.ensure_consumed()?;
    Ok(layers)
}

// ============================================================================
// TrustStrategy - TLS 신뢰 전략
// ============================================================================

/// TLS 신뢰 전략
///
/// `trusted_certificates` 옵션에서 결정됩니다. 옵션이 없으면 시스템 CA,
/// 빈 목록이면 모든 인증서(자체 서명 포함), 경로 목록이면 해당 CA만 신뢰합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrustStrategy {
    /// 시스템 인증서 사용
    #[default]
    TrustSystemCas,
    /// 모든 인증서 신뢰
    TrustAllCertificates,
    /// 특정 인증서만 신뢰
    TrustCustomCas {
        /// 인증서 파일 경로
        certificates: Vec<PathBuf>,
    },
}

impl TrustStrategy {
    fn from_certificates(certificates: Vec<String>) -> Self {
        if certificates.is_empty() {
            Self::TrustAllCertificates
        } else {
            Self::TrustCustomCas {
                certificates: certificates.into_iter().map(PathBuf::from).collect(),
            }
        }
    }
}

// ============================================================================
// PoolConfig - 풀 계층
// ============================================================================

/// 연결 풀 설정
///
/// | 키 | 기본값 |
/// |----|--------|
/// | `connection_timeout` | 30초 |
/// | `update_routing_table_timeout` | 90초 |
/// | `keep_alive` | true |
/// | `max_connection_lifetime` | 1시간 |
/// | `max_connection_pool_size` | 100 |
/// | `encrypted` | false |
/// | `trusted_certificates` | 시스템 CA |
/// | `user_agent` | `bolt-connect/<버전>` |
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// 연결 타임아웃
    pub connection_timeout: Duration,
    /// 라우팅 테이블 갱신 타임아웃
    pub update_routing_table_timeout: Duration,
    /// Keep-Alive 활성화
    pub keep_alive: bool,
    /// 연결 최대 수명
    pub max_connection_lifetime: Duration,
    /// 연결 풀 최대 크기
    pub max_connection_pool_size: usize,
    /// TLS 암호화
    pub encrypted: bool,
    /// TLS 신뢰 전략
    pub trust_strategy: TrustStrategy,
    /// User Agent
    pub user_agent: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            update_routing_table_timeout: Duration::from_secs(90),
            keep_alive: true,
            max_connection_lifetime: Duration::from_secs(3600),
            max_connection_pool_size: 100,
            encrypted: false,
            trust_strategy: TrustStrategy::default(),
            user_agent: format!("bolt-connect/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ConfigLayer for PoolConfig {
    const KEYS: &'static [&'static str] = &[
        keys::CONNECTION_TIMEOUT,
        keys::UPDATE_ROUTING_TABLE_TIMEOUT,
        keys::KEEP_ALIVE,
        keys::MAX_CONNECTION_LIFETIME,
        keys::MAX_CONNECTION_POOL_SIZE,
        keys::ENCRYPTED,
        keys::TRUSTED_CERTIFICATES,
        keys::USER_AGENT,
    ];

    fn take_from(options: &mut ConfigOptions) -> DriverResult<Self> {
        let mut config = Self::default();

        if let Some(v) = options.take_duration(keys::CONNECTION_TIMEOUT)? {
            config.connection_timeout = v;
        }
        if let Some(v) = options.take_duration(keys::UPDATE_ROUTING_TABLE_TIMEOUT)? {
            config.update_routing_table_timeout = v;
        }
        if let Some(v) = options.take_bool(keys::KEEP_ALIVE)? {
            config.keep_alive = v;
        }
        if let Some(v) = options.take_duration(keys::MAX_CONNECTION_LIFETIME)? {
            config.max_connection_lifetime = v;
        }
        if let Some(v) = options.take_usize(keys::MAX_CONNECTION_POOL_SIZE)? {
            config.max_connection_pool_size = v;
        }
        if let Some(v) = options.take_bool(keys::ENCRYPTED)? {
            config.encrypted = v;
        }
        if let Some(v) = options.take_string_list(keys::TRUSTED_CERTIFICATES)? {
            config.trust_strategy = TrustStrategy::from_certificates(v);
        }
        if let Some(v) = options.take_string(keys::USER_AGENT)? {
            config.user_agent = v;
        }

        Ok(config)
    }
}

// ============================================================================
// WorkspaceConfig - 워크스페이스 계층
// ============================================================================

/// 워크스페이스 설정
///
/// 드라이버가 만드는 모든 세션의 기본값입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceConfig {
    /// 연결 획득 타임아웃
    pub connection_acquisition_timeout: Duration,
    /// 최대 트랜잭션 재시도 시간
    pub max_transaction_retry_time: Duration,
    /// 첫 재시도 지연
    pub initial_retry_delay: Duration,
    /// 재시도 지연 배수
    pub retry_delay_multiplier: f64,
    /// 재시도 지연 지터 비율
    pub retry_delay_jitter_factor: f64,
    /// 데이터베이스 이름 (None이면 서버 기본 데이터베이스)
    pub database: Option<String>,
    /// Fetch Size (-1이면 전체)
    pub fetch_size: i64,
    /// 임퍼손트 사용자
    pub impersonated_user: Option<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            connection_acquisition_timeout: Duration::from_secs(60),
            max_transaction_retry_time: Duration::from_secs(30),
            initial_retry_delay: Duration::from_secs(1),
            retry_delay_multiplier: 2.0,
            retry_delay_jitter_factor: 0.2,
            database: None,
            fetch_size: 1000,
            impersonated_user: None,
        }
    }
}

impl WorkspaceConfig {
    /// `base` 위에 옵션의 워크스페이스 키를 덮어씁니다. `base`는 변경되지 않습니다.
    pub fn take_over(base: &Self, options: &mut ConfigOptions) -> DriverResult<Self> {
        let mut config = base.clone();

        if let Some(v) = options.take_duration(keys::CONNECTION_ACQUISITION_TIMEOUT)? {
            config.connection_acquisition_timeout = v;
        }
        if let Some(v) = options.take_duration(keys::MAX_TRANSACTION_RETRY_TIME)? {
            config.max_transaction_retry_time = v;
        }
        if let Some(v) = options.take_duration(keys::INITIAL_RETRY_DELAY)? {
            config.initial_retry_delay = v;
        }
        if let Some(v) = options.take_float(keys::RETRY_DELAY_MULTIPLIER)? {
            config.retry_delay_multiplier = v;
        }
        if let Some(v) = options.take_float(keys::RETRY_DELAY_JITTER_FACTOR)? {
            config.retry_delay_jitter_factor = v;
        }
        if let Some(v) = options.take_optional_string(keys::DATABASE)? {
            config.database = v;
        }
        if let Some(v) = options.take_int(keys::FETCH_SIZE)? {
            config.fetch_size = v;
        }
        if let Some(v) = options.take_optional_string(keys::IMPERSONATED_USER)? {
            config.impersonated_user = v;
        }

        Ok(config)
    }
}

impl ConfigLayer for WorkspaceConfig {
    const KEYS: &'static [&'static str] = &[
        keys::CONNECTION_ACQUISITION_TIMEOUT,
        keys::MAX_TRANSACTION_RETRY_TIME,
        keys::INITIAL_RETRY_DELAY,
        keys::RETRY_DELAY_MULTIPLIER,
        keys::RETRY_DELAY_JITTER_FACTOR,
        keys::DATABASE,
        keys::FETCH_SIZE,
        keys::IMPERSONATED_USER,
    ];

    fn take_from(options: &mut ConfigOptions) -> DriverResult<Self> {
        Self::take_over(&Self::default(), options)
    }
}

// ============================================================================
// Tests
// ============================================================================
