//! 세션
//!
//! 세션 설정 계층과 auto-commit 쿼리 실행

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::config::{keys, ConfigLayer, ConfigOptions, WorkspaceConfig};
use super::driver::ServerInfo;
use super::error::{DriverError, DriverResult};
use super::pool::ConnectionPool;
use super::record::Record;

// ============================================================================
// AccessMode - 접근 모드
// ============================================================================

/// 접근 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// 읽기
    Read,
    /// 쓰기
    #[default]
    Write,
}

impl AccessMode {
    /// 문자열에서 변환 (`READ`/`WRITE`, 대소문자 무시)
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("READ") {
            Some(Self::Read)
        } else if s.eq_ignore_ascii_case("WRITE") {
            Some(Self::Write)
        } else {
            None
        }
    }

    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
        }
    }
}

// ============================================================================
// Bookmark - 북마크
// ============================================================================

/// 인과적 일관성 북마크
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bookmark {
    value: String,
}

impl Bookmark {
    /// 새 북마크 생성
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// 북마크 값
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for Bookmark {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Bookmark {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// SessionConfig - 세션 계층
// ============================================================================

/// 세션 설정
///
/// 드라이버의 [`WorkspaceConfig`] 위에 세션 옵션을 덮어쓴 결과입니다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionConfig {
    /// 워크스페이스 설정
    pub workspace: WorkspaceConfig,
    /// 북마크
    pub bookmarks: Vec<Bookmark>,
    /// 기본 접근 모드
    pub default_access_mode: AccessMode,
}

impl SessionConfig {
    /// 드라이버 기본값 위에 옵션을 적용합니다.
    ///
    /// `defaults`는 변경되지 않습니다. 세션이 인식하지 못하는 키가 남으면 오류입니다.
    pub fn consume_over(defaults: &WorkspaceConfig, mut options: ConfigOptions) -> DriverResult<Self> {
        let config = Self::take_over(defaults, &mut options)?;
        options.ensure_consumed()?;
        Ok(config)
    }

    fn take_over(defaults: &WorkspaceConfig, options: &mut ConfigOptions) -> DriverResult<Self> {
        let workspace = WorkspaceConfig::take_over(defaults, options)?;

        let bookmarks = options
            .take_string_list(keys::BOOKMARKS)?
            .unwrap_or_default()
            .into_iter()
            .map(Bookmark::new)
            .collect();

        let default_access_mode = match options.take_string(keys::DEFAULT_ACCESS_MODE)? {
            Some(mode) => AccessMode::parse(&mode).ok_or_else(|| {
                DriverError::configuration(format!(
                    "Config option '{}' expects READ or WRITE, got \"{}\"",
                    keys::DEFAULT_ACCESS_MODE,
                    mode
                ))
            })?,
            None => AccessMode::default(),
        };

        Ok(Self {
            workspace,
            bookmarks,
            default_access_mode,
        })
    }

    /// 데이터베이스 이름
    pub fn database(&self) -> Option<&str> {
        self.workspace.database.as_deref()
    }
}

impl ConfigLayer for SessionConfig {
    const KEYS: &'static [&'static str] = &[
        keys::CONNECTION_ACQUISITION_TIMEOUT,
        keys::MAX_TRANSACTION_RETRY_TIME,
        keys::INITIAL_RETRY_DELAY,
        keys::RETRY_DELAY_MULTIPLIER,
        keys::RETRY_DELAY_JITTER_FACTOR,
        keys::DATABASE,
        keys::FETCH_SIZE,
        keys::IMPERSONATED_USER,
        keys::BOOKMARKS,
        keys::DEFAULT_ACCESS_MODE,
    ];

    fn take_from(options: &mut ConfigOptions) -> DriverResult<Self> {
        Self::take_over(&WorkspaceConfig::default(), options)
    }
}

// ============================================================================
// Query - 쿼리
// ============================================================================

/// 쿼리
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// 쿼리 텍스트
    pub text: String,
}

impl Query {
    /// 새 쿼리 생성
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// QueryResult - 쿼리 결과
// ============================================================================

/// 결과 요약
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSummary {
    /// 응답한 서버
    pub server: ServerInfo,
    /// 쿼리를 실행한 데이터베이스
    pub database: Option<String>,
}

/// 쿼리 결과 (모두 수신된 레코드)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// 컬럼 키
    pub keys: Vec<String>,
    /// 레코드
    pub records: Vec<Record>,
    /// 결과 요약
    pub summary: ResultSummary,
}

impl QueryResult {
    /// 새 결과 생성
    pub fn new(keys: Vec<String>, records: Vec<Record>, summary: ResultSummary) -> Self {
        Self {
            keys,
            records,
            summary,
        }
    }

    /// 정확히 한 레코드를 꺼냅니다.
    pub fn single(mut self) -> DriverResult<Record> {
        match self.records.len() {
            1 => Ok(self.records.remove(0)),
            0 => Err(DriverError::ResultNotSingle(
                "No records found. Make sure your query returns exactly one record.".into(),
            )),
            n => Err(DriverError::ResultNotSingle(format!(
                "Expected a result with a single record, but found {} records.",
                n
            ))),
        }
    }
}

// ============================================================================
// Session - 세션
// ============================================================================

/// 데이터베이스 세션
pub struct Session {
    pool: Arc<dyn ConnectionPool>,
    config: SessionConfig,
    open: RwLock<bool>,
}

impl Session {
    /// 새 세션 생성
    pub fn new(pool: Arc<dyn ConnectionPool>, config: SessionConfig) -> Self {
        Self {
            pool,
            config,
            open: RwLock::new(true),
        }
    }

    /// 쿼리 실행 (auto-commit)
    ///
    /// 세션의 기본 접근 모드로 연결을 획득하고, 결과를 모두 받은 뒤 연결을 반환합니다.
    pub async fn run(&self, query: impl Into<Query>) -> DriverResult<QueryResult> {
        self.ensure_open()?;
        let query = query.into();

        let mut conn = self
            .pool
            .acquire(
                self.config.default_access_mode,
                self.config.database(),
                self.config.workspace.connection_acquisition_timeout,
            )
            .await?;

        let result = conn.run(&query, &self.config).await;
        self.pool.release(conn);
        result
    }

    /// 읽기 연결을 획득해 서버가 멀티 데이터베이스를 지원하는지 확인합니다.
    pub(crate) async fn supports_multiple_databases(&self) -> DriverResult<bool> {
        self.ensure_open()?;

        let conn = self
            .pool
            .acquire(
                AccessMode::Read,
                self.config.database(),
                self.config.workspace.connection_acquisition_timeout,
            )
            .await?;
        let supported = conn.supports_multiple_databases();
        self.pool.release(conn);

        Ok(supported)
    }

    /// 세션 설정
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 세션 닫기
    pub async fn close(&self) -> DriverResult<()> {
        *self.open.write() = false;
        Ok(())
    }

    /// 열린 상태
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(DriverError::session("Session is closed"))
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.config.database())
            .field("access_mode", &self.config.default_access_mode)
            .field("open", &*self.open.read())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
