//! 드라이버
//!
//! URI 분류 결과에 따라 Direct/Routing 드라이버를 만들고, 두 드라이버를
//! 하나의 [`Driver`]로 감쌉니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::address::{ServerAddress, DEFAULT_HOST, DEFAULT_PORT};
use super::config::{consume_chain, keys, ConfigOptions, PoolConfig, WorkspaceConfig};
use super::error::{DriverError, DriverResult};
use super::pool::{open_failure, ConnectionPool, PoolConnector};
use super::routing::{RouterProbe, RoutingDriver};
use super::session::{Session, SessionConfig};
use super::uri::{apply_security, classify, DriverKind, RoutingContext};

/// 직접 연결 확인에 사용하는 쿼리
const VERIFY_QUERY: &str = "RETURN 1 AS x";

// ============================================================================
// AuthToken - 인증 토큰
// ============================================================================

/// 인증 토큰
#[derive(Debug, Clone, Default)]
pub enum AuthToken {
    /// 인증 없음
    #[default]
    None,
    /// Basic 인증 (사용자명/비밀번호)
    Basic {
        username: String,
        password: String,
        realm: Option<String>,
    },
    /// Bearer 토큰
    Bearer { token: String },
    /// Kerberos 인증
    Kerberos { ticket: String },
    /// 커스텀 인증
    Custom {
        principal: String,
        credentials: String,
        realm: String,
        scheme: String,
        parameters: Option<HashMap<String, String>>,
    },
}

impl AuthToken {
    /// Basic 인증 토큰 생성
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
            realm: None,
        }
    }

    /// Bearer 토큰 생성
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Kerberos 토큰 생성
    pub fn kerberos(ticket: impl Into<String>) -> Self {
        Self::Kerberos {
            ticket: ticket.into(),
        }
    }

    /// 인증 없음
    pub fn none() -> Self {
        Self::None
    }

    /// 인증 스킴
    pub fn scheme(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::Kerberos { .. } => "kerberos",
            Self::Custom { scheme, .. } => scheme,
        }
    }
}

// ============================================================================
// ServerInfo / Connectivity
// ============================================================================

/// 서버 정보
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// 서버 주소
    pub address: ServerAddress,
    /// 서버 에이전트 (예: `Neo4j/5.13.0`)
    pub agent: String,
    /// 협상된 프로토콜 버전
    pub protocol_version: String,
}

/// 연결 확인 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Connectivity {
    /// 직접 연결한 서버
    Server(ServerInfo),
    /// 라우터별 확인 결과 (라우터 순서)
    Routers(Vec<RouterProbe>),
}

// ============================================================================
// DirectDriver - 단일 서버 드라이버
// ============================================================================

/// 대상이 없을 때 사용하는 주소
pub const DEFAULT_TARGET: &str = ":";

/// 단일 서버 드라이버
pub struct DirectDriver {
    pool: Arc<dyn ConnectionPool>,
    address: ServerAddress,
    default_workspace_config: WorkspaceConfig,
    open: RwLock<bool>,
}

impl DirectDriver {
    /// 대상 문자열을 주소로 변환. 빈 대상은 [`DEFAULT_TARGET`]입니다.
    pub fn parse_target(target: &str) -> DriverResult<ServerAddress> {
        let target = if target.trim().is_empty() {
            DEFAULT_TARGET
        } else {
            target
        };
        ServerAddress::parse(target, DEFAULT_HOST, DEFAULT_PORT)
    }

    /// 단일 서버 드라이버 생성
    pub fn open(
        connector: &dyn PoolConnector,
        target: &str,
        auth: &AuthToken,
        options: ConfigOptions,
    ) -> DriverResult<Self> {
        let address = Self::parse_target(target)?;
        let (pool_config, workspace_config): (PoolConfig, WorkspaceConfig) =
            consume_chain(options)?;

        let pool = connector
            .open_direct(&address, auth, &pool_config, &workspace_config)
            .map_err(|e| open_failure(e, &address.to_string()))?;

        info!(
            address = %address,
            encrypted = pool_config.encrypted,
            "Opened direct driver"
        );

        Ok(Self {
            pool,
            address,
            default_workspace_config: workspace_config,
            open: RwLock::new(true),
        })
    }

    /// 서버 주소
    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// 기본 워크스페이스 설정
    pub fn default_workspace_config(&self) -> &WorkspaceConfig {
        &self.default_workspace_config
    }

    /// TLS 암호화 여부
    pub fn encrypted(&self) -> bool {
        self.pool.pool_config().encrypted
    }

    /// 세션 생성
    pub fn session(&self, options: ConfigOptions) -> DriverResult<Session> {
        self.ensure_open()?;
        let config = SessionConfig::consume_over(&self.default_workspace_config, options)?;
        Ok(Session::new(Arc::clone(&self.pool), config))
    }

    /// 멀티 데이터베이스 지원 여부
    pub async fn supports_multi_db(&self) -> DriverResult<bool> {
        let session = self.session(ConfigOptions::new())?;
        let supported = session.supports_multiple_databases().await;
        session.close().await?;
        supported
    }

    /// 연결 확인
    ///
    /// `fetch_size = -1`로 세션을 열어 `RETURN 1 AS x`를 한 번 왕복하고,
    /// 응답한 서버 정보를 반환합니다.
    pub async fn verify_connectivity(&self, mut options: ConfigOptions) -> DriverResult<ServerInfo> {
        self.ensure_open()?;
        options.insert(keys::FETCH_SIZE, -1);

        let session = self.session(options)?;
        let result = session.run(VERIFY_QUERY).await;
        session.close().await?;

        let result = result?;
        let server = result.summary.server.clone();
        result.single()?;
        Ok(server)
    }

    /// 드라이버 종료 (두 번째 호출부터는 아무것도 하지 않음)
    pub async fn close(&self) -> DriverResult<()> {
        {
            let mut open = self.open.write();
            if !*open {
                return Ok(());
            }
            *open = false;
        }
        self.pool.close().await
    }

    /// 열린 상태
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(DriverError::session("Driver is closed"))
        }
    }
}

impl fmt::Debug for DirectDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectDriver")
            .field("address", &self.address)
            .field("open", &*self.open.read())
            .finish()
    }
}

// ============================================================================
// Driver - 드라이버
// ============================================================================

/// 그래프 데이터베이스 드라이버
#[derive(Debug)]
pub enum Driver {
    /// 단일 서버
    Direct(DirectDriver),
    /// 클러스터 라우팅
    Routing(RoutingDriver),
}

impl Driver {
    /// 드라이버 종류
    pub fn kind(&self) -> DriverKind {
        match self {
            Driver::Direct(_) => DriverKind::Direct,
            Driver::Routing(_) => DriverKind::Routing,
        }
    }

    /// 세션 생성
    ///
    /// 옵션은 드라이버의 기본 워크스페이스 설정 위에 적용됩니다.
    pub fn session(&self, options: ConfigOptions) -> DriverResult<Session> {
        match self {
            Driver::Direct(d) => d.session(options),
            Driver::Routing(d) => d.session(options),
        }
    }

    /// 연결 확인
    pub async fn verify_connectivity(&self, options: ConfigOptions) -> DriverResult<Connectivity> {
        match self {
            Driver::Direct(d) => d.verify_connectivity(options).await.map(Connectivity::Server),
            Driver::Routing(d) => d.verify_connectivity(options).await.map(Connectivity::Routers),
        }
    }

    /// 멀티 데이터베이스 지원 여부
    pub async fn supports_multi_db(&self) -> DriverResult<bool> {
        match self {
            Driver::Direct(d) => d.supports_multi_db().await,
            Driver::Routing(d) => d.supports_multi_db().await,
        }
    }

    /// TLS 암호화 여부
    pub fn encrypted(&self) -> bool {
        match self {
            Driver::Direct(d) => d.encrypted(),
            Driver::Routing(d) => d.encrypted(),
        }
    }

    /// 기본 워크스페이스 설정
    pub fn default_workspace_config(&self) -> &WorkspaceConfig {
        match self {
            Driver::Direct(d) => d.default_workspace_config(),
            Driver::Routing(d) => d.default_workspace_config(),
        }
    }

    /// 열린 상태
    pub fn is_open(&self) -> bool {
        match self {
            Driver::Direct(d) => d.is_open(),
            Driver::Routing(d) => d.is_open(),
        }
    }

    /// 드라이버 종료
    pub async fn close(&self) -> DriverResult<()> {
        match self {
            Driver::Direct(d) => d.close().await,
            Driver::Routing(d) => d.close().await,
        }
    }
}

impl From<DirectDriver> for Driver {
    fn from(driver: DirectDriver) -> Self {
        Driver::Direct(driver)
    }
}

impl From<RoutingDriver> for Driver {
    fn from(driver: RoutingDriver) -> Self {
        Driver::Routing(driver)
    }
}

// ============================================================================
// GraphDatabase - 드라이버 팩토리
// ============================================================================

/// 드라이버 팩토리
///
/// 풀 구현([`PoolConnector`])을 받아 URI 또는 대상 주소로 드라이버를 만듭니다.
pub struct GraphDatabase<C> {
    connector: C,
}

impl<C: PoolConnector> GraphDatabase<C> {
    /// 새 팩토리 생성
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// 풀 생성자
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// URI로 드라이버 생성
    ///
    /// 스킴이 드라이버 종류와 보안 모드를 결정합니다. 보안 스킴(`+s`, `+ssc`)에
    /// `encrypted` 또는 `trusted_certificates`를 함께 지정하면 설정 오류입니다.
    pub fn driver(&self, uri: &str, auth: AuthToken, mut options: ConfigOptions) -> DriverResult<Driver> {
        let (kind, security, parsed) = classify(uri)?;
        apply_security(security, &mut options)?;
        let routing_context = parsed.routing_context()?;

        match kind {
            DriverKind::Direct => {
                if !routing_context.is_empty() {
                    return Err(DriverError::invalid_argument(format!(
                        "Routing parameters are not supported with scheme \"{}\". Given URI \"{}\".",
                        parsed.scheme, uri
                    )));
                }
                self.direct_driver(&parsed.netloc, auth, options).map(Driver::Direct)
            }
            DriverKind::Routing => self
                .routing_driver(&[parsed.netloc.as_str()], auth, routing_context, options)
                .map(Driver::Routing),
        }
    }

    /// 단일 서버 드라이버 생성
    pub fn direct_driver(
        &self,
        target: &str,
        auth: AuthToken,
        options: ConfigOptions,
    ) -> DriverResult<DirectDriver> {
        DirectDriver::open(&self.connector, target, &auth, options)
    }

    /// 라우팅 드라이버 생성
    pub fn routing_driver<S: AsRef<str>>(
        &self,
        targets: &[S],
        auth: AuthToken,
        routing_context: RoutingContext,
        options: ConfigOptions,
    ) -> DriverResult<RoutingDriver> {
        RoutingDriver::open(&self.connector, targets, &auth, routing_context, options)
    }
}

impl<C> fmt::Debug for GraphDatabase<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphDatabase").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
