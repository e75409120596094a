//! 라우팅 드라이버
//!
//! 초기 라우터 집합으로 클러스터에 연결합니다. 라우팅 테이블 관리는 풀이 담당하고,
//! 드라이버는 세션 생성과 연결 확인(라우터 팬아웃)을 제공합니다.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::table::RoutingInfo;
use crate::driver::address::{ServerAddress, DEFAULT_HOST, DEFAULT_PORT};
use crate::driver::config::{consume_chain, ConfigOptions, PoolConfig, WorkspaceConfig};
use crate::driver::driver::AuthToken;
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::pool::{open_failure, PoolConnector, RoutingPool};
use crate::driver::session::{Session, SessionConfig};
use crate::driver::uri::{RoutingContext, RESERVED_CONTEXT_KEY};

/// 대상이 없을 때 사용하는 초기 라우터
pub const DEFAULT_TARGETS: &str = ": :17601 :17687";

/// 라우터 한 곳의 확인 결과
///
/// 응답이 없거나 실패한 라우터는 `routing_info`가 None입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterProbe {
    /// 라우터 주소
    pub address: ServerAddress,
    /// 라우팅 정보
    pub routing_info: Option<RoutingInfo>,
}

/// 라우팅 드라이버
pub struct RoutingDriver {
    pool: Arc<dyn RoutingPool>,
    initial_addresses: Vec<ServerAddress>,
    routing_context: RoutingContext,
    default_workspace_config: WorkspaceConfig,
    open: RwLock<bool>,
}

impl RoutingDriver {
    /// 대상 목록을 초기 라우터 주소로 변환
    ///
    /// 대상이 비어 있으면 [`DEFAULT_TARGETS`]를 사용합니다.
    pub fn parse_targets<S: AsRef<str>>(targets: &[S]) -> DriverResult<Vec<ServerAddress>> {
        let addresses = ServerAddress::parse_list(targets, DEFAULT_HOST, DEFAULT_PORT)?;
        if addresses.is_empty() {
            return ServerAddress::parse_list(&[DEFAULT_TARGETS], DEFAULT_HOST, DEFAULT_PORT);
        }
        Ok(addresses)
    }

    /// 라우팅 드라이버 생성
    pub fn open<S: AsRef<str>>(
        connector: &dyn PoolConnector,
        targets: &[S],
        auth: &AuthToken,
        routing_context: RoutingContext,
        options: ConfigOptions,
    ) -> DriverResult<Self> {
        let addresses = Self::parse_targets(targets)?;

        if routing_context.contains_key(RESERVED_CONTEXT_KEY) {
            return Err(DriverError::configuration(format!(
                "The key '{}' is reserved for routing context.",
                RESERVED_CONTEXT_KEY
            )));
        }

        let (pool_config, workspace_config): (PoolConfig, WorkspaceConfig) =
            consume_chain(options)?;

        let pool = connector
            .open_routing(
                &addresses,
                auth,
                &routing_context,
                &pool_config,
                &workspace_config,
            )
            .map_err(|e| open_failure(e, &display_addresses(&addresses)))?;

        let initial_addresses = pool.default_database_initial_router_addresses();
        info!(
            routers = %display_addresses(&initial_addresses),
            encrypted = pool_config.encrypted,
            "Opened routing driver"
        );

        Ok(Self {
            pool,
            initial_addresses,
            routing_context,
            default_workspace_config: workspace_config,
            open: RwLock::new(true),
        })
    }

    /// 초기 라우터 주소
    pub fn initial_addresses(&self) -> &[ServerAddress] {
        &self.initial_addresses
    }

    /// 라우팅 컨텍스트
    pub fn routing_context(&self) -> &RoutingContext {
        &self.routing_context
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
        Ok(Session::new(Arc::clone(&self.pool).into_connection_pool(), config))
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
    /// 현재 라우팅 테이블의 모든 라우터에 동시에 라우팅 정보를 요청합니다.
    /// 한 곳이라도 응답하면 성공입니다. 라우터별 `ServiceUnavailable`,
    /// `SessionExpired`, 서버 에러는 해당 라우터의 실패로만 기록하고,
    /// 그 밖의 에러는 그대로 반환합니다.
    ///
    /// 옵션은 워크스페이스 키만 받습니다. 라우팅 정보 요청에는 북마크와 접근 모드가
    /// 쓰이지 않으므로 `bookmarks`, `default_access_mode`는
    /// [`DriverError::UnknownConfigurationOption`]입니다.
    pub async fn verify_connectivity(&self, mut options: ConfigOptions) -> DriverResult<Vec<RouterProbe>> {
        self.ensure_open()?;
        let workspace = WorkspaceConfig::take_over(&self.default_workspace_config, &mut options)?;
        options.ensure_consumed()?;
        let timeout = workspace.connection_acquisition_timeout;

        let routers = self.pool.routing_table_for_default_database().routers;
        debug!(routers = routers.len(), "Verifying connectivity of routing servers");

        let results = join_all(
            routers
                .iter()
                .map(|router| self.probe_router(router, &workspace, timeout)),
        )
        .await;

        let mut probes = Vec::with_capacity(routers.len());
        for (address, result) in routers.into_iter().zip(results) {
            let routing_info = match result {
                Ok(info) => info,
                Err(
                    e @ (DriverError::ServiceUnavailable(_)
                    | DriverError::SessionExpired(_)
                    | DriverError::Server { .. }),
                ) => {
                    debug!(router = %address, error = %e, "Router did not answer");
                    None
                }
                Err(e) => return Err(e),
            };
            probes.push(RouterProbe {
                address,
                routing_info,
            });
        }

        if probes.iter().all(|p| p.routing_info.is_none()) {
            warn!(routers = probes.len(), "No routing server answered");
            return Err(DriverError::service_unavailable(
                "Could not connect to any routing servers.",
            ));
        }

        Ok(probes)
    }

    async fn probe_router(
        &self,
        router: &ServerAddress,
        workspace: &WorkspaceConfig,
        timeout: Duration,
    ) -> DriverResult<Option<RoutingInfo>> {
        let fetch = self.pool.fetch_routing_info(
            router,
            workspace.database.as_deref(),
            workspace.impersonated_user.as_deref(),
            &[],
            timeout,
        );

        match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::service_unavailable(format!(
                "Timed out after {:?} fetching routing info from {}",
                timeout, router
            ))),
        }
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

impl fmt::Debug for RoutingDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingDriver")
            .field("initial_addresses", &self.initial_addresses)
            .field("routing_context", &self.routing_context)
            .field("open", &*self.open.read())
            .finish()
    }
}

fn display_addresses(addresses: &[ServerAddress]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::keys;
    use crate::driver::routing::ServerRole;
    use crate::driver::testing::{FakeConnector, FakeServer, RouterBehavior};
    use crate::driver::{BoltError, Value};

    fn addr(host: &str) -> ServerAddress {
        ServerAddress::new(host, 7687)
    }

    fn info_from(host: &str) -> RoutingInfo {
        RoutingInfo {
            servers: vec![
                (ServerRole::Route, vec![addr(host)]),
                (ServerRole::Write, vec![addr(host)]),
            ],
            ttl: Duration::from_secs(300),
            database: None,
        }
    }

    fn open_with(routers: Vec<(ServerAddress, RouterBehavior)>) -> (FakeConnector, RoutingDriver) {
        let targets: Vec<String> = routers.iter().map(|(a, _)| a.to_string()).collect();
        let connector = FakeConnector::new(FakeServer::new(addr("a"))).with_routers(routers);
        let driver = RoutingDriver::open(
            &connector,
            &targets,
            &AuthToken::none(),
            RoutingContext::new(),
            ConfigOptions::new().with(keys::CONNECTION_ACQUISITION_TIMEOUT, 0.05),
        )
        .unwrap();
        (connector, driver)
    }

    #[test]
    fn test_default_targets() {
        let addresses = RoutingDriver::parse_targets::<&str>(&[]).unwrap();
        assert_eq!(
            addresses,
            vec![
                ServerAddress::new("localhost", 7687),
                ServerAddress::new("localhost", 17601),
                ServerAddress::new("localhost", 17687),
            ]
        );

        let addresses = RoutingDriver::parse_targets(&["", "  "]).unwrap();
        assert_eq!(addresses.len(), 3);
    }

    #[test]
    fn test_targets_joined_in_order() {
        let addresses = RoutingDriver::parse_targets(&["a:1 b:2", "c"]).unwrap();
        assert_eq!(
            addresses,
            vec![
                ServerAddress::new("a", 1),
                ServerAddress::new("b", 2),
                ServerAddress::new("c", 7687),
            ]
        );
    }

    #[test]
    fn test_open_records_initial_addresses() {
        let (connector, driver) = open_with(vec![
            (addr("a"), RouterBehavior::Empty),
            (addr("b"), RouterBehavior::Empty),
        ]);
        assert_eq!(driver.initial_addresses(), &[addr("a"), addr("b")]);
        assert_eq!(connector.opened_addresses(), vec![addr("a"), addr("b")]);
        assert!(!driver.encrypted());
    }

    #[test]
    fn test_open_rejects_reserved_context_key() {
        let connector = FakeConnector::new(FakeServer::new(addr("a")));
        let mut context = RoutingContext::new();
        context.insert("address".into(), "x:1".into());

        let result = RoutingDriver::open(&connector, &["a"], &AuthToken::none(), context, ConfigOptions::new());
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }

    #[test]
    fn test_open_translates_transport_failure() {
        let connector = FakeConnector::new(FakeServer::new(addr("a")))
            .fail_open_with(BoltError::Security("certificate rejected".into()));

        let result = RoutingDriver::open(
            &connector,
            &["a"],
            &AuthToken::none(),
            RoutingContext::new(),
            ConfigOptions::new(),
        );
        assert!(matches!(result, Err(DriverError::ServiceUnavailable(ref m)) if m.contains("certificate rejected")));
    }

    #[test]
    fn test_open_rejects_unknown_option() {
        let connector = FakeConnector::new(FakeServer::new(addr("a")));
        let result = RoutingDriver::open(
            &connector,
            &["a"],
            &AuthToken::none(),
            RoutingContext::new(),
            ConfigOptions::new().with("fetch_sise", 10),
        );
        assert!(matches!(result, Err(DriverError::UnknownConfigurationOption { .. })));
    }

    #[tokio::test]
    async fn test_verify_succeeds_if_any_router_answers() {
        let (connector, driver) = open_with(vec![
            (addr("a"), RouterBehavior::Fail(DriverError::service_unavailable("down"))),
            (addr("b"), RouterBehavior::Answer(info_from("b"))),
            (addr("c"), RouterBehavior::Fail(DriverError::session_expired("gone"))),
        ]);

        let probes = driver.verify_connectivity(ConfigOptions::new()).await.unwrap();
        assert_eq!(probes.len(), 3);
        assert_eq!(probes[0].address, addr("a"));
        assert!(probes[0].routing_info.is_none());
        assert_eq!(probes[1].routing_info, Some(info_from("b")));
        assert!(probes[2].routing_info.is_none());

        // 라우터마다 자기 주소로 조회
        let mut fetched = connector.fetched_from();
        fetched.sort();
        assert_eq!(fetched, vec![addr("a"), addr("b"), addr("c")]);
    }

    #[tokio::test]
    async fn test_verify_fails_when_no_router_answers() {
        let (_connector, driver) = open_with(vec![
            (addr("a"), RouterBehavior::Fail(DriverError::service_unavailable("down"))),
            (addr("b"), RouterBehavior::Fail(DriverError::session_expired("gone"))),
            (addr("c"), RouterBehavior::Fail(DriverError::server("Neo.TransientError.General", "busy"))),
            (addr("d"), RouterBehavior::Empty),
        ]);

        let result = driver.verify_connectivity(ConfigOptions::new()).await;
        assert!(matches!(
            result,
            Err(DriverError::ServiceUnavailable(ref m)) if m == "Could not connect to any routing servers."
        ));
    }

    #[tokio::test]
    async fn test_verify_propagates_unexpected_error() {
        let (_connector, driver) = open_with(vec![
            (addr("a"), RouterBehavior::Answer(info_from("a"))),
            (addr("b"), RouterBehavior::Fail(DriverError::configuration("bad auth scheme"))),
        ]);

        let result = driver.verify_connectivity(ConfigOptions::new()).await;
        assert!(matches!(result, Err(DriverError::Configuration(ref m)) if m == "bad auth scheme"));
    }

    #[tokio::test]
    async fn test_verify_treats_timeout_as_unavailable() {
        let (_connector, driver) = open_with(vec![
            (addr("a"), RouterBehavior::Hang),
            (addr("b"), RouterBehavior::Answer(info_from("b"))),
        ]);
        let probes = driver.verify_connectivity(ConfigOptions::new()).await.unwrap();
        assert!(probes[0].routing_info.is_none());
        assert!(probes[1].routing_info.is_some());

        let (_connector, driver) = open_with(vec![(addr("a"), RouterBehavior::Hang)]);
        let result = driver.verify_connectivity(ConfigOptions::new()).await;
        assert!(matches!(result, Err(DriverError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_verify_passes_workspace_settings() {
        let (connector, driver) = open_with(vec![(addr("a"), RouterBehavior::Answer(info_from("a")))]);

        driver
            .verify_connectivity(
                ConfigOptions::new()
                    .with(keys::DATABASE, "movies")
                    .with(keys::IMPERSONATED_USER, "alice"),
            )
            .await
            .unwrap();

        let requests = connector.fetch_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].database.as_deref(), Some("movies"));
        assert_eq!(requests[0].impersonated_user.as_deref(), Some("alice"));
        assert_eq!(requests[0].bookmarks, 0);
        assert_eq!(requests[0].timeout, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_verify_rejects_session_only_keys() {
        let (connector, driver) = open_with(vec![(addr("a"), RouterBehavior::Answer(info_from("a")))]);

        for (key, value) in [
            (keys::BOOKMARKS, Value::from("bm:1")),
            (keys::DEFAULT_ACCESS_MODE, Value::from("READ")),
        ] {
            let result = driver
                .verify_connectivity(ConfigOptions::new().with(key, value))
                .await;
            assert!(matches!(
                result,
                Err(DriverError::UnknownConfigurationOption { ref keys }) if keys == &vec![key.to_string()]
            ));
        }
        assert!(connector.fetch_requests().is_empty());
    }

    #[tokio::test]
    async fn test_verify_without_routers() {
        let (_connector, driver) = open_with(vec![]);
        let result = driver.verify_connectivity(ConfigOptions::new()).await;
        assert!(matches!(result, Err(DriverError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (connector, driver) = open_with(vec![(addr("a"), RouterBehavior::Empty)]);

        driver.close().await.unwrap();
        driver.close().await.unwrap();
        assert!(!driver.is_open());
        assert_eq!(connector.close_count(), 1);

        assert!(matches!(driver.session(ConfigOptions::new()), Err(DriverError::Session(_))));
        assert!(matches!(
            driver.verify_connectivity(ConfigOptions::new()).await,
            Err(DriverError::Session(_))
        ));
    }
}
