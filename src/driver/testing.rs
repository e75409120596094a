//! 테스트용 가짜 풀
//!
//! 소켓 없이 드라이버 코어를 검증하기 위한 [`PoolConnector`] 구현입니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;

use super::address::ServerAddress;
use super::config::{PoolConfig, WorkspaceConfig};
use super::driver::{AuthToken, ServerInfo};
use super::error::{BoltError, BoltResult, DriverError, DriverResult};
use super::pool::{ConnectionPool, PoolConnector, PooledConnection, RoutingPool};
use super::record::Record;
use super::routing::{RoutingInfo, RoutingTable};
use super::session::{AccessMode, Bookmark, Query, QueryResult, ResultSummary, SessionConfig};
use super::types::Value;
use super::uri::RoutingContext;

// ============================================================================
// FakeServer - 쿼리를 받는 가짜 서버
// ============================================================================

#[derive(Debug, Default)]
struct ServerState {
    queries: Vec<String>,
    fetch_sizes: Vec<i64>,
    databases: Vec<Option<String>>,
    failure: Option<DriverError>,
    rows: Option<usize>,
    multi_db: bool,
}

/// 가짜 서버 (복제본은 상태를 공유)
#[derive(Debug, Clone)]
pub(crate) struct FakeServer {
    address: ServerAddress,
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub(crate) fn new(address: ServerAddress) -> Self {
        Self {
            address,
            state: Arc::default(),
        }
    }

    pub(crate) fn fail_queries_with(&self, error: DriverError) {
        self.state.lock().failure = Some(error);
    }

    pub(crate) fn return_rows(&self, rows: usize) {
        self.state.lock().rows = Some(rows);
    }

    pub(crate) fn set_multi_db(&self, supported: bool) {
        self.state.lock().multi_db = supported;
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.state.lock().queries.clone()
    }

    pub(crate) fn fetch_sizes(&self) -> Vec<i64> {
        self.state.lock().fetch_sizes.clone()
    }

    pub(crate) fn databases(&self) -> Vec<Option<String>> {
        self.state.lock().databases.clone()
    }

    fn info(&self) -> ServerInfo {
        ServerInfo {
            address: self.address.clone(),
            agent: "Neo4j/5.13.0".into(),
            protocol_version: "5.4".into(),
        }
    }

    fn execute(&self, query: &Query, config: &SessionConfig) -> DriverResult<QueryResult> {
        let mut state = self.state.lock();
        state.queries.push(query.text.clone());
        state.fetch_sizes.push(config.workspace.fetch_size);
        state.databases.push(config.workspace.database.clone());

        if let Some(error) = &state.failure {
            return Err(error.clone());
        }

        let keys = vec!["x".to_string()];
        let records = (0..state.rows.unwrap_or(1))
            .map(|_| Record::new(keys.clone(), vec![Value::Integer(1)]))
            .collect();
        let summary = ResultSummary {
            server: self.info(),
            database: config.workspace.database.clone(),
        };
        Ok(QueryResult::new(keys, records, summary))
    }
}

struct FakeConnection {
    server: FakeServer,
}

impl PooledConnection for FakeConnection {
    fn run<'a>(
        &'a mut self,
        query: &'a Query,
        config: &'a SessionConfig,
    ) -> BoxFuture<'a, DriverResult<QueryResult>> {
        let result = self.server.execute(query, config);
        future::ready(result).boxed()
    }

    fn server_info(&self) -> ServerInfo {
        self.server.info()
    }

    fn supports_multiple_databases(&self) -> bool {
        self.server.state.lock().multi_db
    }
}

// ============================================================================
// FakePool - 가짜 풀
// ============================================================================

/// 라우터 응답 방식
#[derive(Debug, Clone)]
pub(crate) enum RouterBehavior {
    /// 라우팅 정보 반환
    Answer(RoutingInfo),
    /// 응답했지만 정보 없음
    Empty,
    /// 에러
    Fail(DriverError),
    /// 응답하지 않음
    Hang,
}

/// 라우팅 정보 요청 기록
#[derive(Debug, Clone)]
pub(crate) struct FetchRequest {
    pub(crate) address: ServerAddress,
    pub(crate) database: Option<String>,
    pub(crate) impersonated_user: Option<String>,
    pub(crate) bookmarks: usize,
    pub(crate) timeout: Duration,
}

#[derive(Debug)]
pub(crate) struct FakePool {
    pool_config: PoolConfig,
    server: FakeServer,
    initial_addresses: Vec<ServerAddress>,
    routers: Vec<(ServerAddress, RouterBehavior)>,
    fetches: Mutex<Vec<FetchRequest>>,
    acquired_modes: Mutex<Vec<AccessMode>>,
    in_use: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl FakePool {
    pub(crate) fn in_use(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }

    pub(crate) fn acquired_modes(&self) -> Vec<AccessMode> {
        self.acquired_modes.lock().clone()
    }
}

impl ConnectionPool for FakePool {
    fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }

    fn acquire<'a>(
        &'a self,
        access_mode: AccessMode,
        _database: Option<&'a str>,
        _timeout: Duration,
    ) -> BoxFuture<'a, DriverResult<Box<dyn PooledConnection>>> {
        self.acquired_modes.lock().push(access_mode);
        self.in_use.fetch_add(1, Ordering::SeqCst);
        let connection: Box<dyn PooledConnection> = Box::new(FakeConnection {
            server: self.server.clone(),
        });
        future::ready(Ok(connection)).boxed()
    }

    fn release(&self, _connection: Box<dyn PooledConnection>) {
        self.in_use.fetch_sub(1, Ordering::SeqCst);
    }

    fn close(&self) -> BoxFuture<'_, DriverResult<()>> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        future::ready(Ok(())).boxed()
    }
}

impl RoutingPool for FakePool {
    fn fetch_routing_info<'a>(
        &'a self,
        address: &'a ServerAddress,
        database: Option<&'a str>,
        impersonated_user: Option<&'a str>,
        bookmarks: &'a [Bookmark],
        timeout: Duration,
    ) -> BoxFuture<'a, DriverResult<Option<RoutingInfo>>> {
        self.fetches.lock().push(FetchRequest {
            address: address.clone(),
            database: database.map(str::to_string),
            impersonated_user: impersonated_user.map(str::to_string),
            bookmarks: bookmarks.len(),
            timeout,
        });

        let behavior = self
            .routers
            .iter()
            .find(|(router, _)| router == address)
            .map(|(_, behavior)| behavior.clone());

        match behavior {
            Some(RouterBehavior::Answer(info)) => future::ready(Ok(Some(info))).boxed(),
            Some(RouterBehavior::Empty) => future::ready(Ok(None)).boxed(),
            Some(RouterBehavior::Fail(error)) => future::ready(Err(error)).boxed(),
            Some(RouterBehavior::Hang) => future::pending::<DriverResult<Option<RoutingInfo>>>().boxed(),
            None => future::ready(Err(DriverError::service_unavailable(format!(
                "Unknown router {}",
                address
            ))))
            .boxed(),
        }
    }

    fn default_database_initial_router_addresses(&self) -> Vec<ServerAddress> {
        self.initial_addresses.clone()
    }

    fn routing_table_for_default_database(&self) -> RoutingTable {
        RoutingTable::new(self.routers.iter().map(|(address, _)| address.clone()))
    }

    fn into_connection_pool(self: Arc<Self>) -> Arc<dyn ConnectionPool> {
        self
    }
}

// ============================================================================
// FakeConnector - 가짜 풀 생성자
// ============================================================================

#[derive(Default)]
struct ConnectorState {
    opened_addresses: Vec<ServerAddress>,
    pool_config: Option<PoolConfig>,
    routing_context: Option<RoutingContext>,
    pools: Vec<Arc<FakePool>>,
    open_failure: Option<BoltError>,
}

/// 가짜 풀 생성자
pub(crate) struct FakeConnector {
    server: FakeServer,
    routers: Vec<(ServerAddress, RouterBehavior)>,
    closes: Arc<AtomicUsize>,
    state: Mutex<ConnectorState>,
}

impl FakeConnector {
    pub(crate) fn new(server: FakeServer) -> Self {
        Self {
            server,
            routers: Vec::new(),
            closes: Arc::default(),
            state: Mutex::default(),
        }
    }

    /// 라우팅 테이블의 라우터와 응답 방식
    pub(crate) fn with_routers(mut self, routers: Vec<(ServerAddress, RouterBehavior)>) -> Self {
        self.routers = routers;
        self
    }

    /// 다음 풀 열기를 실패시킵니다.
    pub(crate) fn fail_open_with(self, error: BoltError) -> Self {
        self.state.lock().open_failure = Some(error);
        self
    }

    /// 세션 테스트용 단일 서버 풀
    pub(crate) fn direct_pool(server: FakeServer) -> Arc<FakePool> {
        let connector = Self::new(server);
        connector.new_pool(PoolConfig::default(), Vec::new())
    }

    pub(crate) fn opened_addresses(&self) -> Vec<ServerAddress> {
        self.state.lock().opened_addresses.clone()
    }

    pub(crate) fn last_pool_config(&self) -> Option<PoolConfig> {
        self.state.lock().pool_config.clone()
    }

    pub(crate) fn last_routing_context(&self) -> Option<RoutingContext> {
        self.state.lock().routing_context.clone()
    }

    pub(crate) fn direct_pool_handle(&self) -> Option<Arc<FakePool>> {
        self.state.lock().pools.last().cloned()
    }

    pub(crate) fn fetched_from(&self) -> Vec<ServerAddress> {
        self.fetch_requests()
            .into_iter()
            .map(|request| request.address)
            .collect()
    }

    pub(crate) fn fetch_requests(&self) -> Vec<FetchRequest> {
        self.state
            .lock()
            .pools
            .iter()
            .flat_map(|pool| pool.fetches.lock().clone())
            .collect()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn new_pool(&self, pool_config: PoolConfig, initial_addresses: Vec<ServerAddress>) -> Arc<FakePool> {
        Arc::new(FakePool {
            pool_config,
            server: self.server.clone(),
            initial_addresses,
            routers: self.routers.clone(),
            fetches: Mutex::default(),
            acquired_modes: Mutex::default(),
            in_use: AtomicUsize::new(0),
            closes: Arc::clone(&self.closes),
        })
    }

    fn record_open(
        &self,
        addresses: &[ServerAddress],
        pool_config: &PoolConfig,
    ) -> BoltResult<Arc<FakePool>> {
        let mut state = self.state.lock();
        if let Some(error) = state.open_failure.take() {
            return Err(error);
        }
        state.opened_addresses.extend(addresses.iter().cloned());
        state.pool_config = Some(pool_config.clone());

        let pool = self.new_pool(pool_config.clone(), addresses.to_vec());
        state.pools.push(Arc::clone(&pool));
        Ok(pool)
    }
}

impl PoolConnector for FakeConnector {
    fn open_direct(
        &self,
        address: &ServerAddress,
        _auth: &AuthToken,
        pool_config: &PoolConfig,
        _workspace_config: &WorkspaceConfig,
    ) -> BoltResult<Arc<dyn ConnectionPool>> {
        let pool: Arc<dyn ConnectionPool> =
            self.record_open(std::slice::from_ref(address), pool_config)?;
        Ok(pool)
    }

    fn open_routing(
        &self,
        addresses: &[ServerAddress],
        _auth: &AuthToken,
        routing_context: &RoutingContext,
        pool_config: &PoolConfig,
        _workspace_config: &WorkspaceConfig,
    ) -> BoltResult<Arc<dyn RoutingPool>> {
        let pool = self.record_open(addresses, pool_config)?;
        self.state.lock().routing_context = Some(routing_context.clone());
        let pool: Arc<dyn RoutingPool> = pool;
        Ok(pool)
    }
}

impl std::fmt::Debug for FakeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeConnector")
            .field("routers", &self.routers.len())
            .finish()
    }
}

