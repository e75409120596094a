//! 연결 풀 협력자
//!
//! 소켓, 프로토콜, 라우팅 테이블 캐시는 이 크레이트 밖의 풀 구현이 담당합니다.
//! 드라이버는 아래 트레이트를 통해서만 풀을 사용합니다.
//!
//! | 트레이트 | 역할 |
//! |----------|------|
//! | [`PoolConnector`] | 드라이버 생성 시 풀 열기 |
//! | [`ConnectionPool`] | 연결 획득/반환, 종료 |
//! | [`RoutingPool`] | 라우터 조회, 라우팅 테이블 |
//! | [`PooledConnection`] | 쿼리 왕복, 서버 정보 |

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

use super::address::ServerAddress;
use super::config::{PoolConfig, WorkspaceConfig};
use super::driver::{AuthToken, ServerInfo};
use super::error::{BoltError, BoltResult, DriverError, DriverResult};
use super::routing::{RoutingInfo, RoutingTable};
use super::session::{AccessMode, Bookmark, Query, QueryResult, SessionConfig};
use super::uri::RoutingContext;

// ============================================================================
// PoolConnector - 풀 생성
// ============================================================================

/// 풀 생성자
///
/// 풀은 지연 연결하므로 `open_*`은 동기 함수입니다. 실패는 [`BoltError`]로 보고하고,
/// 드라이버가 [`DriverError`]로 변환합니다.
pub trait PoolConnector: Send + Sync {
    /// 단일 서버 풀 열기
    fn open_direct(
        &self,
        address: &ServerAddress,
        auth: &AuthToken,
        pool_config: &PoolConfig,
        workspace_config: &WorkspaceConfig,
    ) -> BoltResult<Arc<dyn ConnectionPool>>;

    /// 라우팅 풀 열기
    fn open_routing(
        &self,
        addresses: &[ServerAddress],
        auth: &AuthToken,
        routing_context: &RoutingContext,
        pool_config: &PoolConfig,
        workspace_config: &WorkspaceConfig,
    ) -> BoltResult<Arc<dyn RoutingPool>>;
}

// ============================================================================
// ConnectionPool - 연결 풀
// ============================================================================

/// 연결 풀
pub trait ConnectionPool: Send + Sync + fmt::Debug {
    /// 풀을 연 설정
    fn pool_config(&self) -> &PoolConfig;

    /// 연결 획득
    ///
    /// `timeout` 안에 연결을 얻지 못하면 실패합니다.
    fn acquire<'a>(
        &'a self,
        access_mode: AccessMode,
        database: Option<&'a str>,
        timeout: Duration,
    ) -> BoxFuture<'a, DriverResult<Box<dyn PooledConnection>>>;

    /// 연결 반환
    fn release(&self, connection: Box<dyn PooledConnection>);

    /// 모든 연결 종료
    fn close(&self) -> BoxFuture<'_, DriverResult<()>>;
}

// ============================================================================
// RoutingPool - 라우팅 풀
// ============================================================================

/// 라우팅 풀
pub trait RoutingPool: ConnectionPool {
    /// 라우터 한 곳에서 라우팅 정보를 조회합니다.
    ///
    /// 라우터가 응답했지만 정보가 없으면 `Ok(None)`입니다.
    fn fetch_routing_info<'a>(
        &'a self,
        address: &'a ServerAddress,
        database: Option<&'a str>,
        impersonated_user: Option<&'a str>,
        bookmarks: &'a [Bookmark],
        timeout: Duration,
    ) -> BoxFuture<'a, DriverResult<Option<RoutingInfo>>>;

    /// 기본 데이터베이스의 초기 라우터 주소
    fn default_database_initial_router_addresses(&self) -> Vec<ServerAddress>;

    /// 기본 데이터베이스의 현재 라우팅 테이블 (스냅샷)
    fn routing_table_for_default_database(&self) -> RoutingTable;

    /// `ConnectionPool`로 변환. 구현은 `self`를 그대로 반환합니다.
    fn into_connection_pool(self: Arc<Self>) -> Arc<dyn ConnectionPool>;
}

// ============================================================================
// PooledConnection - 풀 연결
// ============================================================================

/// 풀에서 획득한 연결
pub trait PooledConnection: Send {
    /// 쿼리 실행 후 결과를 모두 수신
    fn run<'a>(
        &'a mut self,
        query: &'a Query,
        config: &'a SessionConfig,
    ) -> BoxFuture<'a, DriverResult<QueryResult>>;

    /// 연결된 서버 정보
    fn server_info(&self) -> ServerInfo;

    /// 서버가 멀티 데이터베이스를 지원하는지 여부
    fn supports_multiple_databases(&self) -> bool;
}

/// 풀 열기 실패를 드라이버 에러로 변환
pub(crate) fn open_failure(err: BoltError, target: &str) -> DriverError {
    warn!(target_address = %target, error = %err, "Failed to open connection pool");
    err.into()
}
