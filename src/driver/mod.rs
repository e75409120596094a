//! Driver Module
//!
//! 연결 대상 결정과 연결 확인
//!
//! # 구성
//!
//! - 주소 해석 (`ServerAddress`)
//! - URI 분류 (`classify`, `apply_security`, `parse_routing_context`)
//! - 설정 계층 (`ConfigOptions`, `PoolConfig`, `WorkspaceConfig`, `SessionConfig`)
//! - 드라이버 (`GraphDatabase`, `Driver`, `DirectDriver`, `RoutingDriver`)
//! - 풀 협력자 (`PoolConnector`, `ConnectionPool`, `RoutingPool`, `PooledConnection`)
//!
//! # Example
//!
//! ```ignore
//! use bolt_connect::driver::{AuthToken, ConfigOptions, Connectivity, GraphDatabase};
//!
//! // connector: 풀 구현 (PoolConnector)
//! let db = GraphDatabase::new(connector);
//!
//! // neo4j+s:// -> 라우팅 드라이버, TLS
//! let driver = db.driver(
//!     "neo4j+s://cluster.example:7687?policy=eu",
//!     AuthToken::basic("neo4j", "password"),
//!     ConfigOptions::new().with("max_connection_pool_size", 50),
//! )?;
//!
//! match driver.verify_connectivity(ConfigOptions::new()).await? {
//!     Connectivity::Server(info) => println!("{}", info.agent),
//!     Connectivity::Routers(probes) => println!("{} routers", probes.len()),
//! }
//!
//! let session = driver.session(ConfigOptions::new().with("database", "movies"))?;
//! let result = session.run("RETURN 1 AS x").await?;
//!
//! session.close().await?;
//! driver.close().await?;
//! ```

pub mod config;
pub mod routing;
mod address;
mod driver;
mod error;
mod pool;
mod record;
mod session;
mod types;
mod uri;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use address::{ServerAddress, DEFAULT_HOST, DEFAULT_PORT};
pub use config::{
    consume_chain, ConfigChain, ConfigLayer, ConfigOptions, PoolConfig, TrustStrategy,
    WorkspaceConfig,
};
pub use driver::{
    AuthToken, Connectivity, DirectDriver, Driver, GraphDatabase, ServerInfo, DEFAULT_TARGET,
};
pub use error::{BoltError, BoltResult, DriverError, DriverResult};
pub use pool::{ConnectionPool, PoolConnector, PooledConnection, RoutingPool};
pub use record::Record;
pub use routing::{RouterProbe, RoutingDriver, RoutingInfo, RoutingTable};
pub use session::{
    AccessMode, Bookmark, Query, QueryResult, ResultSummary, Session, SessionConfig,
};
pub use types::Value;
pub use uri::{
    apply_security, classify, parse_routing_context, DriverKind, ParsedUri, RoutingContext,
    SecurityType, UriScheme,
};
