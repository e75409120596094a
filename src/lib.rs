//! # bolt-connect
//!
//! Topology resolution and connectivity verification for Bolt graph database
//! drivers.
//!
//! Given a connection URI, the crate decides whether the client talks to one
//! fixed server (`bolt`, `bolt+s`, `bolt+ssc`) or to a self-discovering cluster
//! (`neo4j`, `neo4j+s`, `neo4j+ssc`), validates the security posture implied by
//! the scheme against explicit options, and can verify that the target is
//! reachable.
//!
//! ## Features
//!
//! - **URI classification** - scheme to driver kind and security mode, with
//!   conflicting options rejected instead of merged
//! - **Layered configuration** - one flat option bag split into pool, workspace
//!   and session layers; unknown keys are errors
//! - **Connectivity verification** - a single round trip for direct drivers, a
//!   concurrent fan-out over all routers for routing drivers
//! - **Pluggable pools** - sockets and protocol live behind [`PoolConnector`]
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use bolt_connect::{AuthToken, ConfigOptions, GraphDatabase};
//!
//! let db = GraphDatabase::new(connector);
//! let driver = db.driver(
//!     "neo4j://localhost:7687",
//!     AuthToken::basic("neo4j", "password"),
//!     ConfigOptions::new(),
//! )?;
//!
//! driver.verify_connectivity(ConfigOptions::new()).await?;
//! driver.close().await?;
//! ```
//!
//! ## Classification
//!
//! ```rust
//! use bolt_connect::{classify, DriverKind, SecurityType};
//!
//! let (kind, security, uri) = classify("neo4j+s://a.example:7687?policy=eu").unwrap();
//! assert_eq!(kind, DriverKind::Routing);
//! assert_eq!(security, SecurityType::Secure);
//! assert_eq!(uri.routing_context().unwrap()["policy"], "eu");
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use bolt_connect::{ConfigOptions, DriverError, PoolConfig, WorkspaceConfig};
//! use bolt_connect::driver::consume_chain;
//!
//! let options = ConfigOptions::new().with("max_conection_pool_size", 10);
//! let result: Result<(PoolConfig, WorkspaceConfig), _> = consume_chain(options);
//! assert!(matches!(result, Err(DriverError::UnknownConfigurationOption { .. })));
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - Classification, configuration layers, drivers and the pool traits
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod driver;

// Re-exports for convenience
pub use driver::{
    classify, AccessMode, AuthToken, BoltError, Bookmark, ConfigOptions, Connectivity,
    ConnectionPool, DirectDriver, Driver, DriverError, DriverKind, DriverResult, GraphDatabase,
    PoolConfig, PoolConnector, PooledConnection, Query, QueryResult, Record, RoutingDriver,
    RoutingPool, SecurityType, ServerAddress, ServerInfo, Session, SessionConfig, Value,
    WorkspaceConfig,
};
