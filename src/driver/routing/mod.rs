//! 라우팅 모듈
//!
//! `neo4j`, `neo4j+s`, `neo4j+ssc` 스킴의 클러스터 드라이버입니다.
//!
//! # 개요
//!
//! 라우팅 드라이버는 초기 라우터 집합으로 풀을 열고, 연결 확인 시 현재 라우팅
//! 테이블의 모든 라우터에 동시에 라우팅 정보를 요청합니다. 한 라우터라도 응답하면
//! 클러스터에 도달할 수 있는 것으로 봅니다.
//!
//! # 예시
//!
//! ```ignore
//! use bolt_connect::driver::routing::RoutingDriver;
//! use bolt_connect::driver::{AuthToken, ConfigOptions, RoutingContext};
//!
//! let driver = RoutingDriver::open(
//!     &connector,
//!     &["server1:7687", "server2:7687"],
//!     &AuthToken::basic("neo4j", "password"),
//!     RoutingContext::new(),
//!     ConfigOptions::new(),
//! )?;
//!
//! let probes = driver.verify_connectivity(ConfigOptions::new()).await?;
//! driver.close().await?;
//! ```

mod driver;
mod table;

pub use driver::{RouterProbe, RoutingDriver, DEFAULT_TARGETS};
pub use table::{RoutingInfo, RoutingTable, ServerRole};
