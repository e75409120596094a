//! 서버 주소
//!
//! `host[:port]` 형식의 대상 문자열을 [`ServerAddress`]로 변환합니다.
//! IPv6 호스트는 `[::1]:7687`처럼 대괄호로 감쌉니다.

use std::fmt;

use super::error::{DriverError, DriverResult};

/// 기본 호스트
pub const DEFAULT_HOST: &str = "localhost";

/// 기본 포트
pub const DEFAULT_PORT: u16 = 7687;

// ============================================================================
// ServerAddress - 서버 주소
// ============================================================================

/// 서버 주소
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerAddress {
    /// 호스트
    pub host: String,
    /// 포트
    pub port: u16,
}

impl ServerAddress {
    /// 새 서버 주소 생성
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// 대상 문자열 하나를 파싱
    ///
    /// 호스트가 비어 있으면 `default_host`, 포트가 없거나 0이면 `default_port`를
    /// 사용합니다.
    pub fn parse(target: &str, default_host: &str, default_port: u16) -> DriverResult<Self> {
        let target = target.trim();

        let (host, port) = match target.strip_prefix('[') {
            Some(rest) => {
                let (host, port) = rest.rsplit_once(']').ok_or_else(|| {
                    DriverError::malformed_address(format!(
                        "Unterminated IPv6 address in {:?}",
                        target
                    ))
                })?;
                (host, port.strip_prefix(':').unwrap_or(port))
            }
            None => target.split_once(':').unwrap_or((target, "")),
        };

        let port = parse_port(port, target)?;
        let host = if host.is_empty() { default_host } else { host };
        if host.is_empty() {
            return Err(DriverError::malformed_address(format!(
                "No host in {:?} and no default host",
                target
            )));
        }

        let port = if port == 0 { default_port } else { port };
        Ok(Self::new(host, port))
    }

    /// 공백으로 구분된 대상 목록을 파싱
    ///
    /// 모든 대상을 공백으로 이어 붙인 뒤 다시 나눕니다. 순서는 유지됩니다.
    pub fn parse_list<S: AsRef<str>>(
        targets: &[S],
        default_host: &str,
        default_port: u16,
    ) -> DriverResult<Vec<Self>> {
        let joined = targets
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");

        joined
            .split_whitespace()
            .map(|token| Self::parse(token, default_host, default_port))
            .collect()
    }

    /// IPv6 호스트 여부
    pub fn is_ipv6(&self) -> bool {
        self.host.contains(':')
    }
}

/// 포트 문자열 파싱 (빈 문자열은 0)
fn parse_port(port: &str, target: &str) -> DriverResult<u16> {
    if port.is_empty() {
        return Ok(0);
    }
    port.parse().map_err(|_| {
        DriverError::malformed_address(format!("Invalid port {:?} in address {:?}", port, target))
    })
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ipv6() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

// ============================================================================
// Tests
// ============================================================================
