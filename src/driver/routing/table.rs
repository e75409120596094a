//! 라우팅 테이블
//!
//! 라우터가 돌려준 라우팅 정보와 기본 데이터베이스의 라우터 스냅샷

use std::time::Duration;

use crate::driver::address::ServerAddress;

/// 서버 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRole {
    /// 라우팅 테이블 제공자
    Route,
    /// 쓰기 (리더)
    Write,
    /// 읽기 (팔로워)
    Read,
}

impl ServerRole {
    /// 문자열에서 역할 파싱 (대소문자 무시)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ROUTE" => Some(Self::Route),
            "WRITE" => Some(Self::Write),
            "READ" => Some(Self::Read),
            _ => None,
        }
    }

    /// 역할 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "ROUTE",
            Self::Write => "WRITE",
            Self::Read => "READ",
        }
    }
}

/// 라우터 한 곳이 돌려준 라우팅 정보
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingInfo {
    /// 역할별 서버 목록
    pub servers: Vec<(ServerRole, Vec<ServerAddress>)>,
    /// 유효 기간
    pub ttl: Duration,
    /// 정보가 가리키는 데이터베이스 (서버가 해석한 이름)
    pub database: Option<String>,
}

/// 기본 데이터베이스의 라우팅 테이블 스냅샷
///
/// 연결 확인은 라우터 목록만 사용합니다. 캐시와 갱신 정책은 풀이 관리합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    /// 라우터 목록
    pub routers: Vec<ServerAddress>,
}

impl RoutingTable {
    /// 라우터 목록으로 스냅샷 생성 (중복 제거, 순서 유지)
    pub fn new(routers: impl IntoIterator<Item = ServerAddress>) -> Self {
        let mut table = Self::default();
        for router in routers {
            if !table.routers.contains(&router) {
                table.routers.push(router);
            }
        }
        table
    }
}
