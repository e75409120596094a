//! URI 분류
//!
//! 연결 URI를 드라이버 종류(Direct/Routing)와 보안 모드로 분류합니다.
//!
//! | 스킴 | 드라이버 | 보안 |
//! |------|----------|------|
//! | `bolt` | Direct | NotSecure |
//! | `bolt+s` | Direct | Secure |
//! | `bolt+ssc` | Direct | SelfSignedCertificate |
//! | `neo4j` | Routing | NotSecure |
//! | `neo4j+s` | Routing | Secure |
//! | `neo4j+ssc` | Routing | SelfSignedCertificate |

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use url::Url;

use super::config::{keys, ConfigOptions};
use super::error::{DriverError, DriverResult};
use super::types::Value;

/// 라우팅 컨텍스트 (URI 쿼리에서 추출)
pub type RoutingContext = BTreeMap<String, String>;

/// 라우팅 컨텍스트에서 사용할 수 없는 키
pub(crate) const RESERVED_CONTEXT_KEY: &str = "address";

// ============================================================================
// DriverKind / SecurityType
// ============================================================================

/// 드라이버 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// 단일 서버
    Direct,
    /// 클러스터 라우팅
    Routing,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Direct => write!(f, "direct"),
            DriverKind::Routing => write!(f, "routing"),
        }
    }
}

/// 보안 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityType {
    /// 암호화 없음 (명시적 옵션으로 설정 가능)
    NotSecure,
    /// TLS, 시스템 CA 검증
    Secure,
    /// TLS, 모든 인증서 신뢰
    SelfSignedCertificate,
}

impl SecurityType {
    /// URI가 보안 설정을 결정하는지 여부
    pub fn is_secure(&self) -> bool {
        !matches!(self, SecurityType::NotSecure)
    }
}

// ============================================================================
// UriScheme
// ============================================================================

/// 지원하는 URI 스킴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriScheme {
    /// `bolt`
    Bolt,
    /// `bolt+ssc`
    BoltSelfSigned,
    /// `bolt+s`
    BoltSecure,
    /// `neo4j`
    Neo4j,
    /// `neo4j+ssc`
    Neo4jSelfSigned,
    /// `neo4j+s`
    Neo4jSecure,
}

impl UriScheme {
    /// 모든 스킴 (오류 메시지 순서)
    pub const ALL: [UriScheme; 6] = [
        UriScheme::Bolt,
        UriScheme::BoltSelfSigned,
        UriScheme::BoltSecure,
        UriScheme::Neo4j,
        UriScheme::Neo4jSelfSigned,
        UriScheme::Neo4jSecure,
    ];

    /// 스킴 문자열에서 변환 (대소문자 무시)
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(scheme))
    }

    /// 스킴 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            UriScheme::Bolt => "bolt",
            UriScheme::BoltSelfSigned => "bolt+ssc",
            UriScheme::BoltSecure => "bolt+s",
            UriScheme::Neo4j => "neo4j",
            UriScheme::Neo4jSelfSigned => "neo4j+ssc",
            UriScheme::Neo4jSecure => "neo4j+s",
        }
    }

    /// 드라이버 종류
    pub fn driver_kind(&self) -> DriverKind {
        match self {
            UriScheme::Bolt | UriScheme::BoltSelfSigned | UriScheme::BoltSecure => {
                DriverKind::Direct
            }
            UriScheme::Neo4j | UriScheme::Neo4jSelfSigned | UriScheme::Neo4jSecure => {
                DriverKind::Routing
            }
        }
    }

    /// 보안 모드
    pub fn security_type(&self) -> SecurityType {
        match self {
            UriScheme::Bolt | UriScheme::Neo4j => SecurityType::NotSecure,
            UriScheme::BoltSecure | UriScheme::Neo4jSecure => SecurityType::Secure,
            UriScheme::BoltSelfSigned | UriScheme::Neo4jSelfSigned => {
                SecurityType::SelfSignedCertificate
            }
        }
    }

    fn list(filter: impl Fn(&UriScheme) -> bool) -> String {
        Self::ALL
            .iter()
            .filter(|s| filter(*s))
            .map(|s| format!("'{}'", s.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for UriScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ParsedUri
// ============================================================================

/// 파싱된 URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    /// 스킴
    pub scheme: UriScheme,
    /// `host[:port]`
    pub netloc: String,
    /// 쿼리 문자열 (`?` 제외)
    pub query: Option<String>,
}

impl ParsedUri {
    /// 라우팅 컨텍스트 추출
    pub fn routing_context(&self) -> DriverResult<RoutingContext> {
        match self.query.as_deref() {
            Some(query) => parse_routing_context(query),
            None => Ok(RoutingContext::new()),
        }
    }
}

/// URI를 드라이버 종류, 보안 모드, 파싱 결과로 분류합니다.
///
/// 인증 정보(`user:password@`), 경로, 프래그먼트가 있는 URI는
/// [`DriverError::MalformedAddress`]입니다. 인증 정보는 [`AuthToken`](super::AuthToken)으로
/// 전달합니다.
pub fn classify(uri: &str) -> DriverResult<(DriverKind, SecurityType, ParsedUri)> {
    let shown = redact_userinfo(uri);
    let parsed = Url::parse(uri).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => unsupported_scheme(&shown, ""),
        other => DriverError::malformed_address(format!("Invalid URI \"{}\": {}", shown, other)),
    })?;

    let scheme = UriScheme::from_scheme(parsed.scheme())
        .ok_or_else(|| unsupported_scheme(&shown, parsed.scheme()))?;

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(DriverError::malformed_address(format!(
            "URI must not carry credentials, pass them as an auth token instead. Given URI \"{}\".",
            shown
        )));
    }
    if !matches!(parsed.path(), "" | "/") || parsed.fragment().is_some() {
        return Err(DriverError::malformed_address(format!(
            "URI must not have a path or fragment. Given URI \"{}\".",
            shown
        )));
    }

    let host = parsed.host_str().unwrap_or_default();
    let netloc = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let kind = scheme.driver_kind();
    let security = scheme.security_type();
    debug!(uri = %shown, kind = %kind, security = ?security, "Classified connection URI");

    Ok((
        kind,
        security,
        ParsedUri {
            scheme,
            netloc,
            query: parsed.query().map(str::to_string),
        },
    ))
}

fn unsupported_scheme(uri: &str, scheme: &str) -> DriverError {
    DriverError::unsupported_scheme(format!(
        "URI scheme \"{}\" is not supported. Supported URI schemes are [{}]. \
         Examples: bolt://host[:port] or neo4j://host[:port][?routing_context]. Given URI \"{}\".",
        scheme,
        UriScheme::list(|_| true),
        uri
    ))
}

/// 로그와 에러 메시지용으로 URI의 사용자 정보를 가립니다.
fn redact_userinfo(uri: &str) -> Cow<'_, str> {
    let Some(start) = uri.find("://").map(|i| i + 3) else {
        return Cow::Borrowed(uri);
    };
    let rest = &uri[start..];
    let authority = &rest[..rest.find(['/', '?', '#']).unwrap_or(rest.len())];
    match authority.rfind('@') {
        Some(at) => Cow::Owned(format!("{}***{}", &uri[..start], &rest[at..])),
        None => Cow::Borrowed(uri),
    }
}

/// URI 쿼리 문자열을 라우팅 컨텍스트로 변환합니다.
///
/// 중복 키, 빈 키나 빈 값, 예약 키 `address`는 설정 오류입니다.
pub fn parse_routing_context(query: &str) -> DriverResult<RoutingContext> {
    let mut context = RoutingContext::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() || value.is_empty() {
            return Err(DriverError::configuration(format!(
                "Invalid parameters: '{}={}' in query '{}'.",
                key, value, query
            )));
        }
        if key == RESERVED_CONTEXT_KEY {
            return Err(DriverError::configuration(format!(
                "The key '{}' is reserved for routing context.",
                RESERVED_CONTEXT_KEY
            )));
        }
        if context.contains_key(key.as_ref()) {
            return Err(DriverError::configuration(format!(
                "Duplicated query parameters with key '{}' in query '{}'.",
                key, query
            )));
        }
        context.insert(key.into_owned(), value.into_owned());
    }

    Ok(context)
}

/// 보안 모드를 옵션 집합에 반영합니다.
///
/// 보안 스킴에서는 `encrypted`, `trusted_certificates`를 직접 지정할 수 없습니다.
/// 검사를 통과하면 스킴이 결정하는 값을 채워 넣습니다.
pub fn apply_security(security: SecurityType, options: &mut ConfigOptions) -> DriverResult<()> {
    if !security.is_secure() {
        return Ok(());
    }

    if options.contains_key(keys::ENCRYPTED) || options.contains_key(keys::TRUSTED_CERTIFICATES) {
        return Err(DriverError::configuration(format!(
            "The config settings '{}' and '{}' can only be used with the URI schemes [{}]. \
             Use the other URI schemes [{}] for setting encryption settings.",
            keys::ENCRYPTED,
            keys::TRUSTED_CERTIFICATES,
            UriScheme::list(|s| !s.security_type().is_secure()),
            UriScheme::list(|s| s.security_type().is_secure()),
        )));
    }

    options.insert_default(keys::ENCRYPTED, true);
    if security == SecurityType::SelfSignedCertificate {
        options.insert_default(keys::TRUSTED_CERTIFICATES, Value::List(Vec::new()));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
