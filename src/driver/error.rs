//! Driver Error Types
//!
//! 드라이버 에러 정의

use std::io;
use thiserror::Error;

// ============================================================================
// DriverError - 드라이버 에러
// ============================================================================

/// 드라이버 에러
///
/// 설정 모순(`Configuration`, `InvalidArgument`, `UnknownConfigurationOption`)과
/// 도달 불가(`ServiceUnavailable`)를 구분할 수 있도록 나뉘어 있습니다.
#[derive(Error, Debug, Clone)]
pub enum DriverError {
    /// 주소 형식 오류
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    /// 지원하지 않는 URI 스킴
    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    /// 설정 에러 (URI 스킴과 명시적 설정의 충돌 포함)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 잘못된 인자
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 어떤 설정 계층도 인식하지 못한 키
    #[error("Unknown configuration option(s): {}", .keys.join(", "))]
    UnknownConfigurationOption {
        /// 남은 키 (정렬됨)
        keys: Vec<String>,
    },

    /// 서비스 불가
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 세션 만료
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// 서버 에러
    #[error("Server error: {code} - {message}")]
    Server {
        /// 서버 에러 코드
        code: String,
        /// 서버 메시지
        message: String,
    },

    /// 연결 에러
    #[error("Connection error: {0}")]
    Connection(String),

    /// 세션 에러
    #[error("Session error: {0}")]
    Session(String),

    /// 타임아웃 에러
    #[error("Timeout: {0}")]
    Timeout(String),

    /// 타입 변환 에러
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// 결과가 정확히 한 레코드가 아님
    #[error("Result is not single: {0}")]
    ResultNotSingle(String),
}

impl DriverError {
    /// 주소 형식 에러 생성
    pub fn malformed_address(msg: impl Into<String>) -> Self {
        Self::MalformedAddress(msg.into())
    }

    /// 스킴 에러 생성
    pub fn unsupported_scheme(msg: impl Into<String>) -> Self {
        Self::UnsupportedScheme(msg.into())
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 잘못된 인자 에러 생성
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// 알 수 없는 설정 키 에러 생성
    pub fn unknown_options<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        Self::UnknownConfigurationOption { keys }
    }

    /// 서비스 불가 에러 생성
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// 세션 만료 에러 생성
    pub fn session_expired(msg: impl Into<String>) -> Self {
        Self::SessionExpired(msg.into())
    }

    /// 서버 에러 생성
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Server {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 세션 에러 생성
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// 타임아웃 에러 생성
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// 타입 변환 에러 생성
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// 클라이언트 에러 여부
    ///
    /// 호출자의 입력이 잘못된 경우입니다. 재시도해도 결과가 바뀌지 않습니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedAddress(_)
                | Self::UnsupportedScheme(_)
                | Self::Configuration(_)
                | Self::InvalidArgument(_)
                | Self::UnknownConfigurationOption { .. }
                | Self::TypeConversion(_)
        )
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// 드라이버 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// BoltError - 전송 계층 에러
// ============================================================================

/// 풀 협력자가 보고하는 전송 계층 에러
///
/// 드라이버 경계 밖으로 노출되지 않습니다. [`DirectDriver`](super::DirectDriver)와
/// [`RoutingDriver`](super::routing::RoutingDriver)의 `open`에서 한 번
/// [`DriverError`]로 변환됩니다.
#[derive(Error, Debug)]
pub enum BoltError {
    /// 핸드셰이크 실패 (프로토콜 버전 협상 등)
    #[error("Handshake error: {0}")]
    Handshake(String),

    /// TLS/보안 실패
    #[error("Security error: {0}")]
    Security(String),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 연결 종료
    #[error("Connection closed")]
    ConnectionClosed,

    /// 타임아웃
    #[error("Operation timed out")]
    Timeout,

    /// 풀이 거부한 설정
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// 전송 계층 결과 타입
pub type BoltResult<T> = Result<T, BoltError>;

impl From<BoltError> for DriverError {
    fn from(err: BoltError) -> Self {
        match err {
            BoltError::Configuration(msg) => DriverError::Configuration(msg),
            other => DriverError::ServiceUnavailable(other.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_creation() {
        let err = DriverError::malformed_address("host:port:extra");
        assert!(matches!(err, DriverError::MalformedAddress(_)));

        let err = DriverError::session_expired("leader switched");
        assert!(matches!(err, DriverError::SessionExpired(_)));

        let err = DriverError::server("Neo.ClientError.Statement.SyntaxError", "Invalid syntax");
        assert!(matches!(err, DriverError::Server { .. }));
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::service_unavailable("Could not connect to any routing servers.");
        assert_eq!(
            err.to_string(),
            "Service unavailable: Could not connect to any routing servers."
        );

        let err = DriverError::server("Neo.ClientError.Statement.SyntaxError", "Invalid syntax");
        assert_eq!(
            err.to_string(),
            "Server error: Neo.ClientError.Statement.SyntaxError - Invalid syntax"
        );
    }

    #[test]
    fn test_unknown_options_sorted() {
        let err = DriverError::unknown_options(["max_pool_size", "databse"]);
        match &err {
            DriverError::UnknownConfigurationOption { keys } => {
                assert_eq!(keys, &vec!["databse".to_string(), "max_pool_size".to_string()]);
            }
            other => panic!("Expected UnknownConfigurationOption, got {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "Unknown configuration option(s): databse, max_pool_size"
        );
    }

    #[test]
    fn test_driver_error_client_error() {
        assert!(DriverError::configuration("conflict").is_client_error());
        assert!(DriverError::invalid_argument("routing params").is_client_error());
        assert!(DriverError::unsupported_scheme("http").is_client_error());
        assert!(DriverError::unknown_options(["x"]).is_client_error());
        assert!(!DriverError::service_unavailable("down").is_client_error());
    }

    #[test]
    fn test_bolt_error_translation() {
        let err: DriverError = BoltError::Handshake("no common version".into()).into();
        assert!(matches!(err, DriverError::ServiceUnavailable(ref m) if m.contains("no common version")));

        let err: DriverError = BoltError::Security("certificate rejected".into()).into();
        assert!(matches!(err, DriverError::ServiceUnavailable(_)));

        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err: DriverError = BoltError::from(io_err).into();
        assert!(matches!(err, DriverError::ServiceUnavailable(_)));

        let err: DriverError = BoltError::Configuration("bad ssl context".into()).into();
        assert!(matches!(err, DriverError::Configuration(_)));
    }
}
