use thiserror::Error;

/// Transport-level failures talking to the storefront backend
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error {code}: {message}")]
    Http { code: u16, message: String },

    #[error("Request failed: {0}")]
    Request(String),
}

/// Errors produced by the product fetch boundary
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Backend answered `success: false`
    #[error("Backend rejected request: {message}")]
    Rejected { message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid product id: {0:?}")]
    InvalidProductId(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl CatalogError {
    /// Short stable code used in structured log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Network(NetworkError::Timeout(_)) => "TIMEOUT",
            CatalogError::Network(NetworkError::Http { .. }) => "HTTP_ERROR",
            CatalogError::Network(_) => "NET_ERROR",
            CatalogError::Rejected { .. } => "REJECTED",
            CatalogError::Decode(_) => "DECODE_ERROR",
            CatalogError::Unauthenticated => "UNAUTHENTICATED",
            CatalogError::InvalidProductId(_) => "INVALID_PRODUCT_ID",
        }
    }
}

/// Result type alias для удобства
pub type CatalogResult<T> = Result<T, CatalogError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
