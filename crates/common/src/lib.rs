pub mod config;
pub mod errors;
pub mod structured_logging;

pub use config::{ApiConfig, SectionDefaults, StorefrontConfig};

pub use errors::{
    CatalogError, CatalogResult,
    ConfigError, ConfigResult,
    NetworkError,
};

pub use structured_logging::{
    init_structured_logging,
    LoggingConfig,
    StructuredLogEntry,
    OperationTimer,
    RequestContext,
};
