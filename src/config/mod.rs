//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → PipelineConfig (validated, immutable)
//!     → each stage server reads its own section
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_or_default, ConfigError};
pub use schema::{
    BlobStoreConfig, IngestionConfig, ListenerConfig, ObservabilityConfig, PipelineConfig,
    RelayConfig, TimeoutConfig, TlsConfig, TransformConfig,
};
pub use validation::ValidationError;
