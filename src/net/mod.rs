//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → plain TCP: tokio TcpListener → axum::serve
//!     → TLS: tls.rs loads PEM cert/key → axum-server rustls acceptor
//! ```

pub mod tls;

pub use tls::load_tls_config;
