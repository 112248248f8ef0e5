//! Adapter layer modules for external system integration.
//!
//! Provides the collaborator interfaces the signer depends on:
//! - Signing capability over an externally held key
//! - Chain validation engine and an in-memory certificate pool
//! - HTTP timestamp authority communication with retry logic

pub mod backend;
pub mod certificate_pool;
pub mod timestamp_http_client;

pub use backend::SigningBackend;
pub use certificate_pool::{CertificatePool, ChainBuilder};
pub use timestamp_http_client::{TimestampHttpClient, TimestampHttpConfig, TimestampProvider};
