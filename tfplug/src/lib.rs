//! tfplug - Terraform Plugin Framework for Rust
//!
//! A framework for building Terraform providers in Rust, following the
//! request/response contract of the Terraform Plugin Protocol v6.
//! [`ProviderServer`] dispatches host requests to a [`Provider`]'s resources
//! and data sources.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod import;

// Host-facing modules
pub mod server;
pub mod wire;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{Provider, ProviderMetadataRequest, ProviderMetadataResponse};
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use server::{LogLevel, ProviderServer, ServerConfig};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
pub use wire::EncodedValue;
