//! Host-facing request and response messages
//!
//! These mirror the Terraform Plugin Protocol v6 messages handled by
//! [`ProviderServer`](crate::server::ProviderServer), after the transport has
//! unwrapped them. Values stay encoded ([`EncodedValue`]) until the server
//! decodes them, exactly as they arrive from Terraform.
//!
//! Each RPC has a snake_case module with nested `Request` and `Response`
//! types, e.g. `apply_resource_change::Request`.

use crate::error::Result;
use crate::schema::Schema;
use crate::types::{AttributePath, ClientCapabilities, Diagnostic, DynamicValue};
use std::collections::HashMap;

/// A value as carried on the wire: msgpack, or JSON when msgpack is empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedValue {
    pub msgpack: Vec<u8>,
    pub json: Vec<u8>,
}

impl EncodedValue {
    pub fn from_value(value: &DynamicValue) -> Result<Self> {
        Ok(Self {
            msgpack: value.encode_msgpack()?,
            json: vec![],
        })
    }

    pub fn from_json(json: Vec<u8>) -> Self {
        Self {
            msgpack: vec![],
            json,
        }
    }

    pub fn decode(&self) -> Result<DynamicValue> {
        if !self.msgpack.is_empty() {
            DynamicValue::decode_msgpack(&self.msgpack)
        } else {
            DynamicValue::decode_json(&self.json)
        }
    }
}

pub mod get_metadata {
    use super::*;

    pub struct Response {
        pub type_name: String,
        /// Sorted resource type names
        pub resources: Vec<String>,
        /// Sorted data source type names
        pub data_sources: Vec<String>,
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod get_provider_schema {
    use super::*;

    pub struct Response {
        pub provider: Schema,
        pub resource_schemas: HashMap<String, Schema>,
        pub data_source_schemas: HashMap<String, Schema>,
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod configure_provider {
    use super::*;

    pub struct Request {
        pub terraform_version: String,
        pub config: EncodedValue,
        pub client_capabilities: ClientCapabilities,
    }

    pub struct Response {
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod validate_resource_config {
    use super::*;

    pub struct Request {
        pub type_name: String,
        pub config: EncodedValue,
        pub client_capabilities: ClientCapabilities,
    }

    pub struct Response {
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod validate_data_resource_config {
    use super::*;

    pub struct Request {
        pub type_name: String,
        pub config: EncodedValue,
    }

    pub struct Response {
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod plan_resource_change {
    use super::*;

    pub struct Request {
        pub type_name: String,
        pub prior_state: EncodedValue,
        pub proposed_new_state: EncodedValue,
        pub config: EncodedValue,
    }

    pub struct Response {
        pub planned_state: EncodedValue,
        pub requires_replace: Vec<AttributePath>,
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod apply_resource_change {
    use super::*;

    pub struct Request {
        pub type_name: String,
        pub prior_state: EncodedValue,
        pub planned_state: EncodedValue,
        pub config: EncodedValue,
    }

    pub struct Response {
        pub new_state: EncodedValue,
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod read_resource {
    use super::*;

    pub struct Request {
        pub type_name: String,
        pub current_state: EncodedValue,
        pub client_capabilities: ClientCapabilities,
    }

    pub struct Response {
        /// Null when the resource no longer exists remotely
        pub new_state: EncodedValue,
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod import_resource_state {
    use super::*;

    pub struct Request {
        pub type_name: String,
        pub id: String,
        pub client_capabilities: ClientCapabilities,
    }

    pub struct ImportedResource {
        pub type_name: String,
        pub state: EncodedValue,
    }

    pub struct Response {
        pub imported_resources: Vec<ImportedResource>,
        pub diagnostics: Vec<Diagnostic>,
    }
}

pub mod read_data_source {
    use super::*;

    pub struct Request {
        pub type_name: String,
        pub config: EncodedValue,
        pub client_capabilities: ClientCapabilities,
    }

    pub struct Response {
        pub state: EncodedValue,
        pub diagnostics: Vec<Diagnostic>,
    }
}
