//! Terraform provider for the CCoE naming convention service
//!
//! Resources reserve names (`ccoe-naming_resources`, `ccoe-naming_vms`) and a
//! data source lists them. Every operation is one round trip to the naming
//! service, plus a confirming read after mutations.

pub mod api;
pub mod config;
pub mod data_sources;
pub mod provider_data;
pub mod resources;

pub use provider_data::NamingProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::Diagnostic;

use api::resources::ResourceNaming;
use api::vms::VmNaming;
use resources::SyncedKind;

pub struct NamingProvider {
    provider_data: Option<NamingProviderData>,
}

impl Default for NamingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();

        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Reserves names from the CCoE naming convention service")
                    .attribute(
                        AttributeBuilder::new("endpoint", AttributeType::String)
                            .description(
                                "Base URL of the naming service. Can also be set with CCOE_NAMING_ENDPOINT",
                            )
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("timeout", AttributeType::Number)
                            .description(
                                "Request timeout in seconds. Can also be set with CCOE_NAMING_TIMEOUT",
                            )
                            .optional()
                            .build(),
                    )
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl Provider for NamingProvider {
    fn type_name(&self) -> &str {
        "ccoe-naming"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let client_config = match config::resolve(&request.config) {
            Ok(client_config) => client_config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        tracing::info!(
            endpoint = %client_config.endpoint,
            timeout_secs = client_config.timeout.as_secs_f64(),
            "configuring naming client"
        );

        match api::Client::new(client_config) {
            Ok(client) => {
                let provider_data = NamingProviderData::new(client);
                self.provider_data = Some(provider_data.clone());
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(Arc::new(provider_data)),
                }
            }
            Err(e) => ConfigureProviderResponse {
                diagnostics: vec![Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                )],
                provider_data: None,
            },
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            ResourceNaming::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(resources::ResourceNamingResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            VmNaming::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(resources::VmNamingResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert(
            "ccoe-naming_resources".to_string(),
            Box::new(|| {
                Box::new(data_sources::ResourcesDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::types::{AttributePath, ClientCapabilities, DynamicValue};

    fn configure_request(config: DynamicValue) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    fn clear_env() {
        std::env::remove_var(config::ENDPOINT_ENV);
        std::env::remove_var(config::TIMEOUT_ENV);
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_with_defaults() {
        clear_env();

        let mut provider = NamingProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::null()))
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.provider_data.is_some());
        let provider_data = provider.provider_data.unwrap();
        assert_eq!(provider_data.client.base_url(), "http://localhost:8888");
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_from_env_vars() {
        clear_env();
        std::env::set_var(config::ENDPOINT_ENV, "https://naming.example.com/");
        std::env::set_var(config::TIMEOUT_ENV, "3");

        let mut provider = NamingProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::null()))
            .await;

        assert!(response.diagnostics.is_empty());
        let provider_data = provider.provider_data.unwrap();
        let client = &provider_data.client;
        assert_eq!(client.base_url(), "https://naming.example.com");
        assert_eq!(client.timeout().as_secs(), 3);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_rejects_invalid_endpoint() {
        clear_env();

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("endpoint"), "localhost:8888".to_string())
            .unwrap();

        let mut provider = NamingProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;

        assert_eq!(response.diagnostics[0].summary, "Failed to create API client");
        assert!(response.provider_data.is_none());
    }

    #[test]
    fn provider_registers_resources_and_data_sources() {
        let provider = NamingProvider::new();

        let resources = provider.resources();
        assert!(resources.contains_key("ccoe-naming_resources"));
        assert!(resources.contains_key("ccoe-naming_vms"));
        assert_eq!(resources.len(), 2);

        let data_sources = provider.data_sources();
        assert!(data_sources.contains_key("ccoe-naming_resources"));
    }

    #[test]
    fn factories_build_matching_type_names() {
        let provider = NamingProvider::new();

        for (type_name, factory) in provider.resources() {
            assert_eq!(factory().type_name(), type_name);
        }
        for (type_name, factory) in provider.data_sources() {
            assert_eq!(factory().type_name(), type_name);
        }
    }

    #[test]
    fn provider_schema_is_optional_everywhere() {
        let schema = NamingProvider::schema_static();

        assert!(schema.attribute("endpoint").unwrap().optional);
        assert_eq!(
            schema.attribute("timeout").unwrap().r#type,
            AttributeType::Number
        );
    }
}
