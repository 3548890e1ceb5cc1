//! Server module for hosting Terraform providers
//!
//! [`ProviderServer`] owns a provider plus the data its `configure` produced,
//! and turns each host request (see [`crate::wire`]) into calls on a freshly
//! created resource or data source. The transport in front of it only has to
//! move the wire messages.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceMetadataRequest, DataSourceSchemaRequest,
    DataSourceWithConfigure, ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::error::TfplugError;
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderMetadataRequest,
    ProviderSchemaRequest, ResourceFactory,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, ResourceMetadataRequest,
    ResourceSchemaRequest, ResourceWithConfigure, UpdateResourceRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::Schema;
use crate::types::{has_errors, AttributePath, Diagnostic, Dynamic, DynamicValue};
use crate::wire::{self, EncodedValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

/// Environment variable Terraform uses to pick the provider log level
pub const LOG_ENV_VAR: &str = "TF_LOG_PROVIDER";

/// Log level for the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Server configuration for hosting a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Whether to enable logging
    pub enable_logging: bool,
    /// Log level used when TF_LOG_PROVIDER is unset or invalid
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            log_level: LogLevel::Info,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Installs the global subscriber. Stdout belongs to the plugin handshake,
    /// so logs go to stderr. Calling this twice is harmless.
    pub fn init_logging(&self) {
        if !self.enable_logging {
            return;
        }

        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.as_directive()));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

/// Dispatches host requests to a provider
pub struct ProviderServer<P: Provider> {
    provider: RwLock<P>,
    provider_data: RwLock<ProviderData>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ServerConfig::default())
    }

    pub fn with_config(provider: P, config: ServerConfig) -> Self {
        config.init_logging();

        let resources = provider.resources();
        let data_sources = provider.data_sources();

        Self {
            provider: RwLock::new(provider),
            provider_data: RwLock::new(None),
            resources,
            data_sources,
        }
    }

    /// Type names of the provider and everything it registers, as each
    /// reports it through `metadata`.
    pub async fn get_metadata(&self, ctx: Context) -> wire::get_metadata::Response {
        let type_name = self
            .provider
            .read()
            .await
            .metadata(ctx.clone(), ProviderMetadataRequest)
            .await
            .type_name;

        let mut resources = Vec::with_capacity(self.resources.len());
        for factory in self.resources.values() {
            let response = factory()
                .metadata(ctx.clone(), ResourceMetadataRequest)
                .await;
            resources.push(response.type_name);
        }
        resources.sort();

        let mut data_sources = Vec::with_capacity(self.data_sources.len());
        for factory in self.data_sources.values() {
            let response = factory()
                .metadata(ctx.clone(), DataSourceMetadataRequest)
                .await;
            data_sources.push(response.type_name);
        }
        data_sources.sort();

        wire::get_metadata::Response {
            type_name,
            resources,
            data_sources,
            diagnostics: vec![],
        }
    }

    pub async fn get_provider_schema(&self, ctx: Context) -> wire::get_provider_schema::Response {
        let provider_schema = self
            .provider
            .read()
            .await
            .schema(ctx.clone(), ProviderSchemaRequest)
            .await;
        let mut diagnostics = provider_schema.diagnostics;

        let mut resource_schemas = HashMap::new();
        for (type_name, factory) in &self.resources {
            let response = factory()
                .schema(ctx.clone(), ResourceSchemaRequest)
                .await;
            diagnostics.extend(response.diagnostics);
            resource_schemas.insert(type_name.clone(), response.schema);
        }

        let mut data_source_schemas = HashMap::new();
        for (type_name, factory) in &self.data_sources {
            let response = factory()
                .schema(ctx.clone(), DataSourceSchemaRequest)
                .await;
            diagnostics.extend(response.diagnostics);
            data_source_schemas.insert(type_name.clone(), response.schema);
        }

        wire::get_provider_schema::Response {
            provider: provider_schema.schema,
            resource_schemas,
            data_source_schemas,
            diagnostics,
        }
    }

    pub async fn configure_provider(
        &self,
        ctx: Context,
        request: wire::configure_provider::Request,
    ) -> wire::configure_provider::Response {
        let mut diagnostics = vec![];

        let Some(config) = decode(&request.config, "provider configuration", &mut diagnostics)
        else {
            return wire::configure_provider::Response { diagnostics };
        };

        let response = self
            .provider
            .write()
            .await
            .configure(
                ctx,
                ConfigureProviderRequest {
                    terraform_version: request.terraform_version,
                    config,
                    client_capabilities: request.client_capabilities,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        if !has_errors(&diagnostics) {
            *self.provider_data.write().await = response.provider_data;
            tracing::debug!("provider configured");
        }

        wire::configure_provider::Response { diagnostics }
    }

    pub async fn validate_resource_config(
        &self,
        ctx: Context,
        request: wire::validate_resource_config::Request,
    ) -> wire::validate_resource_config::Response {
        let mut diagnostics = vec![];

        let Some(factory) = self.resources.get(&request.type_name) else {
            diagnostics.push(unknown_resource(&request.type_name));
            return wire::validate_resource_config::Response { diagnostics };
        };
        let Some(config) = decode(&request.config, "configuration", &mut diagnostics) else {
            return wire::validate_resource_config::Response { diagnostics };
        };

        let resource = factory();
        let schema = resource
            .schema(ctx.clone(), ResourceSchemaRequest)
            .await
            .schema;
        diagnostics.extend(check_config(&schema, &config));

        if !has_errors(&diagnostics) {
            let response = resource
                .validate(
                    ctx,
                    ValidateResourceConfigRequest {
                        type_name: request.type_name,
                        config,
                        client_capabilities: request.client_capabilities,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        wire::validate_resource_config::Response { diagnostics }
    }

    pub async fn validate_data_resource_config(
        &self,
        ctx: Context,
        request: wire::validate_data_resource_config::Request,
    ) -> wire::validate_data_resource_config::Response {
        let mut diagnostics = vec![];

        let Some(factory) = self.data_sources.get(&request.type_name) else {
            diagnostics.push(unknown_data_source(&request.type_name));
            return wire::validate_data_resource_config::Response { diagnostics };
        };
        let Some(config) = decode(&request.config, "configuration", &mut diagnostics) else {
            return wire::validate_data_resource_config::Response { diagnostics };
        };

        let data_source = factory();
        let schema = data_source
            .schema(ctx.clone(), DataSourceSchemaRequest)
            .await
            .schema;
        diagnostics.extend(check_config(&schema, &config));

        if !has_errors(&diagnostics) {
            let response = data_source
                .validate(
                    ctx,
                    ValidateDataSourceConfigRequest {
                        type_name: request.type_name,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        wire::validate_data_resource_config::Response { diagnostics }
    }

    /// Computes the planned state. Computed attributes the configuration
    /// leaves unset become unknown whenever the remote side will recompute them.
    pub async fn plan_resource_change(
        &self,
        ctx: Context,
        request: wire::plan_resource_change::Request,
    ) -> wire::plan_resource_change::Response {
        let mut diagnostics = vec![];
        let empty = |diagnostics: Vec<Diagnostic>| wire::plan_resource_change::Response {
            planned_state: EncodedValue::default(),
            requires_replace: vec![],
            diagnostics,
        };

        let Some(factory) = self.resources.get(&request.type_name) else {
            diagnostics.push(unknown_resource(&request.type_name));
            return empty(diagnostics);
        };
        let (Some(prior), Some(proposed), Some(config)) = (
            decode(&request.prior_state, "prior state", &mut diagnostics),
            decode(&request.proposed_new_state, "proposed state", &mut diagnostics),
            decode(&request.config, "configuration", &mut diagnostics),
        ) else {
            return empty(diagnostics);
        };

        if proposed.is_null() {
            tracing::debug!(type_name = %request.type_name, "planning destroy");
            return empty(diagnostics);
        }

        let schema = factory().schema(ctx, ResourceSchemaRequest).await.schema;
        let planned = plan_computed(&schema, &prior, proposed, &config, &mut diagnostics);

        let planned_state = encode(&planned, &mut diagnostics);
        wire::plan_resource_change::Response {
            planned_state,
            requires_replace: vec![],
            diagnostics,
        }
    }

    pub async fn apply_resource_change(
        &self,
        ctx: Context,
        request: wire::apply_resource_change::Request,
    ) -> wire::apply_resource_change::Response {
        let mut diagnostics = vec![];

        let (Some(prior), Some(planned), Some(config)) = (
            decode(&request.prior_state, "prior state", &mut diagnostics),
            decode(&request.planned_state, "planned state", &mut diagnostics),
            decode(&request.config, "configuration", &mut diagnostics),
        ) else {
            return wire::apply_resource_change::Response {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let resource = match self.configured_resource(ctx.clone(), &request.type_name).await {
            Ok(resource) => resource,
            Err(errors) => {
                return wire::apply_resource_change::Response {
                    new_state: request.prior_state,
                    diagnostics: errors,
                }
            }
        };

        let new_state = if planned.is_null() {
            tracing::debug!(type_name = %request.type_name, "applying delete");
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name: request.type_name,
                        prior_state: prior.clone(),
                    },
                )
                .await;
            let failed = has_errors(&response.diagnostics);
            diagnostics.extend(response.diagnostics);
            if failed {
                prior
            } else {
                DynamicValue::null()
            }
        } else if prior.is_null() {
            tracing::debug!(type_name = %request.type_name, "applying create");
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name: request.type_name,
                        planned_state: planned,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            response.new_state
        } else {
            tracing::debug!(type_name = %request.type_name, "applying update");
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name: request.type_name,
                        prior_state: prior,
                        planned_state: planned,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            response.new_state
        };

        let new_state = encode(&new_state, &mut diagnostics);
        wire::apply_resource_change::Response {
            new_state,
            diagnostics,
        }
    }

    pub async fn read_resource(
        &self,
        ctx: Context,
        request: wire::read_resource::Request,
    ) -> wire::read_resource::Response {
        let mut diagnostics = vec![];

        let Some(current_state) = decode(&request.current_state, "current state", &mut diagnostics)
        else {
            return wire::read_resource::Response {
                new_state: request.current_state,
                diagnostics,
            };
        };

        let resource = match self.configured_resource(ctx.clone(), &request.type_name).await {
            Ok(resource) => resource,
            Err(errors) => {
                return wire::read_resource::Response {
                    new_state: request.current_state,
                    diagnostics: errors,
                }
            }
        };

        let response = resource
            .read(
                ctx,
                ReadResourceRequest {
                    type_name: request.type_name,
                    current_state,
                    client_capabilities: request.client_capabilities,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        let new_state = encode(
            &response.new_state.unwrap_or_else(DynamicValue::null),
            &mut diagnostics,
        );
        wire::read_resource::Response {
            new_state,
            diagnostics,
        }
    }

    pub async fn import_resource_state(
        &self,
        ctx: Context,
        request: wire::import_resource_state::Request,
    ) -> wire::import_resource_state::Response {
        let resource = match self.configured_resource(ctx.clone(), &request.type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return wire::import_resource_state::Response {
                    imported_resources: vec![],
                    diagnostics,
                }
            }
        };

        let response = resource
            .import_state(
                ctx,
                ImportResourceStateRequest {
                    type_name: request.type_name,
                    id: request.id,
                    client_capabilities: request.client_capabilities,
                },
            )
            .await;
        let mut diagnostics = response.diagnostics;

        let imported_resources = response
            .imported_resources
            .into_iter()
            .map(|imported| wire::import_resource_state::ImportedResource {
                type_name: imported.type_name,
                state: encode(&imported.state, &mut diagnostics),
            })
            .collect();

        wire::import_resource_state::Response {
            imported_resources,
            diagnostics,
        }
    }

    pub async fn read_data_source(
        &self,
        ctx: Context,
        request: wire::read_data_source::Request,
    ) -> wire::read_data_source::Response {
        let mut diagnostics = vec![];

        let Some(config) = decode(&request.config, "configuration", &mut diagnostics) else {
            return wire::read_data_source::Response {
                state: EncodedValue::default(),
                diagnostics,
            };
        };

        let data_source = match self
            .configured_data_source(ctx.clone(), &request.type_name)
            .await
        {
            Ok(data_source) => data_source,
            Err(errors) => {
                return wire::read_data_source::Response {
                    state: EncodedValue::default(),
                    diagnostics: errors,
                }
            }
        };

        let response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: request.type_name,
                    config,
                    client_capabilities: request.client_capabilities,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        let state = encode(&response.state, &mut diagnostics);
        wire::read_data_source::Response { state, diagnostics }
    }

    /// Creates a resource from its factory and hands it the provider data.
    /// Before `configure_provider` the resource is left unconfigured and
    /// reports that itself.
    async fn configured_resource(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self
            .resources
            .get(type_name)
            .ok_or_else(|| vec![unknown_resource(type_name)])?;
        let mut resource = factory();

        let provider_data = self.provider_data.read().await.clone();
        if provider_data.is_some() {
            let response = resource
                .configure(ctx, ConfigureResourceRequest { provider_data })
                .await;
            if has_errors(&response.diagnostics) {
                return Err(response.diagnostics);
            }
        }

        Ok(resource)
    }

    async fn configured_data_source(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self
            .data_sources
            .get(type_name)
            .ok_or_else(|| vec![unknown_data_source(type_name)])?;
        let mut data_source = factory();

        let provider_data = self.provider_data.read().await.clone();
        if provider_data.is_some() {
            let response = data_source
                .configure(ctx, ConfigureDataSourceRequest { provider_data })
                .await;
            if has_errors(&response.diagnostics) {
                return Err(response.diagnostics);
            }
        }

        Ok(data_source)
    }
}

fn unknown_resource(type_name: &str) -> Diagnostic {
    Diagnostic::error(
        "Unknown resource type",
        TfplugError::ResourceNotFound(type_name.to_string()).to_string(),
    )
}

fn unknown_data_source(type_name: &str) -> Diagnostic {
    Diagnostic::error(
        "Unknown data source type",
        TfplugError::DataSourceNotFound(type_name.to_string()).to_string(),
    )
}

fn decode(
    value: &EncodedValue,
    what: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<DynamicValue> {
    match value.decode() {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                format!("Invalid {}", what),
                e.to_string(),
            ));
            None
        }
    }
}

fn encode(value: &DynamicValue, diagnostics: &mut Vec<Diagnostic>) -> EncodedValue {
    EncodedValue::from_value(value).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
        EncodedValue::default()
    })
}

/// Checks a configuration against a schema: unknown attributes, values set
/// on computed-only attributes, type tags and required attributes.
fn check_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];

    let entries = match &config.value {
        Dynamic::Map(entries) => Some(entries),
        Dynamic::Unknown => return diagnostics,
        _ => None,
    };

    if let Some(entries) = entries {
        let mut names: Vec<_> = entries.keys().collect();
        names.sort();

        for name in names {
            let value = &entries[name];
            let path = AttributePath::new(name);

            let Some(attribute) = schema.attribute(name) else {
                diagnostics.push(
                    Diagnostic::error(
                        "Unsupported argument",
                        format!("An argument named \"{}\" is not expected here", name),
                    )
                    .with_attribute(path),
                );
                continue;
            };

            if attribute.is_computed_only() && !value.is_null() {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid configuration",
                        format!("Attribute \"{}\" is read-only and cannot be set", name),
                    )
                    .with_attribute(path.clone()),
                );
            }

            if !attribute.r#type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        TfplugError::TypeMismatch {
                            expected: attribute.r#type.to_json().to_string(),
                            actual: value.type_name().to_string(),
                        }
                        .to_string(),
                    )
                    .with_attribute(path),
                );
            }
        }
    }

    for attribute in schema.block.attributes.iter().filter(|a| a.required) {
        let set = entries
            .and_then(|entries| entries.get(&attribute.name))
            .is_some_and(|value| !value.is_null());
        if !set {
            diagnostics.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!(
                        "The argument \"{}\" is required, but no definition was found",
                        attribute.name
                    ),
                )
                .with_attribute(AttributePath::new(&attribute.name)),
            );
        }
    }

    diagnostics
}

/// Builds the planned state from the proposed one.
///
/// On create every computed attribute the configuration leaves unset becomes
/// unknown. On update the same happens only when a configurable attribute
/// changed, and `id` keeps its prior value.
fn plan_computed(
    schema: &Schema,
    prior: &DynamicValue,
    proposed: DynamicValue,
    config: &DynamicValue,
    diagnostics: &mut Vec<Diagnostic>,
) -> DynamicValue {
    let mut planned = proposed;
    let creating = prior.is_null();

    let changed = !creating
        && schema
            .block
            .attributes
            .iter()
            .filter(|a| !a.is_computed_only())
            .any(|a| {
                let path = AttributePath::new(&a.name);
                prior.get(&path) != planned.get(&path)
            });

    if !creating && !changed {
        return planned;
    }

    for attribute in schema.block.attributes.iter().filter(|a| a.computed) {
        if !creating && attribute.name == "id" {
            continue;
        }

        let path = AttributePath::new(&attribute.name);
        let configured = config.get(&path).is_some_and(|value| !value.is_null());
        if configured {
            continue;
        }

        if let Err(e) = planned.mark_unknown(&path) {
            diagnostics.push(
                Diagnostic::error("Failed to plan computed attribute", e.to_string())
                    .with_attribute(path),
            );
        }
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{
        ConfigureDataSourceResponse, DataSource, DataSourceSchemaResponse, ReadDataSourceResponse,
    };
    use crate::provider::{
        ConfigureProviderResponse, ProviderMetadataRequest, ProviderMetadataResponse,
        ProviderSchemaResponse,
    };
    use crate::resource::{
        ConfigureResourceResponse, CreateResourceResponse, DeleteResourceResponse,
        ReadResourceResponse, Resource, ResourceSchemaResponse,
        UpdateResourceResponse, ValidateResourceConfigResponse,
    };
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
    use crate::types::ClientCapabilities;
    use async_trait::async_trait;

    fn note_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(AttributeBuilder::new("id", AttributeType::String).computed().build())
            .attribute(AttributeBuilder::new("text", AttributeType::String).required().build())
            .attribute(
                AttributeBuilder::new("length", AttributeType::Number)
                    .computed()
                    .build(),
            )
            .build()
    }

    /// Keeps notes in memory; the provider data is the id it hands out
    struct NoteResource {
        next_id: Option<Arc<String>>,
    }

    #[async_trait]
    impl Resource for NoteResource {
        fn type_name(&self) -> &str {
            "test_note"
        }

        async fn schema(
            &self,
            _ctx: Context,
            _request: ResourceSchemaRequest,
        ) -> ResourceSchemaResponse {
            ResourceSchemaResponse {
                schema: note_schema(),
                diagnostics: vec![],
            }
        }

        async fn validate(
            &self,
            _ctx: Context,
            request: ValidateResourceConfigRequest,
        ) -> ValidateResourceConfigResponse {
            let mut diagnostics = vec![];
            if let Ok(text) = request.config.get_string(&AttributePath::new("text")) {
                if text.is_empty() {
                    diagnostics.push(Diagnostic::error("Empty text", "text must not be empty"));
                }
            }
            ValidateResourceConfigResponse { diagnostics }
        }

        async fn create(
            &self,
            _ctx: Context,
            request: CreateResourceRequest,
        ) -> CreateResourceResponse {
            let Some(id) = &self.next_id else {
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Provider not configured",
                        "configure first",
                    )],
                };
            };

            let mut state = request.planned_state;
            let text = state
                .get_string(&AttributePath::new("text"))
                .unwrap_or_default();
            state
                .set_string(&AttributePath::new("id"), id.to_string())
                .unwrap();
            state
                .set_number(&AttributePath::new("length"), text.len() as f64)
                .unwrap();
            CreateResourceResponse {
                new_state: state,
                diagnostics: vec![],
            }
        }

        async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
            let gone = request
                .current_state
                .get_string(&AttributePath::new("id"))
                .map(|id| id == "gone")
                .unwrap_or(false);
            ReadResourceResponse {
                new_state: if gone {
                    None
                } else {
                    Some(request.current_state)
                },
                diagnostics: vec![],
            }
        }

        async fn update(
            &self,
            _ctx: Context,
            request: UpdateResourceRequest,
        ) -> UpdateResourceResponse {
            UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![],
            }
        }

        async fn delete(
            &self,
            _ctx: Context,
            request: DeleteResourceRequest,
        ) -> DeleteResourceResponse {
            let locked = request
                .prior_state
                .get_string(&AttributePath::new("id"))
                .map(|id| id == "locked")
                .unwrap_or(false);
            DeleteResourceResponse {
                diagnostics: if locked {
                    vec![Diagnostic::error("Failed to delete note", "locked")]
                } else {
                    vec![]
                },
            }
        }
    }

    #[async_trait]
    impl ResourceWithConfigure for NoteResource {
        async fn configure(
            &mut self,
            _ctx: Context,
            request: ConfigureResourceRequest,
        ) -> ConfigureResourceResponse {
            self.next_id = request
                .provider_data
                .and_then(|data| data.downcast::<String>().ok());
            ConfigureResourceResponse {
                diagnostics: vec![],
            }
        }
    }

    struct EchoDataSource;

    #[async_trait]
    impl DataSource for EchoDataSource {
        fn type_name(&self) -> &str {
            "test_echo"
        }

        async fn schema(
            &self,
            _ctx: Context,
            _request: DataSourceSchemaRequest,
        ) -> DataSourceSchemaResponse {
            DataSourceSchemaResponse {
                schema: SchemaBuilder::new()
                    .attribute(
                        AttributeBuilder::new("value", AttributeType::String)
                            .optional()
                            .build(),
                    )
                    .build(),
                diagnostics: vec![],
            }
        }

        async fn read(
            &self,
            _ctx: Context,
            request: ReadDataSourceRequest,
        ) -> ReadDataSourceResponse {
            ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![],
            }
        }
    }

    #[async_trait]
    impl DataSourceWithConfigure for EchoDataSource {
        async fn configure(
            &mut self,
            _ctx: Context,
            _request: ConfigureDataSourceRequest,
        ) -> ConfigureDataSourceResponse {
            ConfigureDataSourceResponse {
                diagnostics: vec![],
            }
        }
    }

    struct TestProvider;

    #[async_trait]
    impl Provider for TestProvider {
        fn type_name(&self) -> &str {
            "test"
        }

        async fn metadata(
            &self,
            _ctx: Context,
            _request: ProviderMetadataRequest,
        ) -> ProviderMetadataResponse {
            ProviderMetadataResponse {
                type_name: "test".to_string(),
            }
        }

        async fn schema(
            &self,
            _ctx: Context,
            _request: ProviderSchemaRequest,
        ) -> ProviderSchemaResponse {
            ProviderSchemaResponse {
                schema: SchemaBuilder::new().build(),
                diagnostics: vec![],
            }
        }

        async fn configure(
            &mut self,
            _ctx: Context,
            _request: ConfigureProviderRequest,
        ) -> ConfigureProviderResponse {
            ConfigureProviderResponse {
                diagnostics: vec![],
                provider_data: Some(Arc::new("note-1".to_string())),
            }
        }

        fn resources(&self) -> HashMap<String, ResourceFactory> {
            let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
            resources.insert(
                "test_note".to_string(),
                Box::new(|| {
                    Box::new(NoteResource { next_id: None }) as Box<dyn ResourceWithConfigure>
                }),
            );
            resources
        }

        fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
            let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
            data_sources.insert(
                "test_echo".to_string(),
                Box::new(|| Box::new(EchoDataSource) as Box<dyn DataSourceWithConfigure>),
            );
            data_sources
        }
    }

    fn server() -> ProviderServer<TestProvider> {
        ProviderServer::with_config(TestProvider, ServerConfig::new().without_logging())
    }

    async fn configured_server() -> ProviderServer<TestProvider> {
        let server = server();
        let response = server
            .configure_provider(
                Context::new(),
                wire::configure_provider::Request {
                    terraform_version: "1.9.0".to_string(),
                    config: EncodedValue::from_json(b"{}".to_vec()),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        server
    }

    fn value(json: &str) -> EncodedValue {
        EncodedValue::from_json(json.as_bytes().to_vec())
    }

    fn validate_request(json: &str) -> wire::validate_resource_config::Request {
        wire::validate_resource_config::Request {
            type_name: "test_note".to_string(),
            config: value(json),
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    async fn schema_lists_resources_and_data_sources() {
        let response = server().get_provider_schema(Context::new()).await;

        assert!(response.diagnostics.is_empty());
        assert!(response.resource_schemas.contains_key("test_note"));
        assert!(response.data_source_schemas.contains_key("test_echo"));
    }

    #[tokio::test]
    async fn metadata_names_provider_and_registered_types() {
        let response = server().get_metadata(Context::new()).await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(response.type_name, "test");
        assert_eq!(response.resources, vec!["test_note".to_string()]);
        assert_eq!(response.data_sources, vec!["test_echo".to_string()]);
    }

    #[tokio::test]
    async fn validate_accepts_well_typed_config() {
        let response = server()
            .validate_resource_config(Context::new(), validate_request(r#"{"text":"hi"}"#))
            .await;

        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn validate_reports_missing_required_attribute() {
        let response = server()
            .validate_resource_config(Context::new(), validate_request("{}"))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Missing required argument");
    }

    #[tokio::test]
    async fn validate_reports_type_mismatch_and_unknown_attribute() {
        let response = server()
            .validate_resource_config(
                Context::new(),
                validate_request(r#"{"text":7,"colour":"red"}"#),
            )
            .await;

        let summaries: Vec<_> = response
            .diagnostics
            .iter()
            .map(|d| d.summary.as_str())
            .collect();
        assert!(summaries.contains(&"Incorrect attribute value type"));
        assert!(summaries.contains(&"Unsupported argument"));
    }

    #[tokio::test]
    async fn validate_runs_resource_checks_after_type_checks() {
        let response = server()
            .validate_resource_config(Context::new(), validate_request(r#"{"text":""}"#))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Empty text");
    }

    #[tokio::test]
    async fn validate_rejects_unknown_type() {
        let response = server()
            .validate_resource_config(
                Context::new(),
                wire::validate_resource_config::Request {
                    type_name: "test_missing".to_string(),
                    config: value("{}"),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert_eq!(response.diagnostics[0].summary, "Unknown resource type");
    }

    #[tokio::test]
    async fn plan_create_marks_computed_unknown() {
        let response = server()
            .plan_resource_change(
                Context::new(),
                wire::plan_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: EncodedValue::default(),
                    proposed_new_state: value(r#"{"id":null,"text":"hi","length":null}"#),
                    config: value(r#"{"id":null,"text":"hi","length":null}"#),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let planned = response.planned_state.decode().unwrap();
        assert_eq!(planned.get(&AttributePath::new("id")), Some(&Dynamic::Unknown));
        assert_eq!(
            planned.get(&AttributePath::new("length")),
            Some(&Dynamic::Unknown)
        );
        assert_eq!(
            planned.get_string(&AttributePath::new("text")).unwrap(),
            "hi"
        );
    }

    #[tokio::test]
    async fn plan_update_keeps_id_and_recomputes_the_rest() {
        let response = server()
            .plan_resource_change(
                Context::new(),
                wire::plan_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: value(r#"{"id":"note-1","text":"hi","length":2}"#),
                    proposed_new_state: value(r#"{"id":"note-1","text":"hello","length":2}"#),
                    config: value(r#"{"id":null,"text":"hello","length":null}"#),
                },
            )
            .await;

        let planned = response.planned_state.decode().unwrap();
        assert_eq!(
            planned.get_string(&AttributePath::new("id")).unwrap(),
            "note-1"
        );
        assert_eq!(
            planned.get(&AttributePath::new("length")),
            Some(&Dynamic::Unknown)
        );
    }

    #[tokio::test]
    async fn plan_without_changes_keeps_prior_values() {
        let state = r#"{"id":"note-1","text":"hi","length":2}"#;
        let response = server()
            .plan_resource_change(
                Context::new(),
                wire::plan_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: value(state),
                    proposed_new_state: value(state),
                    config: value(r#"{"id":null,"text":"hi","length":null}"#),
                },
            )
            .await;

        let planned = response.planned_state.decode().unwrap();
        assert_eq!(planned.get_number(&AttributePath::new("length")).unwrap(), 2.0);
    }

    #[tokio::test]
    async fn plan_destroy_is_null() {
        let response = server()
            .plan_resource_change(
                Context::new(),
                wire::plan_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: value(r#"{"id":"note-1","text":"hi","length":2}"#),
                    proposed_new_state: EncodedValue::default(),
                    config: EncodedValue::default(),
                },
            )
            .await;

        assert!(response.planned_state.decode().unwrap().is_null());
    }

    #[tokio::test]
    async fn apply_create_before_configure_reports_resource_error() {
        let response = server()
            .apply_resource_change(
                Context::new(),
                wire::apply_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: EncodedValue::default(),
                    planned_state: value(r#"{"text":"hi"}"#),
                    config: value(r#"{"text":"hi"}"#),
                },
            )
            .await;

        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
        assert!(response.new_state.decode().unwrap().is_null());
    }

    #[tokio::test]
    async fn apply_create_uses_provider_data() {
        let server = configured_server().await;
        let response = server
            .apply_resource_change(
                Context::new(),
                wire::apply_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: EncodedValue::default(),
                    planned_state: value(r#"{"text":"hi"}"#),
                    config: value(r#"{"text":"hi"}"#),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = response.new_state.decode().unwrap();
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "note-1");
        assert_eq!(state.get_number(&AttributePath::new("length")).unwrap(), 2.0);
    }

    #[tokio::test]
    async fn apply_delete_clears_state() {
        let server = configured_server().await;
        let response = server
            .apply_resource_change(
                Context::new(),
                wire::apply_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: value(r#"{"id":"note-1","text":"hi"}"#),
                    planned_state: EncodedValue::default(),
                    config: EncodedValue::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.decode().unwrap().is_null());
    }

    #[tokio::test]
    async fn apply_failed_delete_keeps_prior_state() {
        let server = configured_server().await;
        let response = server
            .apply_resource_change(
                Context::new(),
                wire::apply_resource_change::Request {
                    type_name: "test_note".to_string(),
                    prior_state: value(r#"{"id":"locked","text":"hi"}"#),
                    planned_state: EncodedValue::default(),
                    config: EncodedValue::default(),
                },
            )
            .await;

        assert!(has_errors(&response.diagnostics));
        let state = response.new_state.decode().unwrap();
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "locked");
    }

    #[tokio::test]
    async fn read_of_missing_resource_returns_null() {
        let server = configured_server().await;
        let response = server
            .read_resource(
                Context::new(),
                wire::read_resource::Request {
                    type_name: "test_note".to_string(),
                    current_state: value(r#"{"id":"gone","text":"hi"}"#),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.decode().unwrap().is_null());
    }

    #[tokio::test]
    async fn import_without_support_reports_diagnostic() {
        let server = configured_server().await;
        let response = server
            .import_resource_state(
                Context::new(),
                wire::import_resource_state::Request {
                    type_name: "test_note".to_string(),
                    id: "note-1".to_string(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.imported_resources.is_empty());
        assert_eq!(response.diagnostics[0].summary, "Import not supported");
    }

    #[tokio::test]
    async fn read_data_source_dispatches_by_type() {
        let server = configured_server().await;
        let response = server
            .read_data_source(
                Context::new(),
                wire::read_data_source::Request {
                    type_name: "test_echo".to_string(),
                    config: value(r#"{"value":"ping"}"#),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = response.state.decode().unwrap();
        assert_eq!(state.get_string(&AttributePath::new("value")).unwrap(), "ping");

        let missing = server
            .read_data_source(
                Context::new(),
                wire::read_data_source::Request {
                    type_name: "test_nothing".to_string(),
                    config: value("{}"),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;
        assert_eq!(missing.diagnostics[0].summary, "Unknown data source type");
    }

    #[test]
    fn logging_can_be_installed_twice() {
        let config = ServerConfig::new().with_log_level(LogLevel::Debug);
        config.init_logging();
        config.init_logging();
    }
}
