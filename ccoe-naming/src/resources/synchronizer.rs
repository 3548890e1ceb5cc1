//! Lifecycle shared by every naming resource
//!
//! [`NamingResource`] keeps one Terraform resource in step with one record on
//! the naming service. What differs between record kinds (type name, desired
//! attributes, record to state mapping) comes from [`SyncedKind`].
//!
//! - create: POST the desired attributes, adopt the assigned id and name, then
//!   re-read the record. If that read fails the create response is kept so
//!   the id is not lost.
//! - read: GET by id and overwrite every attribute. A missing id or a 404
//!   drops the resource from state.
//! - update: PUT the desired attributes, then re-read. The id never changes.
//! - delete: DELETE by id. A 404 counts as already deleted.

use async_trait::async_trait;
use std::marker::PhantomData;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use crate::api::{cancellable, NamingApi, NamingKind};
use crate::NamingProviderData;

/// A naming record kind that can back a Terraform resource
pub trait SyncedKind: NamingKind {
    const TYPE_NAME: &'static str;

    /// Human readable noun used in diagnostics, e.g. "resource name"
    const NOUN: &'static str;

    const DESCRIPTION: &'static str;

    /// Desired attributes as (name, description), in schema order
    const ATTRIBUTES: &'static [(&'static str, &'static str)];

    /// Builds the request body from a planned state
    fn desired(state: &DynamicValue) -> Result<Self::Request, Diagnostic>;

    fn record_id(record: &Self::Record) -> i64;

    /// Copies every attribute of the record, id and name included, into `state`
    fn write_state(record: &Self::Record, state: &mut DynamicValue) -> tfplug::Result<()>;
}

/// Reads a required string attribute from a planned state
pub fn required_string(state: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
    state.get_string(&AttributePath::new(name)).map_err(|e| {
        Diagnostic::error(
            format!("Invalid value for {}", name),
            format!("Attribute '{}' must be a known string: {}", name, e),
        )
        .with_attribute(AttributePath::new(name))
    })
}

pub struct NamingResource<K: SyncedKind> {
    provider_data: Option<NamingProviderData>,
    _kind: PhantomData<K>,
}

impl<K: SyncedKind> Default for NamingResource<K> {
    fn default() -> Self {
        Self {
            provider_data: None,
            _kind: PhantomData,
        }
    }
}

impl<K: SyncedKind> NamingResource<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description(K::DESCRIPTION)
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Identifier assigned by the naming service")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name computed by the naming service")
                    .computed()
                    .build(),
            );

        for (name, description) in K::ATTRIBUTES {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .description(description)
                    .required()
                    .build(),
            );
        }

        builder.build()
    }

    fn api<'a>(&self, provider_data: &'a NamingProviderData) -> NamingApi<'a, K> {
        provider_data.client.naming::<K>()
    }

    fn not_configured() -> Diagnostic {
        Diagnostic::error(
            "Provider not configured",
            "Provider data was not properly configured",
        )
    }

    /// Overlays a record onto `state`
    fn record_state(record: &K::Record, mut state: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        K::write_state(record, &mut state).map_err(|e| {
            Diagnostic::error(
                "Failed to set state",
                format!("Could not store {} in state: {}", K::NOUN, e),
            )
        })?;
        Ok(state)
    }
}

fn state_id(state: &DynamicValue) -> Option<String> {
    state
        .get_string(&AttributePath::new("id"))
        .ok()
        .filter(|id| !id.is_empty())
}

#[async_trait]
impl<K: SyncedKind> Resource for NamingResource<K> {
    fn type_name(&self) -> &str {
        K::TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(Self::not_configured());
            return CreateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics,
            };
        };

        let desired = match K::desired(&request.planned_state) {
            Ok(desired) => desired,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let api = self.api(provider_data);
        let created = match cancellable(&ctx, api.create(&desired)).await {
            Ok(record) => record,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to create {}", K::NOUN),
                    format!("API error: {}", e),
                ));
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let id = K::record_id(&created).to_string();
        tracing::debug!(type_name = K::TYPE_NAME, id = %id, "created naming record");

        let created_state = match Self::record_state(&created, request.planned_state) {
            Ok(state) => state,
            Err(diag) => {
                // The record exists remotely but cannot be tracked.
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let new_state = match cancellable(&ctx, api.get(&id)).await {
            Ok(record) => match Self::record_state(&record, created_state.clone()) {
                Ok(state) => state,
                Err(diag) => {
                    diagnostics.push(diag);
                    created_state
                }
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to read created {}", K::NOUN),
                    format!("Record {} was created but could not be read back: {}", id, e),
                ));
                created_state
            }
        };

        CreateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let Some(id) = state_id(&request.current_state) else {
            tracing::warn!(type_name = K::TYPE_NAME, "state has no id, removing from state");
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
            };
        };

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(Self::not_configured());
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics,
            };
        };

        match cancellable(&ctx, self.api(provider_data).get(&id)).await {
            Ok(record) => match Self::record_state(&record, request.current_state.clone()) {
                Ok(state) => ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics,
                },
                Err(diag) => {
                    diagnostics.push(diag);
                    ReadResourceResponse {
                        new_state: Some(request.current_state),
                        diagnostics,
                    }
                }
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    type_name = K::TYPE_NAME,
                    id = %id,
                    "naming record no longer exists, removing from state"
                );
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to read {}", K::NOUN),
                    format!("API error: {}", e),
                ));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(Self::not_configured());
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let Some(id) = state_id(&request.prior_state) else {
            diagnostics.push(Diagnostic::error(
                format!("Failed to update {}", K::NOUN),
                "Prior state has no id",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let desired = match K::desired(&request.planned_state) {
            Ok(desired) => desired,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let api = self.api(provider_data);
        let updated = match cancellable(&ctx, api.update(&id, &desired)).await {
            Ok(record) => record,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to update {}", K::NOUN),
                    format!("API error: {}", e),
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let record = match cancellable(&ctx, api.get(&id)).await {
            Ok(record) => record,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to read updated {}", K::NOUN),
                    format!("API error: {}", e),
                ));
                updated
            }
        };

        if K::record_id(&record).to_string() != id {
            diagnostics.push(Diagnostic::error(
                format!("Failed to update {}", K::NOUN),
                format!(
                    "Naming service changed the id from {} to {}",
                    id,
                    K::record_id(&record)
                ),
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        match Self::record_state(&record, request.planned_state) {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics,
            },
            Err(diag) => {
                diagnostics.push(diag);
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(Self::not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let Some(id) = state_id(&request.prior_state) else {
            tracing::warn!(type_name = K::TYPE_NAME, "state has no id, nothing to delete");
            return DeleteResourceResponse { diagnostics };
        };

        match cancellable(&ctx, self.api(provider_data).delete(&id)).await {
            Ok(()) => {
                tracing::debug!(type_name = K::TYPE_NAME, id = %id, "deleted naming record");
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    type_name = K::TYPE_NAME,
                    id = %id,
                    "naming record already deleted"
                );
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to delete {}", K::NOUN),
                    format!("API error: {}", e),
                ));
            }
        }

        DeleteResourceResponse { diagnostics }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };

        if request.id.parse::<i64>().is_err() {
            response.diagnostics.push(Diagnostic::error(
                "Invalid import ID",
                format!(
                    "Expected the numeric id of a {}, got '{}'",
                    K::NOUN,
                    request.id
                ),
            ));
            return response;
        }

        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl<K: SyncedKind> ResourceWithConfigure for NamingResource<K> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match request.provider_data {
            Some(data) => match data.downcast_ref::<NamingProviderData>() {
                Some(provider_data) => {
                    self.provider_data = Some(provider_data.clone());
                }
                None => {
                    tracing::error!("Failed to downcast provider data to NamingProviderData");
                    diagnostics.push(Diagnostic::error(
                        "Invalid provider data",
                        "Failed to extract NamingProviderData from provider data",
                    ));
                }
            },
            None => {
                diagnostics.push(Diagnostic::error(
                    "No provider data",
                    "No provider data was provided to the resource",
                ));
            }
        }

        ConfigureResourceResponse { diagnostics }
    }
}
