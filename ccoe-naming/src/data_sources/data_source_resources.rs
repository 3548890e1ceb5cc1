//! Inventory of every reserved resource name

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::resources::ResourceNaming;
use crate::api::{cancellable, LooseRecord};
use crate::NamingProviderData;

/// Fields kept from each listed record, with their types
const RECORD_FIELDS: &[(&str, AttributeType)] = &[
    ("id", AttributeType::Number),
    ("name", AttributeType::String),
    ("function", AttributeType::String),
    ("region", AttributeType::String),
    ("env", AttributeType::String),
    ("product", AttributeType::String),
    ("application", AttributeType::String),
];

#[derive(Default)]
pub struct ResourcesDataSource {
    provider_data: Option<NamingProviderData>,
}

impl ResourcesDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_type() -> AttributeType {
        AttributeType::Object(
            RECORD_FIELDS
                .iter()
                .map(|(name, field_type)| (name.to_string(), field_type.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Lists every resource name reserved on the CCoE naming convention service")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unix timestamp of the read")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "resources",
                    AttributeType::List(Box::new(Self::record_type())),
                )
                .description("Reserved resource names")
                .computed()
                .build(),
            )
            .build()
    }
}

/// Projects a loose record onto the fixed element type. Missing or mistyped
/// fields become null, unknown fields are dropped.
fn project(record: &LooseRecord) -> Dynamic {
    let fields: HashMap<String, Dynamic> = RECORD_FIELDS
        .iter()
        .map(|(name, field_type)| {
            let value = record
                .get(*name)
                .map(|value| Dynamic::from(value.clone()))
                .unwrap_or(Dynamic::Null);

            let value = if field_type.accepts(&value) {
                value
            } else {
                tracing::warn!(
                    field = *name,
                    "dropping {} value of listed record field",
                    value.type_name()
                );
                Dynamic::Null
            };

            (name.to_string(), value)
        })
        .collect();

    Dynamic::Map(fields)
}

#[async_trait]
impl DataSource for ResourcesDataSource {
    fn type_name(&self) -> &str {
        "ccoe-naming_resources"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(Diagnostic::error(
                "Provider not configured",
                "Provider data was not properly configured",
            ));
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        };

        let records = match cancellable(
            &ctx,
            provider_data.client.naming::<ResourceNaming>().list(),
        )
        .await
        {
            Ok(records) => records,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to list resource names",
                    format!("API error: {}", e),
                ));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        tracing::debug!(count = records.len(), "listed resource names");

        let mut state = DynamicValue::null();
        let resources = records.iter().map(project).collect();
        let result = state
            .set_string(
                &AttributePath::new("id"),
                chrono::Utc::now().timestamp().to_string(),
            )
            .and_then(|_| state.set_list(&AttributePath::new("resources"), resources));

        if let Err(e) = result {
            diagnostics.push(Diagnostic::error("Failed to set state", e.to_string()));
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        }

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for ResourcesDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<NamingProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                tracing::error!("Failed to downcast provider data to NamingProviderData");
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract NamingProviderData from provider data",
                ));
            }
        } else {
            tracing::warn!("No provider data provided to resources data source");
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the data source",
            ));
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
