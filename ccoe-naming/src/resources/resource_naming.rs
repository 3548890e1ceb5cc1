//! Names for generic Azure resources

use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use super::synchronizer::{required_string, NamingResource, SyncedKind};
use crate::api::resources::{ResourceNaming, ResourceNamingRecord, ResourceNamingRequest};

pub type ResourceNamingResource = NamingResource<ResourceNaming>;

impl SyncedKind for ResourceNaming {
    const TYPE_NAME: &'static str = "ccoe-naming_resources";
    const NOUN: &'static str = "resource name";
    const DESCRIPTION: &'static str =
        "Reserves a name for an Azure resource from the CCoE naming convention service";
    const ATTRIBUTES: &'static [(&'static str, &'static str)] = &[
        ("product", "Product the resource belongs to"),
        ("function", "Function of the resource, e.g. web or db"),
        ("application", "Application the resource belongs to"),
        ("region", "Azure region, e.g. eastus"),
        ("env", "Environment, e.g. dev or prod"),
    ];

    fn desired(state: &DynamicValue) -> Result<ResourceNamingRequest, Diagnostic> {
        Ok(ResourceNamingRequest {
            product: required_string(state, "product")?,
            function: required_string(state, "function")?,
            application: required_string(state, "application")?,
            region: required_string(state, "region")?,
            env: required_string(state, "env")?,
        })
    }

    fn record_id(record: &ResourceNamingRecord) -> i64 {
        record.id
    }

    fn write_state(record: &ResourceNamingRecord, state: &mut DynamicValue) -> tfplug::Result<()> {
        state.set_string(&AttributePath::new("id"), record.id.to_string())?;
        state.set_string(&AttributePath::new("name"), record.name.clone())?;
        state.set_string(&AttributePath::new("product"), record.product.clone())?;
        state.set_string(&AttributePath::new("function"), record.function.clone())?;
        state.set_string(&AttributePath::new("application"), record.application.clone())?;
        state.set_string(&AttributePath::new("region"), record.region.clone())?;
        state.set_string(&AttributePath::new("env"), record.env.clone())?;
        Ok(())
    }
}
