//! Names for virtual machines

use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use super::synchronizer::{required_string, NamingResource, SyncedKind};
use crate::api::vms::{VmNaming, VmNamingRecord, VmNamingRequest};

pub type VmNamingResource = NamingResource<VmNaming>;

impl SyncedKind for VmNaming {
    const TYPE_NAME: &'static str = "ccoe-naming_vms";
    const NOUN: &'static str = "VM name";
    const DESCRIPTION: &'static str =
        "Reserves a virtual machine name from the CCoE naming convention service";
    const ATTRIBUTES: &'static [(&'static str, &'static str)] = &[
        ("product", "Product the VM belongs to"),
        ("os", "Operating system, e.g. windows or linux"),
        ("region", "Azure region, e.g. eastus"),
        ("env", "Environment, e.g. dev or prod"),
    ];

    fn desired(state: &DynamicValue) -> Result<VmNamingRequest, Diagnostic> {
        Ok(VmNamingRequest {
            product: required_string(state, "product")?,
            os: required_string(state, "os")?,
            region: required_string(state, "region")?,
            env: required_string(state, "env")?,
        })
    }

    fn record_id(record: &VmNamingRecord) -> i64 {
        record.id
    }

    fn write_state(record: &VmNamingRecord, state: &mut DynamicValue) -> tfplug::Result<()> {
        state.set_string(&AttributePath::new("id"), record.id.to_string())?;
        state.set_string(&AttributePath::new("name"), record.name.clone())?;
        state.set_string(&AttributePath::new("product"), record.product.clone())?;
        state.set_string(&AttributePath::new("os"), record.os.clone())?;
        state.set_string(&AttributePath::new("region"), record.region.clone())?;
        state.set_string(&AttributePath::new("env"), record.env.clone())?;
        Ok(())
    }
}
