pub mod resource_naming;
pub mod resource_vm_naming;
pub mod synchronizer;

pub use resource_naming::ResourceNamingResource;
pub use resource_vm_naming::VmNamingResource;
pub use synchronizer::{NamingResource, SyncedKind};
