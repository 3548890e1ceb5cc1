//! Generic Azure resource names

use serde::{Deserialize, Serialize};

use super::naming::NamingKind;

/// Names for generic Azure resources
pub struct ResourceNaming;

impl NamingKind for ResourceNaming {
    const PATH: &'static str = "/api/naming/resource/naming";

    type Request = ResourceNamingRequest;
    type Record = ResourceNamingRecord;
}

/// Request body for creating and updating resource names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceNamingRequest {
    pub product: String,
    pub function: String,
    pub application: String,
    pub region: String,
    pub env: String,
}

/// Resource name as stored by the naming service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceNamingRecord {
    pub id: i64,
    pub name: String,
    pub product: String,
    pub function: String,
    pub application: String,
    pub region: String,
    pub env: String,
}
