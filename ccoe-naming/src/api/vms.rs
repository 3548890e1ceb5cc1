//! Virtual machine names

use serde::{Deserialize, Serialize};

use super::naming::NamingKind;

/// Names for virtual machines
pub struct VmNaming;

impl NamingKind for VmNaming {
    const PATH: &'static str = "/api/naming/vm/naming";

    type Request = VmNamingRequest;
    type Record = VmNamingRecord;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmNamingRequest {
    pub product: String,
    pub os: String,
    pub region: String,
    pub env: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VmNamingRecord {
    pub id: i64,
    pub name: String,
    pub product: String,
    pub os: String,
    pub region: String,
    pub env: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use crate::api::ApiError;
    use mockito::Server;

    #[tokio::test]
    async fn vm_names_live_in_their_own_collection() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/naming/vm/naming/3")
            .with_body(
                r#"{"id":3,"name":"vmfinwprd01","product":"fin","os":"windows","region":"eastus","env":"prod"}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let record = client.naming::<VmNaming>().get("3").await.unwrap();

        assert_eq!(record.os, "windows");
        assert_eq!(record.name, "vmfinwprd01");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn vm_delete_of_missing_record_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/naming/vm/naming/3")
            .with_status(404)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let result = client.naming::<VmNaming>().delete("3").await;

        assert!(result.as_ref().is_err_and(ApiError::is_not_found));
    }
}
