//! Test helpers for the naming API

#[cfg(test)]
pub fn create_test_client(url: &str) -> super::Client {
    super::Client::new(super::ClientConfig {
        endpoint: url.to_string(),
        ..Default::default()
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8888");
        assert_eq!(config.timeout.as_secs(), 10);
    }

    #[test]
    fn api_error_formatting() {
        let error = ApiError::Status {
            status: 409,
            message: "name already taken".to_string(),
        };

        let error_str = error.to_string();
        assert!(error_str.contains("HTTP 409"));
        assert!(error_str.contains("name already taken"));

        assert_eq!(
            ApiError::Timeout(2.5).to_string(),
            "Request timeout after 2.5 seconds"
        );
        assert!(ApiError::NotFound("/x".to_string()).is_not_found());
        assert!(!ApiError::Cancelled.is_not_found());
    }
}
