//! Provider configuration: provider block first, environment second, defaults last

use crate::api::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use std::time::Duration;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub const ENDPOINT_ENV: &str = "CCOE_NAMING_ENDPOINT";
pub const TIMEOUT_ENV: &str = "CCOE_NAMING_TIMEOUT";

/// Resolves the client settings from the provider block.
///
/// Every problem is reported, not only the first one.
pub fn resolve(config: &DynamicValue) -> Result<ClientConfig, Vec<Diagnostic>> {
    let mut diagnostics = vec![];

    let endpoint = config
        .get_string(&AttributePath::new("endpoint"))
        .ok()
        .filter(|endpoint| !endpoint.is_empty())
        .or_else(|| std::env::var(ENDPOINT_ENV).ok())
        .filter(|endpoint| !endpoint.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let timeout = match config.get_number(&AttributePath::new("timeout")) {
        Ok(seconds) => timeout_from_seconds(seconds, "timeout", &mut diagnostics),
        Err(_) => match std::env::var(TIMEOUT_ENV) {
            Ok(raw) => match raw.trim().parse::<f64>() {
                Ok(seconds) => timeout_from_seconds(seconds, TIMEOUT_ENV, &mut diagnostics),
                Err(_) => {
                    diagnostics.push(Diagnostic::error(
                        "Invalid timeout",
                        format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, raw),
                    ));
                    None
                }
            },
            Err(_) => Some(DEFAULT_TIMEOUT),
        },
    };

    match (timeout, diagnostics.is_empty()) {
        (Some(timeout), true) => Ok(ClientConfig { endpoint, timeout }),
        _ => Err(diagnostics),
    }
}

fn timeout_from_seconds(
    seconds: f64,
    source: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Duration> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(timeout) if !timeout.is_zero() => Some(timeout),
        _ => {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid timeout",
                    format!("{} must be a positive number of seconds, got {}", source, seconds),
                )
                .with_attribute(AttributePath::new("timeout")),
            );
            None
        }
    }
}
