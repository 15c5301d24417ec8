//! Shelly smart plug provisioning.
//!
//! The plug is configured through its local HTTP API with a fixed sequence
//! of JSON POST requests. Requests are built up front from [`PlugSettings`]
//! and then applied one by one: a non-200 answer is logged and recorded,
//! and the next request is still sent.

pub mod client;

pub use client::ShellyClient;

use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value};

/// Default address of a plug in access point mode
pub const DEFAULT_BASE_URL: &str = "http://192.168.33.1";

/// Default relay power limit in watts
pub const DEFAULT_MAX_POWER: u32 = 2200;

#[derive(Debug, thiserror::Error)]
pub enum PlugError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}")]
    Status { operation: String, status: u16 },
}

/// Resolved plug settings (secrets already read from the environment)
#[derive(Clone, PartialEq, Eq)]
pub struct PlugSettings {
    pub name: String,
    /// `on`, `off`, `last` or `switch`
    pub relay_default_state: String,
    pub disable_leds: bool,
    pub mqtt_server: Option<String>,
    /// Keep the Shelly cloud connection enabled
    pub cloud: bool,
    pub max_power: u32,
    pub wifi_ssid: Option<String>,
    pub wifi_key: String,
}

impl std::fmt::Debug for PlugSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlugSettings")
            .field("name", &self.name)
            .field("relay_default_state", &self.relay_default_state)
            .field("disable_leds", &self.disable_leds)
            .field("mqtt_server", &self.mqtt_server)
            .field("cloud", &self.cloud)
            .field("max_power", &self.max_power)
            .field("wifi_ssid", &self.wifi_ssid)
            .finish_non_exhaustive()
    }
}

/// One API call against the plug
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlugRequest {
    /// What the request does, for logs and reports
    pub operation: String,
    pub path: String,
    pub payload: Value,
}

impl PlugRequest {
    fn new(operation: impl Into<String>, path: &str, payload: Value) -> Self {
        Self {
            operation: operation.into(),
            path: path.to_string(),
            payload,
        }
    }
}

/// Transport used to reach the plug
pub trait PlugApi {
    /// POST a JSON body and return the HTTP status
    fn post(&mut self, path: &str, payload: &Value) -> Result<u16, PlugError>;
}

/// Summary of a plug run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlugReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl PlugReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Requests in the order they are sent
pub fn build_requests(settings: &PlugSettings) -> Vec<PlugRequest> {
    let mut requests = vec![
        PlugRequest::new(
            format!("Set device name to {}", settings.name),
            "/settings",
            json!({ "name": settings.name }),
        ),
        PlugRequest::new(
            format!("Set relay default state to {}", settings.relay_default_state),
            "/relay/0",
            json!({ "default_state": settings.relay_default_state }),
        ),
    ];

    if settings.disable_leds {
        requests.push(PlugRequest::new(
            "Disable LEDs",
            "/settings",
            json!({ "led_status_disable": true, "led_power_disable": true }),
        ));
    }

    if let Some(server) = &settings.mqtt_server {
        requests.push(PlugRequest::new(
            format!("Configure MQTT broker {}", server),
            "/mqtt",
            json!({
                "enable": true,
                "server": server,
                "user": "",
                "id": settings.name,
                "topic_prefix": settings.name,
            }),
        ));
    }

    if !settings.cloud {
        requests.push(PlugRequest::new(
            "Disable cloud connection",
            "/settings",
            json!({ "cloud_enabled": false }),
        ));
    }

    requests.push(PlugRequest::new(
        format!("Set max power to {}W", settings.max_power),
        "/settings/relay/0",
        json!({ "max_power": settings.max_power }),
    ));

    // Joining the station network moves the plug off its AP address, so last
    if let Some(ssid) = &settings.wifi_ssid {
        requests.push(PlugRequest::new(
            format!("Join WiFi network {}", ssid),
            "/wifi",
            json!({ "ssid": ssid, "key": settings.wifi_key }),
        ));
    }

    requests
}

/// Send every request, continuing past failures
pub fn apply_requests<A: PlugApi + ?Sized>(api: &mut A, requests: &[PlugRequest]) -> PlugReport {
    let mut report = PlugReport::default();

    for request in requests {
        let result = api.post(&request.path, &request.payload).and_then(|status| {
            if status == 200 {
                Ok(())
            } else {
                Err(PlugError::Status {
                    operation: request.operation.clone(),
                    status,
                })
            }
        });

        match result {
            Ok(()) => {
                info!("{}: done", request.operation);
                report.succeeded.push(request.operation.clone());
            }
            Err(e) => {
                warn!("{}: {}", request.operation, e);
                report.failed.push(request.operation.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PlugSettings {
        PlugSettings {
            name: "Outlet1".to_string(),
            relay_default_state: "off".to_string(),
            disable_leds: true,
            mqtt_server: Some("172.23.83.254".to_string()),
            cloud: false,
            max_power: DEFAULT_MAX_POWER,
            wifi_ssid: Some("IoT".to_string()),
            wifi_key: "wifikey".to_string(),
        }
    }

    /// Answers every request with a fixed status per path
    struct FakePlug {
        calls: Vec<(String, Value)>,
        failing_path: Option<&'static str>,
    }

    impl PlugApi for FakePlug {
        fn post(&mut self, path: &str, payload: &Value) -> Result<u16, PlugError> {
            self.calls.push((path.to_string(), payload.clone()));
            match self.failing_path {
                Some(failing) if failing == path => Ok(500),
                _ => Ok(200),
            }
        }
    }

    #[test]
    fn test_request_order_and_payloads() {
        let requests = build_requests(&settings());
        let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/settings", "/relay/0", "/settings", "/mqtt", "/settings", "/settings/relay/0", "/wifi"]
        );
        assert_eq!(requests[0].payload, json!({ "name": "Outlet1" }));
        assert_eq!(requests[3].payload["topic_prefix"], "Outlet1");
        assert_eq!(requests[5].payload, json!({ "max_power": 2200 }));
        assert_eq!(requests[6].payload, json!({ "ssid": "IoT", "key": "wifikey" }));
    }

    #[test]
    fn test_cloud_flag_skips_disable_request() {
        let mut s = settings();
        s.cloud = true;
        s.mqtt_server = None;
        s.wifi_ssid = None;
        let requests = build_requests(&s);
        assert!(!requests.iter().any(|r| r.payload.get("cloud_enabled").is_some()));
        assert!(!requests.iter().any(|r| r.path == "/mqtt" || r.path == "/wifi"));
    }

    #[test]
    fn test_failure_is_reported_and_run_continues() {
        let mut plug = FakePlug {
            calls: Vec::new(),
            failing_path: Some("/mqtt"),
        };
        let requests = build_requests(&settings());
        let report = apply_requests(&mut plug, &requests);

        assert_eq!(plug.calls.len(), requests.len());
        assert_eq!(report.failed, vec!["Configure MQTT broker 172.23.83.254".to_string()]);
        assert_eq!(report.succeeded.len(), requests.len() - 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_debug_hides_wifi_key() {
        assert!(!format!("{:?}", settings()).contains("wifikey"));
    }
}
