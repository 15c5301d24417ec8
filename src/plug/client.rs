use super::{PlugApi, PlugError};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Identification returned by `GET /shelly`
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "type", default)]
    pub model: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub fw: String,
}

/// HTTP client for the Shelly local API
pub struct ShellyClient {
    base_url: String,
    client: Client,
}

impl ShellyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PlugError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| PlugError::Http {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check that the plug answers and log what it is
    pub fn identify(&self) -> Result<DeviceInfo, PlugError> {
        let url = self.api_url("/shelly");
        let http_error = |source| PlugError::Http {
            url: url.clone(),
            source,
        };

        let resp = self.client.get(&url).send().map_err(http_error)?;
        if !resp.status().is_success() {
            return Err(PlugError::Status {
                operation: "Identify device".to_string(),
                status: resp.status().as_u16(),
            });
        }
        let device: DeviceInfo = resp.json().map_err(http_error)?;
        info!("Connected to {} (mac {}, firmware {})", device.model, device.mac, device.fw);
        Ok(device)
    }
}

impl PlugApi for ShellyClient {
    fn post(&mut self, path: &str, payload: &Value) -> Result<u16, PlugError> {
        let url = self.api_url(path);
        debug!("POST {} {}", url, payload);
        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .map_err(|source| PlugError::Http { url, source })?;
        Ok(resp.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ShellyClient::new("http://192.168.33.1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_url("/settings"), "http://192.168.33.1/settings");
    }

    #[test]
    fn test_device_info_parses_partial_body() {
        let info: DeviceInfo =
            serde_json::from_str(r#"{"type":"SHPLG-S","mac":"AABBCCDDEEFF","auth":false}"#).unwrap();
        assert_eq!(info.model, "SHPLG-S");
        assert_eq!(info.mac, "AABBCCDDEEFF");
        assert!(info.fw.is_empty());
    }
}
