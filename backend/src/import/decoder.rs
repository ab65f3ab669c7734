//! Client for the external VIN decode API (`/vehicles/decodevin/{vin}?format=json`).

use crate::error::{AppError, Result};
use common::model::AdditionalVehicleInfo;
use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DecodeResponse {
    #[serde(default)]
    count: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<DecodeResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DecodeResult {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    variable_id: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct VinDecoder {
    client: Client,
    base_url: String,
}

impl VinDecoder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Decodes a VIN into attributes, keeping only variable ids in `filter`
    /// when one is given.
    ///
    /// Failures are logged and produce an empty list so one bad VIN never
    /// stops its batch.
    pub async fn decode(&self, vin: &str, filter: Option<&HashSet<i32>>) -> Vec<AdditionalVehicleInfo> {
        debug!("Fetching decode data for {}", vin);
        match self.fetch(vin).await {
            Ok(response) => {
                let attributes: Vec<AdditionalVehicleInfo> = response
                    .results
                    .into_iter()
                    .filter_map(|result| {
                        let variable_id = result.variable_id?;
                        if filter.is_some_and(|allowed| !allowed.contains(&variable_id)) {
                            return None;
                        }
                        Some(AdditionalVehicleInfo {
                            value: result.value.unwrap_or_default(),
                            variable_id,
                            vehicle_id: vin.to_string(),
                            variable: None,
                        })
                    })
                    .collect();
                info!(
                    "Decoded VIN {}: {} of {} results kept ({})",
                    vin,
                    attributes.len(),
                    response.count,
                    response.message.as_deref().unwrap_or("no message")
                );
                attributes
            }
            Err(AppError::Network(e)) => {
                error!("HTTP request error processing record {}: {}", vin, e);
                Vec::new()
            }
            Err(e) => {
                error!("General error during API call for record {}: {}", vin, e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self, vin: &str) -> Result<DecodeResponse> {
        let url = format!("{}/vehicles/decodevin/{}", self.base_url, vin);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus(status));
        }
        Ok(response.json::<DecodeResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VIN: &str = "1HGCM82633A004352";

    fn decode_body() -> serde_json::Value {
        serde_json::json!({
            "Count": 4,
            "Message": "Results returned successfully",
            "SearchCriteria": format!("VIN:{VIN}"),
            "Results": [
                { "Value": "HONDA", "ValueId": "474", "Variable": "Make", "VariableId": 26 },
                { "Value": "Accord", "ValueId": "1861", "Variable": "Model", "VariableId": 28 },
                { "Value": null, "ValueId": null, "Variable": "Trim", "VariableId": 38 },
                { "Value": "0", "ValueId": "", "Variable": "Error Code", "VariableId": 143 }
            ]
        })
    }

    async fn mock_decode(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/vehicles/decodevin/{VIN}")))
            .and(query_param("format", "json"))
            .and(header("accept", "application/json"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn decoder(server: &MockServer) -> VinDecoder {
        VinDecoder::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn applies_allow_list_and_normalizes_missing_values() {
        let server = MockServer::start().await;
        mock_decode(&server, ResponseTemplate::new(200).set_body_json(decode_body())).await;

        let filter: HashSet<i32> = [26, 28, 38].into_iter().collect();
        let attributes = decoder(&server).decode(VIN, Some(&filter)).await;

        let pairs: Vec<(i32, &str)> = attributes
            .iter()
            .map(|a| (a.variable_id, a.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![(26, "HONDA"), (28, "Accord"), (38, "")]);
        assert!(attributes.iter().all(|a| a.vehicle_id == VIN));
    }

    #[tokio::test]
    async fn without_filter_everything_is_kept() {
        let server = MockServer::start().await;
        mock_decode(&server, ResponseTemplate::new(200).set_body_json(decode_body())).await;

        assert_eq!(decoder(&server).decode(VIN, None).await.len(), 4);
    }

    #[tokio::test]
    async fn error_status_yields_no_attributes() {
        let server = MockServer::start().await;
        mock_decode(&server, ResponseTemplate::new(503)).await;

        assert!(decoder(&server).decode(VIN, None).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_yields_no_attributes() {
        let server = MockServer::start().await;
        mock_decode(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

        assert!(decoder(&server).decode(VIN, None).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_api_yields_no_attributes() {
        let decoder = VinDecoder::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(decoder.decode(VIN, None).await.is_empty());
    }
}
