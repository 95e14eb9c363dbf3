//! HTTP implementation of the carrier map lookup

use async_trait::async_trait;
use coverage_types::{AdapterError, AdapterResult, Coordinates, Technology};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::client_cache::{ClientCache, ClientConfig};
use crate::mobile_map::{MapLookup, SignalReading};

/// Error envelope some carrier endpoints return with a 200 status
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
	error_code: String,
	#[serde(default)]
	error_message: String,
}

/// Queries `GET {endpoint}/coverage?lat=..&lng=..&technology=..`
#[derive(Debug, Clone)]
pub struct HttpMapLookup {
	client_config: ClientConfig,
	cache: ClientCache,
}

impl HttpMapLookup {
	pub fn new(client_config: ClientConfig, cache: ClientCache) -> Self {
		Self {
			client_config,
			cache,
		}
	}

	fn client(&self) -> AdapterResult<Arc<Client>> {
		self.cache.get_client(&self.client_config)
	}

	fn coverage_url(&self) -> String {
		format!("{}/coverage", self.client_config.base_url.trim_end_matches('/'))
	}

	/// Decode a response body into a reading
	fn parse_body(body: &str) -> AdapterResult<SignalReading> {
		if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
			return Err(AdapterError::Rejected {
				code: envelope.error_code,
				message: envelope.error_message,
			});
		}

		serde_json::from_str::<SignalReading>(body).map_err(|e| AdapterError::InvalidResponse {
			reason: format!("Failed to parse coverage response: {}", e),
		})
	}
}

#[async_trait]
impl MapLookup for HttpMapLookup {
	async fn lookup(
		&self,
		coordinates: Coordinates,
		technology: Technology,
	) -> AdapterResult<SignalReading> {
		let client = self.client()?;
		let url = self.coverage_url();

		debug!(
			"Querying {} {} layer at {}",
			self.client_config.provider, technology, coordinates
		);

		let response = client
			.get(&url)
			.query(&[
				("lat", coordinates.lat.to_string()),
				("lng", coordinates.lng.to_string()),
				("technology", technology.as_str().to_string()),
			])
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(AdapterError::from_http_failure(status.as_u16()));
		}

		let body = response.text().await?;
		Self::parse_body(&body)
	}
}
