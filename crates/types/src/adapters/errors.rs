//! Error types for adapter operations

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure taxonomy shared by adapters, health tracking and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	/// Network failure or timeout talking to an upstream
	TransportFailure,
	/// Upstream answered but reported an error or returned garbage
	UpstreamRejection,
	/// Valid answer indicating no service; not an error
	NoCoverageData,
	/// Programmer or integration error (unknown provider, bad coordinates)
	ConfigurationError,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::TransportFailure => "TRANSPORT_FAILURE",
			ErrorKind::UpstreamRejection => "UPSTREAM_REJECTION",
			ErrorKind::NoCoverageData => "NO_COVERAGE_DATA",
			ErrorKind::ConfigurationError => "CONFIGURATION_ERROR",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Adapter operation errors
#[derive(Error, Debug)]
pub enum AdapterError {
	#[error("HTTP request failed: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("Connection error: {0}")]
	Connection(String),

	#[error("Timeout occurred after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("HTTP {status_code}: {reason}")]
	HttpStatusError { status_code: u16, reason: String },

	#[error("Upstream returned error: {code} - {message}")]
	Rejected { code: String, message: String },

	#[error("Invalid response format: {reason}")]
	InvalidResponse { reason: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Configuration error: {reason}")]
	ConfigError { reason: String },

	#[error("All technology variants failed: {}", .attempts.join("; "))]
	VariantsExhausted { attempts: Vec<String> },
}

impl AdapterError {
	/// Classify into the shared taxonomy
	pub fn kind(&self) -> ErrorKind {
		match self {
			AdapterError::HttpError(e) if e.status().is_some() => ErrorKind::UpstreamRejection,
			AdapterError::HttpError(e) if e.is_decode() => ErrorKind::UpstreamRejection,
			AdapterError::HttpError(_)
			| AdapterError::Connection(_)
			| AdapterError::Timeout { .. }
			| AdapterError::VariantsExhausted { .. } => ErrorKind::TransportFailure,
			AdapterError::HttpStatusError { .. }
			| AdapterError::Rejected { .. }
			| AdapterError::InvalidResponse { .. }
			| AdapterError::Serialization(_) => ErrorKind::UpstreamRejection,
			AdapterError::ConfigError { .. } => ErrorKind::ConfigurationError,
		}
	}

	/// Transport errors are the only ones that move a fallback chain on
	pub fn is_transport(&self) -> bool {
		self.kind() == ErrorKind::TransportFailure
	}

	/// Extract HTTP status code from the error if available
	pub fn status_code(&self) -> Option<u16> {
		match self {
			AdapterError::HttpStatusError { status_code, .. } => Some(*status_code),
			AdapterError::HttpError(reqwest_error) => {
				reqwest_error.status().map(|status| status.as_u16())
			},
			_ => None,
		}
	}

	/// Create an HTTP failure error from response status with default reason
	pub fn from_http_failure(status_code: u16) -> Self {
		let reason = match status_code {
			400 => "Bad Request".to_string(),
			401 => "Unauthorized".to_string(),
			403 => "Forbidden".to_string(),
			404 => "Not Found".to_string(),
			408 => "Request Timeout".to_string(),
			429 => "Too Many Requests".to_string(),
			500 => "Internal Server Error".to_string(),
			502 => "Bad Gateway".to_string(),
			503 => "Service Unavailable".to_string(),
			504 => "Gateway Timeout".to_string(),
			_ => format!("HTTP Error {}", status_code),
		};

		Self::HttpStatusError {
			status_code,
			reason,
		}
	}
}
