//! Error types for the bridge service API

use thiserror::Error;

/// Failures talking to the bridge service's REST API
#[derive(Error, Debug)]
pub enum BridgeApiError {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("HTTP {status_code}: {reason}")]
	HttpStatus { status_code: u16, reason: String },

	#[error("Bridge API request timed out after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Invalid response format: {reason}")]
	InvalidResponse { reason: String },

	#[error("Route {origin_chain_id} -> {destination_chain_id} is not supported: {message}")]
	RouteNotSupported {
		origin_chain_id: u64,
		destination_chain_id: u64,
		message: String,
	},

	#[error("Amount outside deposit limits: {message}")]
	AmountOutOfRange { message: String },

	#[error("Bridge API returned error {code}: {message}")]
	Api { code: String, message: String },
}

impl BridgeApiError {
	/// Whether repeating the same read-only request could succeed
	pub fn is_retryable(&self) -> bool {
		match self {
			BridgeApiError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
			BridgeApiError::HttpStatus { status_code, .. } => {
				*status_code == 429 || (500..600).contains(status_code)
			},
			BridgeApiError::Timeout { .. } => true,
			BridgeApiError::InvalidResponse { .. }
			| BridgeApiError::RouteNotSupported { .. }
			| BridgeApiError::AmountOutOfRange { .. }
			| BridgeApiError::Api { .. } => false,
		}
	}

	/// Whether the failure is a transport problem rather than a business rejection
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			BridgeApiError::Http(_)
				| BridgeApiError::HttpStatus { .. }
				| BridgeApiError::Timeout { .. }
		)
	}
}

pub type BridgeApiResult<T> = Result<T, BridgeApiError>;
