//! Normalized failure classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of failure kinds exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	NetworkError,
	InsufficientFunds,
	ContractRevert,
	UnsupportedRoute,
	Timeout,
	Unknown,
}

impl ErrorKind {
	/// Whether repeating the same operation later may succeed
	pub fn is_retryable(&self) -> bool {
		matches!(self, ErrorKind::NetworkError | ErrorKind::Timeout)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::NetworkError => "NETWORK_ERROR",
			ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
			ErrorKind::ContractRevert => "CONTRACT_REVERT",
			ErrorKind::UnsupportedRoute => "UNSUPPORTED_ROUTE",
			ErrorKind::Timeout => "TIMEOUT",
			ErrorKind::Unknown => "UNKNOWN",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Classified failure with a suggested remediation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorClassification {
	pub kind: ErrorKind,
	pub retryable: bool,
	pub message: String,
	pub remediation: String,
}

impl ErrorClassification {
	pub fn new(
		kind: ErrorKind,
		message: impl Into<String>,
		remediation: impl Into<String>,
	) -> Self {
		Self {
			kind,
			retryable: kind.is_retryable(),
			message: message.into(),
			remediation: remediation.into(),
		}
	}
}
