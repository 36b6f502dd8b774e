//! Error classifier
//!
//! Maps every [`BridgeError`] onto the closed [`ErrorKind`] taxonomy. The
//! mapping inspects error variants and structured payloads only, never message
//! text.

use bridge_types::{
	BridgeApiError, BridgeError, ChainError, ErrorClassification, ErrorKind,
	IntentValidationError, QuoteFailureReason, RegistryError,
};

/// Stateless classification of bridge failures
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
	/// Classify an error returned by any engine operation
	pub fn classify(error: &BridgeError) -> ErrorClassification {
		let kind = Self::kind_of(error);
		let message = match error {
			BridgeError::ExecutionFailed { stage, cause } => {
				format!("{stage} failed: {}", Self::classify(cause).message)
			},
			other => other.to_string(),
		};
		ErrorClassification::new(kind, message, remediation(kind))
	}

	/// Classify the failure carried by a negative quote
	pub fn classify_quote_failure(
		reason: QuoteFailureReason,
		message: impl Into<String>,
	) -> ErrorClassification {
		let kind = quote_failure_kind(reason);
		ErrorClassification::new(kind, message, remediation(kind))
	}

	fn kind_of(error: &BridgeError) -> ErrorKind {
		match error {
			BridgeError::Configuration { .. } => ErrorKind::Unknown,
			BridgeError::Registry(e) => match e {
				RegistryError::UnknownChain { .. } | RegistryError::UnknownRoute { .. } => {
					ErrorKind::UnsupportedRoute
				},
				_ => ErrorKind::Unknown,
			},
			BridgeError::Provider(_) => ErrorKind::NetworkError,
			BridgeError::Validation(e) => match e {
				IntentValidationError::UnknownToken { .. } => ErrorKind::UnsupportedRoute,
				_ => ErrorKind::Unknown,
			},
			BridgeError::Chain(e) => chain_error_kind(e),
			BridgeError::BridgeApi(e) => bridge_api_error_kind(e),
			BridgeError::QuoteRejected { reason, .. } => quote_failure_kind(*reason),
			BridgeError::ExecutionFailed { cause, .. } => Self::kind_of(cause),
			BridgeError::Timeout { .. } => ErrorKind::Timeout,
		}
	}
}

fn chain_error_kind(error: &ChainError) -> ErrorKind {
	match error {
		ChainError::Transport { .. } | ChainError::InvalidEndpoint { .. } => {
			ErrorKind::NetworkError
		},
		ChainError::Reverted { .. } => ErrorKind::ContractRevert,
		ChainError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
		ChainError::Timeout { .. } => ErrorKind::Timeout,
		ChainError::Rejected { .. }
		| ChainError::SubmissionUnconfirmed { .. }
		| ChainError::Signer(_)
		| ChainError::Decode { .. } => ErrorKind::Unknown,
	}
}

fn bridge_api_error_kind(error: &BridgeApiError) -> ErrorKind {
	match error {
		BridgeApiError::Http(e) if e.is_timeout() => ErrorKind::Timeout,
		BridgeApiError::Http(_) => ErrorKind::NetworkError,
		BridgeApiError::HttpStatus { .. } if error.is_retryable() => ErrorKind::NetworkError,
		BridgeApiError::HttpStatus { .. } => ErrorKind::Unknown,
		BridgeApiError::Timeout { .. } => ErrorKind::Timeout,
		BridgeApiError::RouteNotSupported { .. } | BridgeApiError::AmountOutOfRange { .. } => {
			ErrorKind::UnsupportedRoute
		},
		BridgeApiError::InvalidResponse { .. } | BridgeApiError::Api { .. } => ErrorKind::Unknown,
	}
}

fn quote_failure_kind(reason: QuoteFailureReason) -> ErrorKind {
	match reason {
		QuoteFailureReason::InvalidIntent => ErrorKind::Unknown,
		QuoteFailureReason::ProviderUnavailable | QuoteFailureReason::NetworkError => {
			ErrorKind::NetworkError
		},
		QuoteFailureReason::InsufficientBalance => ErrorKind::InsufficientFunds,
		QuoteFailureReason::UnsupportedRoute | QuoteFailureReason::AmountOutOfRange => {
			ErrorKind::UnsupportedRoute
		},
	}
}

fn remediation(kind: ErrorKind) -> &'static str {
	match kind {
		ErrorKind::NetworkError => "Check RPC endpoint and bridge service connectivity, then retry",
		ErrorKind::InsufficientFunds => {
			"Fund the signer with the transfer amount plus native gas on the origin chain"
		},
		ErrorKind::ContractRevert => {
			"Inspect the reverted transaction and request a fresh quote before retrying"
		},
		ErrorKind::UnsupportedRoute => {
			"Pick a supported token and chain pair, or an amount within the deposit limits"
		},
		ErrorKind::Timeout => {
			"Retry later; check whether the transaction landed before submitting again"
		},
		ErrorKind::Unknown => "Inspect the error details and the configuration",
	}
}
