//! Across API client
//!
//! Thin reqwest wrapper around the public Across REST API. Responses are
//! parsed into the engine's typed models here; nothing above this module sees
//! Across wire formats. Retrying is left to the caller.

use async_trait::async_trait;
use bridge_types::{
	Address, BridgeApi, BridgeApiError, BridgeApiResult, BridgeRoute, DepositLimits,
	DepositStatus, FeeRequest, FillStatus, RelayQuote, TxHash, U256,
};
use reqwest::{
	header::{HeaderMap, HeaderValue},
	Client, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const TRACING_TARGET: &str = "bridge_adapters::across";

// ================================
// ACROSS API MODELS
// ================================

/// Across available route entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcrossRoute {
	pub origin_chain_id: u64,
	pub destination_chain_id: u64,
	pub origin_token: String,
	pub destination_token: String,
	pub origin_token_symbol: String,
	#[serde(default)]
	pub destination_token_symbol: Option<String>,
	#[serde(default)]
	pub is_native: bool,
}

/// Numeric field that Across encodes either as a JSON number or a decimal string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AcrossNumber {
	Int(u64),
	Text(String),
}

impl AcrossNumber {
	fn to_u256(&self, field: &str) -> BridgeApiResult<U256> {
		match self {
			AcrossNumber::Int(n) => Ok(U256::from(*n)),
			AcrossNumber::Text(s) => {
				U256::from_str_radix(s.trim(), 10).map_err(|e| BridgeApiError::InvalidResponse {
					reason: format!("Invalid {} '{}': {}", field, s, e),
				})
			},
		}
	}

	fn to_u32(&self, field: &str) -> BridgeApiResult<u32> {
		let wide = self.to_u256(field)?;
		u32::try_from(wide).map_err(|_| BridgeApiError::InvalidResponse {
			reason: format!("{} {} does not fit in 32 bits", field, wide),
		})
	}
}

/// Across fee band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcrossFeeBand {
	pub pct: AcrossNumber,
	pub total: AcrossNumber,
}

/// Across deposit limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcrossLimits {
	pub min_deposit: AcrossNumber,
	pub max_deposit: AcrossNumber,
	pub max_deposit_instant: AcrossNumber,
}

/// Across `suggested-fees` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcrossQuoteResponse {
	pub estimated_fill_time_sec: u64,
	pub timestamp: AcrossNumber,
	pub is_amount_too_low: bool,
	pub exclusive_relayer: String,
	pub exclusivity_deadline: AcrossNumber,
	pub spoke_pool_address: String,
	pub total_relay_fee: AcrossFeeBand,
	pub relayer_capital_fee: AcrossFeeBand,
	pub relayer_gas_fee: AcrossFeeBand,
	pub lp_fee: AcrossFeeBand,
	pub limits: AcrossLimits,
	pub fill_deadline: AcrossNumber,
	pub output_amount: AcrossNumber,
	#[serde(default)]
	pub id: Option<String>,
}

/// Across `deposit/status` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcrossDepositStatusResponse {
	pub status: String,
	#[serde(default)]
	pub deposit_id: Option<AcrossNumber>,
	#[serde(default)]
	pub fill_tx: Option<String>,
	#[serde(default)]
	pub destination_chain_id: Option<u64>,
}

/// Error body returned by Across on 4xx/5xx
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcrossErrorBody {
	#[serde(default)]
	pub code: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
}

fn parse_address(raw: &str, field: &str) -> BridgeApiResult<Address> {
	Address::from_str(raw.trim()).map_err(|e| BridgeApiError::InvalidResponse {
		reason: format!("Invalid {} address '{}': {}", field, raw, e),
	})
}

impl AcrossRoute {
	pub fn to_bridge_route(&self) -> BridgeApiResult<BridgeRoute> {
		Ok(BridgeRoute {
			origin_chain_id: self.origin_chain_id,
			destination_chain_id: self.destination_chain_id,
			origin_token: parse_address(&self.origin_token, "originToken")?,
			destination_token: parse_address(&self.destination_token, "destinationToken")?,
			origin_token_symbol: self.origin_token_symbol.clone(),
			is_native: self.is_native,
		})
	}
}

impl AcrossQuoteResponse {
	pub fn to_relay_quote(&self) -> BridgeApiResult<RelayQuote> {
		Ok(RelayQuote {
			quote_id: self.id.clone(),
			total_relay_fee: self.total_relay_fee.total.to_u256("totalRelayFee.total")?,
			relayer_capital_fee: self
				.relayer_capital_fee
				.total
				.to_u256("relayerCapitalFee.total")?,
			relayer_gas_fee: self.relayer_gas_fee.total.to_u256("relayerGasFee.total")?,
			lp_fee: self.lp_fee.total.to_u256("lpFee.total")?,
			output_amount: self.output_amount.to_u256("outputAmount")?,
			estimated_fill_time_seconds: self.estimated_fill_time_sec,
			timestamp: self.timestamp.to_u32("timestamp")?,
			fill_deadline: self.fill_deadline.to_u32("fillDeadline")?,
			exclusive_relayer: parse_address(&self.exclusive_relayer, "exclusiveRelayer")?,
			exclusivity_deadline: self.exclusivity_deadline.to_u32("exclusivityDeadline")?,
			spoke_pool: parse_address(&self.spoke_pool_address, "spokePoolAddress")?,
			limits: DepositLimits {
				min_deposit: self.limits.min_deposit.to_u256("limits.minDeposit")?,
				max_deposit: self.limits.max_deposit.to_u256("limits.maxDeposit")?,
				max_deposit_instant: self
					.limits
					.max_deposit_instant
					.to_u256("limits.maxDepositInstant")?,
			},
			is_amount_too_low: self.is_amount_too_low,
		})
	}
}

impl AcrossDepositStatusResponse {
	pub fn to_deposit_status(&self) -> BridgeApiResult<DepositStatus> {
		let status = match self.status.as_str() {
			"filled" => FillStatus::Filled,
			"pending" => FillStatus::Pending,
			"expired" => FillStatus::Expired,
			"refunded" => FillStatus::Refunded,
			other => {
				return Err(BridgeApiError::InvalidResponse {
					reason: format!("Unknown deposit status '{}'", other),
				})
			},
		};

		let fill_tx_hash = self
			.fill_tx
			.as_deref()
			.map(|raw| {
				TxHash::from_str(raw.trim()).map_err(|e| BridgeApiError::InvalidResponse {
					reason: format!("Invalid fillTx '{}': {}", raw, e),
				})
			})
			.transpose()?;

		let deposit_id = match &self.deposit_id {
			Some(AcrossNumber::Int(n)) => Some(n.to_string()),
			Some(AcrossNumber::Text(s)) => Some(s.clone()),
			None => None,
		};

		Ok(DepositStatus {
			status,
			deposit_id,
			fill_tx_hash,
			destination_chain_id: self.destination_chain_id,
		})
	}
}

// ================================
// CLIENT
// ================================

/// Across REST client
#[derive(Debug, Clone)]
pub struct AcrossClient {
	base_url: Url,
	client: Client,
	timeout: Duration,
}

impl AcrossClient {
	/// Create a client for the given API base (e.g. `https://app.across.to/api`)
	pub fn new(base_url: Url, timeout: Duration) -> BridgeApiResult<Self> {
		let mut headers = HeaderMap::new();
		headers.insert("Accept", HeaderValue::from_static("application/json"));
		headers.insert(
			"User-Agent",
			HeaderValue::from_static(concat!("across-bridge/", env!("CARGO_PKG_VERSION"))),
		);

		let client = Client::builder()
			.default_headers(headers)
			.timeout(timeout)
			.build()?;

		Ok(Self {
			base_url,
			client,
			timeout,
		})
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
	}

	fn timeout_ms(&self) -> u64 {
		u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
	}

	fn map_send_error(&self, e: reqwest::Error) -> BridgeApiError {
		if e.is_timeout() {
			BridgeApiError::Timeout {
				timeout_ms: self.timeout_ms(),
			}
		} else {
			BridgeApiError::Http(e)
		}
	}

	async fn get<T: DeserializeOwned>(
		&self,
		path: &str,
		query: &[(&str, String)],
	) -> BridgeApiResult<T> {
		let url = self.endpoint(path);
		debug!(target: TRACING_TARGET, url = %url, "Across GET");

		let response = self
			.client
			.get(&url)
			.query(query)
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		let response = check_status(response).await?;
		response
			.json::<T>()
			.await
			.map_err(|e| BridgeApiError::InvalidResponse {
				reason: format!("Failed to parse Across {} response: {}", path, e),
			})
	}
}

/// Turn a non-2xx response into a typed error using the Across error `code`
async fn check_status(response: Response) -> BridgeApiResult<Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}

	let body = response.json::<AcrossErrorBody>().await.ok();
	let code = body.as_ref().and_then(|b| b.code.clone());
	let message = body
		.and_then(|b| b.message)
		.unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

	warn!(
		target: TRACING_TARGET,
		status = status.as_u16(),
		code = code.as_deref().unwrap_or("-"),
		"Across request failed: {}",
		message
	);

	Err(match code.as_deref() {
		Some("ROUTE_NOT_ENABLED") | Some("UNSUPPORTED_ROUTE") => {
			BridgeApiError::RouteNotSupported {
				origin_chain_id: 0,
				destination_chain_id: 0,
				message,
			}
		},
		Some("AMOUNT_TOO_LOW") | Some("AMOUNT_TOO_HIGH") => {
			BridgeApiError::AmountOutOfRange { message }
		},
		Some(code)
			if status.is_client_error()
				&& status != StatusCode::TOO_MANY_REQUESTS
				&& status != StatusCode::NOT_FOUND =>
		{
			BridgeApiError::Api {
				code: code.to_string(),
				message,
			}
		},
		_ => BridgeApiError::HttpStatus {
			status_code: status.as_u16(),
			reason: message,
		},
	})
}

fn with_route(err: BridgeApiError, origin: u64, destination: u64) -> BridgeApiError {
	match err {
		BridgeApiError::RouteNotSupported { message, .. } => BridgeApiError::RouteNotSupported {
			origin_chain_id: origin,
			destination_chain_id: destination,
			message,
		},
		other => other,
	}
}

#[async_trait]
impl BridgeApi for AcrossClient {
	async fn available_routes(
		&self,
		origin_chain_id: u64,
		destination_chain_id: u64,
		origin_token: Address,
		destination_token: Address,
	) -> BridgeApiResult<Vec<BridgeRoute>> {
		let routes: Vec<AcrossRoute> = self
			.get(
				"available-routes",
				&[
					("originChainId", origin_chain_id.to_string()),
					("destinationChainId", destination_chain_id.to_string()),
					("originToken", origin_token.to_string()),
					("destinationToken", destination_token.to_string()),
				],
			)
			.await
			.map_err(|e| with_route(e, origin_chain_id, destination_chain_id))?;

		let mut converted = Vec::with_capacity(routes.len());
		for route in &routes {
			match route.to_bridge_route() {
				Ok(r) => converted.push(r),
				Err(e) => warn!(target: TRACING_TARGET, "Skipping malformed Across route: {}", e),
			}
		}

		debug!(
			target: TRACING_TARGET,
			origin_chain_id,
			destination_chain_id,
			"Across returned {} routes ({} usable)",
			routes.len(),
			converted.len()
		);
		Ok(converted)
	}

	async fn suggested_fees(&self, request: &FeeRequest) -> BridgeApiResult<RelayQuote> {
		let mut query = vec![
			("inputToken", request.input_token.to_string()),
			("outputToken", request.output_token.to_string()),
			("originChainId", request.origin_chain_id.to_string()),
			("destinationChainId", request.destination_chain_id.to_string()),
			("amount", request.amount.to_string()),
		];
		if let Some(depositor) = request.depositor {
			query.push(("depositor", depositor.to_string()));
		}
		if let Some(recipient) = request.recipient {
			query.push(("recipient", recipient.to_string()));
		}

		let response: AcrossQuoteResponse = self
			.get("suggested-fees", &query)
			.await
			.map_err(|e| with_route(e, request.origin_chain_id, request.destination_chain_id))?;

		let quote = response.to_relay_quote()?;
		debug!(
			target: TRACING_TARGET,
			quote_id = quote.quote_id.as_deref().unwrap_or("-"),
			total_relay_fee = %quote.total_relay_fee,
			output_amount = %quote.output_amount,
			"Across fee quote received"
		);
		Ok(quote)
	}

	async fn deposit_status(
		&self,
		origin_chain_id: u64,
		deposit_tx_hash: TxHash,
	) -> BridgeApiResult<DepositStatus> {
		let result: BridgeApiResult<AcrossDepositStatusResponse> = self
			.get(
				"deposit/status",
				&[
					("originChainId", origin_chain_id.to_string()),
					("depositTxHash", deposit_tx_hash.to_string()),
				],
			)
			.await;

		match result {
			Ok(response) => response.to_deposit_status(),
			// Not indexed yet
			Err(BridgeApiError::HttpStatus {
				status_code: 404, ..
			}) => Ok(DepositStatus::pending()),
			Err(e) => Err(e),
		}
	}
}
