//! Quote engine
//!
//! Prices and validates a prospective transfer without submitting anything.
//! The checks run in a fixed order and stop at the first failure, which is
//! reported as data on the returned [`Quote`] rather than as an error.

use crate::provider_pool::{ProviderHandle, ProviderPool};
use crate::retry::RetryPolicy;
use bridge_types::{
	BridgeApi, BridgeApiError, BridgeApiResult, Bytes, ChainError, ChainResult,
	DepositCall, FeeBreakdown, FeeRequest, Quote, QuoteFailureReason, TransferIntent,
	TransferPlan, U256,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const TRACING_TARGET: &str = "bridge_service::quote_engine";

/// Tunables for [`QuoteEngine`]
#[derive(Debug, Clone)]
pub struct QuoteEngineConfig {
	/// Upper bound on every individual chain or bridge API read
	pub read_timeout: Duration,
	/// Deposit gas assumed when estimation reverts because the approval is not mined yet
	pub fallback_deposit_gas: u64,
	pub retry: RetryPolicy,
}

impl Default for QuoteEngineConfig {
	fn default() -> Self {
		Self {
			read_timeout: Duration::from_secs(10),
			fallback_deposit_gas: 200_000,
			retry: RetryPolicy::default(),
		}
	}
}

/// Outcome of evaluating an intent
#[derive(Debug, Clone)]
pub enum Evaluation {
	/// The transfer can proceed; the plan carries the positive quote
	Feasible(Box<TransferPlan>),
	Rejected(Quote),
}

impl Evaluation {
	pub fn quote(&self) -> &Quote {
		match self {
			Evaluation::Feasible(plan) => &plan.quote,
			Evaluation::Rejected(quote) => quote,
		}
	}

	pub fn into_quote(self) -> Quote {
		match self {
			Evaluation::Feasible(plan) => plan.quote,
			Evaluation::Rejected(quote) => quote,
		}
	}
}

struct Rejection {
	reason: QuoteFailureReason,
	message: String,
}

impl Rejection {
	fn new(reason: QuoteFailureReason, message: impl Into<String>) -> Self {
		Self {
			reason,
			message: message.into(),
		}
	}

	fn network(e: impl std::fmt::Display) -> Self {
		Self::new(QuoteFailureReason::NetworkError, e.to_string())
	}
}

impl From<BridgeApiError> for Rejection {
	fn from(e: BridgeApiError) -> Self {
		let reason = match &e {
			BridgeApiError::RouteNotSupported { .. } => QuoteFailureReason::UnsupportedRoute,
			BridgeApiError::AmountOutOfRange { .. } => QuoteFailureReason::AmountOutOfRange,
			_ => QuoteFailureReason::NetworkError,
		};
		Self::new(reason, e.to_string())
	}
}

/// Read-only pricing and feasibility checks
#[derive(Debug, Clone)]
pub struct QuoteEngine {
	bridge: Arc<dyn BridgeApi>,
	config: QuoteEngineConfig,
}

impl QuoteEngine {
	pub fn new(bridge: Arc<dyn BridgeApi>, config: QuoteEngineConfig) -> Self {
		Self { bridge, config }
	}

	pub fn config(&self) -> &QuoteEngineConfig {
		&self.config
	}

	pub fn bridge(&self) -> &Arc<dyn BridgeApi> {
		&self.bridge
	}

	/// Simulate the transfer and return a fresh quote
	pub async fn dry_run(&self, pool: &ProviderPool, intent: &TransferIntent) -> Quote {
		self.evaluate(pool, intent).await.into_quote()
	}

	/// Simulate the transfer, keeping the deposit plan when it is feasible
	pub async fn evaluate(&self, pool: &ProviderPool, intent: &TransferIntent) -> Evaluation {
		match self.plan(pool, intent).await {
			Ok(plan) => {
				info!(
					target: TRACING_TARGET,
					quote_id = %plan.quote.quote_id,
					origin = intent.origin_chain_id,
					destination = intent.destination_chain_id,
					token = %intent.token_symbol,
					output_amount = %plan.quote.output_amount,
					gas_cost = %plan.quote.fees.gas_cost,
					requires_approval = plan.quote.requires_approval,
					"Transfer is feasible"
				);
				Evaluation::Feasible(Box::new(plan))
			},
			Err(rejection) => {
				info!(
					target: TRACING_TARGET,
					origin = intent.origin_chain_id,
					destination = intent.destination_chain_id,
					token = %intent.token_symbol,
					reason = %rejection.reason,
					"Transfer cannot proceed: {}",
					rejection.message
				);
				Evaluation::Rejected(Quote::rejected(intent, rejection.reason, rejection.message))
			},
		}
	}

	async fn plan(
		&self,
		pool: &ProviderPool,
		intent: &TransferIntent,
	) -> Result<TransferPlan, Rejection> {
		// 1. Shape and registry checks, no network access
		intent
			.validate()
			.map_err(|e| Rejection::new(QuoteFailureReason::InvalidIntent, e.to_string()))?;
		let recipient = intent
			.recipient_address()
			.map_err(|e| Rejection::new(QuoteFailureReason::InvalidIntent, e.to_string()))?;

		let registry = pool.registry();
		let invalid = |e: bridge_types::RegistryError| {
			Rejection::new(QuoteFailureReason::InvalidIntent, e.to_string())
		};
		let origin_token = registry
			.resolve_token(intent.origin_chain_id, &intent.token_symbol)
			.map_err(invalid)?
			.clone();
		let destination_token = registry
			.resolve_token(intent.destination_chain_id, &intent.token_symbol)
			.map_err(invalid)?;
		let input_token = registry.bridge_token_address(&origin_token).map_err(invalid)?;
		let output_token = registry.bridge_token_address(destination_token).map_err(invalid)?;

		// 2. Connections and balance
		let unavailable = |e: bridge_types::ProviderError| {
			Rejection::new(QuoteFailureReason::ProviderUnavailable, e.to_string())
		};
		let origin = pool.get_provider(intent.origin_chain_id).map_err(unavailable)?;
		pool.get_provider(intent.destination_chain_id).map_err(unavailable)?;

		let signer = origin.client.signer_address();
		let balance = match origin_token.contract_address {
			None => {
				self.read(&origin, "native balance", origin.client.native_balance(signer))
					.await
			},
			Some(token) => {
				self.read(&origin, "token balance", origin.client.token_balance(token, signer))
					.await
			},
		}
		.map_err(Rejection::network)?;

		if balance < intent.amount {
			return Err(Rejection::new(
				QuoteFailureReason::InsufficientBalance,
				format!(
					"{} balance {} on chain {} is below the requested {}",
					origin_token.symbol, balance, intent.origin_chain_id, intent.amount
				),
			));
		}

		// 3. Route and fees
		let bridge = &self.bridge;
		let routes = self
			.config
			.retry
			.run("available-routes", move || {
				self.bridge_read(bridge.available_routes(
					intent.origin_chain_id,
					intent.destination_chain_id,
					input_token,
					output_token,
				))
			})
			.await?;
		if routes.is_empty() {
			return Err(Rejection::new(
				QuoteFailureReason::UnsupportedRoute,
				format!(
					"no {} route from chain {} to chain {}",
					intent.token_symbol, intent.origin_chain_id, intent.destination_chain_id
				),
			));
		}

		let request = FeeRequest {
			input_token,
			output_token,
			origin_chain_id: intent.origin_chain_id,
			destination_chain_id: intent.destination_chain_id,
			amount: intent.amount,
			depositor: Some(signer),
			recipient: Some(recipient),
		};
		let request = &request;
		let relay = self
			.config
			.retry
			.run("suggested-fees", move || self.bridge_read(bridge.suggested_fees(request)))
			.await?;

		if relay.is_amount_too_low {
			return Err(Rejection::new(
				QuoteFailureReason::AmountOutOfRange,
				format!("amount {} is too low to cover relay fees", intent.amount),
			));
		}
		if !relay.limits.contains(intent.amount) {
			return Err(Rejection::new(
				QuoteFailureReason::AmountOutOfRange,
				format!(
					"amount {} is outside the deposit limits {}..={}",
					intent.amount, relay.limits.min_deposit, relay.limits.max_deposit
				),
			));
		}
		if relay.output_amount.is_zero() {
			return Err(Rejection::new(
				QuoteFailureReason::AmountOutOfRange,
				"relay fees consume the entire amount",
			));
		}

		let deposit = DepositCall {
			spoke_pool: relay.spoke_pool,
			depositor: signer,
			recipient,
			input_token,
			output_token,
			input_amount: intent.amount,
			output_amount: relay.output_amount,
			destination_chain_id: intent.destination_chain_id,
			exclusive_relayer: relay.exclusive_relayer,
			quote_timestamp: relay.timestamp,
			fill_deadline: relay.fill_deadline,
			exclusivity_deadline: relay.exclusivity_deadline,
			message: Bytes::new(),
			value: if origin_token.is_native() { intent.amount } else { U256::ZERO },
		};

		// 4. Allowance and gas
		let approval_token = match origin_token.contract_address {
			Some(token) => {
				let allowance = self
					.read(
						&origin,
						"allowance",
						origin.client.allowance(token, signer, relay.spoke_pool),
					)
					.await
					.map_err(Rejection::network)?;
				(allowance < intent.amount).then_some(token)
			},
			None => None,
		};

		let gas_price = self
			.read(&origin, "gas price", origin.client.gas_price())
			.await
			.map_err(Rejection::network)?;

		let approval_gas = match approval_token {
			Some(token) => self
				.read(
					&origin,
					"approval gas estimate",
					origin.client.estimate_approval_gas(token, relay.spoke_pool, intent.amount),
				)
				.await
				.map_err(Rejection::network)?,
			None => 0,
		};

		let deposit_gas = match self
			.read(&origin, "deposit gas estimate", origin.client.estimate_deposit_gas(&deposit))
			.await
		{
			Ok(gas) => gas,
			Err(ChainError::Reverted { .. }) if approval_token.is_some() => {
				debug!(
					target: TRACING_TARGET,
					chain_id = intent.origin_chain_id,
					fallback = self.config.fallback_deposit_gas,
					"Deposit estimate reverted pending approval, using fallback gas"
				);
				self.config.fallback_deposit_gas
			},
			Err(e @ ChainError::Reverted { .. }) => {
				return Err(Rejection::new(
					QuoteFailureReason::UnsupportedRoute,
					format!("deposit simulation reverted: {e}"),
				));
			},
			Err(e) => return Err(Rejection::network(e)),
		};

		let gas_units = approval_gas.saturating_add(deposit_gas);
		let gas_cost = U256::from(gas_units).saturating_mul(U256::from(gas_price));

		let native_balance = match origin_token.contract_address {
			None => balance,
			Some(_) => self
				.read(&origin, "native balance", origin.client.native_balance(signer))
				.await
				.map_err(Rejection::network)?,
		};
		let native_required = gas_cost.saturating_add(deposit.value);
		if native_balance < native_required {
			return Err(Rejection::new(
				QuoteFailureReason::InsufficientBalance,
				format!(
					"native balance {} on chain {} cannot cover {} (gas {} + value {})",
					native_balance, intent.origin_chain_id, native_required, gas_cost, deposit.value
				),
			));
		}

		// 5. Positive quote
		let fees = FeeBreakdown {
			relay_fee: relay.relayer_capital_fee.saturating_add(relay.relayer_gas_fee),
			protocol_fee: relay.lp_fee,
			gas_cost,
			gas_price,
			gas_units,
		};
		let quote = Quote::feasible(
			intent,
			relay.quote_id.clone(),
			fees,
			relay.output_amount,
			relay.estimated_fill_time_seconds,
			approval_token.is_some(),
		);

		Ok(TransferPlan {
			intent: intent.clone(),
			origin_token,
			approval_token,
			deposit,
			quote,
		})
	}

	/// Bound a chain read by the configured timeout
	async fn read<T>(
		&self,
		handle: &ProviderHandle,
		operation: &str,
		call: impl Future<Output = ChainResult<T>>,
	) -> ChainResult<T> {
		tokio::time::timeout(self.config.read_timeout, call)
			.await
			.map_err(|_| ChainError::timeout(handle.chain_id, operation, self.timeout_ms()))?
	}

	/// Bound one bridge API attempt by the configured timeout
	async fn bridge_read<T>(
		&self,
		call: impl Future<Output = BridgeApiResult<T>>,
	) -> BridgeApiResult<T> {
		tokio::time::timeout(self.config.read_timeout, call)
			.await
			.map_err(|_| BridgeApiError::Timeout {
				timeout_ms: self.timeout_ms(),
			})?
	}

	fn timeout_ms(&self) -> u64 {
		u64::try_from(self.config.read_timeout.as_millis()).unwrap_or(u64::MAX)
	}
}

