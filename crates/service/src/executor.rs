//! Bridge executor
//!
//! Submits the approval and deposit transactions for a transfer and tracks the
//! deposit until the bridge reports it filled. Every execution re-evaluates
//! the intent; a previously returned quote never authorizes a submission.

use crate::provider_pool::{ProviderHandle, ProviderPool};
use crate::quote_engine::{Evaluation, QuoteEngine};
use bridge_types::{
	Address, BridgeError, BridgeResult, ChainError, ChainResult, ExecutionResult, ExecutionStage,
	FillStatus, QuoteFailureReason, TransactionOutcome, TransferIntent, TransferPlan, TxHash,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const TRACING_TARGET: &str = "bridge_service::executor";

/// Tunables for [`BridgeExecutor`]
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
	/// Blocks required on top of the approval and deposit transactions
	pub confirmations: u64,
	pub receipt_timeout: Duration,
	/// Upper bound on submissions, balance re-checks and individual status polls
	pub read_timeout: Duration,
	/// Track the deposit until it is filled before returning
	pub wait_for_fill: bool,
	pub fill_poll_interval: Duration,
	pub fill_timeout: Duration,
}

impl Default for ExecutorConfig {
	fn default() -> Self {
		Self {
			confirmations: 1,
			receipt_timeout: Duration::from_secs(120),
			read_timeout: Duration::from_secs(10),
			wait_for_fill: false,
			fill_poll_interval: Duration::from_secs(5),
			fill_timeout: Duration::from_secs(300),
		}
	}
}

/// Executes transfers planned by the [`QuoteEngine`]
#[derive(Debug, Clone)]
pub struct BridgeExecutor {
	quotes: QuoteEngine,
	config: ExecutorConfig,
}

impl BridgeExecutor {
	pub fn new(quotes: QuoteEngine, config: ExecutorConfig) -> Self {
		Self { quotes, config }
	}

	pub fn config(&self) -> &ExecutorConfig {
		&self.config
	}

	/// Re-validate, approve if needed, deposit, and optionally wait for the fill
	///
	/// Returns `Submitted` once the deposit is broadcast even if its receipt
	/// does not arrive in time. Submissions are never retried.
	///
	/// A submission that does not return within `read_timeout` fails with
	/// [`ChainError::SubmissionUnconfirmed`]: the transaction may be in the
	/// mempool already, so callers must check the signer's nonce or the
	/// bridge before trying again. A node rejection is re-checked against the
	/// signer's balances and reported as [`ChainError::InsufficientFunds`]
	/// when they no longer cover the transfer.
	pub async fn execute_dynamic_bridge(
		&self,
		pool: &ProviderPool,
		intent: &TransferIntent,
	) -> BridgeResult<ExecutionResult> {
		let plan = match self.quotes.evaluate(pool, intent).await {
			Evaluation::Feasible(plan) => *plan,
			Evaluation::Rejected(quote) => {
				return Err(BridgeError::execution_failed(
					ExecutionStage::Validation,
					BridgeError::QuoteRejected {
						reason: quote.failure_reason.unwrap_or(QuoteFailureReason::InvalidIntent),
						message: quote.error.unwrap_or_default(),
					},
				));
			},
		};

		let origin = pool
			.get_provider(intent.origin_chain_id)
			.map_err(|e| BridgeError::execution_failed(ExecutionStage::Validation, e))?;

		let approval_tx_hash = match plan.approval_token {
			Some(token) => Some(
				self.approve(&origin, token, &plan)
					.await
					.map_err(|e| BridgeError::execution_failed(ExecutionStage::Approval, e))?,
			),
			None => None,
		};

		let deposit_tx_hash = match self
			.submit(&origin, "deposit submission", async {
				origin.client.submit_deposit(&plan.deposit).await
			})
			.await
		{
			Ok(tx_hash) => tx_hash,
			Err(e) => {
				let cause = self.explain_rejection(&origin, &plan, e).await;
				return Err(BridgeError::execution_failed(ExecutionStage::Deposit, cause));
			},
		};

		let mut result = ExecutionResult::submitted(deposit_tx_hash, approval_tx_hash, plan.quote);
		info!(
			target: TRACING_TARGET,
			tx_hash = %deposit_tx_hash,
			origin = result.origin_chain_id,
			destination = result.destination_chain_id,
			"Deposit submitted"
		);

		match self.confirm(&origin, deposit_tx_hash).await {
			Ok(outcome) if outcome.succeeded => {
				result.deposit_block = Some(outcome.block_number);
				debug!(
					target: TRACING_TARGET,
					tx_hash = %deposit_tx_hash,
					block = outcome.block_number,
					gas_used = outcome.gas_used,
					"Deposit confirmed"
				);
			},
			Ok(outcome) => {
				return Err(BridgeError::execution_failed(
					ExecutionStage::Deposit,
					ChainError::Reverted {
						chain_id: origin.chain_id,
						tx_hash: Some(outcome.tx_hash),
						reason: format!("deposit reverted in block {}", outcome.block_number),
					},
				));
			},
			Err(e) => {
				warn!(
					target: TRACING_TARGET,
					tx_hash = %deposit_tx_hash,
					"Deposit receipt unavailable, keeping submitted status: {}",
					e
				);
			},
		}

		if self.config.wait_for_fill {
			result = self.wait_for_fill(result, self.config.fill_timeout).await;
		}
		Ok(result)
	}

	/// Poll the bridge until the deposit is filled, fails, or `timeout` elapses
	///
	/// Returns the last known state; a timeout leaves the status unchanged.
	pub async fn wait_for_fill(
		&self,
		mut result: ExecutionResult,
		timeout: Duration,
	) -> ExecutionResult {
		if result.is_terminal() {
			return result;
		}

		let bridge = self.quotes.bridge();
		let deadline = Instant::now() + timeout;
		loop {
			let remaining = deadline.saturating_duration_since(Instant::now());
			if remaining.is_zero() {
				info!(
					target: TRACING_TARGET,
					tx_hash = %result.deposit_tx_hash,
					timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
					"Stopped waiting for fill"
				);
				return result;
			}

			let poll = tokio::time::timeout(
				self.config.read_timeout.min(remaining),
				bridge.deposit_status(result.origin_chain_id, result.deposit_tx_hash),
			)
			.await;

			match poll {
				Ok(Ok(status)) if status.status == FillStatus::Filled => {
					result.mark_filled(status.fill_tx_hash);
					info!(
						target: TRACING_TARGET,
						tx_hash = %result.deposit_tx_hash,
						fill_tx_hash = ?result.filled_tx_hash,
						"Deposit filled"
					);
					return result;
				},
				Ok(Ok(status)) if status.status.is_failure() => {
					result.mark_failed();
					warn!(
						target: TRACING_TARGET,
						tx_hash = %result.deposit_tx_hash,
						status = ?status.status,
						"Deposit will not be filled"
					);
					return result;
				},
				Ok(Ok(_)) => {
					debug!(
						target: TRACING_TARGET,
						tx_hash = %result.deposit_tx_hash,
						"Fill pending"
					);
				},
				Ok(Err(e)) => {
					debug!(
						target: TRACING_TARGET,
						tx_hash = %result.deposit_tx_hash,
						"Deposit status poll failed: {}",
						e
					);
				},
				Err(_) => {
					debug!(
						target: TRACING_TARGET,
						tx_hash = %result.deposit_tx_hash,
						"Deposit status poll timed out"
					);
				},
			}

			let remaining = deadline.saturating_duration_since(Instant::now());
			tokio::time::sleep(self.config.fill_poll_interval.min(remaining)).await;
		}
	}

	async fn approve(
		&self,
		origin: &ProviderHandle,
		token: Address,
		plan: &TransferPlan,
	) -> ChainResult<TxHash> {
		let spender = plan.deposit.spoke_pool;
		let amount = plan.intent.amount;
		let submitted = self
			.submit(origin, "approval submission", async {
				origin.client.submit_approval(token, spender, amount).await
			})
			.await;
		let tx_hash = match submitted {
			Ok(tx_hash) => tx_hash,
			Err(e) => return Err(self.explain_rejection(origin, plan, e).await),
		};
		info!(target: TRACING_TARGET, tx_hash = %tx_hash, %token, %spender, "Approval submitted");

		let outcome = self.confirm(origin, tx_hash).await?;
		if !outcome.succeeded {
			return Err(ChainError::Reverted {
				chain_id: origin.chain_id,
				tx_hash: Some(tx_hash),
				reason: format!("approval reverted in block {}", outcome.block_number),
			});
		}
		debug!(
			target: TRACING_TARGET,
			tx_hash = %tx_hash,
			block = outcome.block_number,
			"Approval confirmed"
		);
		Ok(tx_hash)
	}

	async fn confirm(
		&self,
		origin: &ProviderHandle,
		tx_hash: TxHash,
	) -> ChainResult<TransactionOutcome> {
		let confirmations = self.config.confirmations.max(1);
		let receipt_timeout = self.config.receipt_timeout;
		self.bounded(origin, "receipt", receipt_timeout, async {
			origin
				.client
				.wait_for_confirmations(tx_hash, confirmations, receipt_timeout)
				.await
		})
		.await
	}

	/// Broadcast through `call`, bounded by `read_timeout`
	///
	/// Running out of time is not a plain timeout here, the node may have
	/// accepted the transaction before the deadline.
	async fn submit(
		&self,
		origin: &ProviderHandle,
		operation: &str,
		call: impl Future<Output = ChainResult<TxHash>>,
	) -> ChainResult<TxHash> {
		let limit = self.config.read_timeout;
		tokio::time::timeout(limit, call)
			.await
			.map_err(|_| ChainError::SubmissionUnconfirmed {
				chain_id: origin.chain_id,
				operation: operation.to_string(),
				timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
			})?
	}

	/// Turn a node rejection into `InsufficientFunds` when the signer can no
	/// longer pay for the transfer; any other error is returned unchanged
	async fn explain_rejection(
		&self,
		origin: &ProviderHandle,
		plan: &TransferPlan,
		error: ChainError,
	) -> ChainError {
		if !matches!(error, ChainError::Rejected { .. }) {
			return error;
		}
		match self.funding_shortfall(origin, plan).await {
			Ok(Some(reason)) => {
				warn!(
					target: TRACING_TARGET,
					chain_id = origin.chain_id,
					"Submission rejected: {}",
					reason
				);
				ChainError::InsufficientFunds {
					chain_id: origin.chain_id,
					reason,
				}
			},
			Ok(None) => error,
			Err(e) => {
				debug!(
					target: TRACING_TARGET,
					chain_id = origin.chain_id,
					"Balance re-check after rejection failed: {}",
					e
				);
				error
			},
		}
	}

	/// What the signer is missing to pay for `plan`, if anything
	async fn funding_shortfall(
		&self,
		origin: &ProviderHandle,
		plan: &TransferPlan,
	) -> ChainResult<Option<String>> {
		let signer = origin.client.signer_address();
		let read_timeout = self.config.read_timeout;

		let native = self
			.bounded(origin, "native balance", read_timeout, origin.client.native_balance(signer))
			.await?;
		let native_needed = plan.deposit.value.saturating_add(plan.quote.fees.gas_cost);
		if native < native_needed {
			return Ok(Some(format!(
				"native balance {} is below the {} needed for value and gas",
				native, native_needed
			)));
		}

		if let Some(token) = plan.origin_token.contract_address {
			let balance = self
				.bounded(
					origin,
					"token balance",
					read_timeout,
					origin.client.token_balance(token, signer),
				)
				.await?;
			if balance < plan.intent.amount {
				return Ok(Some(format!(
					"{} balance {} is below the transfer amount {}",
					plan.origin_token.symbol, balance, plan.intent.amount
				)));
			}
		}
		Ok(None)
	}

	async fn bounded<T>(
		&self,
		origin: &ProviderHandle,
		operation: &str,
		limit: Duration,
		call: impl Future<Output = ChainResult<T>>,
	) -> ChainResult<T> {
		let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
		tokio::time::timeout(limit, call)
			.await
			.map_err(|_| ChainError::timeout(origin.chain_id, operation, timeout_ms))?
	}
}
