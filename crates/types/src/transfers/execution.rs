//! Execution plan and result models

use super::{Quote, TransferIntent};
use crate::chains::TokenDescriptor;
use crate::providers::DepositCall;
use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything needed to submit a transfer, derived from a fresh positive quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPlan {
	pub intent: TransferIntent,
	pub origin_token: TokenDescriptor,
	/// Contract the signer must approve before depositing, when approval is required
	pub approval_token: Option<Address>,
	pub deposit: DepositCall,
	pub quote: Quote,
}

impl TransferPlan {
	pub fn requires_approval(&self) -> bool {
		self.approval_token.is_some()
	}
}

/// Lifecycle of a submitted transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
	Submitted,
	Filled,
	Failed,
}

impl ExecutionStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(self, ExecutionStatus::Filled | ExecutionStatus::Failed)
	}
}

/// Record of a submitted transfer
///
/// Only fill tracking changes a result after submission. Once the status is
/// `Filled` or `Failed` it no longer changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
	pub deposit_tx_hash: TxHash,
	pub approval_tx_hash: Option<TxHash>,
	pub origin_chain_id: u64,
	pub destination_chain_id: u64,
	pub status: ExecutionStatus,
	pub filled_tx_hash: Option<TxHash>,
	/// Origin block the deposit was mined in, once its receipt has been seen
	pub deposit_block: Option<u64>,
	pub quote: Quote,
	pub submitted_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl ExecutionResult {
	pub fn submitted(
		deposit_tx_hash: TxHash,
		approval_tx_hash: Option<TxHash>,
		quote: Quote,
	) -> Self {
		let now = Utc::now();
		Self {
			deposit_tx_hash,
			approval_tx_hash,
			origin_chain_id: quote.origin_chain_id,
			destination_chain_id: quote.destination_chain_id,
			status: ExecutionStatus::Submitted,
			filled_tx_hash: None,
			deposit_block: None,
			quote,
			submitted_at: now,
			updated_at: now,
		}
	}

	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}

	/// Record the destination fill. Returns false if the result was already terminal.
	pub fn mark_filled(&mut self, fill_tx_hash: Option<TxHash>) -> bool {
		if self.is_terminal() {
			return false;
		}
		self.status = ExecutionStatus::Filled;
		self.filled_tx_hash = fill_tx_hash;
		self.updated_at = Utc::now();
		true
	}

	/// Record a terminal failure. Returns false if the result was already terminal.
	pub fn mark_failed(&mut self) -> bool {
		if self.is_terminal() {
			return false;
		}
		self.status = ExecutionStatus::Failed;
		self.updated_at = Utc::now();
		true
	}
}
