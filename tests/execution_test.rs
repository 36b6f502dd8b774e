//! Execution, receipt handling and fill tracking over in-memory fakes

mod mocks;

use across_bridge::mocks::{
	sample_relay_quote, FakeBridgeApi, FakeChainClient, FakeSubmission, FAKE_SPOKE_POOL,
};
use across_bridge::{
	Address, BridgeError, ChainError, ErrorKind, ExecutionStage, ExecutionStatus, FillStatus,
	QuoteFailureReason, TransferIntent, TxHash, U256,
};
use mocks::*;
use std::str::FromStr;
use std::time::Duration;

fn assert_failed_at(err: &BridgeError, expected: ExecutionStage) {
	match err {
		BridgeError::ExecutionFailed { stage, .. } => assert_eq!(*stage, expected),
		other => panic!("expected an execution failure, got {other:?}"),
	}
}

#[tokio::test]
async fn test_usdc_transfer_approves_then_deposits() {
	let harness = Harness::funded().await;

	let result = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();

	assert_eq!(result.status, ExecutionStatus::Submitted);
	assert_eq!(result.deposit_tx_hash.len(), 32);
	assert_ne!(result.deposit_tx_hash, TxHash::ZERO);
	assert!(result.deposit_block.is_some());
	assert_eq!(result.origin_chain_id, BASE_SEPOLIA);
	assert_eq!(result.destination_chain_id, SEPOLIA);

	let submissions = harness.origin.submissions();
	assert_eq!(submissions.len(), 2);
	match &submissions[0] {
		FakeSubmission::Approval {
			tx_hash,
			token,
			spender,
			amount,
		} => {
			assert_eq!(Some(*tx_hash), result.approval_tx_hash);
			assert_eq!(*token, usdc_base_sepolia());
			assert_eq!(*spender, FAKE_SPOKE_POOL);
			assert_eq!(*amount, U256::from(USDC_AMOUNT));
		},
		other => panic!("approval must come first, got {other:?}"),
	}
	match &submissions[1] {
		FakeSubmission::Deposit { tx_hash, call } => {
			assert_eq!(*tx_hash, result.deposit_tx_hash);
			assert_eq!(call.spoke_pool, FAKE_SPOKE_POOL);
			assert_eq!(call.input_amount, U256::from(USDC_AMOUNT));
			assert_eq!(call.destination_chain_id, SEPOLIA);
			assert_eq!(call.recipient, Address::from_str(RECIPIENT).unwrap());
			assert!(call.value.is_zero());
		},
		other => panic!("expected the deposit second, got {other:?}"),
	}
}

#[tokio::test]
async fn test_sufficient_allowance_deposits_directly() {
	let origin = funded_origin(100_000_000, ether(1)).with_allowance(
		usdc_base_sepolia(),
		FAKE_SPOKE_POOL,
		U256::from(USDC_AMOUNT),
	);
	let harness = Harness::new(origin, FakeBridgeApi::new()).await;

	let result = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();

	assert_eq!(result.approval_tx_hash, None);
	let submissions = harness.origin.submissions();
	assert_eq!(submissions.len(), 1);
	assert!(!submissions[0].is_approval());
}

#[tokio::test]
async fn test_native_transfer_sends_value() {
	let origin = FakeChainClient::new(BASE_SEPOLIA).with_native_balance(ether(2));
	let harness = Harness::new(origin, FakeBridgeApi::new()).await;
	let intent = TransferIntent::new("ETH", BASE_SEPOLIA, SEPOLIA, ether(1), RECIPIENT);

	let result = harness.bridge.execute_dynamic_bridge(&intent).await.unwrap();

	assert_eq!(result.approval_tx_hash, None);
	match &harness.origin.submissions()[..] {
		[FakeSubmission::Deposit { call, .. }] => {
			assert_eq!(call.value, ether(1));
			assert_eq!(call.input_token, weth_base_sepolia());
		},
		other => panic!("expected a single deposit, got {other:?}"),
	}
}

#[tokio::test]
async fn test_insufficient_balance_submits_nothing() {
	let harness = Harness::new(funded_origin(1_000, ether(1)), FakeBridgeApi::new()).await;

	let err = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Validation);
	assert!(matches!(
		err.root_cause(),
		BridgeError::QuoteRejected {
			reason: QuoteFailureReason::InsufficientBalance,
			..
		}
	));
	assert!(harness.origin.submissions().is_empty());
	assert_eq!(
		harness.bridge.handle_bridge_error(&err).kind,
		ErrorKind::InsufficientFunds
	);
}

#[tokio::test]
async fn test_execution_revalidates_instead_of_trusting_the_dry_run() {
	let harness = Harness::funded().await;
	let intent = usdc_intent(USDC_AMOUNT);

	let quote = harness.bridge.dry_run(&intent).await;
	assert!(quote.can_proceed);

	// Liquidity drains between the dry run and the execution
	harness.api.update(|state| {
		let mut drained = sample_relay_quote(intent.amount);
		drained.limits.max_deposit = U256::from(1_000_000u64);
		state.quote = Some(drained);
	});

	let err = harness.bridge.execute_dynamic_bridge(&intent).await.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Validation);
	assert!(harness.origin.submissions().is_empty());
	let classification = harness.bridge.handle_bridge_error(&err);
	assert_eq!(classification.kind, ErrorKind::UnsupportedRoute);
	assert!(!classification.retryable);
}

#[tokio::test]
async fn test_reverted_approval_stops_before_deposit() {
	let harness = Harness::funded().await;
	harness.origin.update(|state| state.revert_approval = true);

	let err = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Approval);
	let submissions = harness.origin.submissions();
	assert_eq!(submissions.len(), 1);
	assert!(submissions[0].is_approval());
	assert_eq!(
		harness.bridge.handle_bridge_error(&err).kind,
		ErrorKind::ContractRevert
	);
}

#[tokio::test]
async fn test_reverted_deposit_fails_the_deposit_stage() {
	let harness = Harness::funded().await;
	harness.origin.update(|state| state.revert_deposit = true);

	let err = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Deposit);
	let classification = harness.bridge.handle_bridge_error(&err);
	assert_eq!(classification.kind, ErrorKind::ContractRevert);
	assert!(classification.message.starts_with("deposit failed: "));
}

fn approved_origin() -> FakeChainClient {
	funded_origin(100_000_000, ether(1)).with_allowance(
		usdc_base_sepolia(),
		FAKE_SPOKE_POOL,
		U256::MAX,
	)
}

#[tokio::test]
async fn test_deposit_rejected_after_balance_drained_is_insufficient_funds() {
	let harness = Harness::new(approved_origin(), FakeBridgeApi::new()).await;
	harness.origin.update(|state| state.drain_before_submit = true);

	let err = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Deposit);
	assert!(matches!(
		err.root_cause(),
		BridgeError::Chain(ChainError::InsufficientFunds { chain_id: BASE_SEPOLIA, .. })
	));
	assert!(harness.origin.submissions().is_empty());
	let classification = harness.bridge.handle_bridge_error(&err);
	assert_eq!(classification.kind, ErrorKind::InsufficientFunds);
	assert!(!classification.retryable);
}

#[tokio::test]
async fn test_approval_rejected_after_balance_drained_is_insufficient_funds() {
	let harness = Harness::funded().await;
	harness.origin.update(|state| state.drain_before_submit = true);

	let err = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Approval);
	assert_eq!(
		harness.bridge.handle_bridge_error(&err).kind,
		ErrorKind::InsufficientFunds
	);
}

#[tokio::test]
async fn test_rejection_with_funds_intact_keeps_node_error() {
	let harness = Harness::new(approved_origin(), FakeBridgeApi::new()).await;
	let rejection = ChainError::Rejected {
		chain_id: BASE_SEPOLIA,
		code: -32000,
		message: "nonce too low".to_string(),
	};
	harness
		.origin
		.update(|state| state.submission_failure = Some(rejection.clone()));

	let err = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Deposit);
	assert!(matches!(err.root_cause(), BridgeError::Chain(e) if *e == rejection));
	assert_eq!(harness.bridge.handle_bridge_error(&err).kind, ErrorKind::Unknown);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_deposit_submission_is_not_retryable() {
	let harness = Harness::new(approved_origin(), FakeBridgeApi::new()).await;
	harness.origin.update(|state| state.stall_submissions = true);

	let err = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap_err();

	assert_failed_at(&err, ExecutionStage::Deposit);
	assert!(matches!(
		err.root_cause(),
		BridgeError::Chain(ChainError::SubmissionUnconfirmed { chain_id: BASE_SEPOLIA, .. })
	));
	// the node saw the transaction even though the call never returned
	assert_eq!(harness.origin.submissions().len(), 1);
	let classification = harness.bridge.handle_bridge_error(&err);
	assert_ne!(classification.kind, ErrorKind::Timeout);
	assert!(!classification.retryable);
}

#[tokio::test(start_paused = true)]
async fn test_missing_receipt_keeps_submitted_status() {
	let origin = funded_origin(100_000_000, ether(1)).with_allowance(
		usdc_base_sepolia(),
		FAKE_SPOKE_POOL,
		U256::MAX,
	);
	let harness = Harness::new(origin, FakeBridgeApi::new()).await;
	harness.origin.update(|state| state.withhold_receipts = true);

	let result = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();

	assert_eq!(result.status, ExecutionStatus::Submitted);
	assert_eq!(result.deposit_block, None);
	assert_eq!(harness.origin.submissions().len(), 1);
}

#[tokio::test]
async fn test_wait_for_fill_reports_fill_hash() {
	let harness = Harness::new(
		funded_origin(100_000_000, ether(1)),
		FakeBridgeApi::new().with_statuses([
			FillStatus::Pending,
			FillStatus::Pending,
			FillStatus::Filled,
		]),
	)
	.await;

	let submitted = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();
	let result = harness
		.bridge
		.wait_for_fill(submitted, Duration::from_secs(5))
		.await;

	assert_eq!(result.status, ExecutionStatus::Filled);
	assert_eq!(result.filled_tx_hash, Some(TxHash::repeat_byte(0xf1)));
	assert_eq!(harness.api.state().status_calls, 3);
}

#[tokio::test]
async fn test_expired_deposit_is_failed() {
	let harness = Harness::new(
		funded_origin(100_000_000, ether(1)),
		FakeBridgeApi::new().with_statuses([FillStatus::Pending, FillStatus::Expired]),
	)
	.await;

	let submitted = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();
	let result = harness
		.bridge
		.wait_for_fill(submitted, Duration::from_secs(5))
		.await;

	assert_eq!(result.status, ExecutionStatus::Failed);
	assert_eq!(result.filled_tx_hash, None);
}

#[tokio::test(start_paused = true)]
async fn test_fill_timeout_returns_last_known_status() {
	let harness = Harness::new(
		funded_origin(100_000_000, ether(1)),
		FakeBridgeApi::new().with_statuses([FillStatus::Pending]),
	)
	.await;

	let submitted = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();
	let deposit_tx_hash = submitted.deposit_tx_hash;
	let result = harness
		.bridge
		.wait_for_fill(submitted, Duration::from_millis(100))
		.await;

	assert_eq!(result.status, ExecutionStatus::Submitted);
	assert_eq!(result.deposit_tx_hash, deposit_tx_hash);
	assert!(harness.api.state().status_calls >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_hung_status_poll_respects_fill_timeout() {
	let harness = Harness::new(approved_origin(), FakeBridgeApi::new()).await;
	harness.api.update(|state| state.stall_status_polls = true);
	let submitted = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();

	let timeout = Duration::from_millis(200);
	assert!(fast_executor_config().read_timeout > timeout);
	let started = tokio::time::Instant::now();
	let result = harness.bridge.wait_for_fill(submitted.clone(), timeout).await;
	let elapsed = started.elapsed();

	assert!(elapsed >= timeout);
	assert!(elapsed < Duration::from_millis(250), "waited {elapsed:?}");
	assert_eq!(result.status, ExecutionStatus::Submitted);
	assert_eq!(harness.api.state().status_calls, 1);

	let result = harness.bridge.wait_for_fill(submitted, Duration::ZERO).await;
	assert_eq!(result.status, ExecutionStatus::Submitted);
	assert_eq!(harness.api.state().status_calls, 1);
}

#[tokio::test]
async fn test_terminal_result_is_not_polled_again() {
	let harness = Harness::new(
		funded_origin(100_000_000, ether(1)),
		FakeBridgeApi::new().with_statuses([FillStatus::Filled]),
	)
	.await;

	let submitted = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();
	let filled = harness
		.bridge
		.wait_for_fill(submitted, Duration::from_secs(1))
		.await;
	let again = harness
		.bridge
		.wait_for_fill(filled.clone(), Duration::from_secs(1))
		.await;

	assert_eq!(again, filled);
	assert_eq!(harness.api.state().status_calls, 1);
}

#[tokio::test]
async fn test_configured_fill_wait_runs_inside_execution() {
	let mut config = fast_executor_config();
	config.wait_for_fill = true;
	let harness = Harness::with_executor_config(
		funded_origin(100_000_000, ether(1)),
		FakeBridgeApi::new().with_statuses([FillStatus::Pending, FillStatus::Filled]),
		config,
	)
	.await;

	let result = harness
		.bridge
		.execute_dynamic_bridge(&usdc_intent(USDC_AMOUNT))
		.await
		.unwrap();

	assert_eq!(result.status, ExecutionStatus::Filled);
}

#[tokio::test]
async fn test_simple_bridge() {
	let harness = Harness::funded().await;

	let result = harness
		.bridge
		.simple_bridge("usdc", BASE_SEPOLIA, SEPOLIA, U256::from(USDC_AMOUNT), RECIPIENT)
		.await
		.unwrap();

	assert_eq!(result.status, ExecutionStatus::Submitted);
	assert_eq!(result.quote.token_symbol, "usdc");
	assert_eq!(harness.origin.submissions().len(), 2);
}
