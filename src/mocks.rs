//! In-memory fakes for examples and testing
//!
//! A chain client, a connector and a bridge API that behave like the real
//! ones without any network access. State is public so tests can arrange
//! balances and inspect submissions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bridge_types::{
	Address, BridgeApi, BridgeApiError, BridgeApiResult, BridgeRoute, ChainClient,
	ChainConnector, ChainDescriptor, ChainError, ChainResult, DepositCall, DepositLimits,
	DepositStatus, FeeRequest, FillStatus, RelayQuote, TransactionOutcome, TxHash, U256,
};
use url::Url;

/// Signer address used by fakes unless overridden
pub const FAKE_SIGNER: Address = Address::repeat_byte(0x5a);

/// SpokePool address returned by [`sample_relay_quote`]
pub const FAKE_SPOKE_POOL: Address = Address::repeat_byte(0x5b);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A transaction broadcast through a [`FakeChainClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeSubmission {
	Approval {
		tx_hash: TxHash,
		token: Address,
		spender: Address,
		amount: U256,
	},
	Deposit { tx_hash: TxHash, call: DepositCall },
}

impl FakeSubmission {
	pub fn tx_hash(&self) -> TxHash {
		match self {
			FakeSubmission::Approval { tx_hash, .. } | FakeSubmission::Deposit { tx_hash, .. } => {
				*tx_hash
			},
		}
	}

	pub fn is_approval(&self) -> bool {
		matches!(self, FakeSubmission::Approval { .. })
	}
}

/// Mutable chain state behind a [`FakeChainClient`]
#[derive(Debug, Clone)]
pub struct FakeChainState {
	pub block_number: u64,
	pub native_balance: U256,
	pub token_balances: HashMap<Address, U256>,
	/// Keyed by `(token, spender)`
	pub allowances: HashMap<(Address, Address), U256>,
	pub gas_price: u128,
	pub approval_gas: u64,
	pub deposit_gas: u64,
	/// Returned by every read while set
	pub read_failure: Option<ChainError>,
	pub revert_approval: bool,
	pub revert_deposit: bool,
	/// Receipts never arrive
	pub withhold_receipts: bool,
	/// Balances are emptied just before each submission, which the node
	/// then rejects for lack of funds
	pub drain_before_submit: bool,
	/// Returned by submissions instead of a transaction hash
	pub submission_failure: Option<ChainError>,
	/// Submissions are recorded but the call never returns
	pub stall_submissions: bool,
	pub submissions: Vec<FakeSubmission>,
	pub shutdown: bool,
}

impl Default for FakeChainState {
	fn default() -> Self {
		Self {
			block_number: 1_000,
			native_balance: U256::ZERO,
			token_balances: HashMap::new(),
			allowances: HashMap::new(),
			gas_price: 1_000_000_000,
			approval_gas: 46_000,
			deposit_gas: 120_000,
			read_failure: None,
			revert_approval: false,
			revert_deposit: false,
			withhold_receipts: false,
			drain_before_submit: false,
			submission_failure: None,
			stall_submissions: false,
			submissions: Vec::new(),
			shutdown: false,
		}
	}
}

/// Chain client backed by [`FakeChainState`]
///
/// Deposit gas estimation reverts while the ERC-20 allowance is too low, like
/// a node simulating `depositV3` would.
#[derive(Debug)]
pub struct FakeChainClient {
	chain_id: u64,
	signer: Address,
	state: Mutex<FakeChainState>,
	nonce: AtomicU64,
}

impl FakeChainClient {
	pub fn new(chain_id: u64) -> Self {
		Self {
			chain_id,
			signer: FAKE_SIGNER,
			state: Mutex::new(FakeChainState::default()),
			nonce: AtomicU64::new(0),
		}
	}

	pub fn with_native_balance(self, balance: U256) -> Self {
		lock(&self.state).native_balance = balance;
		self
	}

	pub fn with_token_balance(self, token: Address, balance: U256) -> Self {
		lock(&self.state).token_balances.insert(token, balance);
		self
	}

	pub fn with_allowance(self, token: Address, spender: Address, amount: U256) -> Self {
		lock(&self.state).allowances.insert((token, spender), amount);
		self
	}

	/// Run `f` against the state, e.g. to change balances between calls
	pub fn update<R>(&self, f: impl FnOnce(&mut FakeChainState) -> R) -> R {
		f(&mut lock(&self.state))
	}

	pub fn state(&self) -> FakeChainState {
		lock(&self.state).clone()
	}

	pub fn submissions(&self) -> Vec<FakeSubmission> {
		lock(&self.state).submissions.clone()
	}

	fn check_reads(&self) -> ChainResult<()> {
		match &lock(&self.state).read_failure {
			Some(e) => Err(e.clone()),
			None => Ok(()),
		}
	}

	/// Fail the submission the way a node would, before anything is recorded
	fn check_submission(&self, state: &mut FakeChainState) -> ChainResult<()> {
		if state.drain_before_submit {
			state.native_balance = U256::ZERO;
			state.token_balances.values_mut().for_each(|b| *b = U256::ZERO);
			return Err(ChainError::Rejected {
				chain_id: self.chain_id,
				code: -32000,
				message: "insufficient funds for gas * price + value".to_string(),
			});
		}
		match &state.submission_failure {
			Some(e) => Err(e.clone()),
			None => Ok(()),
		}
	}

	async fn stall_if_requested(&self) {
		let stall = lock(&self.state).stall_submissions;
		if stall {
			std::future::pending::<()>().await;
		}
	}

	fn next_tx_hash(&self) -> TxHash {
		let n = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
		let mut bytes = [0u8; 32];
		bytes[..8].copy_from_slice(&self.chain_id.to_be_bytes());
		bytes[24..].copy_from_slice(&n.to_be_bytes());
		TxHash::from(bytes)
	}
}

#[async_trait]
impl ChainClient for FakeChainClient {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	fn signer_address(&self) -> Address {
		self.signer
	}

	async fn block_number(&self) -> ChainResult<u64> {
		self.check_reads()?;
		Ok(lock(&self.state).block_number)
	}

	async fn native_balance(&self, _owner: Address) -> ChainResult<U256> {
		self.check_reads()?;
		Ok(lock(&self.state).native_balance)
	}

	async fn token_balance(&self, token: Address, _owner: Address) -> ChainResult<U256> {
		self.check_reads()?;
		Ok(lock(&self.state)
			.token_balances
			.get(&token)
			.copied()
			.unwrap_or_default())
	}

	async fn allowance(
		&self,
		token: Address,
		_owner: Address,
		spender: Address,
	) -> ChainResult<U256> {
		self.check_reads()?;
		Ok(lock(&self.state)
			.allowances
			.get(&(token, spender))
			.copied()
			.unwrap_or_default())
	}

	async fn gas_price(&self) -> ChainResult<u128> {
		self.check_reads()?;
		Ok(lock(&self.state).gas_price)
	}

	async fn estimate_approval_gas(
		&self,
		_token: Address,
		_spender: Address,
		_amount: U256,
	) -> ChainResult<u64> {
		self.check_reads()?;
		Ok(lock(&self.state).approval_gas)
	}

	async fn estimate_deposit_gas(&self, deposit: &DepositCall) -> ChainResult<u64> {
		self.check_reads()?;
		let state = lock(&self.state);
		if deposit.value.is_zero() {
			let allowance = state
				.allowances
				.get(&(deposit.input_token, deposit.spoke_pool))
				.copied()
				.unwrap_or_default();
			if allowance < deposit.input_amount {
				return Err(ChainError::Reverted {
					chain_id: self.chain_id,
					tx_hash: None,
					reason: "ERC20: insufficient allowance".to_string(),
				});
			}
		}
		Ok(state.deposit_gas)
	}

	async fn submit_approval(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> ChainResult<TxHash> {
		let tx_hash = self.next_tx_hash();
		{
			let mut state = lock(&self.state);
			self.check_submission(&mut state)?;
			if !state.revert_approval {
				state.allowances.insert((token, spender), amount);
			}
			state.submissions.push(FakeSubmission::Approval {
				tx_hash,
				token,
				spender,
				amount,
			});
		}
		self.stall_if_requested().await;
		Ok(tx_hash)
	}

	async fn submit_deposit(&self, deposit: &DepositCall) -> ChainResult<TxHash> {
		let tx_hash = self.next_tx_hash();
		{
			let mut state = lock(&self.state);
			self.check_submission(&mut state)?;
			state.submissions.push(FakeSubmission::Deposit {
				tx_hash,
				call: deposit.clone(),
			});
		}
		self.stall_if_requested().await;
		Ok(tx_hash)
	}

	async fn wait_for_confirmations(
		&self,
		tx_hash: TxHash,
		confirmations: u64,
		timeout: Duration,
	) -> ChainResult<TransactionOutcome> {
		let (submission, withhold, reverts, block) = {
			let mut state = lock(&self.state);
			state.block_number += confirmations.max(1);
			let submission = state
				.submissions
				.iter()
				.find(|s| s.tx_hash() == tx_hash)
				.cloned();
			let reverts = match &submission {
				Some(FakeSubmission::Approval { .. }) => state.revert_approval,
				Some(FakeSubmission::Deposit { .. }) => state.revert_deposit,
				None => false,
			};
			(submission, state.withhold_receipts, reverts, state.block_number)
		};

		if withhold {
			tokio::time::sleep(timeout).await;
			return Err(ChainError::timeout(
				self.chain_id,
				"receipt",
				u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
			));
		}
		if submission.is_none() {
			return Err(ChainError::Decode {
				chain_id: self.chain_id,
				reason: format!("unknown transaction {tx_hash}"),
			});
		}
		Ok(TransactionOutcome {
			tx_hash,
			block_number: block,
			succeeded: !reverts,
			gas_used: 50_000,
		})
	}

	async fn shutdown(&self) {
		lock(&self.state).shutdown = true;
	}
}

/// Connector handing out shared [`FakeChainClient`]s
#[derive(Debug, Default)]
pub struct FakeConnector {
	clients: HashMap<u64, Arc<FakeChainClient>>,
	unreachable: HashSet<u64>,
	connects: AtomicU64,
}

impl FakeConnector {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_client(mut self, client: Arc<FakeChainClient>) -> Self {
		self.clients.insert(client.chain_id, client);
		self
	}

	/// Connections to `chain_id` fail with a transport error
	pub fn with_unreachable(mut self, chain_id: u64) -> Self {
		self.unreachable.insert(chain_id);
		self
	}

	pub fn connect_count(&self) -> u64 {
		self.connects.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ChainConnector for FakeConnector {
	async fn connect(
		&self,
		chain: &ChainDescriptor,
		rpc_url: &Url,
	) -> ChainResult<Arc<dyn ChainClient>> {
		self.connects.fetch_add(1, Ordering::SeqCst);
		if self.unreachable.contains(&chain.chain_id) {
			return Err(ChainError::Transport {
				chain_id: chain.chain_id,
				reason: format!("connection refused: {rpc_url}"),
			});
		}
		match self.clients.get(&chain.chain_id) {
			Some(client) => Ok(client.clone() as Arc<dyn ChainClient>),
			None => Ok(Arc::new(FakeChainClient::new(chain.chain_id))),
		}
	}
}

/// Failure a [`FakeBridgeApi`] can be told to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeApiFailure {
	Status(u16),
	Timeout,
	RouteNotSupported,
	AmountOutOfRange,
}

impl FakeApiFailure {
	fn into_error(self, origin_chain_id: u64, destination_chain_id: u64) -> BridgeApiError {
		match self {
			FakeApiFailure::Status(status_code) => BridgeApiError::HttpStatus {
				status_code,
				reason: "injected".to_string(),
			},
			FakeApiFailure::Timeout => BridgeApiError::Timeout { timeout_ms: 10 },
			FakeApiFailure::RouteNotSupported => BridgeApiError::RouteNotSupported {
				origin_chain_id,
				destination_chain_id,
				message: "Route is not enabled".to_string(),
			},
			FakeApiFailure::AmountOutOfRange => BridgeApiError::AmountOutOfRange {
				message: "Amount exceeds max. deposit limit".to_string(),
			},
		}
	}
}

/// Mutable state behind a [`FakeBridgeApi`]
#[derive(Debug, Clone, Default)]
pub struct FakeBridgeState {
	/// `None` enables every requested route
	pub routes: Option<Vec<BridgeRoute>>,
	pub quote: Option<RelayQuote>,
	pub route_failures: VecDeque<FakeApiFailure>,
	pub fee_failures: VecDeque<FakeApiFailure>,
	/// Popped one per poll; the last entry repeats
	pub statuses: VecDeque<DepositStatus>,
	/// Status polls never return
	pub stall_status_polls: bool,
	pub route_calls: u32,
	pub fee_calls: u32,
	pub status_calls: u32,
}

/// Bridge API answering from [`FakeBridgeState`]
#[derive(Debug, Default)]
pub struct FakeBridgeApi {
	state: Mutex<FakeBridgeState>,
}

impl FakeBridgeApi {
	/// Every route enabled, quoting [`sample_relay_quote`] for any amount
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_quote(self, quote: RelayQuote) -> Self {
		lock(&self.state).quote = Some(quote);
		self
	}

	pub fn with_routes(self, routes: Vec<BridgeRoute>) -> Self {
		lock(&self.state).routes = Some(routes);
		self
	}

	pub fn with_statuses(self, statuses: impl IntoIterator<Item = FillStatus>) -> Self {
		lock(&self.state).statuses = statuses
			.into_iter()
			.map(|status| DepositStatus {
				status,
				deposit_id: Some("4242".to_string()),
				fill_tx_hash: (status == FillStatus::Filled).then(|| TxHash::repeat_byte(0xf1)),
				destination_chain_id: None,
			})
			.collect();
		self
	}

	pub fn update<R>(&self, f: impl FnOnce(&mut FakeBridgeState) -> R) -> R {
		f(&mut lock(&self.state))
	}

	pub fn state(&self) -> FakeBridgeState {
		lock(&self.state).clone()
	}
}

#[async_trait]
impl BridgeApi for FakeBridgeApi {
	async fn available_routes(
		&self,
		origin_chain_id: u64,
		destination_chain_id: u64,
		origin_token: Address,
		destination_token: Address,
	) -> BridgeApiResult<Vec<BridgeRoute>> {
		let mut state = lock(&self.state);
		state.route_calls += 1;
		if let Some(failure) = state.route_failures.pop_front() {
			return Err(failure.into_error(origin_chain_id, destination_chain_id));
		}
		let route = BridgeRoute {
			origin_chain_id,
			destination_chain_id,
			origin_token,
			destination_token,
			origin_token_symbol: String::new(),
			is_native: false,
		};
		Ok(match &state.routes {
			None => vec![route],
			Some(routes) => routes
				.iter()
				.filter(|r| {
					r.origin_chain_id == origin_chain_id
						&& r.destination_chain_id == destination_chain_id
						&& r.origin_token == origin_token
				})
				.cloned()
				.collect(),
		})
	}

	async fn suggested_fees(&self, request: &FeeRequest) -> BridgeApiResult<RelayQuote> {
		let mut state = lock(&self.state);
		state.fee_calls += 1;
		if let Some(failure) = state.fee_failures.pop_front() {
			return Err(failure.into_error(request.origin_chain_id, request.destination_chain_id));
		}
		Ok(state
			.quote
			.clone()
			.unwrap_or_else(|| sample_relay_quote(request.amount)))
	}

	async fn deposit_status(
		&self,
		_origin_chain_id: u64,
		_deposit_tx_hash: TxHash,
	) -> BridgeApiResult<DepositStatus> {
		let (stall, status) = {
			let mut state = lock(&self.state);
			state.status_calls += 1;
			let status = if state.statuses.len() > 1 {
				state.statuses.pop_front()
			} else {
				state.statuses.front().cloned()
			};
			(state.stall_status_polls, status)
		};
		if stall {
			std::future::pending::<()>().await;
		}
		Ok(status.unwrap_or_else(DepositStatus::pending))
	}
}

/// Relay quote charging 0.1% relayer fee and 0.02% LP fee on `amount`
pub fn sample_relay_quote(amount: U256) -> RelayQuote {
	let relayer_capital_fee = amount / U256::from(2_000u64);
	let relayer_gas_fee = amount / U256::from(2_000u64);
	let lp_fee = amount / U256::from(5_000u64);
	let total_relay_fee = relayer_capital_fee + relayer_gas_fee + lp_fee;
	RelayQuote {
		quote_id: Some("fake-quote".to_string()),
		total_relay_fee,
		relayer_capital_fee,
		relayer_gas_fee,
		lp_fee,
		output_amount: amount.saturating_sub(total_relay_fee),
		estimated_fill_time_seconds: 12,
		timestamp: 1_700_000_000,
		fill_deadline: 1_700_021_600,
		exclusive_relayer: Address::ZERO,
		exclusivity_deadline: 0,
		spoke_pool: FAKE_SPOKE_POOL,
		limits: DepositLimits {
			min_deposit: U256::from(1_000u64),
			max_deposit: U256::from(10u64).pow(U256::from(30u64)),
			max_deposit_instant: U256::from(10u64).pow(U256::from(24u64)),
		},
		is_amount_too_low: false,
	}
}
