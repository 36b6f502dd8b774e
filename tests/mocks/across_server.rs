//! Fake Across REST API served by axum on an ephemeral port

use axum::{
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
	Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

/// Deposit hash the fake reports as not indexed yet
pub const UNINDEXED_DEPOSIT: &str =
	"0x0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Default)]
pub struct ServerState {
	/// Number of upcoming `suggested-fees` requests answered with 503
	pub fee_outages: AtomicU32,
	pub fee_requests: AtomicU32,
	pub route_requests: AtomicU32,
}

pub struct FakeAcrossServer {
	pub base_url: Url,
	pub state: Arc<ServerState>,
	pub handle: JoinHandle<()>,
}

impl FakeAcrossServer {
	pub async fn spawn() -> Result<Self, Box<dyn std::error::Error>> {
		let state = Arc::new(ServerState::default());
		let app = Router::new()
			.route("/api/available-routes", get(available_routes))
			.route("/api/suggested-fees", get(suggested_fees))
			.route("/api/deposit/status", get(deposit_status))
			.with_state(state.clone());

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let handle = tokio::spawn(async move {
			axum::serve(listener, app).await.ok();
		});

		Ok(Self {
			base_url: Url::parse(&format!("http://{addr}/api"))?,
			state,
			handle,
		})
	}
}

impl Drop for FakeAcrossServer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

type Params = Query<HashMap<String, String>>;

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
	params.get(name).map(String::as_str).unwrap_or_default()
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
	(status, Json(json!({ "code": code, "message": message }))).into_response()
}

async fn available_routes(
	State(state): State<Arc<ServerState>>,
	Query(params): Params,
) -> Response {
	state.route_requests.fetch_add(1, Ordering::SeqCst);
	let origin = param(&params, "originChainId");
	let destination = param(&params, "destinationChainId");
	if origin != "84532" || destination != "11155111" {
		return Json(json!([])).into_response();
	}
	Json(json!([{
		"originChainId": 84532,
		"destinationChainId": 11155111,
		"originToken": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
		"destinationToken": "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238",
		"originTokenSymbol": "USDC",
		"destinationTokenSymbol": "USDC",
		"isNative": false
	}]))
	.into_response()
}

async fn suggested_fees(State(state): State<Arc<ServerState>>, Query(params): Params) -> Response {
	state.fee_requests.fetch_add(1, Ordering::SeqCst);
	let outage = state
		.fee_outages
		.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
		.is_ok();
	if outage {
		return error(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", "Try again later");
	}

	if param(&params, "destinationChainId") == "80001" {
		return error(
			StatusCode::BAD_REQUEST,
			"ROUTE_NOT_ENABLED",
			"Route is not enabled",
		);
	}
	let amount: u64 = param(&params, "amount").parse().unwrap_or_default();
	if amount < 500_000 {
		return error(
			StatusCode::BAD_REQUEST,
			"AMOUNT_TOO_LOW",
			"Sent amount is too low relative to fees",
		);
	}
	if param(&params, "inputToken").is_empty() || param(&params, "depositor").is_empty() {
		return error(StatusCode::BAD_REQUEST, "INVALID_PARAM", "Missing parameter");
	}

	let relay_fee = amount / 1_000;
	Json(json!({
		"estimatedFillTimeSec": 12,
		"timestamp": "1754342087",
		"isAmountTooLow": false,
		"quoteBlock": "23070320",
		"exclusiveRelayer": "0x0000000000000000000000000000000000000000",
		"exclusivityDeadline": 0,
		"spokePoolAddress": "0x82B564983aE7274c86695917BBf8C99ECb6F0F8F",
		"totalRelayFee": { "pct": "1000000000000000", "total": relay_fee.to_string() },
		"relayerCapitalFee": { "pct": "100000000000000", "total": (relay_fee / 10).to_string() },
		"relayerGasFee": { "pct": "900000000000000", "total": (relay_fee - relay_fee / 10).to_string() },
		"lpFee": { "pct": "0", "total": "0" },
		"limits": {
			"minDeposit": "500000",
			"maxDeposit": "1000000000000",
			"maxDepositInstant": "250000000000",
			"maxDepositShortDelay": "1000000000000",
			"recommendedDepositInstant": "250000000000"
		},
		"fillDeadline": "1754353917",
		"outputAmount": (amount - relay_fee).to_string(),
		"id": "fake-across-quote"
	}))
	.into_response()
}

async fn deposit_status(Query(params): Params) -> Response {
	let tx_hash = param(&params, "depositTxHash");
	if tx_hash == UNINDEXED_DEPOSIT {
		return (
			StatusCode::NOT_FOUND,
			Json(json!({ "error": "DepositNotFoundException", "message": "Deposit not found" })),
		)
			.into_response();
	}
	Json(json!({
		"status": "filled",
		"originChainId": param(&params, "originChainId").parse::<u64>().unwrap_or_default(),
		"depositId": 1042,
		"depositTxHash": tx_hash,
		"fillTx": format!("0x{}", "cd".repeat(32)),
		"destinationChainId": 11155111
	}))
	.into_response()
}
