//! Contract bindings used by the EVM chain client

use alloy::sol;

sol! {
	#[allow(missing_docs)]
	#[sol(rpc)]
	interface IERC20 {
		function balanceOf(address owner) external view returns (uint256);
		function allowance(address owner, address spender) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
	}

	#[allow(missing_docs)]
	#[sol(rpc)]
	interface ISpokePool {
		function depositV3(
			address depositor,
			address recipient,
			address inputToken,
			address outputToken,
			uint256 inputAmount,
			uint256 outputAmount,
			uint256 destinationChainId,
			address exclusiveRelayer,
			uint32 quoteTimestamp,
			uint32 fillDeadline,
			uint32 exclusivityDeadline,
			bytes calldata message
		) external payable;
	}
}
