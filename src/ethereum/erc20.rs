use crate::ethereum::client::{sol_call, EthereumClient, RpcError, TransactionRequest};
use crate::ethereum::utils::calculate_gas_margin;
use crate::ethereum::wallet::{Wallet, WalletError};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use log::{debug, info};

sol! {
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }
}

pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

pub fn transfer_calldata(recipient: Address, amount: U256) -> Bytes {
    IERC20::transferCall {
        to: recipient,
        amount,
    }
    .abi_encode()
    .into()
}

pub async fn get_allowance(
    client: &dyn EthereumClient,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256, RpcError> {
    let allowance = sol_call(client, token, IERC20::allowanceCall { owner, spender }).await?;
    debug!("Allowance of {} for spender {} on {}: {}", owner, spender, token, allowance);
    Ok(allowance)
}

pub async fn get_token_balance(
    client: &dyn EthereumClient,
    token: Address,
    owner: Address,
) -> Result<U256, RpcError> {
    sol_call(client, token, IERC20::balanceOfCall { owner }).await
}

/// Set the gas limit to the node's estimate plus margin
pub async fn with_gas_limit(
    client: &dyn EthereumClient,
    tx: TransactionRequest,
) -> Result<TransactionRequest, RpcError> {
    let estimated = client.estimate_gas(&tx).await?;
    Ok(tx.gas_limit(calculate_gas_margin(estimated)))
}

/// Submit `approve(spender, amount)` and return the transaction hash
pub async fn approve(
    client: &dyn EthereumClient,
    wallet: &dyn Wallet,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<String, WalletError> {
    let tx = TransactionRequest::default()
        .from(wallet.address())
        .to(token)
        .input(approve_calldata(spender, amount).into());
    let tx = with_gas_limit(client, tx)
        .await
        .map_err(WalletError::from_rpc)?;

    info!("Approving {} of token {} for spender {}", amount, token, spender);
    wallet.send_transaction(tx).await
}
