use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol_types::SolCall;
use alloy::transports::TransportError;
use async_trait::async_trait;
use log::{debug, error};
use std::sync::Arc;
use thiserror::Error;

pub use alloy::rpc::types::TransactionRequest;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
}

impl From<TransportError> for RpcError {
    fn from(error: TransportError) -> Self {
        match error.as_error_resp() {
            Some(payload) => RpcError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => RpcError::Transport(error.to_string()),
        }
    }
}

impl From<alloy::sol_types::Error> for RpcError {
    fn from(error: alloy::sol_types::Error) -> Self {
        RpcError::Abi(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// Read access to an Ethereum node
#[async_trait]
pub trait EthereumClient: Send + Sync {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RpcError>;

    async fn get_balance(&self, address: Address) -> Result<U256, RpcError>;

    async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, RpcError>;
}

/// Run a typed contract call and decode its return value
pub async fn sol_call<C: SolCall + Send>(
    client: &dyn EthereumClient,
    to: Address,
    call: C,
) -> Result<C::Return, RpcError> {
    let data = client.call(to, call.abi_encode().into()).await?;
    Ok(C::abi_decode_returns(&data)?)
}

/// Node access through an alloy provider
pub struct AlloyClient {
    provider: DynProvider,
}

impl AlloyClient {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl EthereumClient for AlloyClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        debug!("eth_call to {}", to);
        let tx = TransactionRequest::default().to(to).input(data.into());
        Ok(self.provider.call(tx).await?)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RpcError> {
        self.provider.estimate_gas(tx.clone()).await.map_err(|e| {
            error!("eth_estimateGas failed: {}", e);
            RpcError::from(e)
        })
    }

    async fn get_balance(&self, address: Address) -> Result<U256, RpcError> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let hash: TxHash = tx_hash
            .parse()
            .map_err(|_| RpcError::InvalidResponse(format!("bad tx hash {}", tx_hash)))?;

        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|receipt| TransactionReceipt {
            transaction_hash: tx_hash.to_string(),
            block_number: receipt.block_number,
            success: receipt.status(),
        }))
    }
}

/// Create a client for the given node URL
pub fn create_ethereum_client(rpc_url: &str) -> Result<Arc<AlloyClient>, RpcError> {
    let url: reqwest::Url = rpc_url
        .parse()
        .map_err(|e| RpcError::Transport(format!("invalid RPC URL {}: {}", rpc_url, e)))?;
    let provider = ProviderBuilder::new().connect_http(url).erased();
    Ok(Arc::new(AlloyClient::new(provider)))
}
