use crate::entity::PaymentError;
use crate::ethereum::client::{AlloyClient, RpcError, TransactionRequest};
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

/// EIP-1193 "user rejected request"
const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("User rejected the request")]
    Rejected,

    #[error("Insufficient funds for gas")]
    InsufficientFunds,

    #[error("Wallet error: {0}")]
    Rpc(#[from] RpcError),
}

impl WalletError {
    /// Classify a raw JSON-RPC error coming back from the signer
    pub fn from_rpc(error: RpcError) -> Self {
        match &error {
            RpcError::Rpc { code, .. } if *code == USER_REJECTED_CODE => WalletError::Rejected,
            RpcError::Rpc { message, .. } => {
                let message = message.to_lowercase();
                if message.contains("user denied") || message.contains("user rejected") {
                    WalletError::Rejected
                } else if message.contains("insufficient funds") {
                    WalletError::InsufficientFunds
                } else {
                    WalletError::Rpc(error)
                }
            }
            _ => WalletError::Rpc(error),
        }
    }
}

impl From<WalletError> for PaymentError {
    fn from(error: WalletError) -> Self {
        match error {
            WalletError::Rejected => PaymentError::UserRejectedTransaction,
            WalletError::InsufficientFunds => PaymentError::LowBalanceForGas,
            WalletError::Rpc(e) => PaymentError::Unknown(e.to_string()),
        }
    }
}

/// Signing side of the user's wallet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    /// Sign and broadcast, returning the transaction hash
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<String, WalletError>;

    /// `personal_sign` over a UTF-8 message, returning the hex signature
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;
}

/// Wallet backed by an account the node (or injected provider) manages
pub struct RpcWallet {
    client: Arc<AlloyClient>,
    address: Address,
}

impl RpcWallet {
    pub fn new(client: Arc<AlloyClient>, address: Address) -> Self {
        Self { client, address }
    }
}

#[async_trait]
impl Wallet for RpcWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<String, WalletError> {
        let pending = self
            .client
            .provider()
            .send_transaction(tx.from(self.address))
            .await
            .map_err(|e| {
                warn!("eth_sendTransaction failed: {}", e);
                WalletError::from_rpc(RpcError::from(e))
            })?;

        let tx_hash = pending.tx_hash().to_string();
        info!("Transaction sent: {}", tx_hash);
        Ok(tx_hash)
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let data = Bytes::copy_from_slice(message.as_bytes());
        self.client
            .provider()
            .raw_request::<_, String>("personal_sign".into(), (data, self.address))
            .await
            .map_err(|e| WalletError::from_rpc(RpcError::from(e)))
    }
}
