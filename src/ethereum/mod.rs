pub mod client;
pub mod ens;
pub mod erc20;
pub mod paraswap;
pub mod utils;
pub mod wallet;

pub use client::{
    create_ethereum_client, AlloyClient, EthereumClient, RpcError, TransactionReceipt, TransactionRequest,
};
pub use utils::{amount_to_decimal, amount_to_int, etherscan_tx_url, validate_eth_address};
pub use wallet::{RpcWallet, Wallet, WalletError};
