use crate::ethereum::client::{sol_call, EthereumClient, RpcError};
use alloy::primitives::{address, hex, keccak256, Address, B256};
use alloy::sol;
use log::debug;

/// ENS registry, same address on mainnet and testnets
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    interface ENSRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface INameResolver {
        function name(bytes32 node) external view returns (string);
    }
}

pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(buf);
    }
    node
}

pub fn reverse_name(address: Address) -> String {
    format!("{}.addr.reverse", hex::encode(address.as_slice()))
}

/// Reverse-resolve an address to its primary ENS name, if one is set
pub async fn lookup_address(
    client: &dyn EthereumClient,
    address: Address,
) -> Result<Option<String>, RpcError> {
    let node = namehash(&reverse_name(address));

    let resolver = sol_call(client, ENS_REGISTRY, ENSRegistry::resolverCall { node }).await?;
    if resolver == Address::ZERO {
        debug!("No reverse resolver for {}", address);
        return Ok(None);
    }

    let name = sol_call(client, resolver, INameResolver::nameCall { node }).await?;
    Ok(Some(name).filter(|name| !name.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::client::{TransactionReceipt, TransactionRequest};
    use alloy::primitives::{Bytes, U256};
    use alloy::sol_types::SolValue;
    use async_trait::async_trait;
    use std::str::FromStr;

    struct ReverseRecords {
        resolver: Address,
        name: &'static str,
    }

    fn abi_string(value: &str) -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[31] = 0x20;
        data[32..64].copy_from_slice(&U256::from(value.len()).to_be_bytes::<32>());
        let mut padded = value.as_bytes().to_vec();
        padded.resize(value.len().div_ceil(32) * 32, 0);
        data.extend(padded);
        data
    }

    #[async_trait]
    impl EthereumClient for ReverseRecords {
        async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes, RpcError> {
            if to == ENS_REGISTRY {
                Ok(self.resolver.abi_encode().into())
            } else {
                Ok(abi_string(self.name).into())
            }
        }

        async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64, RpcError> {
            Ok(0)
        }

        async fn get_balance(&self, _address: Address) -> Result<U256, RpcError> {
            Ok(U256::ZERO)
        }

        async fn get_transaction_receipt(
            &self,
            _tx_hash: &str,
        ) -> Result<Option<TransactionReceipt>, RpcError> {
            Ok(None)
        }
    }

    #[test]
    fn namehash_matches_eip137_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            hex::encode(namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            hex::encode(namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn reverse_name_is_lowercase_hex() {
        let address = Address::from_str("0x6B175474E89094C44Da98b954EedeAC495271d0F").unwrap();
        assert_eq!(
            reverse_name(address),
            "6b175474e89094c44da98b954eedeac495271d0f.addr.reverse"
        );
    }

    #[tokio::test]
    async fn resolves_primary_name() {
        let chain = ReverseRecords {
            resolver: Address::repeat_byte(0x42),
            name: "mooni.eth",
        };
        let name = lookup_address(&chain, Address::repeat_byte(0x11)).await.unwrap();
        assert_eq!(name.as_deref(), Some("mooni.eth"));
    }

    #[tokio::test]
    async fn missing_resolver_or_name_is_none() {
        let no_resolver = ReverseRecords {
            resolver: Address::ZERO,
            name: "ignored.eth",
        };
        assert_eq!(lookup_address(&no_resolver, Address::ZERO).await.unwrap(), None);

        let empty = ReverseRecords {
            resolver: Address::repeat_byte(0x42),
            name: "",
        };
        assert_eq!(lookup_address(&empty, Address::ZERO).await.unwrap(), None);
    }
}
