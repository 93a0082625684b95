// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC client for the counter demo networks.

use std::str::FromStr;

use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};

use super::counter::{CounterContract, ForwarderContract};
use super::types::{Network, NetworkConfig};

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Read-only client for one network.
#[derive(Debug)]
pub struct ChainClient {
    network: Network,
    provider: HttpProvider,
}

impl ChainClient {
    /// Create a client for `network` talking to `rpc_url`.
    ///
    /// No request is made until the first read.
    pub fn new(network: Network, rpc_url: &str) -> Result<Self, ChainClientError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn config(&self) -> &'static NetworkConfig {
        self.network.config()
    }

    /// Chain id as reported by the RPC endpoint.
    pub async fn get_chain_id(&self) -> Result<u64, ChainClientError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainClientError::RpcError(e.to_string()))
    }

    /// Read `contextCounter(user)` from the network's counter contract.
    pub async fn counter_value(&self, user: Address) -> Result<U256, ChainClientError> {
        let counter = parse_address(self.config().counter_address)?;
        CounterContract::new(&self.provider, counter)
            .context_counter(user)
            .await
    }

    /// Read the forwarder's next `userNonce(user)`.
    pub async fn forwarder_nonce(&self, user: Address) -> Result<U256, ChainClientError> {
        let forwarder = parse_address(self.config().trusted_forwarder)?;
        ForwarderContract::new(&self.provider, forwarder)
            .user_nonce(user)
            .await
    }
}

/// Parse a 0x-prefixed address, accepting any checksum casing.
pub fn parse_address(raw: &str) -> Result<Address, ChainClientError> {
    Address::from_str(raw.trim()).map_err(|e| ChainClientError::InvalidAddress(e.to_string()))
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::{matchers::method, Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Minimal JSON-RPC responder: answers by method name and echoes the id.
    pub(crate) struct RpcResponder {
        pub chain_id: u64,
        pub call_result: U256,
    }

    impl Respond for RpcResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            let id = body.get("id").cloned().unwrap_or(json!(0));
            let result = match body.get("method").and_then(Value::as_str) {
                Some("eth_chainId") => json!(format!("{:#x}", self.chain_id)),
                Some("eth_call") => json!(format!(
                    "0x{}",
                    alloy::hex::encode(self.call_result.to_be_bytes::<32>())
                )),
                _ => Value::Null,
            };
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }))
        }
    }

    pub(crate) async fn mock_rpc(chain_id: u64, call_result: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(RpcResponder {
                chain_id,
                call_result: U256::from(call_result),
            })
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn rejects_invalid_rpc_url() {
        let result = ChainClient::new(Network::BaseSepolia, "not a url");
        assert!(matches!(result, Err(ChainClientError::InvalidRpcUrl(_))));
    }

    #[test]
    fn parse_address_accepts_lowercase_and_rejects_garbage() {
        assert!(parse_address("0x79dbe2ce05f44195b502c2f160f35fcab9190308").is_ok());
        assert!(matches!(
            parse_address("0x1234"),
            Err(ChainClientError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn reads_chain_id_and_counter_over_rpc() {
        let server = mock_rpc(84532, 7).await;
        let client = ChainClient::new(Network::BaseSepolia, &server.uri()).unwrap();

        assert_eq!(client.get_chain_id().await.unwrap(), 84532);

        let user = parse_address("0x00000000000000000000000000000000000000aa").unwrap();
        assert_eq!(client.counter_value(user).await.unwrap(), U256::from(7u64));
        assert_eq!(client.forwarder_nonce(user).await.unwrap(), U256::from(7u64));
    }
}
