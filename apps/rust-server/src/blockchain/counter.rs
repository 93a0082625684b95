// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Counter and forwarder contract interactions.

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    sol,
    sol_types::SolCall,
};

use super::client::ChainClientError;

sol! {
    #[sol(rpc)]
    interface ICounterERC2771 {
        function increment() external;
        function contextCounter(address user) external view returns (uint256);
    }

    #[sol(rpc)]
    interface IGelatoRelay1BalanceERC2771 {
        function userNonce(address user) external view returns (uint256);
    }
}

/// `CounterERC2771` contract wrapper.
pub struct CounterContract<P> {
    contract: ICounterERC2771::ICounterERC2771Instance<P>,
}

impl<P: Provider + Clone> CounterContract<P> {
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: ICounterERC2771::new(address, provider.clone()),
        }
    }

    /// Per-user counter, keyed by the ERC-2771 `_msgSender()`.
    pub async fn context_counter(&self, user: Address) -> Result<U256, ChainClientError> {
        self.contract
            .contextCounter(user)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))
    }
}

/// Calldata for `increment()`.
pub fn increment_calldata() -> Bytes {
    ICounterERC2771::incrementCall {}.abi_encode().into()
}

/// Gelato 1Balance ERC-2771 forwarder wrapper.
pub struct ForwarderContract<P> {
    contract: IGelatoRelay1BalanceERC2771::IGelatoRelay1BalanceERC2771Instance<P>,
}

impl<P: Provider + Clone> ForwarderContract<P> {
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: IGelatoRelay1BalanceERC2771::new(address, provider.clone()),
        }
    }

    /// Replay-protection nonce the forwarder expects next for `user`.
    pub async fn user_nonce(&self, user: Address) -> Result<U256, ChainClientError> {
        self.contract
            .userNonce(user)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))
    }
}
