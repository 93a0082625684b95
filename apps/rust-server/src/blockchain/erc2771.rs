// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-2771 sponsored call typed data for Gelato's 1Balance forwarder.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    sol,
    sol_types::{Eip712Domain, SolStruct},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

sol! {
    struct SponsoredCallERC2771 {
        uint256 chainId;
        address target;
        bytes data;
        address user;
        uint256 userNonce;
        uint256 userDeadline;
    }
}

pub const EIP712_DOMAIN_NAME: &str = "GelatoRelay1BalanceERC2771";
pub const EIP712_DOMAIN_VERSION: &str = "1";

/// How long a signed sponsored call stays valid.
pub const DEFAULT_DEADLINE_GAP_SECS: u64 = 86_400;

/// A `CallWithERC2771Request` together with the forwarder-specific fields
/// the user signs over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Erc2771Call {
    pub chain_id: u64,
    #[schema(value_type = String, example = "0x79dBe2Ce05f44195B502c2f160f35fcab9190308")]
    pub target: Address,
    #[schema(value_type = String, example = "0xd09de08a")]
    pub data: Bytes,
    #[schema(value_type = String)]
    pub user: Address,
    pub user_nonce: u64,
    /// Unix seconds after which the forwarder rejects the call.
    pub user_deadline: u64,
}

impl Erc2771Call {
    /// EIP-712 domain of the forwarder on this call's chain.
    pub fn domain(&self, forwarder: Address) -> Eip712Domain {
        Eip712Domain::new(
            Some(EIP712_DOMAIN_NAME.into()),
            Some(EIP712_DOMAIN_VERSION.into()),
            Some(U256::from(self.chain_id)),
            Some(forwarder),
            None,
        )
    }

    /// Digest the user's account signs for the forwarder to accept the call.
    pub fn signing_digest(&self, forwarder: Address) -> B256 {
        let typed = SponsoredCallERC2771 {
            chainId: U256::from(self.chain_id),
            target: self.target,
            data: self.data.clone(),
            user: self.user,
            userNonce: U256::from(self.user_nonce),
            userDeadline: U256::from(self.user_deadline),
        };
        typed.eip712_signing_hash(&self.domain(forwarder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    fn word_u64(value: u64) -> [u8; 32] {
        U256::from(value).to_be_bytes::<32>()
    }

    fn word_address(address: Address) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(address.as_slice());
        word
    }

    fn sample_call() -> Erc2771Call {
        Erc2771Call {
            chain_id: 84532,
            target: "0x79dBe2Ce05f44195B502c2f160f35fcab9190308".parse().unwrap(),
            data: crate::blockchain::increment_calldata(),
            user: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            user_nonce: 3,
            user_deadline: 1_800_000_000,
        }
    }

    #[test]
    fn digest_matches_hand_rolled_eip712_encoding() {
        let call = sample_call();
        let forwarder: Address = crate::blockchain::TRUSTED_FORWARDER.parse().unwrap();

        let domain_type = keccak256(
            "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );
        let mut domain = Vec::new();
        domain.extend_from_slice(domain_type.as_slice());
        domain.extend_from_slice(keccak256(EIP712_DOMAIN_NAME).as_slice());
        domain.extend_from_slice(keccak256(EIP712_DOMAIN_VERSION).as_slice());
        domain.extend_from_slice(&word_u64(call.chain_id));
        domain.extend_from_slice(&word_address(forwarder));
        let domain_separator = keccak256(&domain);

        let struct_type = keccak256(
            "SponsoredCallERC2771(uint256 chainId,address target,bytes data,address user,uint256 userNonce,uint256 userDeadline)",
        );
        let mut fields = Vec::new();
        fields.extend_from_slice(struct_type.as_slice());
        fields.extend_from_slice(&word_u64(call.chain_id));
        fields.extend_from_slice(&word_address(call.target));
        fields.extend_from_slice(keccak256(&call.data).as_slice());
        fields.extend_from_slice(&word_address(call.user));
        fields.extend_from_slice(&word_u64(call.user_nonce));
        fields.extend_from_slice(&word_u64(call.user_deadline));
        let struct_hash = keccak256(&fields);

        let mut preimage = vec![0x19, 0x01];
        preimage.extend_from_slice(domain_separator.as_slice());
        preimage.extend_from_slice(struct_hash.as_slice());

        assert_eq!(call.signing_digest(forwarder), keccak256(&preimage));
    }

    #[test]
    fn digest_binds_chain_and_nonce() {
        let forwarder: Address = crate::blockchain::TRUSTED_FORWARDER.parse().unwrap();
        let base = sample_call();
        let other_chain = Erc2771Call {
            chain_id: 421614,
            ..base.clone()
        };
        let next_nonce = Erc2771Call {
            user_nonce: base.user_nonce + 1,
            ..base.clone()
        };
        assert_ne!(base.signing_digest(forwarder), other_chain.signing_digest(forwarder));
        assert_ne!(base.signing_digest(forwarder), next_nonce.signing_digest(forwarder));
    }

    #[test]
    fn serializes_with_relay_field_names() {
        let value = serde_json::to_value(sample_call()).unwrap();
        assert_eq!(value["chainId"], 84532);
        assert_eq!(value["userNonce"], 3);
        assert_eq!(value["userDeadline"], 1_800_000_000u64);
        assert_eq!(value["data"], "0xd09de08a");
    }
}
