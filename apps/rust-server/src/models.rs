// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`/`Deserialize` and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation. Field names are
//! camelCase to match what the browser page already speaks.
//!
//! ## Model Categories
//!
//! - **Wallet**: the logged-in wallet (`WalletDetails`)
//! - **Passkey**: registration options and sub-organization creation
//! - **Signing**: prepared intents and their passkey-stamped redemption
//! - **Relay**: sponsored calls, counter reads and task tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::{Erc2771Call, Network},
    providers::{
        gelato::{TaskState, TaskStatus},
        turnkey::{Attestation, WebAuthnStamp},
    },
};

// =============================================================================
// Wallet
// =============================================================================

/// The wallet a user is logged in with. Its presence is the logged-in state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletDetails {
    /// Turnkey wallet id.
    pub id: String,
    /// Ethereum address of the wallet's first account.
    pub address: String,
    /// Turnkey sub-organization that owns the wallet.
    pub sub_org_id: String,
}

/// The wallet as the browser echoes it back on signing requests. Fields may
/// be null when the page holds a half-cleared session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionWallet {
    pub id: Option<String>,
    pub address: Option<String>,
    pub sub_org_id: Option<String>,
}

impl From<WalletDetails> for SessionWallet {
    fn from(wallet: WalletDetails) -> Self {
        Self {
            id: Some(wallet.id),
            address: Some(wallet.address),
            sub_org_id: Some(wallet.sub_org_id),
        }
    }
}

// =============================================================================
// Passkey Registration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RelyingParty {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyUser {
    pub name: String,
    pub display_name: String,
}

/// Parameters for `navigator.credentials.create`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub rp: RelyingParty,
    pub user: PasskeyUser,
    /// base64url challenge; must be echoed back when creating the sub-org.
    pub challenge: String,
    pub sub_org_name: String,
    pub expires_at: DateTime<Utc>,
}

/// Request to create a sub-organization and wallet for a new passkey.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubOrgRequest {
    pub sub_org_name: String,
    pub challenge: String,
    pub attestation: Attestation,
}

// =============================================================================
// Session
// =============================================================================

/// The body a passkey must stamp to log in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub organization_id: String,
    /// Exact request body to stamp.
    pub payload: String,
    /// Hex SHA-256 of `payload`; the WebAuthn challenge is its UTF-8 bytes.
    pub challenge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub stamp: WebAuthnStamp,
}

// =============================================================================
// Signing
// =============================================================================

/// Request to prepare an EIP-191 message signature.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageRequest {
    pub wallet: Option<SessionWallet>,
    pub message: String,
}

/// A Turnkey activity body awaiting the user's passkey stamp.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSigning {
    pub intent_id: String,
    /// Exact request body to stamp.
    pub payload: String,
    /// Hex SHA-256 of `payload`; the WebAuthn challenge is its UTF-8 bytes.
    pub challenge: String,
    pub expires_at: DateTime<Utc>,
}

/// Redeem a prepared intent with the passkey stamp over its payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSigningRequest {
    pub intent_id: String,
    pub stamp: WebAuthnStamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub message: String,
    /// 0x-prefixed 65-byte signature.
    pub signature: String,
    /// Where the signature can be checked by hand.
    pub verify_url: String,
}

// =============================================================================
// Counter & Relay
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CounterValue {
    pub network: Network,
    pub chain_id: u64,
    pub contract: String,
    pub address: String,
    /// Decimal string; the contract stores a `uint256`.
    pub counter: String,
}

/// Request to prepare a sponsored `increment()` call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredCallRequest {
    pub wallet: Option<SessionWallet>,
    pub network: Network,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSponsoredCall {
    #[serde(flatten)]
    pub signing: PreparedSigning,
    pub network: Network,
    pub request: Erc2771Call,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredCallResponse {
    pub task_id: String,
    pub status_url: String,
    pub network: Network,
    /// Counter read right after submission, if the read succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter: Option<String>,
}

/// A relay task tracked by the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelayTaskRecord {
    pub task_id: String,
    pub network: Option<Network>,
    pub chain_id: u64,
    pub user: Option<String>,
    pub task_state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_message: Option<String>,
    pub status_url: String,
    pub updated_at: DateTime<Utc>,
}

impl RelayTaskRecord {
    /// Record built from a live status for a task this process did not submit.
    pub fn from_status(status: &TaskStatus) -> Self {
        let network = Network::ALL
            .into_iter()
            .find(|n| n.config().chain_id == status.chain_id);
        let mut record = Self {
            task_id: status.task_id.clone(),
            network,
            chain_id: status.chain_id,
            user: None,
            task_state: status.task_state,
            transaction_hash: None,
            block_number: None,
            last_check_message: None,
            status_url: crate::providers::gelato::GelatoRelayClient::status_url(&status.task_id),
            updated_at: Utc::now(),
        };
        record.apply(status);
        record
    }

    /// Fold a fresh status snapshot into the record.
    pub fn apply(&mut self, status: &TaskStatus) {
        self.task_state = status.task_state;
        if status.transaction_hash.is_some() {
            self.transaction_hash = status.transaction_hash.clone();
        }
        if status.block_number.is_some() {
            self.block_number = status.block_number;
        }
        self.last_check_message = status.last_check_message.clone();
        self.updated_at = Utc::now();
    }
}
