// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Turnkey request and response shapes.
//!
//! Only the fields the service reads are modelled; Turnkey responses carry
//! much more and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const ACTIVITY_TYPE_CREATE_SUB_ORGANIZATION: &str = "ACTIVITY_TYPE_CREATE_SUB_ORGANIZATION_V7";
pub const ACTIVITY_TYPE_SIGN_RAW_PAYLOAD: &str = "ACTIVITY_TYPE_SIGN_RAW_PAYLOAD_V2";

pub const PAYLOAD_ENCODING_HEXADECIMAL: &str = "PAYLOAD_ENCODING_HEXADECIMAL";
pub const HASH_FUNCTION_NO_OP: &str = "HASH_FUNCTION_NO_OP";

pub const CURVE_SECP256K1: &str = "CURVE_SECP256K1";
pub const PATH_FORMAT_BIP32: &str = "PATH_FORMAT_BIP32";
pub const ADDRESS_FORMAT_ETHEREUM: &str = "ADDRESS_FORMAT_ETHEREUM";
pub const DEFAULT_ETHEREUM_PATH: &str = "m/44'/60'/0'/0/0";

// =============================================================================
// Activity Envelope
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest<P> {
    #[serde(rename = "type")]
    pub activity_type: &'static str,
    pub timestamp_ms: String,
    pub organization_id: String,
    pub parameters: P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Created,
    Pending,
    Completed,
    Failed,
    ConsensusNeeded,
    Rejected,
}

impl ActivityStatus {
    /// Whether polling can stop.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ActivityStatus::Created | ActivityStatus::Pending)
    }
}

pub fn map_activity_status(raw_status: &str) -> ActivityStatus {
    match raw_status.trim().to_ascii_uppercase().as_str() {
        "ACTIVITY_STATUS_COMPLETED" => ActivityStatus::Completed,
        "ACTIVITY_STATUS_FAILED" => ActivityStatus::Failed,
        "ACTIVITY_STATUS_CONSENSUS_NEEDED" => ActivityStatus::ConsensusNeeded,
        "ACTIVITY_STATUS_REJECTED" => ActivityStatus::Rejected,
        "ACTIVITY_STATUS_CREATED" => ActivityStatus::Created,
        _ => ActivityStatus::Pending,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityResponse {
    pub activity: Activity,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub result: Option<ActivityResult>,
    #[serde(default)]
    pub failure: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResult {
    #[serde(default)]
    pub create_sub_organization_result_v7: Option<CreateSubOrganizationResult>,
    #[serde(default)]
    pub sign_raw_payload_result: Option<SignRawPayloadResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetActivityRequest<'a> {
    pub organization_id: &'a str,
    pub activity_id: &'a str,
}

// =============================================================================
// Create Sub-Organization
// =============================================================================

/// Passkey attestation produced by `navigator.credentials.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub credential_id: String,
    pub client_data_json: String,
    pub attestation_object: String,
    #[serde(default)]
    pub transports: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubOrganizationParams {
    pub sub_organization_name: String,
    pub root_users: Vec<RootUserParams>,
    pub root_quorum_threshold: u32,
    pub wallet: WalletParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootUserParams {
    pub user_name: String,
    pub api_keys: Vec<serde_json::Value>,
    pub authenticators: Vec<AuthenticatorParams>,
    pub oauth_providers: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorParams {
    pub authenticator_name: String,
    pub challenge: String,
    pub attestation: Attestation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletParams {
    pub wallet_name: String,
    pub accounts: Vec<WalletAccountParams>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccountParams {
    pub curve: &'static str,
    pub path_format: &'static str,
    pub path: &'static str,
    pub address_format: &'static str,
}

impl WalletAccountParams {
    /// First BIP-44 Ethereum account.
    pub fn default_ethereum() -> Self {
        Self {
            curve: CURVE_SECP256K1,
            path_format: PATH_FORMAT_BIP32,
            path: DEFAULT_ETHEREUM_PATH,
            address_format: ADDRESS_FORMAT_ETHEREUM,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubOrganizationResult {
    pub sub_organization_id: String,
    #[serde(default)]
    pub wallet: Option<CreatedWallet>,
    #[serde(default)]
    pub root_user_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWallet {
    pub wallet_id: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}

// =============================================================================
// Sign Raw Payload
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRawPayloadParams {
    pub sign_with: String,
    pub payload: String,
    pub encoding: &'static str,
    pub hash_function: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignRawPayloadResult {
    pub r: String,
    pub s: String,
    pub v: String,
}

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationQuery<'a> {
    pub organization_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccountsQuery<'a> {
    pub organization_id: &'a str,
    pub wallet_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoamiResponse {
    pub organization_id: String,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListWalletsResponse {
    #[serde(default)]
    pub wallets: Vec<WalletSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub wallet_id: String,
    #[serde(default)]
    pub wallet_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListWalletAccountsResponse {
    #[serde(default)]
    pub accounts: Vec<WalletAccount>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub address: String,
    #[serde(default)]
    pub path: Option<String>,
}
