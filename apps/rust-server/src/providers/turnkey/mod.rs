// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Turnkey integration: sub-organization provisioning and passkey-authorized
//! signing.

use std::time::Duration;

use alloy::primitives::B256;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

pub mod stamp;
pub mod types;

pub use stamp::{webauthn_challenge, ApiKeyStamper, Stamp, StampError, WebAuthnStamp};
pub use types::*;

use crate::config::TurnkeyCredentials;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 10;
const PASSKEY_AUTHENTICATOR_NAME: &str = "Passkey";
const DEFAULT_WALLET_NAME: &str = "Default ETH Wallet";

#[derive(Debug, thiserror::Error)]
pub enum TurnkeyError {
    #[error("Turnkey stamp failed: {0}")]
    Stamp(#[from] StampError),

    #[error("Turnkey rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("Turnkey request failed: {0}")]
    Request(String),

    #[error("Turnkey response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Turnkey activity {activity_id} ended as {status}")]
    ActivityFailed { activity_id: String, status: String },

    #[error("Turnkey activity {0} did not complete in time")]
    ActivityTimeout(String),
}

/// Sub-organization and wallet created for a new passkey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedWallet {
    pub sub_organization_id: String,
    pub wallet_id: String,
    pub address: String,
}

#[derive(Debug)]
pub struct TurnkeyClient {
    api_base_url: String,
    organization_id: String,
    stamper: ApiKeyStamper,
    http: Client,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl TurnkeyClient {
    pub fn new(api_base_url: &str, credentials: &TurnkeyCredentials) -> Result<Self, TurnkeyError> {
        let stamper = ApiKeyStamper::new(&credentials.api_public_key, &credentials.api_private_key)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TurnkeyError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            organization_id: credentials.organization_id.clone(),
            stamper,
            http,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        })
    }

    /// Override activity polling (tests use a short interval).
    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self
    }

    /// Parent organization id.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Create a sub-organization whose only root user is the new passkey,
    /// with one Ethereum wallet account.
    pub async fn create_sub_organization(
        &self,
        sub_organization_name: &str,
        challenge: &str,
        attestation: Attestation,
    ) -> Result<ProvisionedWallet, TurnkeyError> {
        let request = ActivityRequest {
            activity_type: ACTIVITY_TYPE_CREATE_SUB_ORGANIZATION,
            timestamp_ms: timestamp_ms(),
            organization_id: self.organization_id.clone(),
            parameters: CreateSubOrganizationParams {
                sub_organization_name: sub_organization_name.to_string(),
                root_users: vec![RootUserParams {
                    user_name: sub_organization_name.to_string(),
                    api_keys: Vec::new(),
                    authenticators: vec![AuthenticatorParams {
                        authenticator_name: PASSKEY_AUTHENTICATOR_NAME.to_string(),
                        challenge: challenge.to_string(),
                        attestation,
                    }],
                    oauth_providers: Vec::new(),
                }],
                root_quorum_threshold: 1,
                wallet: WalletParams {
                    wallet_name: DEFAULT_WALLET_NAME.to_string(),
                    accounts: vec![WalletAccountParams::default_ethereum()],
                },
            },
        };
        let body = to_body(&request)?;
        let stamp = self.stamper.stamp(&body);

        let response: ActivityResponse = self
            .post_json("/public/v1/submit/create_sub_organization", body, &stamp)
            .await?;
        let activity = self
            .await_activity(&self.organization_id, response.activity)
            .await?;

        let result = activity
            .result
            .and_then(|r| r.create_sub_organization_result_v7)
            .ok_or_else(|| {
                TurnkeyError::InvalidResponse("missing createSubOrganizationResultV7".to_string())
            })?;
        let wallet = result.wallet.ok_or_else(|| {
            TurnkeyError::InvalidResponse("sub-organization was created without a wallet".to_string())
        })?;
        let address = wallet.addresses.into_iter().next().ok_or_else(|| {
            TurnkeyError::InvalidResponse("wallet has no addresses".to_string())
        })?;

        info!(
            sub_organization_id = %result.sub_organization_id,
            wallet_id = %wallet.wallet_id,
            address = %address,
            "Turnkey sub-organization created"
        );

        Ok(ProvisionedWallet {
            sub_organization_id: result.sub_organization_id,
            wallet_id: wallet.wallet_id,
            address,
        })
    }

    /// Body a passkey stamps to identify its user via `whoami`.
    pub fn whoami_body(&self) -> Result<String, TurnkeyError> {
        to_body(&OrganizationQuery {
            organization_id: &self.organization_id,
        })
    }

    /// Resolve the passkey's user and sub-organization.
    pub async fn whoami(&self, stamp: &Stamp) -> Result<WhoamiResponse, TurnkeyError> {
        self.post_json("/public/v1/query/whoami", self.whoami_body()?, stamp)
            .await
    }

    /// Wallets of an organization (parent read access covers sub-orgs).
    pub async fn list_wallets(
        &self,
        organization_id: &str,
    ) -> Result<Vec<WalletSummary>, TurnkeyError> {
        let body = to_body(&OrganizationQuery { organization_id })?;
        let stamp = self.stamper.stamp(&body);
        let response: ListWalletsResponse = self
            .post_json("/public/v1/query/list_wallets", body, &stamp)
            .await?;
        Ok(response.wallets)
    }

    pub async fn list_wallet_accounts(
        &self,
        organization_id: &str,
        wallet_id: &str,
    ) -> Result<Vec<WalletAccount>, TurnkeyError> {
        let body = to_body(&WalletAccountsQuery {
            organization_id,
            wallet_id,
        })?;
        let stamp = self.stamper.stamp(&body);
        let response: ListWalletAccountsResponse = self
            .post_json("/public/v1/query/list_wallet_accounts", body, &stamp)
            .await?;
        Ok(response.accounts)
    }

    /// Activity body asking `sign_with` in `organization_id` to sign `digest`
    /// as-is.
    pub fn sign_raw_payload_body(
        &self,
        organization_id: &str,
        sign_with: &str,
        digest: B256,
    ) -> Result<String, TurnkeyError> {
        to_body(&ActivityRequest {
            activity_type: ACTIVITY_TYPE_SIGN_RAW_PAYLOAD,
            timestamp_ms: timestamp_ms(),
            organization_id: organization_id.to_string(),
            parameters: SignRawPayloadParams {
                sign_with: sign_with.to_string(),
                payload: alloy::hex::encode(digest),
                encoding: PAYLOAD_ENCODING_HEXADECIMAL,
                hash_function: HASH_FUNCTION_NO_OP,
            },
        })
    }

    /// Submit a prepared sign-raw-payload body with the user's stamp.
    pub async fn sign_raw_payload(
        &self,
        organization_id: &str,
        body: String,
        stamp: &Stamp,
    ) -> Result<SignRawPayloadResult, TurnkeyError> {
        let response: ActivityResponse = self
            .post_json("/public/v1/submit/sign_raw_payload", body, stamp)
            .await?;
        let activity = self.await_activity(organization_id, response.activity).await?;

        activity
            .result
            .and_then(|r| r.sign_raw_payload_result)
            .ok_or_else(|| TurnkeyError::InvalidResponse("missing signRawPayloadResult".to_string()))
    }

    /// Poll `get_activity` until the activity leaves the pending states.
    async fn await_activity(
        &self,
        organization_id: &str,
        mut activity: Activity,
    ) -> Result<Activity, TurnkeyError> {
        let mut attempts = 0;
        loop {
            match map_activity_status(&activity.status) {
                ActivityStatus::Completed => return Ok(activity),
                status if status.is_terminal() => {
                    warn!(
                        activity_id = %activity.id,
                        status = %activity.status,
                        failure = ?activity.failure,
                        "Turnkey activity did not complete"
                    );
                    return Err(TurnkeyError::ActivityFailed {
                        activity_id: activity.id,
                        status: activity.status,
                    });
                }
                _ => {}
            }

            if attempts >= self.max_poll_attempts {
                return Err(TurnkeyError::ActivityTimeout(activity.id));
            }
            attempts += 1;
            tokio::time::sleep(self.poll_interval).await;

            let body = to_body(&GetActivityRequest {
                organization_id,
                activity_id: &activity.id,
            })?;
            let stamp = self.stamper.stamp(&body);
            let response: ActivityResponse = self
                .post_json("/public/v1/query/get_activity", body, &stamp)
                .await?;
            activity = response.activity;
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: String,
        stamp: &Stamp,
    ) -> Result<T, TurnkeyError> {
        let response = self
            .http
            .post(format!("{}{}", self.api_base_url, path))
            .header(stamp.header_name, &stamp.header_value)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TurnkeyError::Request(format!("POST {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(TurnkeyError::Unauthorized(format!(
                    "POST {path} returned {status}: {body}"
                )));
            }
            return Err(TurnkeyError::Request(format!(
                "POST {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TurnkeyError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}

fn timestamp_ms() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

fn to_body<T: Serialize>(value: &T) -> Result<String, TurnkeyError> {
    serde_json::to_string(value)
        .map_err(|e| TurnkeyError::InvalidResponse(format!("serialize body failed: {e}")))
}
