// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passkey login.
//!
//! The passkey stamps a `whoami` query against the parent organization;
//! Turnkey resolves the authenticator to its sub-organization. The wallet is
//! then looked up with the service key, since parent organizations can read
//! their sub-organizations.

use axum::{extract::State, Json};
use tracing::info;

use super::map_turnkey_error;
use crate::{
    error::{ApiError, ApiJson},
    models::{LoginPayload, LoginRequest, WalletDetails},
    providers::turnkey::{webauthn_challenge, TurnkeyError},
    state::AppState,
};

fn wallet_not_found() -> ApiError {
    ApiError::not_found("wallet not found")
}

/// The body the passkey must stamp to log in.
#[utoipa::path(
    get,
    path = "/v1/session/login-payload",
    tag = "Session",
    responses(
        (status = 200, description = "Payload and WebAuthn challenge", body = LoginPayload),
        (status = 503, description = "Turnkey is not configured")
    )
)]
pub async fn login_payload(State(state): State<AppState>) -> Result<Json<LoginPayload>, ApiError> {
    let turnkey = state.turnkey()?;
    let payload = turnkey.whoami_body().map_err(map_turnkey_error)?;
    Ok(Json(LoginPayload {
        organization_id: turnkey.organization_id().to_string(),
        challenge: webauthn_challenge(&payload),
        payload,
    }))
}

/// Log in with an existing passkey and return its wallet.
#[utoipa::path(
    post,
    path = "/v1/session/login",
    tag = "Session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Wallet of the passkey's sub-organization", body = WalletDetails),
        (status = 400, description = "Stamp does not cover the login payload"),
        (status = 401, description = "Turnkey rejected the passkey"),
        (status = 404, description = "No wallet for this passkey"),
        (status = 503, description = "Turnkey is not configured")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<WalletDetails>, ApiError> {
    let turnkey = state.turnkey()?;
    let body = turnkey.whoami_body().map_err(map_turnkey_error)?;
    let stamp = request
        .stamp
        .for_body(&body)
        .map_err(|e| map_turnkey_error(TurnkeyError::Stamp(e)))?;

    let whoami = turnkey.whoami(&stamp).await.map_err(map_turnkey_error)?;
    let sub_org_id = whoami.organization_id;
    if sub_org_id.trim().is_empty() {
        return Err(wallet_not_found());
    }

    let wallet = turnkey
        .list_wallets(&sub_org_id)
        .await
        .map_err(map_turnkey_error)?
        .into_iter()
        .next()
        .ok_or_else(wallet_not_found)?;
    let account = turnkey
        .list_wallet_accounts(&sub_org_id, &wallet.wallet_id)
        .await
        .map_err(map_turnkey_error)?
        .into_iter()
        .next()
        .ok_or_else(wallet_not_found)?;

    info!(
        sub_org_id = %sub_org_id,
        wallet_id = %wallet.wallet_id,
        user_id = ?whoami.user_id,
        "Passkey login"
    );

    Ok(Json(WalletDetails {
        id: wallet.wallet_id,
        address: account.address,
        sub_org_id,
    }))
}
