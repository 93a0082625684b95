// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passkey-authorized signing.
//!
//! Signing is split in two requests. `prepare` builds the exact Turnkey
//! sign-raw-payload body and parks it as a single-use intent; the browser
//! stamps that body with its passkey; `submit` forwards the stored body with
//! the stamp. The service never holds a key that can sign for the user.

use alloy::primitives::{Address, Signature, B256};
use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::map_turnkey_error;
use crate::{
    blockchain::{
        parse_address, personal_message_digest, signature_from_parts, signature_hex,
        verify_signer,
    },
    error::{ApiError, ApiJson},
    models::{
        PreparedSigning, SessionWallet, SignMessageRequest, SignedMessage, SubmitSigningRequest,
        WalletDetails,
    },
    providers::turnkey::{webauthn_challenge, TurnkeyError, WebAuthnStamp},
    state::{AppState, IntentPurpose, SigningIntent},
};

pub const VERIFY_SIGNATURE_URL: &str = "https://etherscan.io/verifiedSignatures";

// =============================================================================
// Intent Helpers
// =============================================================================

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

/// The logged-in wallet and its parsed address.
pub(crate) fn require_wallet(
    wallet: Option<SessionWallet>,
) -> Result<(WalletDetails, Address), ApiError> {
    let SessionWallet {
        id,
        address,
        sub_org_id,
    } = wallet.unwrap_or_default();
    let (Some(address), Some(sub_org_id)) = (present(address), present(sub_org_id)) else {
        return Err(ApiError::bad_request("wallet not found"));
    };
    let signer = parse_address(&address)
        .map_err(|e| ApiError::bad_request(format!("Invalid wallet address: {e}")))?;
    let wallet = WalletDetails {
        id: id.unwrap_or_default(),
        address,
        sub_org_id,
    };
    Ok((wallet, signer))
}

/// Park a sign-raw-payload body for `digest` until the passkey stamps it.
pub(crate) fn prepare_intent(
    state: &AppState,
    wallet: WalletDetails,
    signer: Address,
    digest: B256,
    purpose: IntentPurpose,
) -> Result<PreparedSigning, ApiError> {
    let turnkey = state.turnkey()?;
    let body = turnkey
        .sign_raw_payload_body(&wallet.sub_org_id, &wallet.address, digest)
        .map_err(map_turnkey_error)?;

    let intent_id = Uuid::new_v4().to_string();
    let challenge = webauthn_challenge(&body);
    let expires_at = Utc::now() + chrono::Duration::seconds(state.intents.ttl().as_secs() as i64);

    state.intents.insert(
        intent_id.clone(),
        SigningIntent {
            wallet,
            signer,
            digest,
            body: body.clone(),
            purpose,
        },
    );

    Ok(PreparedSigning {
        intent_id,
        payload: body,
        challenge,
        expires_at,
    })
}

/// Redeem an intent. Each intent can be taken once.
pub(crate) fn take_intent(state: &AppState, intent_id: &str) -> Result<SigningIntent, ApiError> {
    state
        .intents
        .take(intent_id)
        .ok_or_else(|| ApiError::not_found("Signing intent not found or expired"))
}

/// Submit the intent's body with the user's stamp and check the signature
/// recovers to the intent's wallet.
pub(crate) async fn sign_intent(
    state: &AppState,
    intent: &SigningIntent,
    stamp: &WebAuthnStamp,
) -> Result<Signature, ApiError> {
    let turnkey = state.turnkey()?;
    let stamp = stamp
        .for_body(&intent.body)
        .map_err(|e| map_turnkey_error(TurnkeyError::Stamp(e)))?;

    let result = turnkey
        .sign_raw_payload(&intent.wallet.sub_org_id, intent.body.clone(), &stamp)
        .await
        .map_err(map_turnkey_error)?;

    let signature = signature_from_parts(&result.r, &result.s, &result.v)
        .map_err(|e| ApiError::bad_gateway(format!("Turnkey returned a bad signature: {e}")))?;
    verify_signer(&signature, &intent.digest, intent.signer).map_err(|e| {
        warn!(
            wallet = %intent.wallet.address,
            sub_org_id = %intent.wallet.sub_org_id,
            error = %e,
            "Turnkey signature does not match wallet"
        );
        ApiError::bad_gateway(e.to_string())
    })?;

    Ok(signature)
}

// =============================================================================
// Handlers
// =============================================================================

/// Prepare an EIP-191 signature of `message` by the wallet.
#[utoipa::path(
    post,
    path = "/v1/sign-message/prepare",
    tag = "Signing",
    request_body = SignMessageRequest,
    responses(
        (status = 200, description = "Payload for the passkey to stamp", body = PreparedSigning),
        (status = 400, description = "Missing wallet or empty message"),
        (status = 503, description = "Turnkey is not configured")
    )
)]
pub async fn prepare_sign_message(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignMessageRequest>,
) -> Result<Json<PreparedSigning>, ApiError> {
    let (wallet, signer) = require_wallet(request.wallet)?;
    if request.message.is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }

    let digest = personal_message_digest(&request.message);
    let prepared = prepare_intent(
        &state,
        wallet,
        signer,
        digest,
        IntentPurpose::Message(request.message),
    )?;
    Ok(Json(prepared))
}

/// Sign a prepared message with the user's passkey stamp.
#[utoipa::path(
    post,
    path = "/v1/sign-message",
    tag = "Signing",
    request_body = SubmitSigningRequest,
    responses(
        (status = 200, description = "Message signed by the wallet", body = SignedMessage),
        (status = 400, description = "Stamp does not cover the prepared payload"),
        (status = 404, description = "Unknown or expired intent"),
        (status = 502, description = "Turnkey failed or signed with another key")
    )
)]
pub async fn sign_message(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitSigningRequest>,
) -> Result<Json<SignedMessage>, ApiError> {
    let intent = take_intent(&state, &request.intent_id)?;
    let IntentPurpose::Message(message) = &intent.purpose else {
        return Err(ApiError::bad_request(
            "Intent was not prepared for a message signature",
        ));
    };

    let signature = sign_intent(&state, &intent, &request.stamp).await?;

    info!(
        wallet = %intent.wallet.address,
        sub_org_id = %intent.wallet.sub_org_id,
        "Message signed"
    );

    Ok(Json(SignedMessage {
        message: message.clone(),
        signature: signature_hex(&signature),
        verify_url: VERIFY_SIGNATURE_URL.to_string(),
    }))
}
