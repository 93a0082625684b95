// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passkey registration options.
//!
//! The browser runs the WebAuthn ceremony itself; the service only picks the
//! relying party, names the sub-organization and issues the challenge that
//! `POST /v1/sub-orgs` later redeems.

use std::fmt::Display;

use axum::{extract::State, Json};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Local, TimeZone, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

use crate::{
    error::ApiError,
    models::{PasskeyUser, RegistrationOptions, RelyingParty},
    state::AppState,
};

const SUB_ORG_NAME_PREFIX: &str = "Turnkey Viem+Passkey Demo";
const CHALLENGE_BYTES: usize = 32;

/// Local date-time like `10-19-2026, 3.04.05 PM`, safe for Turnkey names.
pub fn human_readable_date_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%-m-%-d-%Y, %-I.%M.%S %p").to_string()
}

pub fn sub_org_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("{SUB_ORG_NAME_PREFIX} - {}", human_readable_date_time(at))
}

fn random_challenge() -> Result<String, ApiError> {
    let mut bytes = [0u8; CHALLENGE_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| ApiError::internal("Failed to generate passkey challenge"))?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// WebAuthn creation options for a new passkey.
#[utoipa::path(
    get,
    path = "/v1/passkey/registration-options",
    tag = "Passkey",
    responses(
        (status = 200, description = "Options for navigator.credentials.create", body = RegistrationOptions)
    )
)]
pub async fn registration_options(
    State(state): State<AppState>,
) -> Result<Json<RegistrationOptions>, ApiError> {
    let name = sub_org_name(&Local::now());
    let challenge = random_challenge()?;
    let ttl = state.challenges.ttl();
    state.challenges.insert(challenge.clone(), ());

    debug!(sub_org_name = %name, "Issued passkey registration challenge");

    Ok(Json(RegistrationOptions {
        rp: RelyingParty {
            id: state.config.rp_id.clone(),
            name: state.config.rp_name.clone(),
        },
        user: PasskeyUser {
            name: name.clone(),
            display_name: name.clone(),
        },
        challenge,
        sub_org_name: name,
        expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
    }))
}
