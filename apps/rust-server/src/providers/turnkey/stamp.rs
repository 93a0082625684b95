// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Turnkey request stamps.
//!
//! Every Turnkey request is authenticated by a stamp header computed over the
//! exact request body. The service stamps its own requests with a P-256 API
//! key (`X-Stamp`). User-authorized requests carry a passkey assertion
//! (`X-Stamp-WebAuthn`) produced in the browser over a body the service
//! prepared.

use base64ct::{Base64UrlUnpadded, Encoding};
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

pub const API_KEY_STAMP_HEADER: &str = "X-Stamp";
pub const WEBAUTHN_STAMP_HEADER: &str = "X-Stamp-WebAuthn";
const API_KEY_SIGNATURE_SCHEME: &str = "SIGNATURE_SCHEME_TK_API_P256";

#[derive(Debug, thiserror::Error)]
pub enum StampError {
    #[error("Invalid API private key: {0}")]
    InvalidPrivateKey(String),

    #[error("API public key does not match the private key (expected {expected})")]
    PublicKeyMismatch { expected: String },

    #[error("Invalid WebAuthn stamp: {0}")]
    InvalidWebAuthnStamp(String),

    #[error("WebAuthn stamp does not cover this request body")]
    ChallengeMismatch,
}

/// A header ready to attach to a Turnkey request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub header_name: &'static str,
    pub header_value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyStampBody<'a> {
    public_key: &'a str,
    scheme: &'static str,
    signature: String,
}

/// Signs request bodies with the parent organization's API key.
pub struct ApiKeyStamper {
    signing_key: SigningKey,
    public_key_hex: String,
}

impl std::fmt::Debug for ApiKeyStamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyStamper")
            .field("public_key_hex", &self.public_key_hex)
            .finish_non_exhaustive()
    }
}

impl ApiKeyStamper {
    /// Load the key pair, checking the configured public key against the one
    /// derived from the private key.
    pub fn new(public_key_hex: &str, private_key_hex: &str) -> Result<Self, StampError> {
        let key_bytes = alloy::hex::decode(private_key_hex.trim())
            .map_err(|e| StampError::InvalidPrivateKey(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&key_bytes)
            .map_err(|e| StampError::InvalidPrivateKey(e.to_string()))?;

        let derived = alloy::hex::encode(
            signing_key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes(),
        );
        if !derived.eq_ignore_ascii_case(public_key_hex.trim()) {
            return Err(StampError::PublicKeyMismatch { expected: derived });
        }

        Ok(Self {
            signing_key,
            public_key_hex: derived,
        })
    }

    pub fn public_key_hex(&self) -> &str {
        &self.public_key_hex
    }

    /// `X-Stamp` header for `body`.
    pub fn stamp(&self, body: &str) -> Stamp {
        let signature: Signature = self.signing_key.sign(body.as_bytes());
        let stamp = ApiKeyStampBody {
            public_key: &self.public_key_hex,
            scheme: API_KEY_SIGNATURE_SCHEME,
            signature: alloy::hex::encode(signature.to_der().as_bytes()),
        };
        // Serializing a struct of strings cannot fail.
        let json = serde_json::to_string(&stamp).unwrap_or_default();
        Stamp {
            header_name: API_KEY_STAMP_HEADER,
            header_value: Base64UrlUnpadded::encode_string(json.as_bytes()),
        }
    }
}

/// Passkey assertion over a request body, as produced by the browser.
///
/// All fields are base64url encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthnStamp {
    pub credential_id: String,
    pub authenticator_data: String,
    pub client_data_json: String,
    pub signature: String,
}

impl WebAuthnStamp {
    /// Check the assertion was made over `body` and produce the header.
    pub fn for_body(&self, body: &str) -> Result<Stamp, StampError> {
        for (name, value) in [
            ("credentialId", &self.credential_id),
            ("authenticatorData", &self.authenticator_data),
            ("clientDataJson", &self.client_data_json),
            ("signature", &self.signature),
        ] {
            if value.trim().is_empty() {
                return Err(StampError::InvalidWebAuthnStamp(format!("{name} is empty")));
            }
        }

        let client_data = decode_base64url(&self.client_data_json)?;
        let client_data: serde_json::Value = serde_json::from_slice(&client_data)
            .map_err(|e| StampError::InvalidWebAuthnStamp(format!("clientDataJson: {e}")))?;
        let challenge = client_data
            .get("challenge")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                StampError::InvalidWebAuthnStamp("clientDataJson has no challenge".to_string())
            })?;
        if decode_base64url(challenge)? != webauthn_challenge(body).as_bytes() {
            return Err(StampError::ChallengeMismatch);
        }

        let header_value = serde_json::to_string(self)
            .map_err(|e| StampError::InvalidWebAuthnStamp(e.to_string()))?;
        Ok(Stamp {
            header_name: WEBAUTHN_STAMP_HEADER,
            header_value,
        })
    }
}

/// Challenge a passkey must sign to stamp `body`: the hex SHA-256 of the
/// body. The WebAuthn challenge bytes are the UTF-8 bytes of this string.
pub fn webauthn_challenge(body: &str) -> String {
    alloy::hex::encode(Sha256::digest(body.as_bytes()))
}

fn decode_base64url(raw: &str) -> Result<Vec<u8>, StampError> {
    Base64UrlUnpadded::decode_vec(raw.trim().trim_end_matches('='))
        .map_err(|e| StampError::InvalidWebAuthnStamp(format!("bad base64url: {e}")))
}
