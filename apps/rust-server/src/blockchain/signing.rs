// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Digest computation and signature assembly for Turnkey-signed payloads.
//!
//! Turnkey signs raw 32-byte digests (`HASH_FUNCTION_NO_OP`) and answers with
//! hex `r`, `s` and a recovery id `v`. This module builds the digests the
//! service asks Turnkey to sign and turns the answer back into a standard
//! 65-byte Ethereum signature.

use alloy::primitives::{eip191_hash_message, Address, Signature, B256, U256};

/// Errors assembling or checking a signature.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid signature component `{0}`: {1}")]
    InvalidComponent(&'static str, String),

    #[error("Signature recovery failed: {0}")]
    Recovery(String),

    #[error("Signature was produced by {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },
}

/// EIP-191 `personal_sign` digest of a UTF-8 message.
pub fn personal_message_digest(message: &str) -> B256 {
    eip191_hash_message(message.as_bytes())
}

/// Build a signature from Turnkey's `r`, `s`, `v` hex strings.
///
/// `v` may be the raw recovery id (`00`/`01`) or the legacy `27`/`28` form
/// (`1b`/`1c`).
pub fn signature_from_parts(r: &str, s: &str, v: &str) -> Result<Signature, SignatureError> {
    let r = parse_scalar("r", r)?;
    let s = parse_scalar("s", s)?;
    let v = u8::from_str_radix(strip_hex_prefix(v), 16)
        .map_err(|e| SignatureError::InvalidComponent("v", e.to_string()))?;
    let y_parity = match v {
        0 | 27 => false,
        1 | 28 => true,
        other => {
            return Err(SignatureError::InvalidComponent(
                "v",
                format!("unexpected recovery id {other}"),
            ))
        }
    };
    Ok(Signature::new(r, s, y_parity))
}

/// 0x-prefixed `r ‖ s ‖ (27 + v)` encoding used by `personal_sign` and
/// Gelato's `userSignature`.
pub fn signature_hex(signature: &Signature) -> String {
    format!("0x{}", alloy::hex::encode(signature.as_bytes()))
}

/// Recover the signer of `digest` and require it to be `expected`.
pub fn verify_signer(
    signature: &Signature,
    digest: &B256,
    expected: Address,
) -> Result<(), SignatureError> {
    let recovered = signature
        .recover_address_from_prehash(digest)
        .map_err(|e| SignatureError::Recovery(e.to_string()))?;
    if recovered == expected {
        Ok(())
    } else {
        Err(SignatureError::SignerMismatch {
            expected,
            recovered,
        })
    }
}

fn parse_scalar(name: &'static str, raw: &str) -> Result<U256, SignatureError> {
    let digits = strip_hex_prefix(raw);
    if digits.is_empty() || digits.len() > 64 {
        return Err(SignatureError::InvalidComponent(
            name,
            format!("expected up to 64 hex characters, got {}", digits.len()),
        ));
    }
    U256::from_str_radix(digits, 16).map_err(|e| SignatureError::InvalidComponent(name, e.to_string()))
}

fn strip_hex_prefix(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix("0x").unwrap_or(raw)
}
