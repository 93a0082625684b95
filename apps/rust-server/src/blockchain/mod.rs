// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the counter demo networks.
//!
//! This module provides functionality for:
//! - Reading the per-user `CounterERC2771` value
//! - Reading the Gelato forwarder nonce and building ERC-2771 typed data
//! - Turning Turnkey signature components into Ethereum signatures

pub mod client;
pub mod counter;
pub mod erc2771;
pub mod signing;
pub mod types;

pub use client::{parse_address, ChainClient, ChainClientError};
pub use counter::increment_calldata;
pub use erc2771::{Erc2771Call, DEFAULT_DEADLINE_GAP_SECS};
pub use signing::{
    personal_message_digest, signature_from_parts, signature_hex, verify_signer, SignatureError,
};
pub use types::*;
