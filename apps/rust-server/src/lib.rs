// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passkey Relay Server - Turnkey passkey wallets with Gelato sponsored calls
//!
//! Users hold an Ethereum wallet inside their own Turnkey sub-organization,
//! controlled by a passkey. The service provisions those sub-organizations,
//! prepares signing activities for the passkey to stamp, and relays
//! EIP-712-signed `increment()` calls to a counter contract through Gelato's
//! 1Balance ERC-2771 forwarder on Base Sepolia and Arbitrum Sepolia.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Networks, contract bindings, digests and signatures
//! - `providers` - Turnkey and Gelato HTTP clients
//! - `relay_poller` - Background relay task status sync

pub mod api;
pub mod blockchain;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod relay_poller;
pub mod state;
pub mod store;
