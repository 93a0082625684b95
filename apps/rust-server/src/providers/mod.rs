// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External service clients.
//!
//! - `turnkey` - wallet custody, passkey-authorized signing
//! - `gelato` - sponsored ERC-2771 relay

pub mod gelato;
pub mod turnkey;
