// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Test network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
    /// `CounterERC2771` deployment
    pub counter_address: &'static str,
    /// Gelato `GelatoRelay1BalanceERC2771` forwarder
    pub trusted_forwarder: &'static str,
}

/// Gelato 1Balance ERC-2771 forwarder, same address on every supported chain.
pub const TRUSTED_FORWARDER: &str = "0xd8253782c45a12053594b9deB72d8e8aB2Fca54c";

/// Base Sepolia configuration.
pub const BASE_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Base Sepolia",
    chain_id: 84532,
    rpc_url: "https://sepolia.base.org",
    explorer_url: "https://sepolia.basescan.org",
    counter_address: "0x79dBe2Ce05f44195B502c2f160f35fcab9190308",
    trusted_forwarder: TRUSTED_FORWARDER,
};

/// Arbitrum Sepolia configuration.
pub const ARBITRUM_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Arbitrum Sepolia",
    chain_id: 421614,
    rpc_url: "https://sepolia-rollup.arbitrum.io/rpc",
    explorer_url: "https://sepolia.arbiscan.io",
    counter_address: "0xfB1862BD2083DAe03Ae77E64b1B1f6168240D25D",
    trusted_forwarder: TRUSTED_FORWARDER,
};

/// Networks the counter demo runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Network {
    #[serde(rename = "baseSepolia", alias = "base-sepolia", alias = "base_sepolia")]
    BaseSepolia,
    #[serde(
        rename = "arbSepolia",
        alias = "arb-sepolia",
        alias = "arbitrum-sepolia",
        alias = "arbitrum_sepolia"
    )]
    ArbitrumSepolia,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::BaseSepolia, Network::ArbitrumSepolia];

    pub fn config(self) -> &'static NetworkConfig {
        match self {
            Network::BaseSepolia => &BASE_SEPOLIA,
            Network::ArbitrumSepolia => &ARBITRUM_SEPOLIA,
        }
    }

    /// Key used in URLs and JSON bodies.
    pub fn key(self) -> &'static str {
        match self {
            Network::BaseSepolia => "baseSepolia",
            Network::ArbitrumSepolia => "arbSepolia",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "baseSepolia" | "base-sepolia" | "base_sepolia" => Ok(Network::BaseSepolia),
            "arbSepolia" | "arb-sepolia" | "arbitrum-sepolia" | "arbitrum_sepolia" => {
                Ok(Network::ArbitrumSepolia)
            }
            other => Err(format!(
                "Unsupported network `{other}` (expected `baseSepolia` or `arbSepolia`)"
            )),
        }
    }
}
