// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup into an [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TURNKEY_API_BASE_URL` | Turnkey API endpoint | `https://api.turnkey.com` |
//! | `TURNKEY_ORGANIZATION_ID` | Parent organization that owns the sub-orgs | Required for Turnkey calls |
//! | `TURNKEY_API_PUBLIC_KEY` | Compressed P-256 public key (hex) of the API key | Required for Turnkey calls |
//! | `TURNKEY_API_PRIVATE_KEY` | P-256 private key (hex) of the API key | Required for Turnkey calls |
//! | `GELATO_API_BASE_URL` | Gelato relay endpoint | `https://api.gelato.digital` |
//! | `GELATO_API_KEY` | 1Balance sponsor API key | Required for sponsored calls |
//! | `PASSKEY_RP_ID` | WebAuthn relying party id | `localhost` |
//! | `PASSKEY_RP_NAME` | WebAuthn relying party name | `Turnkey Viem Passkey Demo` |
//! | `BASE_SEPOLIA_RPC_URL` | Base Sepolia JSON-RPC endpoint | `https://sepolia.base.org` |
//! | `ARBITRUM_SEPOLIA_RPC_URL` | Arbitrum Sepolia JSON-RPC endpoint | `https://sepolia-rollup.arbitrum.io/rpc` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Unset (plain HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use crate::blockchain::{Network, ARBITRUM_SEPOLIA, BASE_SEPOLIA};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TURNKEY_API_BASE_URL_ENV: &str = "TURNKEY_API_BASE_URL";
pub const TURNKEY_ORGANIZATION_ID_ENV: &str = "TURNKEY_ORGANIZATION_ID";
pub const TURNKEY_API_PUBLIC_KEY_ENV: &str = "TURNKEY_API_PUBLIC_KEY";
pub const TURNKEY_API_PRIVATE_KEY_ENV: &str = "TURNKEY_API_PRIVATE_KEY";
pub const GELATO_API_BASE_URL_ENV: &str = "GELATO_API_BASE_URL";
pub const GELATO_API_KEY_ENV: &str = "GELATO_API_KEY";
pub const PASSKEY_RP_ID_ENV: &str = "PASSKEY_RP_ID";
pub const PASSKEY_RP_NAME_ENV: &str = "PASSKEY_RP_NAME";
pub const BASE_SEPOLIA_RPC_URL_ENV: &str = "BASE_SEPOLIA_RPC_URL";
pub const ARBITRUM_SEPOLIA_RPC_URL_ENV: &str = "ARBITRUM_SEPOLIA_RPC_URL";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Logging format selector. `json` switches the subscriber to JSON lines.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TURNKEY_API_BASE_URL: &str = "https://api.turnkey.com";
pub const DEFAULT_GELATO_API_BASE_URL: &str = "https://api.gelato.digital";
pub const DEFAULT_PASSKEY_RP_ID: &str = "localhost";
pub const DEFAULT_PASSKEY_RP_NAME: &str = "Turnkey Viem Passkey Demo";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Turnkey API credentials for the parent organization.
#[derive(Debug, Clone)]
pub struct TurnkeyCredentials {
    pub organization_id: String,
    pub api_public_key: String,
    pub api_private_key: String,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub turnkey_api_base_url: String,
    /// `None` when any of the three Turnkey variables is missing.
    pub turnkey: Option<TurnkeyCredentials>,
    pub gelato_api_base_url: String,
    pub gelato_api_key: Option<String>,
    pub rp_id: String,
    pub rp_name: String,
    pub base_sepolia_rpc_url: String,
    pub arbitrum_sepolia_rpc_url: String,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let organization_id = env_optional(TURNKEY_ORGANIZATION_ID_ENV);
        let api_public_key = env_optional(TURNKEY_API_PUBLIC_KEY_ENV);
        let api_private_key = env_optional(TURNKEY_API_PRIVATE_KEY_ENV);
        let turnkey = match (organization_id, api_public_key, api_private_key) {
            (Some(organization_id), Some(api_public_key), Some(api_private_key)) => {
                Some(TurnkeyCredentials {
                    organization_id,
                    api_public_key,
                    api_private_key,
                })
            }
            _ => None,
        };

        Self {
            host: env_or_default(HOST_ENV, DEFAULT_HOST),
            port: env_optional(PORT_ENV)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            turnkey_api_base_url: env_or_default(
                TURNKEY_API_BASE_URL_ENV,
                DEFAULT_TURNKEY_API_BASE_URL,
            ),
            turnkey,
            gelato_api_base_url: env_or_default(
                GELATO_API_BASE_URL_ENV,
                DEFAULT_GELATO_API_BASE_URL,
            ),
            gelato_api_key: env_optional(GELATO_API_KEY_ENV),
            rp_id: env_or_default(PASSKEY_RP_ID_ENV, DEFAULT_PASSKEY_RP_ID),
            rp_name: env_or_default(PASSKEY_RP_NAME_ENV, DEFAULT_PASSKEY_RP_NAME),
            base_sepolia_rpc_url: env_or_default(BASE_SEPOLIA_RPC_URL_ENV, BASE_SEPOLIA.rpc_url),
            arbitrum_sepolia_rpc_url: env_or_default(
                ARBITRUM_SEPOLIA_RPC_URL_ENV,
                ARBITRUM_SEPOLIA.rpc_url,
            ),
            tls_cert_path: env_optional(TLS_CERT_PATH_ENV),
            tls_key_path: env_optional(TLS_KEY_PATH_ENV),
        }
    }

    /// RPC endpoint for a network, honoring overrides.
    pub fn rpc_url(&self, network: Network) -> &str {
        match network {
            Network::BaseSepolia => &self.base_sepolia_rpc_url,
            Network::ArbitrumSepolia => &self.arbitrum_sepolia_rpc_url,
        }
    }

    /// Whether JSON log output was requested.
    pub fn json_logs() -> bool {
        env_optional(LOG_FORMAT_ENV)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            turnkey_api_base_url: DEFAULT_TURNKEY_API_BASE_URL.to_string(),
            turnkey: None,
            gelato_api_base_url: DEFAULT_GELATO_API_BASE_URL.to_string(),
            gelato_api_key: None,
            rp_id: DEFAULT_PASSKEY_RP_ID.to_string(),
            rp_name: DEFAULT_PASSKEY_RP_NAME.to_string(),
            base_sepolia_rpc_url: BASE_SEPOLIA.rpc_url.to_string(),
            arbitrum_sepolia_rpc_url: ARBITRUM_SEPOLIA.rpc_url.to_string(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_public_endpoints() {
        let config = AppConfig::default();
        assert_eq!(config.turnkey_api_base_url, "https://api.turnkey.com");
        assert_eq!(config.gelato_api_base_url, "https://api.gelato.digital");
        assert_eq!(config.rp_id, "localhost");
        assert!(config.turnkey.is_none());
        assert!(config.gelato_api_key.is_none());
    }

    #[test]
    fn rpc_url_selects_per_network() {
        let config = AppConfig {
            base_sepolia_rpc_url: "http://base.local".to_string(),
            arbitrum_sepolia_rpc_url: "http://arb.local".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.rpc_url(Network::BaseSepolia), "http://base.local");
        assert_eq!(config.rpc_url(Network::ArbitrumSepolia), "http://arb.local");
    }
}
