// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::blockchain::{ChainClient, Erc2771Call, Network};
use crate::cache::PendingCache;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::WalletDetails;
use crate::providers::gelato::{GelatoError, GelatoRelayClient};
use crate::providers::turnkey::{TurnkeyClient, TurnkeyError};
use crate::store::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Turnkey(#[from] TurnkeyError),

    #[error(transparent)]
    Gelato(#[from] GelatoError),
}

/// What a prepared signing intent will be used for once signed.
#[derive(Debug, Clone)]
pub enum IntentPurpose {
    Message(String),
    SponsoredCall { network: Network, call: Erc2771Call },
}

/// A sign-raw-payload body built by the service, waiting for the user's
/// passkey stamp.
#[derive(Debug, Clone)]
pub struct SigningIntent {
    pub wallet: WalletDetails,
    pub signer: Address,
    pub digest: B256,
    /// Exact body the stamp must cover.
    pub body: String,
    pub purpose: IntentPurpose,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub turnkey: Option<Arc<TurnkeyClient>>,
    pub gelato: Arc<GelatoRelayClient>,
    /// Outstanding passkey registration challenges.
    pub challenges: Arc<PendingCache<()>>,
    pub intents: Arc<PendingCache<SigningIntent>>,
    pub store: Arc<RwLock<InMemoryStore>>,
}

impl AppState {
    /// Build the provider clients from configuration.
    ///
    /// Turnkey is optional: without credentials the service still serves
    /// counter reads and relay status, and readiness reports it missing.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let turnkey = match &config.turnkey {
            Some(credentials) => Some(TurnkeyClient::new(
                &config.turnkey_api_base_url,
                credentials,
            )?),
            None => {
                warn!("Turnkey credentials not configured; passkey wallets are unavailable");
                None
            }
        };
        let gelato =
            GelatoRelayClient::new(&config.gelato_api_base_url, config.gelato_api_key.clone())?;
        if !gelato.is_configured() {
            warn!("GELATO_API_KEY not configured; sponsored calls are unavailable");
        }

        Ok(Self::with_clients(config, turnkey, gelato))
    }

    pub fn with_clients(
        config: AppConfig,
        turnkey: Option<TurnkeyClient>,
        gelato: GelatoRelayClient,
    ) -> Self {
        Self {
            config: Arc::new(config),
            turnkey: turnkey.map(Arc::new),
            gelato: Arc::new(gelato),
            challenges: Arc::new(PendingCache::default()),
            intents: Arc::new(PendingCache::default()),
            store: Arc::new(RwLock::new(InMemoryStore::new())),
        }
    }

    /// The Turnkey client, or 503 when credentials are missing.
    pub fn turnkey(&self) -> Result<&TurnkeyClient, ApiError> {
        self.turnkey
            .as_deref()
            .ok_or_else(|| ApiError::service_unavailable("Turnkey is not configured"))
    }

    /// RPC client for a network, using any configured endpoint override.
    pub fn chain_client(&self, network: Network) -> Result<ChainClient, ApiError> {
        ChainClient::new(network, self.config.rpc_url(network)).map_err(|e| {
            error!(network = %network, error = %e, "Failed to create chain client");
            ApiError::service_unavailable(format!("{network} RPC is unavailable"))
        })
    }
}
