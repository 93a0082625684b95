// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use super::map_chain_error;
use crate::{
    blockchain::{parse_address, Network},
    error::ApiError,
    models::CounterValue,
    state::AppState,
};

/// Read the ERC-2771 counter of `address` on `network`.
#[utoipa::path(
    get,
    path = "/v1/counter/{network}/{address}",
    tag = "Relay",
    params(
        ("network" = String, Path, description = "Network key: baseSepolia or arbSepolia"),
        ("address" = String, Path, description = "User address whose counter to read")
    ),
    responses(
        (status = 200, description = "Current counter value", body = CounterValue),
        (status = 400, description = "Unknown network or invalid address"),
        (status = 503, description = "RPC request failed")
    )
)]
pub async fn get_counter(
    State(state): State<AppState>,
    Path((network, address)): Path<(String, String)>,
) -> Result<Json<CounterValue>, ApiError> {
    let network: Network = network.parse().map_err(ApiError::bad_request)?;
    let user = parse_address(&address).map_err(|e| map_chain_error(network, e))?;

    let client = state.chain_client(network)?;
    let counter = client
        .counter_value(user)
        .await
        .map_err(|e| map_chain_error(network, e))?;

    Ok(Json(CounterValue {
        network,
        chain_id: network.config().chain_id,
        contract: network.config().counter_address.to_string(),
        address: user.to_string(),
        counter: counter.to_string(),
    }))
}
