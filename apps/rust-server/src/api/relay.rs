// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gelato-sponsored `increment()` calls through the ERC-2771 forwarder.
//!
//! The user signs an EIP-712 `SponsoredCallERC2771` with their passkey
//! wallet; Gelato submits the call and pays gas from the sponsor's 1Balance.
//! The counter contract sees the user as `_msgSender()`.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

use super::{
    map_chain_error, map_gelato_error,
    signing::{prepare_intent, require_wallet, sign_intent, take_intent},
};
use crate::{
    blockchain::{
        increment_calldata, parse_address, signature_hex, Erc2771Call, DEFAULT_DEADLINE_GAP_SECS,
    },
    error::{ApiError, ApiJson},
    models::{
        PreparedSponsoredCall, RelayTaskRecord, SponsoredCallRequest, SponsoredCallResponse,
        SubmitSigningRequest,
    },
    providers::gelato::{GelatoError, GelatoRelayClient},
    state::{AppState, IntentPurpose},
};

/// Prepare a sponsored `increment()` for the wallet's passkey to authorize.
#[utoipa::path(
    post,
    path = "/v1/relay/sponsored-call/prepare",
    tag = "Relay",
    request_body = SponsoredCallRequest,
    responses(
        (status = 200, description = "Relay request and payload for the passkey to stamp", body = PreparedSponsoredCall),
        (status = 400, description = "Missing wallet"),
        (status = 422, description = "Gelato does not relay on this network"),
        (status = 503, description = "Gelato, Turnkey or the RPC is unavailable")
    )
)]
pub async fn prepare_sponsored_call(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SponsoredCallRequest>,
) -> Result<Json<PreparedSponsoredCall>, ApiError> {
    let (wallet, user) = require_wallet(request.wallet)?;
    let network = request.network;
    if !state.gelato.is_configured() {
        return Err(map_gelato_error(GelatoError::MissingConfig(
            "GELATO_API_KEY".to_string(),
        )));
    }
    state.turnkey()?;

    let chain = state.chain_client(network)?;
    let chain_id = chain
        .get_chain_id()
        .await
        .map_err(|e| map_chain_error(network, e))?;
    if chain_id != network.config().chain_id {
        warn!(
            network = %network,
            expected = network.config().chain_id,
            reported = chain_id,
            "RPC endpoint reports an unexpected chain id"
        );
        return Err(ApiError::bad_gateway(format!(
            "{network} RPC reports chain id {chain_id}"
        )));
    }

    let supported = state
        .gelato
        .is_network_supported(chain_id)
        .await
        .map_err(map_gelato_error)?;
    if !supported {
        return Err(ApiError::unprocessable(format!(
            "Gelato does not relay on chain {chain_id}"
        )));
    }

    let nonce = chain
        .forwarder_nonce(user)
        .await
        .map_err(|e| map_chain_error(network, e))?;
    let user_nonce = u64::try_from(nonce)
        .map_err(|_| ApiError::bad_gateway(format!("Forwarder nonce {nonce} is out of range")))?;

    let target =
        parse_address(network.config().counter_address).map_err(|e| map_chain_error(network, e))?;
    let forwarder = parse_address(network.config().trusted_forwarder)
        .map_err(|e| map_chain_error(network, e))?;

    let call = Erc2771Call {
        chain_id,
        target,
        data: increment_calldata(),
        user,
        user_nonce,
        user_deadline: Utc::now().timestamp().max(0) as u64 + DEFAULT_DEADLINE_GAP_SECS,
    };
    let digest = call.signing_digest(forwarder);

    let signing = prepare_intent(
        &state,
        wallet,
        user,
        digest,
        IntentPurpose::SponsoredCall {
            network,
            call: call.clone(),
        },
    )?;

    Ok(Json(PreparedSponsoredCall {
        signing,
        network,
        request: call,
    }))
}

/// Sign a prepared sponsored call with the passkey stamp and relay it.
#[utoipa::path(
    post,
    path = "/v1/relay/sponsored-call",
    tag = "Relay",
    request_body = SubmitSigningRequest,
    responses(
        (status = 200, description = "Call submitted to Gelato", body = SponsoredCallResponse),
        (status = 400, description = "Stamp does not cover the prepared payload"),
        (status = 404, description = "Unknown or expired intent"),
        (status = 502, description = "Turnkey or Gelato request failed")
    )
)]
pub async fn submit_sponsored_call(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitSigningRequest>,
) -> Result<Json<SponsoredCallResponse>, ApiError> {
    let intent = take_intent(&state, &request.intent_id)?;
    let IntentPurpose::SponsoredCall { network, call } = &intent.purpose else {
        return Err(ApiError::bad_request(
            "Intent was not prepared for a sponsored call",
        ));
    };
    let network = *network;

    let signature = sign_intent(&state, &intent, &request.stamp).await?;
    let task_id = state
        .gelato
        .sponsored_call_erc2771(call, &signature_hex(&signature))
        .await
        .map_err(map_gelato_error)?;

    let record = state
        .store
        .write()
        .await
        .record_submitted(&task_id, network, &intent.wallet.address);
    info!(
        task_id = %task_id,
        network = %network,
        user = %intent.wallet.address,
        status_url = %record.status_url,
        "Sponsored increment relayed"
    );

    // The relay is asynchronous, so this usually still shows the old value.
    let counter = match state.chain_client(network) {
        Ok(chain) => match chain.counter_value(intent.signer).await {
            Ok(value) => Some(value.to_string()),
            Err(e) => {
                warn!(network = %network, error = %e, "Counter re-read failed");
                None
            }
        },
        Err(_) => None,
    };

    Ok(Json(SponsoredCallResponse {
        status_url: record.status_url,
        task_id,
        network,
        counter,
    }))
}

/// Current state of a relay task.
#[utoipa::path(
    get,
    path = "/v1/relay/tasks/{task_id}",
    tag = "Relay",
    params(("task_id" = String, Path, description = "Gelato task id")),
    responses(
        (status = 200, description = "Tracked task record", body = RelayTaskRecord),
        (status = 404, description = "Gelato does not know the task"),
        (status = 502, description = "Gelato request failed")
    )
)]
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<RelayTaskRecord>, ApiError> {
    let tracked = state.store.read().await.relay_task(&task_id);
    if let Some(record) = &tracked {
        if record.task_state.is_terminal() {
            return Ok(Json(record.clone()));
        }
    }

    let Some(tracked) = tracked else {
        // Untracked ids are answered live and not remembered.
        return state
            .gelato
            .task_status(&task_id)
            .await
            .map(|status| Json(RelayTaskRecord::from_status(&status)))
            .map_err(map_gelato_error);
    };

    let lookup = state.gelato.task_status(&task_id).await;
    let mut store = state.store.write().await;
    match lookup {
        Ok(status) => Ok(Json(
            store
                .apply_status(&status)
                .map(|(_, record)| record)
                .unwrap_or_else(|| RelayTaskRecord::from_status(&status)),
        )),
        Err(GelatoError::TaskNotFound(_)) => Ok(Json(
            store.mark_not_found(&task_id, Utc::now()).unwrap_or(tracked),
        )),
        Err(e) => {
            warn!(
                task_id = %task_id,
                error = %e,
                status_url = %GelatoRelayClient::status_url(&task_id),
                "Live task status unavailable; returning tracked record"
            );
            Ok(Json(tracked))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::signing::tests::{mount_signer, wallet_for};
    use crate::blockchain::{client::tests::mock_rpc, Network, TRUSTED_FORWARDER};
    use crate::blockchain::signing::tests::TEST_KEY;
    use crate::providers::gelato::TaskState;
    use crate::providers::turnkey::stamp::tests::browser_stamp;
    use crate::state::tests::test_state;
    use crate::store::NOT_FOUND_GRACE;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn mount_supported(gelato: &MockServer, chains: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/relays/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "relays": chains })))
            .mount(gelato)
            .await;
    }

    #[tokio::test]
    async fn sponsored_call_round_trip() {
        let rpc = mock_rpc(84532, 5).await;
        let gelato = MockServer::start().await;
        let turnkey = MockServer::start().await;
        mount_supported(&gelato, &["84532", "421614"]).await;

        let state = test_state(Some(&turnkey.uri()), &gelato.uri(), &rpc.uri());
        let wallet = wallet_for(TEST_KEY);

        let Json(prepared) = prepare_sponsored_call(
            State(state.clone()),
            ApiJson(SponsoredCallRequest {
                wallet: Some(wallet.clone().into()),
                network: Network::BaseSepolia,
            }),
        )
        .await
        .unwrap();

        let call = &prepared.request;
        assert_eq!(call.chain_id, 84532);
        assert_eq!(call.user_nonce, 5);
        assert_eq!(call.data, increment_calldata());
        assert_eq!(call.user.to_string(), wallet.address);
        assert!(call.user_deadline > Utc::now().timestamp() as u64 + 86_000);

        let forwarder = parse_address(TRUSTED_FORWARDER).unwrap();
        let digest = call.signing_digest(forwarder);
        let payload: Value = serde_json::from_str(&prepared.signing.payload).unwrap();
        assert_eq!(payload["parameters"]["payload"], alloy::hex::encode(digest));

        mount_signer(&turnkey, TEST_KEY, digest).await;
        Mock::given(method("POST"))
            .and(path("/relays/v2/sponsored-call-erc2771"))
            .and(body_partial_json(json!({
                "chainId": "84532",
                "userNonce": 5,
                "sponsorApiKey": "sponsor-key"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "taskId": "0xtask" })))
            .expect(1)
            .mount(&gelato)
            .await;

        let Json(response) = submit_sponsored_call(
            State(state.clone()),
            ApiJson(SubmitSigningRequest {
                intent_id: prepared.signing.intent_id.clone(),
                stamp: browser_stamp(&prepared.signing.payload),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.task_id, "0xtask");
        assert_eq!(
            response.status_url,
            "https://relay.gelato.digital/tasks/status/0xtask"
        );
        assert_eq!(response.network, Network::BaseSepolia);
        assert_eq!(response.counter.as_deref(), Some("5"));

        let record = state.store.read().await.relay_task("0xtask").unwrap();
        assert_eq!(record.task_state, TaskState::CheckPending);
        assert_eq!(record.user.as_deref(), Some(wallet.address.as_str()));
    }

    #[tokio::test]
    async fn unsupported_chain_is_unprocessable() {
        let rpc = mock_rpc(84532, 0).await;
        let gelato = MockServer::start().await;
        let turnkey = MockServer::start().await;
        mount_supported(&gelato, &["1"]).await;

        let state = test_state(Some(&turnkey.uri()), &gelato.uri(), &rpc.uri());
        let err = prepare_sponsored_call(
            State(state),
            ApiJson(SponsoredCallRequest {
                wallet: Some(wallet_for(TEST_KEY).into()),
                network: Network::BaseSepolia,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn rpc_on_wrong_chain_is_rejected() {
        let rpc = mock_rpc(1, 0).await;
        let turnkey = MockServer::start().await;
        let state = test_state(Some(&turnkey.uri()), "http://127.0.0.1:1", &rpc.uri());

        let err = prepare_sponsored_call(
            State(state),
            ApiJson(SponsoredCallRequest {
                wallet: Some(wallet_for(TEST_KEY).into()),
                network: Network::BaseSepolia,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn missing_sponsor_key_is_service_unavailable() {
        let turnkey = MockServer::start().await;
        let mut state = test_state(Some(&turnkey.uri()), "http://127.0.0.1:1", "http://127.0.0.1:1");
        state.gelato = std::sync::Arc::new(GelatoRelayClient::new("http://127.0.0.1:1", None).unwrap());

        let err = prepare_sponsored_call(
            State(state),
            ApiJson(SponsoredCallRequest {
                wallet: Some(wallet_for(TEST_KEY).into()),
                network: Network::ArbitrumSepolia,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn message_intent_cannot_be_relayed() {
        let turnkey = MockServer::start().await;
        let state = test_state(Some(&turnkey.uri()), "http://127.0.0.1:1", "http://127.0.0.1:1");
        let wallet = wallet_for(TEST_KEY);
        let signer = parse_address(&wallet.address).unwrap();
        let prepared = prepare_intent(
            &state,
            wallet,
            signer,
            crate::blockchain::personal_message_digest("hi"),
            IntentPurpose::Message("hi".to_string()),
        )
        .unwrap();

        let err = submit_sponsored_call(
            State(state),
            ApiJson(SubmitSigningRequest {
                intent_id: prepared.intent_id,
                stamp: browser_stamp(&prepared.payload),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn task_status_refreshes_pending_and_caches_terminal() {
        let gelato = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xtask"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task": {
                    "chainId": 84532,
                    "taskId": "0xtask",
                    "taskState": "ExecSuccess",
                    "transactionHash": "0xhash",
                    "blockNumber": 7
                }
            })))
            .expect(1)
            .mount(&gelato)
            .await;

        let state = test_state(None, &gelato.uri(), "http://127.0.0.1:1");
        state
            .store
            .write()
            .await
            .record_submitted("0xtask", Network::BaseSepolia, "0xuser");

        let Json(first) = get_task_status(State(state.clone()), Path("0xtask".to_string()))
            .await
            .unwrap();
        assert_eq!(first.task_state, TaskState::ExecSuccess);
        assert_eq!(first.block_number, Some(7));

        // Terminal records are served without another lookup.
        let Json(second) = get_task_status(State(state), Path("0xtask".to_string()))
            .await
            .unwrap();
        assert_eq!(second.transaction_hash.as_deref(), Some("0xhash"));
    }

    #[tokio::test]
    async fn unknown_task_is_looked_up_live() {
        let gelato = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xold"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task": { "chainId": 421614, "taskId": "0xold", "taskState": "WaitingForConfirmation" }
            })))
            .mount(&gelato)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xmissing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&gelato)
            .await;

        let state = test_state(None, &gelato.uri(), "http://127.0.0.1:1");
        let Json(record) = get_task_status(State(state.clone()), Path("0xold".to_string()))
            .await
            .unwrap();
        assert_eq!(record.network, Some(Network::ArbitrumSepolia));
        assert_eq!(record.task_state, TaskState::WaitingForConfirmation);
        assert_eq!(state.store.read().await.relay_task_count(), 0);

        let err = get_task_status(State(state), Path("0xmissing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn tracked_task_survives_gelato_outage() {
        let gelato = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xtask"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&gelato)
            .await;

        let state = test_state(None, &gelato.uri(), "http://127.0.0.1:1");
        state
            .store
            .write()
            .await
            .record_submitted("0xtask", Network::BaseSepolia, "0xuser");

        let Json(record) = get_task_status(State(state), Path("0xtask".to_string()))
            .await
            .unwrap();
        assert_eq!(record.task_state, TaskState::CheckPending);
    }

    #[tokio::test]
    async fn tracked_task_unknown_to_gelato_settles_as_not_found() {
        let gelato = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xlost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&gelato)
            .await;

        let state = test_state(None, &gelato.uri(), "http://127.0.0.1:1");
        state.store.write().await.record_submitted_at(
            "0xlost",
            Network::BaseSepolia,
            "0xuser",
            Utc::now() - NOT_FOUND_GRACE - chrono::Duration::seconds(1),
        );

        let Json(record) = get_task_status(State(state.clone()), Path("0xlost".to_string()))
            .await
            .unwrap();
        assert_eq!(record.task_state, TaskState::NotFound);
        assert!(state.store.read().await.pending_task_ids().is_empty());
    }
}
