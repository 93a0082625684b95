// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{ChainClientError, Erc2771Call, Network},
    error::ApiError,
    models::{
        CounterValue, CreateSubOrgRequest, LoginPayload, LoginRequest, PasskeyUser,
        PreparedSigning, PreparedSponsoredCall, RegistrationOptions, RelayTaskRecord,
        RelyingParty, SignMessageRequest, SignedMessage, SponsoredCallRequest,
        SessionWallet, SponsoredCallResponse, SubmitSigningRequest, WalletDetails,
    },
    providers::{
        gelato::{GelatoError, TaskState},
        turnkey::{Attestation, StampError, TurnkeyError, WebAuthnStamp},
    },
    state::AppState,
};

pub mod counter;
pub mod health;
pub mod passkey;
pub mod relay;
pub mod session;
pub mod signing;
pub mod sub_orgs;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/passkey/registration-options",
            get(passkey::registration_options),
        )
        .route("/sub-orgs", post(sub_orgs::create_sub_org))
        .route("/session/login-payload", get(session::login_payload))
        .route("/session/login", post(session::login))
        .route("/sign-message/prepare", post(signing::prepare_sign_message))
        .route("/sign-message", post(signing::sign_message))
        .route("/counter/{network}/{address}", get(counter::get_counter))
        .route(
            "/relay/sponsored-call/prepare",
            post(relay::prepare_sponsored_call),
        )
        .route("/relay/sponsored-call", post(relay::submit_sponsored_call))
        .route("/relay/tasks/{task_id}", get(relay::get_task_status))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        passkey::registration_options,
        sub_orgs::create_sub_org,
        session::login_payload,
        session::login,
        signing::prepare_sign_message,
        signing::sign_message,
        counter::get_counter,
        relay::prepare_sponsored_call,
        relay::submit_sponsored_call,
        relay::get_task_status,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            WalletDetails,
            SessionWallet,
            RegistrationOptions,
            RelyingParty,
            PasskeyUser,
            Attestation,
            CreateSubOrgRequest,
            LoginPayload,
            LoginRequest,
            WebAuthnStamp,
            SignMessageRequest,
            PreparedSigning,
            SubmitSigningRequest,
            SignedMessage,
            CounterValue,
            Network,
            SponsoredCallRequest,
            PreparedSponsoredCall,
            Erc2771Call,
            SponsoredCallResponse,
            RelayTaskRecord,
            TaskState,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Passkey", description = "Passkey registration and sub-organization provisioning"),
        (name = "Session", description = "Passkey login"),
        (name = "Signing", description = "Passkey-authorized message signing"),
        (name = "Relay", description = "Gelato-sponsored counter increments"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

// =============================================================================
// Provider Error Mapping
// =============================================================================

fn map_turnkey_error(error: TurnkeyError) -> ApiError {
    match error {
        TurnkeyError::Stamp(StampError::ChallengeMismatch) => {
            ApiError::bad_request("Passkey stamp does not cover the prepared payload")
        }
        TurnkeyError::Stamp(StampError::InvalidWebAuthnStamp(message)) => {
            ApiError::bad_request(format!("Invalid passkey stamp: {message}"))
        }
        TurnkeyError::Stamp(other) => ApiError::internal(format!("Turnkey stamp failed: {other}")),
        TurnkeyError::Unauthorized(message) => ApiError::new(
            StatusCode::UNAUTHORIZED,
            format!("Turnkey rejected the request: {message}"),
        ),
        TurnkeyError::ActivityTimeout(activity_id) => ApiError::new(
            StatusCode::GATEWAY_TIMEOUT,
            format!("Turnkey activity {activity_id} did not complete in time"),
        ),
        other @ (TurnkeyError::Request(_)
        | TurnkeyError::InvalidResponse(_)
        | TurnkeyError::ActivityFailed { .. }) => ApiError::bad_gateway(other.to_string()),
    }
}

fn map_gelato_error(error: GelatoError) -> ApiError {
    match error {
        GelatoError::MissingConfig(name) => {
            ApiError::service_unavailable(format!("Gelato is not configured: {name} is missing"))
        }
        GelatoError::TaskNotFound(task_id) => {
            ApiError::not_found(format!("Relay task not found: {task_id}"))
        }
        other @ (GelatoError::Request(_) | GelatoError::InvalidResponse(_)) => {
            ApiError::bad_gateway(other.to_string())
        }
    }
}

fn map_chain_error(network: Network, error: ChainClientError) -> ApiError {
    match error {
        ChainClientError::InvalidAddress(message) => {
            ApiError::bad_request(format!("Invalid address: {message}"))
        }
        other => {
            error!(network = %network, error = %other, "Chain read failed");
            ApiError::service_unavailable(format!("{network} RPC request failed"))
        }
    }
}
