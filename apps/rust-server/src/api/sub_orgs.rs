// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sub-organization creation for a freshly registered passkey.

use axum::{extract::State, http::StatusCode, Json};

use super::map_turnkey_error;
use crate::{
    error::{ApiError, ApiJson},
    models::{CreateSubOrgRequest, WalletDetails},
    state::AppState,
};

fn validate(request: &CreateSubOrgRequest) -> Result<(), ApiError> {
    let attestation = &request.attestation;
    for (name, value) in [
        ("subOrgName", &request.sub_org_name),
        ("challenge", &request.challenge),
        ("attestation.credentialId", &attestation.credential_id),
        ("attestation.clientDataJson", &attestation.client_data_json),
        ("attestation.attestationObject", &attestation.attestation_object),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{name} is required")));
        }
    }
    Ok(())
}

/// Create a Turnkey sub-organization whose root user is the new passkey,
/// with one Ethereum wallet.
#[utoipa::path(
    post,
    path = "/v1/sub-orgs",
    tag = "Passkey",
    request_body = CreateSubOrgRequest,
    responses(
        (status = 201, description = "Sub-organization and wallet created", body = WalletDetails),
        (status = 400, description = "Missing field or unknown challenge"),
        (status = 502, description = "Turnkey request failed"),
        (status = 503, description = "Turnkey is not configured")
    )
)]
pub async fn create_sub_org(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSubOrgRequest>,
) -> Result<(StatusCode, Json<WalletDetails>), ApiError> {
    validate(&request)?;
    let turnkey = state.turnkey()?;

    if state.challenges.take(&request.challenge).is_none() {
        return Err(ApiError::bad_request(
            "Unknown or expired registration challenge",
        ));
    }

    let wallet = turnkey
        .create_sub_organization(&request.sub_org_name, &request.challenge, request.attestation)
        .await
        .map_err(map_turnkey_error)?;

    Ok((
        StatusCode::CREATED,
        Json(WalletDetails {
            id: wallet.wallet_id,
            address: wallet.address,
            sub_org_id: wallet.sub_organization_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::turnkey::Attestation;
    use crate::state::tests::test_state;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn request(challenge: &str) -> CreateSubOrgRequest {
        CreateSubOrgRequest {
            sub_org_name: "Turnkey Viem+Passkey Demo - 10-19-2026, 3.04.05 PM".to_string(),
            challenge: challenge.to_string(),
            attestation: Attestation {
                credential_id: "cred".to_string(),
                client_data_json: "client".to_string(),
                attestation_object: "object".to_string(),
                transports: vec!["AUTHENTICATOR_TRANSPORT_HYBRID".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn creates_wallet_for_issued_challenge() {
        let turnkey = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/public/v1/submit/create_sub_organization"))
            .and(body_partial_json(json!({
                "parameters": {
                    "rootUsers": [{
                        "authenticators": [{ "authenticatorName": "Passkey", "challenge": "issued" }]
                    }]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "activity": {
                    "id": "act-1",
                    "status": "ACTIVITY_STATUS_COMPLETED",
                    "result": {
                        "createSubOrganizationResultV7": {
                            "subOrganizationId": "sub-1",
                            "wallet": { "walletId": "wallet-1", "addresses": ["0xabc"] }
                        }
                    }
                }
            })))
            .expect(1)
            .mount(&turnkey)
            .await;

        let state = test_state(Some(&turnkey.uri()), "http://127.0.0.1:1", "http://127.0.0.1:1");
        state.challenges.insert("issued", ());

        let (status, Json(wallet)) = create_sub_org(State(state.clone()), ApiJson(request("issued")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            wallet,
            WalletDetails {
                id: "wallet-1".to_string(),
                address: "0xabc".to_string(),
                sub_org_id: "sub-1".to_string(),
            }
        );

        // The challenge cannot be replayed.
        let err = create_sub_org(State(state), ApiJson(request("issued")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unissued_challenge_and_empty_fields() {
        let turnkey = MockServer::start().await;
        let state = test_state(Some(&turnkey.uri()), "http://127.0.0.1:1", "http://127.0.0.1:1");

        let err = create_sub_org(State(state.clone()), ApiJson(request("forged")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut empty = request("issued");
        empty.attestation.attestation_object = String::new();
        let err = create_sub_org(State(state), ApiJson(empty)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("attestationObject"));
    }

    #[tokio::test]
    async fn requires_turnkey_configuration() {
        let state = test_state(None, "http://127.0.0.1:1", "http://127.0.0.1:1");
        state.challenges.insert("issued", ());
        let err = create_sub_org(State(state), ApiJson(request("issued")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
