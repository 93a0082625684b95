// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gelato relay integration for 1Balance-sponsored ERC-2771 calls.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::blockchain::Erc2771Call;

const STATUS_PAGE_BASE_URL: &str = "https://relay.gelato.digital/tasks/status";

#[derive(Debug, thiserror::Error)]
pub enum GelatoError {
    #[error("Gelato configuration missing: {0}")]
    MissingConfig(String),

    #[error("Gelato request failed: {0}")]
    Request(String),

    #[error("Gelato response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Gelato task not found: {0}")]
    TaskNotFound(String),
}

/// Lifecycle of a relay task as reported by Gelato.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TaskState {
    CheckPending,
    ExecPending,
    WaitingForConfirmation,
    ExecSuccess,
    ExecReverted,
    Cancelled,
    Blacklisted,
    NotFound,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            TaskState::CheckPending | TaskState::ExecPending | TaskState::WaitingForConfirmation
        )
    }
}

pub fn map_task_state(raw_state: &str) -> TaskState {
    match raw_state.trim() {
        "ExecPending" => TaskState::ExecPending,
        "WaitingForConfirmation" => TaskState::WaitingForConfirmation,
        "ExecSuccess" => TaskState::ExecSuccess,
        "ExecReverted" => TaskState::ExecReverted,
        "Cancelled" => TaskState::Cancelled,
        "Blacklisted" => TaskState::Blacklisted,
        "NotFound" => TaskState::NotFound,
        _ => TaskState::CheckPending,
    }
}

/// Status snapshot of a relay task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub task_id: String,
    pub chain_id: u64,
    pub task_state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    task: GelatoTask,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GelatoTask {
    task_id: String,
    chain_id: u64,
    task_state: String,
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    block_number: Option<u64>,
    #[serde(default)]
    last_check_message: Option<String>,
    #[serde(default)]
    creation_date: Option<String>,
    #[serde(default)]
    execution_date: Option<String>,
}

impl From<GelatoTask> for TaskStatus {
    fn from(task: GelatoTask) -> Self {
        Self {
            task_state: map_task_state(&task.task_state),
            task_id: task.task_id,
            chain_id: task.chain_id,
            transaction_hash: task.transaction_hash,
            block_number: task.block_number,
            last_check_message: task.last_check_message,
            creation_date: task.creation_date,
            execution_date: task.execution_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct SupportedRelaysResponse {
    #[serde(default)]
    relays: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GelatoRelayClient {
    api_base_url: String,
    sponsor_api_key: Option<String>,
    http: Client,
}

impl GelatoRelayClient {
    pub fn new(api_base_url: &str, sponsor_api_key: Option<String>) -> Result<Self, GelatoError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| GelatoError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            sponsor_api_key,
            http,
        })
    }

    /// Whether a sponsor API key is available for sponsored calls.
    pub fn is_configured(&self) -> bool {
        self.sponsor_api_key.is_some()
    }

    /// Public status page for a task.
    pub fn status_url(task_id: &str) -> String {
        format!("{STATUS_PAGE_BASE_URL}/{task_id}")
    }

    /// Whether Gelato relays on `chain_id`.
    pub async fn is_network_supported(&self, chain_id: u64) -> Result<bool, GelatoError> {
        let response: SupportedRelaysResponse = self.get_json("/relays/v2").await?;
        Ok(response
            .relays
            .iter()
            .any(|relay| relay.trim() == chain_id.to_string()))
    }

    /// Submit a user-signed ERC-2771 call, gas paid from the sponsor's
    /// 1Balance. Returns the task id.
    pub async fn sponsored_call_erc2771(
        &self,
        call: &Erc2771Call,
        user_signature: &str,
    ) -> Result<String, GelatoError> {
        let sponsor_api_key = self
            .sponsor_api_key
            .as_deref()
            .ok_or_else(|| GelatoError::MissingConfig("GELATO_API_KEY".to_string()))?;

        let payload = json!({
            "chainId": call.chain_id.to_string(),
            "target": call.target,
            "data": call.data,
            "user": call.user,
            "userNonce": call.user_nonce,
            "userDeadline": call.user_deadline,
            "userSignature": user_signature,
            "sponsorApiKey": sponsor_api_key,
        });

        let path = "/relays/v2/sponsored-call-erc2771";
        let response = self
            .http
            .post(format!("{}{}", self.api_base_url, path))
            .json(&payload)
            .send()
            .await
            .map_err(|e| GelatoError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GelatoError::Request(format!(
                "POST {path} returned {status}: {body}"
            )));
        }

        let relay: RelayResponse = response
            .json()
            .await
            .map_err(|e| GelatoError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))?;

        info!(
            task_id = %relay.task_id,
            chain_id = call.chain_id,
            user = %call.user,
            status_url = %Self::status_url(&relay.task_id),
            "Gelato sponsored call submitted"
        );

        Ok(relay.task_id)
    }

    /// Current status of a task.
    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatus, GelatoError> {
        let path = format!("/tasks/status/{task_id}");
        let response = self.send_get(&path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GelatoError::TaskNotFound(task_id.to_string()));
        }
        let response: TaskStatusResponse = read_json(&path, response).await?;
        Ok(response.task.into())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GelatoError> {
        let response = self.send_get(path).await?;
        read_json(path, response).await
    }

    async fn send_get(&self, path: &str) -> Result<reqwest::Response, GelatoError> {
        self.http
            .get(format!("{}{}", self.api_base_url, path))
            .send()
            .await
            .map_err(|e| GelatoError::Request(format!("GET {path} failed: {e}")))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, GelatoError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GelatoError::Request(format!(
            "GET {path} returned {status}: {body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| GelatoError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn sample_call() -> Erc2771Call {
        Erc2771Call {
            chain_id: 84532,
            target: "0x79dBe2Ce05f44195B502c2f160f35fcab9190308".parse().unwrap(),
            data: crate::blockchain::increment_calldata(),
            user: Address::repeat_byte(0x11),
            user_nonce: 0,
            user_deadline: 1_800_000_000,
        }
    }

    #[test]
    fn task_state_mapping_is_stable() {
        assert_eq!(map_task_state("ExecSuccess"), TaskState::ExecSuccess);
        assert_eq!(map_task_state("ExecReverted"), TaskState::ExecReverted);
        assert_eq!(map_task_state("SomethingNew"), TaskState::CheckPending);
        assert!(!TaskState::WaitingForConfirmation.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
    }

    #[test]
    fn status_url_points_at_public_page() {
        assert_eq!(
            GelatoRelayClient::status_url("0xtask"),
            "https://relay.gelato.digital/tasks/status/0xtask"
        );
    }

    #[tokio::test]
    async fn sponsored_call_posts_signed_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relays/v2/sponsored-call-erc2771"))
            .and(body_partial_json(json!({
                "chainId": "84532",
                "data": "0xd09de08a",
                "userNonce": 0,
                "userDeadline": 1_800_000_000u64,
                "userSignature": "0xsig",
                "sponsorApiKey": "sponsor-key"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "taskId": "0xtask" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GelatoRelayClient::new(&server.uri(), Some("sponsor-key".to_string())).unwrap();
        let task_id = client
            .sponsored_call_erc2771(&sample_call(), "0xsig")
            .await
            .unwrap();
        assert_eq!(task_id, "0xtask");
    }

    #[tokio::test]
    async fn sponsored_call_requires_api_key() {
        let client = GelatoRelayClient::new("http://127.0.0.1:1", None).unwrap();
        let err = client
            .sponsored_call_erc2771(&sample_call(), "0xsig")
            .await
            .unwrap_err();
        assert!(matches!(err, GelatoError::MissingConfig(_)));
    }

    #[tokio::test]
    async fn task_status_parses_and_maps_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xdone"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task": {
                    "chainId": 84532,
                    "taskId": "0xdone",
                    "taskState": "ExecSuccess",
                    "transactionHash": "0xhash",
                    "blockNumber": 123
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xmissing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GelatoRelayClient::new(&server.uri(), None).unwrap();
        let status = client.task_status("0xdone").await.unwrap();
        assert_eq!(status.task_state, TaskState::ExecSuccess);
        assert_eq!(status.transaction_hash.as_deref(), Some("0xhash"));
        assert_eq!(status.block_number, Some(123));

        let err = client.task_status("0xmissing").await.unwrap_err();
        assert!(matches!(err, GelatoError::TaskNotFound(id) if id == "0xmissing"));
    }

    #[tokio::test]
    async fn supported_networks_are_read_from_relay_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/relays/v2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "relays": ["1", "84532"] })),
            )
            .mount(&server)
            .await;

        let client = GelatoRelayClient::new(&server.uri(), None).unwrap();
        assert!(client.is_network_supported(84532).await.unwrap());
        assert!(!client.is_network_supported(421614).await.unwrap());
    }

    #[tokio::test]
    async fn missing_relay_list_is_a_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/relays/v2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GelatoRelayClient::new(&server.uri(), None).unwrap();
        let err = client.is_network_supported(84532).await.unwrap_err();
        assert!(matches!(err, GelatoError::Request(message) if message.contains("404")));
    }
}
