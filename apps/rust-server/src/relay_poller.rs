// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Task Poller
//!
//! Background task that follows sponsored calls after submission. Gelato
//! reports progress only when asked, so without this loop a task's record
//! would stay `CheckPending` until somebody opened its status endpoint.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 5 s) the poller:
//! 1. Lists all tracked tasks in a non-terminal state.
//! 2. Fetches each task's status from Gelato and folds it into the store.
//! 3. Logs state transitions; a terminal state removes the task from the
//!    next sweep.
//!
//! Lookup failures are logged and the task stays pending. A task Gelato
//! answers 404 for past the grace period settles as `NotFound`, and tasks
//! still pending after a day are dropped.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`, cancelled by `main` on Ctrl-C
//! or SIGTERM.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::providers::gelato::GelatoError;
use crate::state::AppState;

/// Default interval between polling sweeps.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct RelayPoller {
    state: AppState,
    poll_interval: Duration,
}

impl RelayPoller {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(RelayPoller::new(state).run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Relay task poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Relay task poller shutting down");
                return;
            }

            self.poll_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Relay task poller shutting down");
                    return;
                }
            }
        }
    }

    /// One sweep over the pending tasks.
    pub(crate) async fn poll_step(&self) {
        let pending_ids = {
            let mut store = self.state.store.write().await;
            for task_id in store.expire_stale(Utc::now()) {
                warn!(task_id = %task_id, "Relay task still pending after a day; no longer tracked");
            }
            store.pending_task_ids()
        };
        if pending_ids.is_empty() {
            return;
        }

        for task_id in &pending_ids {
            let status = match self.state.gelato.task_status(task_id).await {
                Ok(status) => status,
                Err(GelatoError::TaskNotFound(_)) => {
                    let settled = self
                        .state
                        .store
                        .write()
                        .await
                        .mark_not_found(task_id, Utc::now());
                    if settled.is_some() {
                        warn!(task_id = %task_id, "Relay task unknown to Gelato; marked NotFound");
                    }
                    continue;
                }
                Err(e) => {
                    warn!(task_id = %task_id, error = %e, "Relay poller: status lookup failed");
                    continue;
                }
            };

            let Some((previous, record)) = self.state.store.write().await.apply_status(&status)
            else {
                continue;
            };
            if previous != record.task_state {
                info!(
                    task_id = %record.task_id,
                    from = ?previous,
                    to = ?record.task_state,
                    transaction_hash = ?record.transaction_hash,
                    status_url = %record.status_url,
                    "Relay task state changed"
                );
            }
        }
    }
}
