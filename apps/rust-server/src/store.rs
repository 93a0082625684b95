// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory record of relay tasks submitted through this process.
//!
//! Records are lost on restart; Gelato remains the source of truth and the
//! status endpoint falls back to a live lookup for unknown task ids. Only
//! tasks submitted here are tracked, and the LRU bound caps memory.

use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;

use crate::blockchain::Network;
use crate::models::RelayTaskRecord;
use crate::providers::gelato::{GelatoRelayClient, TaskState, TaskStatus};

/// Default number of tracked relay tasks.
pub const DEFAULT_TASK_CAPACITY: usize = 4096;

/// Gelato may not index a task the moment it is accepted. A 404 inside
/// this window leaves the task pending.
pub const NOT_FOUND_GRACE: Duration = Duration::seconds(60);

/// Pending tasks older than this are dropped. Matches the sponsored call
/// deadline, after which the forwarder refuses the call.
pub const PENDING_MAX_AGE: Duration = Duration::seconds(86_400);

struct TrackedTask {
    record: RelayTaskRecord,
    tracked_since: DateTime<Utc>,
}

pub struct InMemoryStore {
    relay_tasks: LruCache<String, TrackedTask>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TASK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            relay_tasks: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Track a freshly submitted task as `CheckPending`.
    pub fn record_submitted(
        &mut self,
        task_id: &str,
        network: Network,
        user: &str,
    ) -> RelayTaskRecord {
        self.record_submitted_at(task_id, network, user, Utc::now())
    }

    pub fn record_submitted_at(
        &mut self,
        task_id: &str,
        network: Network,
        user: &str,
        submitted_at: DateTime<Utc>,
    ) -> RelayTaskRecord {
        let record = RelayTaskRecord {
            task_id: task_id.to_string(),
            network: Some(network),
            chain_id: network.config().chain_id,
            user: Some(user.to_string()),
            task_state: TaskState::CheckPending,
            transaction_hash: None,
            block_number: None,
            last_check_message: None,
            status_url: GelatoRelayClient::status_url(task_id),
            updated_at: submitted_at,
        };
        self.relay_tasks.put(
            task_id.to_string(),
            TrackedTask {
                record: record.clone(),
                tracked_since: submitted_at,
            },
        );
        record
    }

    pub fn relay_task(&self, task_id: &str) -> Option<RelayTaskRecord> {
        self.relay_tasks
            .peek(task_id)
            .map(|tracked| tracked.record.clone())
    }

    /// Fold a status snapshot into the matching tracked record. Returns the
    /// previous state and the updated record, or `None` for untracked tasks.
    pub fn apply_status(&mut self, status: &TaskStatus) -> Option<(TaskState, RelayTaskRecord)> {
        let tracked = self.relay_tasks.get_mut(&status.task_id)?;
        let previous = tracked.record.task_state;
        tracked.record.apply(status);
        Some((previous, tracked.record.clone()))
    }

    /// Settle a pending task Gelato no longer knows as `NotFound`, once it
    /// has been tracked longer than [`NOT_FOUND_GRACE`].
    pub fn mark_not_found(&mut self, task_id: &str, now: DateTime<Utc>) -> Option<RelayTaskRecord> {
        let tracked = self.relay_tasks.get_mut(task_id)?;
        if tracked.record.task_state.is_terminal() || now - tracked.tracked_since < NOT_FOUND_GRACE {
            return None;
        }
        tracked.record.task_state = TaskState::NotFound;
        tracked.record.updated_at = now;
        Some(tracked.record.clone())
    }

    /// Drop pending tasks tracked longer than [`PENDING_MAX_AGE`] and return
    /// their ids. Terminal records stay until evicted.
    pub fn expire_stale(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let stale: Vec<String> = self
            .relay_tasks
            .iter()
            .filter(|(_, tracked)| {
                !tracked.record.task_state.is_terminal()
                    && now - tracked.tracked_since >= PENDING_MAX_AGE
            })
            .map(|(task_id, _)| task_id.clone())
            .collect();
        for task_id in &stale {
            self.relay_tasks.pop(task_id);
        }
        stale
    }

    /// Ids of tasks whose state can still change.
    pub fn pending_task_ids(&self) -> Vec<String> {
        self.relay_tasks
            .iter()
            .filter(|(_, tracked)| !tracked.record.task_state.is_terminal())
            .map(|(task_id, _)| task_id.clone())
            .collect()
    }

    pub fn relay_task_count(&self) -> usize {
        self.relay_tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(task_id: &str, state: TaskState) -> TaskStatus {
        TaskStatus {
            task_id: task_id.to_string(),
            chain_id: 84532,
            task_state: state,
            transaction_hash: None,
            block_number: None,
            last_check_message: None,
            creation_date: None,
            execution_date: None,
        }
    }

    #[test]
    fn submitted_tasks_start_pending() {
        let mut store = InMemoryStore::new();
        let record = store.record_submitted("0xtask", Network::BaseSepolia, "0xuser");

        assert_eq!(record.task_state, TaskState::CheckPending);
        assert_eq!(record.chain_id, 84532);
        assert_eq!(store.pending_task_ids(), vec!["0xtask".to_string()]);
        assert_eq!(store.relay_task("0xtask"), Some(record));
    }

    #[test]
    fn apply_status_reports_previous_state() {
        let mut store = InMemoryStore::new();
        store.record_submitted("0xtask", Network::BaseSepolia, "0xuser");

        let (previous, record) = store
            .apply_status(&status("0xtask", TaskState::ExecSuccess))
            .unwrap();
        assert_eq!(previous, TaskState::CheckPending);
        assert_eq!(record.task_state, TaskState::ExecSuccess);
        assert_eq!(record.user.as_deref(), Some("0xuser"));
        assert!(store.pending_task_ids().is_empty());
    }

    #[test]
    fn apply_status_ignores_untracked_tasks() {
        let mut store = InMemoryStore::new();
        assert!(store
            .apply_status(&status("0xother", TaskState::ExecPending))
            .is_none());
        assert_eq!(store.relay_task_count(), 0);
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let mut store = InMemoryStore::with_capacity(2);
        store.record_submitted("0xa", Network::BaseSepolia, "0xuser");
        store.record_submitted("0xb", Network::BaseSepolia, "0xuser");
        store.record_submitted("0xc", Network::BaseSepolia, "0xuser");

        assert_eq!(store.relay_task_count(), 2);
        assert!(store.relay_task("0xa").is_none());
    }

    #[test]
    fn not_found_waits_for_grace_period() {
        let mut store = InMemoryStore::new();
        let now = Utc::now();
        store.record_submitted_at("0xnew", Network::BaseSepolia, "0xuser", now);
        store.record_submitted_at(
            "0xold",
            Network::BaseSepolia,
            "0xuser",
            now - NOT_FOUND_GRACE - Duration::seconds(1),
        );

        assert!(store.mark_not_found("0xnew", now).is_none());
        let record = store.mark_not_found("0xold", now).unwrap();
        assert_eq!(record.task_state, TaskState::NotFound);
        assert_eq!(store.pending_task_ids(), vec!["0xnew".to_string()]);
        assert!(store.mark_not_found("0xmissing", now).is_none());
    }

    #[test]
    fn stale_pending_tasks_expire() {
        let mut store = InMemoryStore::new();
        let now = Utc::now();
        let long_ago = now - PENDING_MAX_AGE - Duration::seconds(1);
        store.record_submitted_at("0xstuck", Network::BaseSepolia, "0xuser", long_ago);
        store.record_submitted_at("0xdone", Network::BaseSepolia, "0xuser", long_ago);
        store.apply_status(&status("0xdone", TaskState::ExecSuccess));
        store.record_submitted_at("0xfresh", Network::BaseSepolia, "0xuser", now);

        assert_eq!(store.expire_stale(now), vec!["0xstuck".to_string()]);
        assert!(store.relay_task("0xstuck").is_none());
        assert!(store.relay_task("0xdone").is_some());
        assert_eq!(store.pending_task_ids(), vec!["0xfresh".to_string()]);
    }
}
