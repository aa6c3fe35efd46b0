use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::CollectionStore;
use crate::error::StoreError;
use crate::models::{Collection, CollectionName, QueueEntry, VoteRecord, VoterRecord};

#[derive(Default)]
struct State {
    votes: Vec<VoteRecord>,
    voters: Vec<VoterRecord>,
    queue: Vec<QueueEntry>,
    failure: Option<String>,
}

// Process-local store, used by tests and for running without a database file.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_votes(votes: Vec<VoteRecord>) -> Self {
        let store = Self::new();
        store.lock().votes = votes;
        store
    }

    pub fn with_voters(voters: Vec<VoterRecord>) -> Self {
        let store = Self::new();
        store.lock().voters = voters;
        store
    }

    // Makes every call fail with `message` until cleared with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_string);
    }

    // Number of `fetch` calls served so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn guarded(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        let state = self.lock();
        if let Some(message) = state.failure.clone() {
            return Err(StoreError::Unavailable(message));
        }
        Ok(state)
    }
}

fn serving(queue: &[QueueEntry]) -> u32 {
    queue
        .iter()
        .filter(|entry| entry.served)
        .map(|entry| entry.token)
        .max()
        .unwrap_or(0)
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn fetch(&self, name: CollectionName) -> Result<Collection, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.guarded()?;
        match name {
            CollectionName::Votes => {
                let mut votes = state.votes.clone();
                votes.sort_by_key(|vote| vote.recorded_at);
                Ok(Collection::Votes(votes))
            }
            CollectionName::Voters => {
                let mut voters = state.voters.clone();
                voters.sort_by_key(|voter| voter.registered_at);
                Ok(Collection::Voters(voters))
            }
        }
    }

    async fn cast_vote(&self, candidate: &str) -> Result<VoteRecord, StoreError> {
        let mut state = self.guarded()?;
        if let Some(existing) = state.votes.iter_mut().find(|v| v.candidate == candidate) {
            existing.vote_count += 1;
            return Ok(existing.clone());
        }
        let record = VoteRecord::new(candidate.to_string());
        state.votes.push(record.clone());
        Ok(record)
    }

    async fn register_voter(&self, name: &str, email: &str) -> Result<VoterRecord, StoreError> {
        let mut state = self.guarded()?;
        let voter = VoterRecord::new(name.to_string(), email.to_string());
        state.voters.push(voter.clone());
        Ok(voter)
    }

    async fn approve_voter(&self, voter_id: &str) -> Result<(), StoreError> {
        let mut state = self.guarded()?;
        match state.voters.iter_mut().find(|v| v.id == voter_id) {
            Some(voter) => {
                voter.verified = true;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("voter {}", voter_id))),
        }
    }

    async fn join_queue(&self, name: &str) -> Result<QueueEntry, StoreError> {
        let mut state = self.guarded()?;
        let token = state.queue.iter().map(|e| e.token).max().unwrap_or(0) + 1;
        let entry = QueueEntry {
            token,
            name: name.to_string(),
            joined_at: Utc::now(),
            serving_at_join: serving(&state.queue),
            served: false,
        };
        state.queue.push(entry.clone());
        Ok(entry)
    }

    async fn call_next(&self) -> Result<Option<QueueEntry>, StoreError> {
        let mut state = self.guarded()?;
        let next = state
            .queue
            .iter_mut()
            .filter(|entry| !entry.served)
            .min_by_key(|entry| entry.token);
        Ok(next.map(|entry| {
            entry.served = true;
            entry.clone()
        }))
    }

    async fn queue(&self) -> Result<Vec<QueueEntry>, StoreError> {
        let state = self.guarded()?;
        let mut waiting: Vec<QueueEntry> =
            state.queue.iter().filter(|e| !e.served).cloned().collect();
        waiting.sort_by_key(|entry| entry.token);
        Ok(waiting)
    }

    async fn queue_entry(&self, token: u32) -> Result<QueueEntry, StoreError> {
        let state = self.guarded()?;
        state
            .queue
            .iter()
            .find(|entry| entry.token == token)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("token #{}", token)))
    }

    async fn now_serving(&self) -> Result<u32, StoreError> {
        Ok(serving(&self.guarded()?.queue))
    }
}
