use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StoreError;

// Names of the two remote collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    Votes,
    Voters,
}

impl CollectionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Votes => "votes",
            CollectionName::Voters => "voters",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: String,
    pub candidate: String,
    pub vote_count: u64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub verified: bool,
    pub registered_at: DateTime<Utc>,
}

impl VoteRecord {
    pub fn new(candidate: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            candidate,
            vote_count: 1,
            recorded_at: Utc::now(),
        }
    }
}

impl VoterRecord {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            verified: false,
            registered_at: Utc::now(),
        }
    }
}

// A full snapshot of one collection, ordered by timestamp ascending.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Votes(Vec<VoteRecord>),
    Voters(Vec<VoterRecord>),
}

impl Collection {
    pub fn name(&self) -> CollectionName {
        match self {
            Collection::Votes(_) => CollectionName::Votes,
            Collection::Voters(_) => CollectionName::Voters,
        }
    }
}

pub trait Record: fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    const COLLECTION: CollectionName;

    fn unpack(collection: Collection) -> Result<Vec<Self>, StoreError>;
}

impl Record for VoteRecord {
    const COLLECTION: CollectionName = CollectionName::Votes;

    fn unpack(collection: Collection) -> Result<Vec<Self>, StoreError> {
        match collection {
            Collection::Votes(records) => Ok(records),
            other => Err(StoreError::Malformed(format!(
                "expected votes, store returned {}",
                other.name()
            ))),
        }
    }
}

impl Record for VoterRecord {
    const COLLECTION: CollectionName = CollectionName::Voters;

    fn unpack(collection: Collection) -> Result<Vec<Self>, StoreError> {
        match collection {
            Collection::Voters(records) => Ok(records),
            other => Err(StoreError::Malformed(format!(
                "expected voters, store returned {}",
                other.name()
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub token: u32,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    // Token being served when this entry joined
    pub serving_at_join: u32,
    pub served: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Voter,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voter" => Ok(Role::Voter),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Voter => f.write_str("voter"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

// The caller identity handed out by the external identity provider.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}
