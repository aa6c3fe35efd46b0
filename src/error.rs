use thiserror::Error;

use crate::models::Role;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Feed closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    #[error("Role {role} may not {action}")]
    Forbidden { role: Role, action: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
