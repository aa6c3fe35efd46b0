//! Live vote and voter-roll statistics over a remote collection store.
//!
//! Each collection snapshot is summarized in full by the pure functions in
//! [`voting`]; [`tasks`] keeps those summaries current through cancellable,
//! last-write-wins subscriptions.

pub mod access;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod tasks;
pub mod views;
pub mod voting;
