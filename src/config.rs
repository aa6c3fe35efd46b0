use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{Role, Session};
use crate::queue::DEFAULT_MINUTES_PER_TOKEN;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub refresh_interval: Duration,
    pub minutes_per_token: u32,
    pub role: Role,
    pub user_id: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:live_tally.db".to_string()),
            refresh_interval: Duration::from_millis(try_load("REFRESH_INTERVAL_MS", 1000u64)),
            minutes_per_token: try_load("MINUTES_PER_TOKEN", DEFAULT_MINUTES_PER_TOKEN),
            role: try_load("LIVE_TALLY_ROLE", Role::Voter),
            user_id: env::var("LIVE_TALLY_USER").unwrap_or_else(|_| "local".to_string()),
        }
    }

    pub fn session(&self) -> Session {
        Session::new(self.user_id.clone(), self.role)
    }
}

// Parses `key`, falling back to `default` when unset or invalid
fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {} value '{}': {}, using default {}", key, raw, e, default);
            default
        }),
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_values_fall_back_to_defaults() {
        assert_eq!(try_load("LIVE_TALLY_TEST_UNSET_KEY", 7u32), 7);
        assert_eq!(try_load("LIVE_TALLY_TEST_UNSET_ROLE", Role::Admin), Role::Admin);
    }
}
