mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, migrate::MigrateDatabase};

use crate::error::StoreError;
use crate::models::{Collection, CollectionName, QueueEntry, VoteRecord, VoterRecord};

// `fetch` always returns the whole collection, never a diff
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn fetch(&self, name: CollectionName) -> Result<Collection, StoreError>;

    // Adds one vote for `candidate`, creating its record on first vote.
    async fn cast_vote(&self, candidate: &str) -> Result<VoteRecord, StoreError>;

    async fn register_voter(&self, name: &str, email: &str) -> Result<VoterRecord, StoreError>;

    async fn approve_voter(&self, voter_id: &str) -> Result<(), StoreError>;

    async fn join_queue(&self, name: &str) -> Result<QueueEntry, StoreError>;

    // Serves the lowest waiting token, if any.
    async fn call_next(&self) -> Result<Option<QueueEntry>, StoreError>;

    // Waiting (unserved) entries, lowest token first.
    async fn queue(&self) -> Result<Vec<QueueEntry>, StoreError>;

    async fn queue_entry(&self, token: u32) -> Result<QueueEntry, StoreError>;

    // Last token served, 0 before anyone was called.
    async fn now_serving(&self) -> Result<u32, StoreError>;
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self, StoreError> {
        let in_memory = db_url.contains(":memory:");

        // Create database if it doesn't exist
        if !in_memory && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        // An in-memory database lives and dies with its single connection
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(db_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id TEXT PRIMARY KEY,
                candidate TEXT NOT NULL UNIQUE,
                vote_count INTEGER NOT NULL DEFAULT 0,
                recorded_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS voters (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                verified BOOLEAN NOT NULL DEFAULT FALSE,
                registered_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue (
                token INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                serving_at_join INTEGER NOT NULL,
                served BOOLEAN NOT NULL DEFAULT FALSE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn fetch_votes(&self) -> Result<Vec<VoteRecord>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, candidate, vote_count, recorded_at
            FROM votes
            ORDER BY recorded_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(vote_from_row)
        .collect()
    }

    async fn fetch_voters(&self) -> Result<Vec<VoterRecord>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, name, email, verified, registered_at
            FROM voters
            ORDER BY registered_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(voter_from_row)
        .collect()
    }
}

#[async_trait]
impl CollectionStore for Database {
    async fn fetch(&self, name: CollectionName) -> Result<Collection, StoreError> {
        match name {
            CollectionName::Votes => Ok(Collection::Votes(self.fetch_votes().await?)),
            CollectionName::Voters => Ok(Collection::Voters(self.fetch_voters().await?)),
        }
    }

    async fn cast_vote(&self, candidate: &str) -> Result<VoteRecord, StoreError> {
        let fresh = VoteRecord::new(candidate.to_string());
        let row = sqlx::query(
            r#"
            INSERT INTO votes (id, candidate, vote_count, recorded_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(candidate)
            DO UPDATE SET vote_count = vote_count + 1
            RETURNING id, candidate, vote_count, recorded_at
            "#,
        )
        .bind(&fresh.id)
        .bind(&fresh.candidate)
        .bind(format_timestamp(fresh.recorded_at))
        .fetch_one(&self.pool)
        .await?;

        vote_from_row(&row)
    }

    async fn register_voter(&self, name: &str, email: &str) -> Result<VoterRecord, StoreError> {
        let voter = VoterRecord::new(name.to_string(), email.to_string());
        sqlx::query(
            r#"
            INSERT INTO voters (id, name, email, verified, registered_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&voter.id)
        .bind(&voter.name)
        .bind(&voter.email)
        .bind(voter.verified)
        .bind(format_timestamp(voter.registered_at))
        .execute(&self.pool)
        .await?;

        Ok(voter)
    }

    async fn approve_voter(&self, voter_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE voters
            SET verified = TRUE
            WHERE id = ?
            "#,
        )
        .bind(voter_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("voter {}", voter_id)));
        }
        Ok(())
    }

    async fn join_queue(&self, name: &str) -> Result<QueueEntry, StoreError> {
        let mut tx = self.pool.begin().await?;

        let serving: i64 = sqlx::query(
            "SELECT COALESCE(MAX(token), 0) AS serving FROM queue WHERE served = TRUE",
        )
        .fetch_one(&mut *tx)
        .await?
        .try_get("serving")?;

        let joined_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO queue (name, joined_at, serving_at_join, served)
            VALUES (?, ?, ?, FALSE)
            RETURNING token, name, joined_at, serving_at_join, served
            "#,
        )
        .bind(name)
        .bind(format_timestamp(joined_at))
        .bind(serving)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        queue_entry_from_row(&row)
    }

    async fn call_next(&self) -> Result<Option<QueueEntry>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE queue
            SET served = TRUE
            WHERE token = (SELECT MIN(token) FROM queue WHERE served = FALSE)
            RETURNING token, name, joined_at, serving_at_join, served
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(queue_entry_from_row).transpose()
    }

    async fn queue(&self) -> Result<Vec<QueueEntry>, StoreError> {
        sqlx::query(
            r#"
            SELECT token, name, joined_at, serving_at_join, served
            FROM queue
            WHERE served = FALSE
            ORDER BY token ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(queue_entry_from_row)
        .collect()
    }

    async fn queue_entry(&self, token: u32) -> Result<QueueEntry, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT token, name, joined_at, serving_at_join, served
            FROM queue
            WHERE token = ?
            "#,
        )
        .bind(i64::from(token))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("token #{}", token)))?;

        queue_entry_from_row(&row)
    }

    async fn now_serving(&self) -> Result<u32, StoreError> {
        let serving: i64 = sqlx::query(
            "SELECT COALESCE(MAX(token), 0) AS serving FROM queue WHERE served = TRUE",
        )
        .fetch_one(&self.pool)
        .await?
        .try_get("serving")?;

        to_token(serving)
    }
}

fn vote_from_row(row: &SqliteRow) -> Result<VoteRecord, StoreError> {
    let vote_count: i64 = row.try_get("vote_count")?;
    Ok(VoteRecord {
        id: row.try_get("id")?,
        candidate: row.try_get("candidate")?,
        vote_count: u64::try_from(vote_count)
            .map_err(|_| StoreError::Malformed(format!("negative vote count {}", vote_count)))?,
        recorded_at: parse_timestamp(&row.try_get::<String, _>("recorded_at")?)?,
    })
}

fn voter_from_row(row: &SqliteRow) -> Result<VoterRecord, StoreError> {
    Ok(VoterRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        verified: row.try_get("verified")?,
        registered_at: parse_timestamp(&row.try_get::<String, _>("registered_at")?)?,
    })
}

fn queue_entry_from_row(row: &SqliteRow) -> Result<QueueEntry, StoreError> {
    Ok(QueueEntry {
        token: to_token(row.try_get("token")?)?,
        name: row.try_get("name")?,
        joined_at: parse_timestamp(&row.try_get::<String, _>("joined_at")?)?,
        serving_at_join: to_token(row.try_get("serving_at_join")?)?,
        served: row.try_get("served")?,
    })
}

// Fixed-width so that text ordering matches time ordering
fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("bad timestamp '{}': {}", value, e)))
}

fn to_token(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Malformed(format!("token out of range: {}", value)))
}
