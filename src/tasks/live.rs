use std::sync::Arc;
use std::time::Duration;

use crate::access::authorize_collection;
use crate::db::CollectionStore;
use crate::error::{AccessError, FeedError};
use crate::models::Session;
use crate::tasks::feed::{Delivery, Subscription, subscribe};
use crate::voting::Summarize;

pub struct LiveSummary<R: Summarize> {
    feed: Subscription<R>,
}

impl<R: Summarize> LiveSummary<R> {
    pub fn new(feed: Subscription<R>) -> Self {
        Self { feed }
    }

    // `None` once the feed has stopped
    pub async fn next(&mut self) -> Option<Result<R::Summary, FeedError>> {
        loop {
            match self.feed.changed().await? {
                Delivery::Pending => continue,
                Delivery::Snapshot(snapshot) => return Some(Ok(R::summarize(&snapshot.records))),
                Delivery::Failed(message) => return Some(Err(FeedError::Delivery(message))),
            }
        }
    }

    pub fn cancel(self) {
        self.feed.cancel();
    }
}

// Opens a live summary of `R`'s collection if `session` may see it.
pub fn watch_summary<R: Summarize>(
    store: Arc<dyn CollectionStore>,
    session: &Session,
    every: Duration,
) -> Result<LiveSummary<R>, AccessError> {
    authorize_collection(session, R::COLLECTION)?;
    Ok(LiveSummary::new(subscribe(store, every)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Collection, Record, Role, VoteRecord, VoterRecord};
    use crate::voting::round_tenth;

    const EVERY: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn vote_summary_follows_the_store() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new("u1", Role::Voter);
        let mut live = watch_summary::<VoteRecord>(store.clone(), &session, EVERY).unwrap();

        let empty = live.next().await.unwrap().unwrap();
        assert_eq!(empty.total_votes, 0);
        assert!(empty.leader.is_none());

        for _ in 0..3 {
            store.cast_vote("B").await.unwrap();
        }
        store.cast_vote("A").await.unwrap();
        let summary = live.next().await.unwrap().unwrap();
        assert_eq!(summary.total_votes, 4);
        assert_eq!(summary.leader.map(|l| l.candidate), Some("B".to_string()));
        live.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn voter_summary_reports_failures() {
        let store = Arc::new(MemoryStore::with_voters(
            [("A", "a@x.org"), ("B", "b@x.org"), ("C", "c@x.org")]
                .into_iter()
                .map(|(name, email)| VoterRecord::new(name.to_string(), email.to_string()))
                .collect(),
        ));
        let session = Session::new("admin", Role::Admin);
        let mut live = watch_summary::<VoterRecord>(store.clone(), &session, EVERY).unwrap();
        assert_eq!(live.next().await.unwrap().unwrap().verified_count, 0);

        let voters = match store.fetch(VoterRecord::COLLECTION).await.unwrap() {
            Collection::Voters(records) => records,
            other => panic!("unexpected {:?}", other.name()),
        };
        store.approve_voter(&voters[0].id).await.unwrap();
        store.approve_voter(&voters[2].id).await.unwrap();
        let summary = live.next().await.unwrap().unwrap();
        assert_eq!((summary.verified_count, summary.pending_count), (2, 1));
        assert_eq!(round_tenth(summary.verified_ratio), 66.7);

        store.set_failure(Some("quota exceeded"));
        assert!(matches!(live.next().await, Some(Err(FeedError::Delivery(_)))));
    }

    #[tokio::test]
    async fn voters_are_admin_only() {
        let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
        let session = Session::new("u1", Role::Voter);
        let refused = watch_summary::<VoterRecord>(store, &session, EVERY);
        assert!(matches!(refused, Err(AccessError::Forbidden { .. })));
    }
}
