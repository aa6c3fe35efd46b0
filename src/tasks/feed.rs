use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::db::CollectionStore;
use crate::models::Record;

#[derive(Debug, Clone)]
pub enum Delivery<R> {
    Pending,
    Snapshot(Snapshot<R>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    pub records: Arc<[R]>,
}

// Dropping the handle stops the feed. A consumer that falls behind only sees the newest delivery.
pub struct Subscription<R: Record> {
    receiver: watch::Receiver<Delivery<R>>,
    task: JoinHandle<()>,
}

impl<R: Record> Subscription<R> {
    // Waits for the next delivery. `None` once the feed has stopped.
    pub async fn changed(&mut self) -> Option<Delivery<R>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn latest(&self) -> Delivery<R> {
        self.receiver.borrow().clone()
    }

    pub fn cancel(self) {
        info!("Cancelling {} subscription", R::COLLECTION);
    }
}

impl<R: Record> Drop for Subscription<R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// Starts pulling full snapshots of `R`'s collection every `every`.
pub fn subscribe<R: Record>(store: Arc<dyn CollectionStore>, every: Duration) -> Subscription<R> {
    let (sender, receiver) = watch::channel(Delivery::Pending);
    info!("Subscribing to {} every {:?}", R::COLLECTION, every);
    let task = tokio::spawn(run_feed(store, sender, every));
    Subscription { receiver, task }
}

async fn run_feed<R: Record>(
    store: Arc<dyn CollectionStore>,
    sender: watch::Sender<Delivery<R>>,
    every: Duration,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_records: Option<Arc<[R]>> = None;
    let mut last_failure: Option<String> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = sender.closed() => break,
        }

        let delivery = match store.fetch(R::COLLECTION).await.and_then(R::unpack) {
            Ok(records) => {
                let unchanged = last_records.as_deref() == Some(records.as_slice());
                if unchanged && last_failure.is_none() {
                    debug!("{} unchanged ({} records)", R::COLLECTION, records.len());
                    continue;
                }
                last_failure = None;
                let records: Arc<[R]> = records.into();
                last_records = Some(Arc::clone(&records));
                Delivery::Snapshot(Snapshot { records })
            }
            Err(e) => {
                let message = e.to_string();
                error!("Failed to fetch {}: {}", R::COLLECTION, message);
                if last_failure.as_deref() == Some(message.as_str()) {
                    continue;
                }
                last_failure = Some(message.clone());
                Delivery::Failed(message)
            }
        };

        if sender.send(delivery).is_err() {
            break;
        }
    }

    info!("{} feed stopped", R::COLLECTION);
}
