//! Topic-based publish/subscribe hub.
//!
//! Producers `publish()` a payload on a named topic and every subscriber registered on that topic
//! gets it, in subscription order.  Subscribers say how they want to be called:
//!
//! - `Dispatch::Inline` ones run on the publisher's thread before `publish()` returns,
//! - `Dispatch::Background` ones are handed to the bounded `WorkerPool` and `publish()` does not
//!   wait for them.
//!
//! A failing or panicking subscriber never affects the others nor the publisher, it is logged and
//! counted in the returned `Delivery`.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use skytrack_engine::{Dispatch, Hub, PoolConfig, Subscriber, WorkerPool};
//! struct Echo;
//!
//! impl Subscriber<String> for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn handle(&self, payload: &String) -> eyre::Result<()> {
//!         println!("{payload}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> eyre::Result<()> {
//! let hub = Hub::new(WorkerPool::new(&PoolConfig::default())?);
//! hub.create_topic("points");
//! hub.subscribe("points", Arc::new(Echo))?;
//! let d = hub.publish("points", "hello".to_string())?;
//! assert_eq!(1, d.inline);
//! # Ok(())
//! # }
//! ```
//!

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, error, trace, warn};

pub use pool::*;

use crate::HubError;

mod pool;

/// Where a subscriber runs.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Dispatch {
    /// On the publisher's thread
    #[default]
    Inline,
    /// In the worker pool
    Background,
}

/// Anything that wants to be told about payloads published on a topic.
///
pub trait Subscriber<P>: Send + Sync {
    /// Used in logs
    fn name(&self) -> &str;

    fn dispatch(&self) -> Dispatch {
        Dispatch::Inline
    }

    fn handle(&self, payload: &P) -> eyre::Result<()>;
}

/// Subscribers are registered and compared by `Arc` identity.
pub type Handler<P> = Arc<dyn Subscriber<P>>;

/// Outcome of a `publish()`.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Inline subscribers that returned fine
    pub inline: usize,
    /// Jobs handed to the pool
    pub queued: usize,
    /// Inline subscribers that failed or panicked
    pub failed: usize,
    /// Jobs refused by the pool
    pub dropped: usize,
}

impl Delivery {
    /// Total number of subscribers seen.
    ///
    pub fn total(&self) -> usize {
        self.inline + self.queued + self.failed + self.dropped
    }
}

impl Display for Delivery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "inline={} queued={} failed={} dropped={}",
            self.inline, self.queued, self.failed, self.dropped
        )
    }
}

pub struct Hub<P> {
    topics: RwLock<BTreeMap<String, Vec<Handler<P>>>>,
    pool: WorkerPool,
}

impl<P> Hub<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(pool: WorkerPool) -> Self {
        Hub {
            topics: RwLock::new(BTreeMap::new()),
            pool,
        }
    }

    /// Register a topic, returns `false` if it was already there (and leaves it alone).
    ///
    #[tracing::instrument(skip(self))]
    pub fn create_topic(&self, name: &str) -> bool {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        if topics.contains_key(name) {
            trace!("topic {name} already exists");
            return false;
        }
        topics.insert(name.to_owned(), vec![]);
        debug!("topic {name} created");
        true
    }

    /// Registered topics, sorted.
    ///
    pub fn topics(&self) -> Vec<String> {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics.keys().cloned().collect()
    }

    /// Number of subscribers on `topic`.
    ///
    pub fn subscribers(&self, topic: &str) -> Result<usize, HubError> {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics
            .get(topic)
            .map(Vec::len)
            .ok_or_else(|| HubError::UnknownTopic(topic.to_owned()))
    }

    /// Add `handler` at the end of the list, subscribing the same handler twice does nothing.
    ///
    #[tracing::instrument(skip(self, handler), fields(handler = handler.name()))]
    pub fn subscribe(&self, topic: &str, handler: Handler<P>) -> Result<(), HubError> {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        let subs = topics
            .get_mut(topic)
            .ok_or_else(|| HubError::UnknownTopic(topic.to_owned()))?;

        if subs.iter().any(|h| same(h, &handler)) {
            trace!("already subscribed");
            return Ok(());
        }
        subs.push(handler);
        Ok(())
    }

    /// Remove `handler` from `topic`, unknown topics and handlers are ignored.
    ///
    #[tracing::instrument(skip(self, handler), fields(handler = handler.name()))]
    pub fn unsubscribe(&self, topic: &str, handler: &Handler<P>) {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(subs) = topics.get_mut(topic) {
            subs.retain(|h| !same(h, handler));
        }
    }

    /// Deliver `payload` to every subscriber of `topic`.
    ///
    /// Returns once all inline subscribers are done, background ones may still be queued or
    /// running.
    ///
    #[tracing::instrument(skip(self, payload))]
    pub fn publish(&self, topic: &str, payload: P) -> Result<Delivery, HubError> {
        // Work on a copy of the list so handlers can (un)subscribe.
        //
        let subs = {
            let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
            topics
                .get(topic)
                .cloned()
                .ok_or_else(|| HubError::UnknownTopic(topic.to_owned()))?
        };

        let payload = Arc::new(payload);
        let mut delivery = Delivery::default();

        for sub in subs {
            match sub.dispatch() {
                Dispatch::Inline => {
                    match catch_unwind(AssertUnwindSafe(|| sub.handle(&payload))) {
                        Ok(Ok(())) => delivery.inline += 1,
                        Ok(Err(e)) => {
                            warn!("subscriber {} failed: {e}", sub.name());
                            delivery.failed += 1;
                        }
                        Err(_) => {
                            error!("subscriber {} panicked", sub.name());
                            delivery.failed += 1;
                        }
                    }
                }
                Dispatch::Background => {
                    let name = format!("{topic}/{}", sub.name());
                    let payload = Arc::clone(&payload);
                    let job = Job::new(&name, move || sub.handle(&payload));

                    match self.pool.submit(job) {
                        Ok(()) => delivery.queued += 1,
                        Err(e) => {
                            warn!("{e}");
                            delivery.dropped += 1;
                        }
                    }
                }
            }
        }
        trace!("{topic}: {delivery}");
        Ok(delivery)
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Stop accepting background work and wait for the queued jobs.
    ///
    pub async fn shutdown(&self) -> PoolStats {
        self.pool.shutdown().await
    }
}

fn same<P>(a: &Handler<P>, b: &Handler<P>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    /// Records what it sees.
    struct Recorder {
        name: String,
        seen: Mutex<Vec<u32>>,
    }

    impl Recorder {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Recorder {
                name: name.into(),
                seen: Mutex::new(vec![]),
            })
        }

        fn seen(&self) -> Vec<u32> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Subscriber<u32> for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn handle(&self, payload: &u32) -> eyre::Result<()> {
            self.seen.lock().unwrap().push(*payload);
            Ok(())
        }
    }

    /// Appends its name to a shared log.
    struct Ordered {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Subscriber<u32> for Ordered {
        fn name(&self) -> &str {
            self.name
        }

        fn handle(&self, _: &u32) -> eyre::Result<()> {
            self.log.lock().unwrap().push(self.name);
            Ok(())
        }
    }

    struct Failing;

    impl Subscriber<u32> for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn handle(&self, _: &u32) -> eyre::Result<()> {
            Err(eyre::eyre!("no luck"))
        }
    }

    struct Panicking;

    impl Subscriber<u32> for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn handle(&self, _: &u32) -> eyre::Result<()> {
            panic!("boom")
        }
    }

    /// Background subscriber that waits for a go before finishing.
    struct Gated {
        gate: Mutex<mpsc::Receiver<()>>,
        done: AtomicUsize,
    }

    impl Subscriber<u32> for Gated {
        fn name(&self) -> &str {
            "gated"
        }

        fn dispatch(&self) -> Dispatch {
            Dispatch::Background
        }

        fn handle(&self, _: &u32) -> eyre::Result<()> {
            self.gate.lock().unwrap().recv()?;
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn hub() -> Hub<u32> {
        Hub::new(WorkerPool::new(&PoolConfig::default()).unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_topic_idempotent() {
        let hub = hub();
        assert!(hub.create_topic("points"));
        let r = Recorder::new("r");
        hub.subscribe("points", r.clone()).unwrap();

        assert!(!hub.create_topic("points"));
        assert_eq!(Ok(1), hub.subscribers("points"));
        assert_eq!(vec!["points".to_string()], hub.topics());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_publish_no_subscribers() {
        let hub = hub();
        hub.create_topic("points");
        assert_eq!(Ok(Delivery::default()), hub.publish("points", 42));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_topic() {
        let hub = hub();
        assert_eq!(
            Err(HubError::UnknownTopic("missing-topic".into())),
            hub.subscribe("missing-topic", Recorder::new("r"))
        );
        assert_eq!(
            Err(HubError::UnknownTopic("nowhere".into())),
            hub.publish("nowhere", 1)
        );
        assert!(hub.subscribers("nowhere").is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscription_order() {
        let hub = hub();
        hub.create_topic("t");
        let log = Arc::new(Mutex::new(vec![]));
        for name in ["first", "second", "third"] {
            let s = Arc::new(Ordered {
                name,
                log: log.clone(),
            });
            hub.subscribe("t", s).unwrap();
        }
        hub.publish("t", 0).unwrap();
        assert_eq!(vec!["first", "second", "third"], *log.lock().unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscribe_twice() {
        let hub = hub();
        hub.create_topic("t");
        let r = Recorder::new("r");
        hub.subscribe("t", r.clone()).unwrap();
        hub.subscribe("t", r.clone()).unwrap();

        let d = hub.publish("t", 7).unwrap();
        assert_eq!(1, d.inline);
        assert_eq!(vec![7], r.seen());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unsubscribe() {
        let hub = hub();
        hub.create_topic("t");
        let a = Recorder::new("a");
        let b = Recorder::new("b");
        let ha: Handler<u32> = a.clone();
        hub.subscribe("t", ha.clone()).unwrap();
        hub.subscribe("t", b.clone()).unwrap();

        hub.unsubscribe("t", &ha);
        hub.unsubscribe("t", &ha);
        hub.unsubscribe("nowhere", &ha);

        hub.publish("t", 1).unwrap();
        assert!(a.seen().is_empty());
        assert_eq!(vec![1], b.seen());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failures_are_isolated() {
        let hub = hub();
        hub.create_topic("t");
        let r = Recorder::new("r");
        hub.subscribe("t", Arc::new(Failing)).unwrap();
        hub.subscribe("t", Arc::new(Panicking)).unwrap();
        hub.subscribe("t", r.clone()).unwrap();

        let d = hub.publish("t", 3).unwrap();
        assert_eq!(2, d.failed);
        assert_eq!(1, d.inline);
        assert_eq!(vec![3], r.seen());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_inline_not_held_by_background() {
        let hub = hub();
        hub.create_topic("points");

        let (go, gate) = mpsc::channel();
        let slow = Arc::new(Gated {
            gate: Mutex::new(gate),
            done: AtomicUsize::new(0),
        });
        let fast = Recorder::new("fast");
        hub.subscribe("points", slow.clone()).unwrap();
        hub.subscribe("points", fast.clone()).unwrap();

        let d = hub.publish("points", 9).unwrap();
        assert_eq!(1, d.queued);
        assert_eq!(1, d.inline);

        // The background one is still waiting, the inline one is done.
        //
        assert_eq!(vec![9], fast.seen());
        assert_eq!(0, slow.done.load(Ordering::SeqCst));

        go.send(()).unwrap();
        let stats = hub.shutdown().await;
        assert_eq!(1, stats.done);
        assert_eq!(1, slow.done.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_background_dropped_when_closed() {
        let hub = hub();
        hub.create_topic("t");
        let (_go, gate) = mpsc::channel();
        hub.subscribe(
            "t",
            Arc::new(Gated {
                gate: Mutex::new(gate),
                done: AtomicUsize::new(0),
            }),
        )
        .unwrap();
        hub.shutdown().await;

        let d = hub.publish("t", 1).unwrap();
        assert_eq!(1, d.dropped);
        assert_eq!(Duration::from_secs(10), hub.pool().timeout());
    }
}
