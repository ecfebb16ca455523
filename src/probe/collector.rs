// src/probe/collector.rs
// =============================================================================
// This module is the concurrent result-aggregation engine.
//
// The protocol, per collector instance:
// 1. new()      - spawns the single consumer task, then hands back the
//                 collector. The consumer is guaranteed to be draining the
//                 channel before any producer can send.
// 2. dispatch() - counts the request, then spawns one task that executes it
//                 and sends its single ProbeResult on the shared channel.
//                 May be called any number of times, including zero.
// 3. wait()     - consumes the collector. Dropping our sender closes the
//                 channel once every in-flight producer has sent and dropped
//                 its clone; the consumer then finishes its loop and returns
//                 the buckets as a sealed ResultSet.
//
// The consumer task is the only writer to the buckets, so they need no lock.
// Buckets are unreachable until wait() returns - the type system enforces
// the "read only after completion" rule, no runtime state checks needed.
//
// Bucket ordering reflects completion order, which is non-deterministic
// under concurrency. That is a documented property, not a bug.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::request::{ProbeRequest, Requester};
use super::result::ProbeResult;

// Minimal buffering: producers park on send until the consumer takes the
// previous result, which keeps memory flat for any fan-out size.
const CHANNEL_CAPACITY: usize = 1;

#[derive(Default)]
struct Buckets {
    succeeded: Vec<ProbeResult>,
    errored: Vec<ProbeResult>,
}

// Accepts dispatches and funnels their results into buckets
pub struct ResourceCollector {
    tx: mpsc::Sender<ProbeResult>,
    consumer: JoinHandle<Buckets>,
    dispatched: usize,
}

impl ResourceCollector {
    /// Creates a collector with its consumer task already running
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::channel::<ProbeResult>(CHANNEL_CAPACITY);

        // The single consumer: classifies every received result exactly once.
        // A result with no error succeeded; everything else errored. The loop
        // ends when the channel closes, i.e. when wait() has dropped our
        // sender and every producer has finished.
        let consumer = tokio::spawn(async move {
            let mut buckets = Buckets::default();
            while let Some(result) = rx.recv().await {
                if result.is_success() {
                    buckets.succeeded.push(result);
                } else {
                    buckets.errored.push(result);
                }
            }
            buckets
        });

        ResourceCollector {
            tx,
            consumer,
            dispatched: 0,
        }
    }

    /// Starts one concurrent request against the shared requester
    ///
    /// The count is bumped before the task spawns, so a dispatch can never
    /// be in flight without being accounted for. wait() consuming `self`
    /// makes dispatch-after-wait unrepresentable.
    pub fn dispatch(&mut self, requester: Arc<dyn Requester>, url: &str) {
        self.dispatched += 1;

        let request = ProbeRequest::get(url, requester);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            request.exec_async(tx).await;
        });
    }

    /// Blocks until every dispatched request has been classified
    ///
    /// Consumes the collector; the returned ResultSet is the only way to
    /// read the buckets.
    pub async fn wait(self) -> Result<ResultSet> {
        let ResourceCollector {
            tx,
            consumer,
            dispatched,
        } = self;

        // Our sender is the last one not owned by a producer task. Dropping
        // it means the channel closes exactly when all producers are done.
        drop(tx);

        let buckets = consumer
            .await
            .context("result collector consumer task failed")?;

        Ok(ResultSet {
            dispatched,
            succeeded: buckets.succeeded,
            errored: buckets.errored,
        })
    }
}

impl Default for ResourceCollector {
    fn default() -> Self {
        Self::new()
    }
}

// The sealed outcome of a dispatch-then-wait round
//
// Every dispatched request appears in exactly one bucket:
// succeeded.len() + errored.len() == dispatched().
pub struct ResultSet {
    dispatched: usize,
    succeeded: Vec<ProbeResult>,
    errored: Vec<ProbeResult>,
}

impl ResultSet {
    /// Results that completed without error, in completion order
    pub fn succeeded(&self) -> &[ProbeResult] {
        &self.succeeded
    }

    /// Results that failed, in completion order
    pub fn errored(&self) -> &[ProbeResult] {
        &self.errored
    }

    /// How many requests were dispatched in total
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Total number of collected results
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.errored.len()
    }

    /// The successful result with the longest timing
    ///
    /// Strict comparison: on equal timings the first-completed result wins.
    /// Returns None when nothing succeeded - callers must handle the empty
    /// case rather than assume a zero-duration result.
    pub fn longest_successful(&self) -> Option<&ProbeResult> {
        let mut longest: Option<&ProbeResult> = None;
        for result in &self.succeeded {
            match longest {
                Some(current) if result.timing > current.timing => longest = Some(result),
                None => longest = Some(result),
                _ => {}
            }
        }
        longest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::error::{ProbeError, TransportKind};
    use crate::probe::testutil::FakeRequester;
    use std::time::Duration;

    fn result_with_timing(url: &str, millis: u64) -> ProbeResult {
        ProbeResult::completed(url.to_string(), 200, Duration::from_millis(millis))
    }

    #[tokio::test]
    async fn test_zero_dispatches_yields_empty_buckets() {
        let collector = ResourceCollector::new();
        let set = collector.wait().await.unwrap();

        assert_eq!(set.dispatched(), 0);
        assert_eq!(set.total(), 0);
        assert!(set.succeeded().is_empty());
        assert!(set.errored().is_empty());
        assert!(set.longest_successful().is_none());
    }

    #[tokio::test]
    async fn test_every_dispatch_lands_in_exactly_one_bucket() {
        // 100 dispatches against an always-succeeding requester: all of them
        // must come back, all in the success bucket.
        let requester = Arc::new(FakeRequester::ok(200, ""));
        let mut collector = ResourceCollector::new();

        for i in 0..100 {
            collector.dispatch(requester.clone(), &format!("https://example.com/r/{}", i));
        }

        let set = collector.wait().await.unwrap();
        assert_eq!(set.dispatched(), 100);
        assert_eq!(set.succeeded().len(), 100);
        assert_eq!(set.errored().len(), 0);
        assert_eq!(requester.hits(), 100);
    }

    #[tokio::test]
    async fn test_single_dispatch() {
        let requester = Arc::new(FakeRequester::ok(200, ""));
        let mut collector = ResourceCollector::new();
        collector.dispatch(requester, "https://example.com/only");

        let set = collector.wait().await.unwrap();
        assert_eq!(set.total(), 1);
        assert_eq!(set.succeeded().len(), 1);
    }

    #[tokio::test]
    async fn test_partition_under_mixed_outcomes() {
        // Failures, successes and unbuildable URLs together: the buckets
        // must form a strict partition of everything dispatched.
        let requester = Arc::new(
            FakeRequester::ok(200, "")
                .route_fail("unreachable", TransportKind::Connect)
                .route_fail("slowhost", TransportKind::Timeout),
        );
        let mut collector = ResourceCollector::new();

        collector.dispatch(requester.clone(), "https://example.com/a.js");
        collector.dispatch(requester.clone(), "https://unreachable.example.com/b.css");
        collector.dispatch(requester.clone(), "https://example.com/c.png");
        collector.dispatch(requester.clone(), "https://slowhost.example.com/d.js");
        collector.dispatch(requester.clone(), "not a url at all");

        let set = collector.wait().await.unwrap();
        assert_eq!(set.dispatched(), 5);
        assert_eq!(set.succeeded().len() + set.errored().len(), 5);
        assert_eq!(set.succeeded().len(), 2);
        assert_eq!(set.errored().len(), 3);

        // the unbuildable URL never reached the requester but still got
        // collected as an errored result
        assert_eq!(requester.hits(), 4);
        assert!(set
            .errored()
            .iter()
            .any(|r| matches!(r.error, Some(ProbeError::Configuration { .. }))));
    }

    #[tokio::test]
    async fn test_slow_requests_are_not_lost() {
        // wait() must block until even the slowest producer has reported.
        let requester =
            Arc::new(FakeRequester::ok(200, "").with_delay(Duration::from_millis(50)));
        let mut collector = ResourceCollector::new();

        for i in 0..8 {
            collector.dispatch(requester.clone(), &format!("https://example.com/{}", i));
        }

        let set = collector.wait().await.unwrap();
        assert_eq!(set.total(), 8);
    }

    #[test]
    fn test_longest_successful_takes_strict_maximum() {
        let set = ResultSet {
            dispatched: 3,
            succeeded: vec![
                result_with_timing("https://example.com/a", 30),
                result_with_timing("https://example.com/b", 90),
                result_with_timing("https://example.com/c", 60),
            ],
            errored: vec![],
        };

        let longest = set.longest_successful().unwrap();
        assert_eq!(longest.url, "https://example.com/b");
    }

    #[test]
    fn test_longest_successful_tie_goes_to_first_completed() {
        let set = ResultSet {
            dispatched: 2,
            succeeded: vec![
                result_with_timing("https://example.com/first", 75),
                result_with_timing("https://example.com/second", 75),
            ],
            errored: vec![],
        };

        let longest = set.longest_successful().unwrap();
        assert_eq!(longest.url, "https://example.com/first");
    }

    #[test]
    fn test_longest_successful_ignores_errored_results() {
        let set = ResultSet {
            dispatched: 2,
            succeeded: vec![result_with_timing("https://example.com/ok", 10)],
            errored: vec![ProbeResult::failed(
                "https://example.com/slow-failure".to_string(),
                ProbeError::transport(TransportKind::Timeout, "deadline exceeded"),
                Duration::from_millis(30_000),
            )],
        };

        let longest = set.longest_successful().unwrap();
        assert_eq!(longest.url, "https://example.com/ok");
    }
}
