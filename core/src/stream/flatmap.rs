//! Backpressure-aware event-stream plumbing.
//!
//! The [`FlatMapProcessor`] lifts decoded upstream items into zero or
//! more downstream items under a demand-driven subscription model. It is
//! single-threaded and cooperative: no internal thread is spawned, and
//! delivery happens on whichever caller thread invokes `on_next` or
//! `request`. Correctness rests on the `pending_flushes` serialization
//! counter: the caller that moves it from zero owns the drain loop, and
//! re-entrant invocations are flattened into that loop.

use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use crossbeam_queue::SegQueue;
use thiserror::Error;

use crate::Ref;

/// Errors surfaced through the streaming contract.
#[derive(Error, Debug, Clone)]
pub enum FlowError {
    #[error("Demand must be positive, got {0}")]
    InvalidDemand(i64),
    #[error("Stream is not fully wired: {0}")]
    IllegalState(&'static str),
    #[error("Failed to map stream item: {0}")]
    Mapper(String),
    #[error("Malformed frame: {0}")]
    Frame(String),
}

/// A framed byte payload delimiting one event in an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn new(payload: Vec<u8>) -> Frame {
        Frame { payload }
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Splits raw bytes into event frames.
pub trait FrameDecoder: Send {
    /// One-time setup before the first decoded emission.
    fn prepare(&mut self) {
        /* Do nothing by default */
    }

    /// Decode zero or more complete frames from a chunk of bytes,
    /// buffering any partial frame for the next call.
    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, FlowError>;
}

/// Encodes event frames into raw bytes.
pub trait FrameEncoder: Send {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<u8>, FlowError>;
}

/// Demand-driven handle from a subscriber to its upstream.
pub trait Subscription: Send + Sync {
    /// Request `n` more items. Non-positive demand is a protocol error
    /// reported to the downstream subscriber.
    fn request(&self, n: i64);

    /// Stop the upstream from emitting further items. In-flight `on_next`
    /// invocations still complete.
    fn cancel(&self);
}

/// Receiver of a stream of items.
pub trait Subscriber<T>: Send + Sync {
    fn on_subscribe(&self, subscription: Ref<dyn Subscription>);
    fn on_next(&self, item: T);
    fn on_error(&self, error: FlowError);
    fn on_complete(&self);
}

/// Source of a stream of items.
pub trait Publisher<T>: Send + Sync {
    fn subscribe(self: Ref<Self>, subscriber: Ref<dyn Subscriber<T>>);
}

enum Terminal {
    Complete,
    Error(FlowError),
}

type Mapper<I, O> = dyn Fn(I) -> Result<Vec<O>, FlowError> + Send + Sync;

/// Buffering, backpressure-aware processor mapping upstream items of type
/// `I` into zero or more downstream items of type `O`.
///
/// Mapped outputs are buffered in an unbounded FIFO and delivered on
/// demand; per subscriber, items are delivered in upstream arrival order,
/// and all output for an upstream item is delivered before any output
/// from later items.
pub struct FlatMapProcessor<I, O> {
    mapper: Box<Mapper<I, O>>,
    prepare: Option<Box<dyn Fn() + Send + Sync>>,
    prepared: AtomicBool,
    queue: SegQueue<O>,
    pending_requests: AtomicI64,
    pending_flushes: AtomicUsize,
    terminal: OnceLock<Terminal>,
    terminated: AtomicBool,
    upstream: Mutex<Option<Ref<dyn Subscription>>>,
    downstream: Mutex<Option<Ref<dyn Subscriber<O>>>>,
}

impl<I: Send + 'static, O: Send + 'static> FlatMapProcessor<I, O> {
    #[must_use]
    pub fn new(
        mapper: impl Fn(I) -> Result<Vec<O>, FlowError> + Send + Sync + 'static,
    ) -> Ref<FlatMapProcessor<I, O>> {
        Ref::new(FlatMapProcessor {
            mapper: Box::new(mapper),
            prepare: None,
            prepared: AtomicBool::new(false),
            queue: SegQueue::new(),
            pending_requests: AtomicI64::new(0),
            pending_flushes: AtomicUsize::new(0),
            terminal: OnceLock::new(),
            terminated: AtomicBool::new(false),
            upstream: Mutex::new(None),
            downstream: Mutex::new(None),
        })
    }

    /// Create a processor with a one-time hook run before the first
    /// emission; used by frame and event decoders for deferred setup.
    #[must_use]
    pub fn with_prepare(
        mapper: impl Fn(I) -> Result<Vec<O>, FlowError> + Send + Sync + 'static,
        prepare: impl Fn() + Send + Sync + 'static,
    ) -> Ref<FlatMapProcessor<I, O>> {
        let processor = Self::new(mapper);
        // The processor was just created; there is exactly one reference.
        let mut inner = Ref::try_unwrap(processor)
            .unwrap_or_else(|_| unreachable!("processor is uniquely owned"));
        inner.prepare = Some(Box::new(prepare));
        Ref::new(inner)
    }

    fn downstream(&self) -> Option<Ref<dyn Subscriber<O>>> {
        self.downstream.lock().expect("Lock poisoned").clone()
    }

    fn upstream(&self) -> Option<Ref<dyn Subscription>> {
        self.upstream.lock().expect("Lock poisoned").clone()
    }

    fn run_prepare(&self) {
        if !self.prepared.swap(true, Ordering::AcqRel)
            && let Some(hook) = &self.prepare
        {
            hook();
        }
    }

    /// Drain the queue toward the downstream subscriber.
    ///
    /// Only the invocation that moves `pending_flushes` from zero runs
    /// the loop; all others return immediately and are drained by the
    /// owning invocation. Outstanding demand is re-read at the top of
    /// every iteration.
    fn flush(&self) {
        let Some(downstream) = self.downstream() else {
            // Nobody to deliver to yet.
            return;
        };
        if self.upstream().is_none() {
            downstream.on_error(FlowError::IllegalState("upstream is not connected"));
            return;
        }
        if self.pending_flushes.fetch_add(1, Ordering::AcqRel) != 0 {
            // Another invocation is serializing delivery.
            return;
        }
        let mut observed = 1usize;
        loop {
            let mut pending = self.pending_requests.load(Ordering::Acquire);
            let mut delivered = 0i64;
            while delivered < pending {
                let Some(item) = self.queue.pop() else {
                    break;
                };
                self.run_prepare();
                downstream.on_next(item);
                delivered += 1;
            }
            if delivered > 0 {
                self.pending_requests.fetch_sub(delivered, Ordering::AcqRel);
                pending -= delivered;
            }
            if self.queue.is_empty()
                && let Some(terminal) = self.terminal.get()
            {
                if !self.terminated.swap(true, Ordering::AcqRel) {
                    match terminal {
                        Terminal::Complete => downstream.on_complete(),
                        Terminal::Error(error) => downstream.on_error(error.clone()),
                    }
                }
            } else if pending > 0
                && let Some(upstream) = self.upstream()
            {
                // Demand remains and the queue ran dry; refill.
                upstream.request(1);
            }
            // Fold in flush requests that arrived while delivering.
            let remaining = self.pending_flushes.fetch_sub(observed, Ordering::AcqRel) - observed;
            if remaining == 0 {
                break;
            }
            observed = remaining;
        }
    }

    fn terminate(&self, terminal: Terminal) {
        let _ = self.terminal.set(terminal);
        self.flush();
    }
}

impl<I: Send + 'static, O: Send + 'static> Subscriber<I> for FlatMapProcessor<I, O> {
    fn on_subscribe(&self, subscription: Ref<dyn Subscription>) {
        *self.upstream.lock().expect("Lock poisoned") = Some(subscription);
    }

    fn on_next(&self, item: I) {
        match (self.mapper)(item) {
            Ok(outputs) => {
                for output in outputs {
                    self.queue.push(output);
                }
                self.flush();
            }
            Err(error) => {
                // A failed mapping poisons the stream: stop the upstream
                // and surface the error once buffered output drains.
                if let Some(upstream) = self.upstream() {
                    upstream.cancel();
                }
                self.terminate(Terminal::Error(error));
            }
        }
    }

    fn on_error(&self, error: FlowError) {
        self.terminate(Terminal::Error(error));
    }

    fn on_complete(&self) {
        self.terminate(Terminal::Complete);
    }
}

impl<I: Send + 'static, O: Send + 'static> Subscription for FlatMapProcessor<I, O> {
    fn request(&self, n: i64) {
        if n <= 0 {
            if let Some(downstream) = self.downstream() {
                downstream.on_error(FlowError::InvalidDemand(n));
            }
            return;
        }
        // Demand saturates at the maximum representable value.
        let _ = self
            .pending_requests
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
        self.flush();
    }

    fn cancel(&self) {
        if let Some(upstream) = self.upstream() {
            upstream.cancel();
        }
    }
}

impl<I: Send + 'static, O: Send + 'static> Publisher<O> for FlatMapProcessor<I, O> {
    fn subscribe(self: Ref<Self>, subscriber: Ref<dyn Subscriber<O>>) {
        *self.downstream.lock().expect("Lock poisoned") = Some(subscriber.clone());
        let subscription: Ref<dyn Subscription> = self;
        subscriber.on_subscribe(subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Upstream that emits items only when demand arrives.
    struct TestUpstream {
        items: Mutex<Vec<&'static str>>,
        requests: AtomicUsize,
        cancelled: AtomicBool,
        target: Mutex<Option<Ref<FlatMapProcessor<&'static str, i32>>>>,
    }

    impl TestUpstream {
        fn new(items: Vec<&'static str>) -> Ref<TestUpstream> {
            Ref::new(TestUpstream {
                items: Mutex::new(items),
                requests: AtomicUsize::new(0),
                cancelled: AtomicBool::new(false),
                target: Mutex::new(None),
            })
        }

        fn wire(self: Ref<Self>, processor: &Ref<FlatMapProcessor<&'static str, i32>>) {
            *self.target.lock().unwrap() = Some(processor.clone());
            let subscription: Ref<dyn Subscription> = self;
            processor.on_subscribe(subscription);
        }

        fn complete(&self) {
            if let Some(processor) = self.target.lock().unwrap().clone() {
                processor.on_complete();
            }
        }
    }

    impl Subscription for TestUpstream {
        fn request(&self, n: i64) {
            self.requests.fetch_add(n as usize, Ordering::SeqCst);
            for _ in 0..n {
                let next = self.items.lock().unwrap().pop();
                let target = self.target.lock().unwrap().clone();
                match (next, target) {
                    (Some(item), Some(processor)) => processor.on_next(item),
                    _ => break,
                }
            }
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct TestSubscriber {
        received: Mutex<Vec<i32>>,
        completed: AtomicBool,
        errors: Mutex<Vec<FlowError>>,
    }

    impl Subscriber<i32> for TestSubscriber {
        fn on_subscribe(&self, _: Ref<dyn Subscription>) {}

        fn on_next(&self, item: i32) {
            self.received.lock().unwrap().push(item);
        }

        fn on_error(&self, error: FlowError) {
            self.errors.lock().unwrap().push(error);
        }

        fn on_complete(&self) {
            self.completed.store(true, Ordering::SeqCst);
        }
    }

    fn mapper(item: &'static str) -> Result<Vec<i32>, FlowError> {
        match item {
            "A" => Ok(vec![1, 2]),
            "B" => Ok(vec![3]),
            _ => Err(FlowError::Mapper(format!("unmapped item {item}"))),
        }
    }

    #[test]
    fn delivers_mapped_items_in_order_on_demand() {
        let processor = FlatMapProcessor::new(mapper);
        let upstream = TestUpstream::new(vec!["B", "A"]);
        let subscriber = Ref::new(TestSubscriber::default());
        upstream.clone().wire(&processor);
        processor
            .clone()
            .subscribe(subscriber.clone());

        processor.request(1);
        assert_eq!(*subscriber.received.lock().unwrap(), vec![1]);
        processor.request(1);
        assert_eq!(*subscriber.received.lock().unwrap(), vec![1, 2]);
        processor.request(1);
        assert_eq!(*subscriber.received.lock().unwrap(), vec![1, 2, 3]);

        // Two upstream items were enough to satisfy three downstream requests.
        assert_eq!(upstream.requests.load(Ordering::SeqCst), 2);
        assert!(!subscriber.completed.load(Ordering::SeqCst));

        upstream.complete();
        assert!(subscriber.completed.load(Ordering::SeqCst));
        assert!(subscriber.errors.lock().unwrap().is_empty());
    }

    #[test]
    fn terminal_waits_for_queue_to_drain() {
        let processor = FlatMapProcessor::new(mapper);
        let upstream = TestUpstream::new(vec!["A"]);
        let subscriber = Ref::new(TestSubscriber::default());
        upstream.clone().wire(&processor);
        processor.clone().subscribe(subscriber.clone());

        processor.request(1);
        upstream.complete();
        // `2` is still queued, so completion must not be delivered yet.
        assert!(!subscriber.completed.load(Ordering::SeqCst));
        processor.request(1);
        assert_eq!(*subscriber.received.lock().unwrap(), vec![1, 2]);
        assert!(subscriber.completed.load(Ordering::SeqCst));
    }

    #[test]
    fn mapper_failure_cancels_upstream_and_errors_downstream() {
        let processor = FlatMapProcessor::new(mapper);
        let upstream = TestUpstream::new(vec!["unknown"]);
        let subscriber = Ref::new(TestSubscriber::default());
        upstream.clone().wire(&processor);
        processor.clone().subscribe(subscriber.clone());

        processor.request(1);
        assert!(upstream.cancelled.load(Ordering::SeqCst));
        let errors = subscriber.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], FlowError::Mapper(_)));
        assert!(!subscriber.completed.load(Ordering::SeqCst));
    }

    #[test]
    fn non_positive_demand_is_a_protocol_error() {
        let processor = FlatMapProcessor::new(mapper);
        let upstream = TestUpstream::new(Vec::new());
        let subscriber = Ref::new(TestSubscriber::default());
        upstream.clone().wire(&processor);
        processor.clone().subscribe(subscriber.clone());

        processor.request(0);
        let errors = subscriber.errors.lock().unwrap();
        assert!(matches!(errors[0], FlowError::InvalidDemand(0)));
    }

    #[test]
    fn flush_without_upstream_reports_illegal_state() {
        let processor = FlatMapProcessor::new(mapper);
        let subscriber = Ref::new(TestSubscriber::default());
        processor.clone().subscribe(subscriber.clone());

        processor.request(1);
        let errors = subscriber.errors.lock().unwrap();
        assert!(matches!(errors[0], FlowError::IllegalState(_)));
    }

    #[test]
    fn prepare_hook_runs_once_before_first_emission() {
        let count = Ref::new(AtomicUsize::new(0));
        let hook_count = count.clone();
        let processor = FlatMapProcessor::with_prepare(mapper, move || {
            hook_count.fetch_add(1, Ordering::SeqCst);
        });
        let upstream = TestUpstream::new(vec!["B", "A"]);
        let subscriber = Ref::new(TestSubscriber::default());
        upstream.clone().wire(&processor);
        processor.clone().subscribe(subscriber.clone());

        assert_eq!(count.load(Ordering::SeqCst), 0);
        processor.request(3);
        assert_eq!(*subscriber.received.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
