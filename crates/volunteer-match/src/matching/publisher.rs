use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use super::domain::Assignment;

/// One broadcast payload, shared by every subscriber that receives it.
pub type AssignmentBatch = Arc<[Assignment]>;

/// Identifier handed out by [`ResultPublisher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving side of a subscription. Dropping it closes the channel, and the publisher forgets
/// the subscriber on its next broadcast.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<AssignmentBatch>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<AssignmentBatch> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<AssignmentBatch, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Delivery tally for one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// What happened to a sequenced run result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Delivered(PublishReport),
    /// A newer run was already published; this result was discarded.
    Superseded { sequence: u64, latest: u64 },
}

/// Destination for finished optimizer runs.
pub trait ResultSink: Send + Sync {
    fn publish_run(&self, sequence: u64, assignments: Vec<Assignment>) -> PublishOutcome;
}

/// Fan-out of assignment results to every live subscriber.
#[derive(Debug, Default)]
pub struct ResultPublisher {
    subscribers: RwLock<HashMap<SubscriptionId, UnboundedSender<AssignmentBatch>>>,
    next_id: AtomicU64,
    latest_sequence: Mutex<Option<u64>>,
}

impl ResultPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
        debug!(subscription = %id, "subscriber registered");
        Subscription { id, receiver }
    }

    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            debug!(subscription = %id, "subscriber removed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers `assignments` to every current subscriber. Subscribers whose channel has
    /// closed are dropped; the rest are unaffected.
    pub fn publish(&self, assignments: Vec<Assignment>) -> PublishReport {
        self.broadcast(assignments.into())
    }

    fn broadcast(&self, batch: AssignmentBatch) -> PublishReport {
        let recipients: Vec<(SubscriptionId, UnboundedSender<AssignmentBatch>)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        let mut report = PublishReport::default();
        let mut closed = Vec::new();
        for (id, sender) in recipients {
            if sender.send(Arc::clone(&batch)).is_ok() {
                report.delivered += 1;
            } else {
                debug!(subscription = %id, "subscriber channel closed; dropping");
                closed.push(id);
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for id in &closed {
                subscribers.remove(id);
            }
            report.dropped = closed.len();
        }

        report
    }
}

impl ResultSink for ResultPublisher {
    /// Publishes unless a run with a higher sequence number has already been broadcast.
    fn publish_run(&self, sequence: u64, assignments: Vec<Assignment>) -> PublishOutcome {
        let mut latest = self
            .latest_sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = *latest {
            if sequence < current {
                info!(sequence, latest = current, "discarding superseded run result");
                return PublishOutcome::Superseded {
                    sequence,
                    latest: current,
                };
            }
        }

        *latest = Some(sequence);
        let report = self.broadcast(assignments.into());
        info!(
            sequence,
            delivered = report.delivered,
            dropped = report.dropped,
            "assignments broadcast"
        );
        PublishOutcome::Delivered(report)
    }
}
