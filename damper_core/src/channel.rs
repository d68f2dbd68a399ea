//! Bounded, lossy handoff of predictions from acquisition to actuation.
//!
//! Neither side ever blocks. What happens when the queue is full is decided
//! by [`OverflowPolicy`].
use std::sync::{Arc, Weak};

use crossbeam_channel as xch;
use damper_traits::Prediction;

/// What a push into a full channel does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Discard the item being pushed.
    #[default]
    DropNewest,
    /// Discard the oldest queued item and queue the new one.
    DropOldest,
}

/// Result of a non-blocking push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Channel was full; the pushed item was discarded.
    Dropped,
    /// Channel was full; the oldest item was discarded to make room.
    Evicted,
    /// The consumer is gone.
    Closed,
}

/// Producer half. Not `Clone`: the pipeline has exactly one producer.
#[derive(Debug)]
pub struct PredictionTx {
    tx: xch::Sender<Prediction>,
    // Held only under DropOldest, to pop from the producer side.
    evict: Option<xch::Receiver<Prediction>>,
    // The evicting receiver keeps the channel connected, so consumer
    // liveness is tracked through this token instead.
    consumer: Weak<()>,
    policy: OverflowPolicy,
    capacity: usize,
}

/// Consumer half.
#[derive(Debug)]
pub struct PredictionRx {
    rx: xch::Receiver<Prediction>,
    _alive: Arc<()>,
}

/// Create a channel holding at most `capacity` predictions (minimum 1).
pub fn prediction_channel(capacity: usize, policy: OverflowPolicy) -> (PredictionTx, PredictionRx) {
    let capacity = capacity.max(1);
    let (tx, rx) = xch::bounded(capacity);
    let evict = match policy {
        OverflowPolicy::DropOldest => Some(rx.clone()),
        OverflowPolicy::DropNewest => None,
    };
    let alive = Arc::new(());
    (
        PredictionTx {
            tx,
            evict,
            consumer: Arc::downgrade(&alive),
            policy,
            capacity,
        },
        PredictionRx { rx, _alive: alive },
    )
}

impl PredictionTx {
    pub fn try_push(&self, p: Prediction) -> PushOutcome {
        if self.consumer.strong_count() == 0 {
            return PushOutcome::Closed;
        }
        let mut item = p;
        let mut evicted = false;
        loop {
            match self.tx.try_send(item) {
                Ok(()) if evicted => return PushOutcome::Evicted,
                Ok(()) => return PushOutcome::Queued,
                Err(xch::TrySendError::Disconnected(_)) => return PushOutcome::Closed,
                Err(xch::TrySendError::Full(back)) => match &self.evict {
                    None => return PushOutcome::Dropped,
                    Some(rx) => {
                        // The consumer may have drained the slot in between; then just retry.
                        if rx.try_recv().is_ok() {
                            evicted = true;
                        }
                        item = back;
                    }
                },
            }
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

impl PredictionRx {
    #[inline]
    pub fn try_pop(&self) -> Option<Prediction> {
        self.rx.try_recv().ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
