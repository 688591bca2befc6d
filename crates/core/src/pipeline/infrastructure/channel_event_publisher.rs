use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError};

use crate::pipeline::event_publisher::EventPublisher;
use crate::pipeline::pipeline_event::PipelineEvent;
use crate::shared::sync::lock;

/// Capacity used by the stdio transport.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// How long a control event waits for room when the channel holds nothing
/// but other control events.
const CONTROL_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Publishes into a bounded channel, evicting the oldest queued snapshot when
/// full.
///
/// Only `queue_update` snapshots are ever discarded. Lifecycle and reply
/// events always make room by evicting a snapshot, keeping the order of
/// everything that stays queued.
pub struct ChannelEventPublisher {
    tx: Sender<PipelineEvent>,
    /// Publisher-side handle used to pull stale snapshots off the queue.
    evict: Receiver<PipelineEvent>,
    /// Serializes publishers so an eviction and its refill are not interleaved
    /// with another send.
    gate: Mutex<()>,
    dropped: AtomicU64,
}

impl ChannelEventPublisher {
    pub fn new(capacity: usize) -> (Self, Receiver<PipelineEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (
            Self {
                tx,
                evict: rx.clone(),
                gate: Mutex::new(()),
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Events discarded: evicted snapshots, plus anything undeliverable.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn discard(&self, event: &PipelineEvent, reason: &str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        log::debug!("{reason}, dropped {}", event.name());
    }

    /// Drains the queue, removes its oldest snapshot and refills in order.
    ///
    /// Returns false when the queue holds no snapshot to evict.
    fn evict_oldest_snapshot(&self) -> bool {
        let mut queued: VecDeque<PipelineEvent> = self.evict.try_iter().collect();
        let evicted = queued
            .iter()
            .position(|e| matches!(e, PipelineEvent::QueueUpdate(_)))
            .and_then(|i| queued.remove(i));
        if let Some(event) = &evicted {
            self.discard(event, "Event channel full");
        }
        for event in queued {
            // Publishers are gated and the queue only shrank, so this fits.
            if let Err(e) = self.tx.try_send(event) {
                self.discard(&e.into_inner(), "Event channel refill failed");
            }
        }
        evicted.is_some()
    }
}

impl EventPublisher for ChannelEventPublisher {
    fn publish(&self, event: PipelineEvent) {
        let _gate = lock(&self.gate);
        let event = match self.tx.try_send(event) {
            Ok(()) => return,
            Err(TrySendError::Disconnected(event)) => {
                self.discard(&event, "No event subscriber");
                return;
            }
            Err(TrySendError::Full(event)) => event,
        };

        if self.evict_oldest_snapshot() {
            if let Err(e) = self.tx.try_send(event) {
                self.discard(&e.into_inner(), "Event channel full");
            }
            return;
        }

        // Nothing but control events queued.
        match event {
            PipelineEvent::QueueUpdate(_) => self.discard(&event, "Event channel full"),
            event => match self.tx.send_timeout(event, CONTROL_SEND_TIMEOUT) {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(event)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Event consumer stalled, dropped {}", event.name());
                }
                Err(SendTimeoutError::Disconnected(event)) => {
                    self.discard(&event, "No event subscriber");
                }
            },
        }
    }
}
