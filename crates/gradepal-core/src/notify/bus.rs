//! Fan-out bus for notification events.
//!
//! Each subscriber owns a bounded channel whose receiving half backs one open
//! response body. Publishing serializes the event once and attempts delivery
//! to a snapshot of the current subscribers concurrently; a subscriber whose
//! delivery fails is dropped from the bus during that same publish. There is
//! no replay: a subscriber only sees events published while it is registered.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use futures_util::Stream;
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use gradepal_types::error::NotifyError;
use gradepal_types::notification::NotificationEvent;

use crate::stream::frame::{data_block, encode_comment};

/// Per-connection handle held by the bus.
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    id: u64,
    tx: Arc<Mutex<Option<mpsc::Sender<Bytes>>>>,
}

impl SubscriberHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deliver one frame. Fails when the subscriber is closed, gone, or does
    /// not accept the frame within `timeout`.
    pub async fn send(&self, frame: Bytes, timeout: Duration) -> bool {
        let tx = match self.tx.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let Some(tx) = tx else {
            return false;
        };
        matches!(tokio::time::timeout(timeout, tx.send(frame)).await, Ok(Ok(())))
    }

    /// Drop the sending half so the connection's body ends. Idempotent.
    pub fn close(&self) {
        let mut guard = match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }
}

/// Registry of live subscribers.
#[derive(Debug)]
pub struct NotificationBus {
    subscribers: DashMap<u64, SubscriberHandle>,
    next_id: AtomicU64,
    buffer: usize,
    send_timeout: Duration,
}

impl NotificationBus {
    pub fn new(buffer: usize, send_timeout: Duration) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
            send_timeout,
        }
    }

    /// Register a subscriber and return its byte stream.
    ///
    /// The stream starts with a `: connected` comment. The subscriber is
    /// unregistered when `cancel` fires or the returned [`Subscription`] is
    /// dropped, whichever comes first.
    pub fn subscribe(self: &Arc<Self>, cancel: &CancellationToken) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        // Capacity is at least one and the receiver is alive.
        let _ = tx.try_send(encode_comment("connected"));

        let handle = SubscriberHandle {
            id,
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        self.subscribers.insert(id, handle);
        debug!(subscriber_id = id, subscribers = self.subscribers.len(), "Subscriber registered");

        let token = cancel.child_token();
        let bus: Weak<Self> = Arc::downgrade(self);
        let watched = token.clone();
        tokio::spawn(async move {
            watched.cancelled().await;
            if let Some(bus) = bus.upgrade() {
                bus.unregister(id);
            }
        });

        Subscription {
            id,
            rx,
            _guard: token.drop_guard(),
        }
    }

    /// Deliver `event` to every registered subscriber.
    ///
    /// Returns the number of subscribers that accepted it.
    pub async fn publish(&self, event: &NotificationEvent) -> Result<usize, NotifyError> {
        let payload =
            serde_json::to_string(event).map_err(|e| NotifyError::Serialize(e.to_string()))?;
        let frame = data_block(&payload);

        let targets: Vec<SubscriberHandle> =
            self.subscribers.iter().map(|entry| entry.value().clone()).collect();
        let timeout = self.send_timeout;
        let results = join_all(targets.iter().map(|handle| {
            let frame = frame.clone();
            async move { (handle, handle.send(frame, timeout).await) }
        }))
        .await;

        let mut delivered = 0;
        for (handle, ok) in results {
            if ok {
                delivered += 1;
            } else {
                self.unregister(handle.id());
            }
        }
        info!(
            event = %payload,
            delivered,
            dropped = targets.len() - delivered,
            "Notification published"
        );
        Ok(delivered)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn unregister(&self, id: u64) {
        if let Some((_, handle)) = self.subscribers.remove(&id) {
            handle.close();
            debug!(subscriber_id = id, "Subscriber unregistered");
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(16, Duration::from_secs(5))
    }
}

/// Receiving side of one subscription.
///
/// Dropping it unregisters the subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Bytes>,
    _guard: DropGuard,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Stream for Subscription {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
