//! Broadcast hub for live dashboard events
//!
//! A single actor task owns the subscriber registry. Every mutation
//! (register, unregister, publish) is a message on its mailbox, so the
//! registry never needs a lock.
//!
//! Delivery is best-effort and at-most-once: each subscriber has a bounded
//! queue and the actor only ever uses `try_send`. A subscriber whose queue
//! is full (or whose receiver is gone) is dropped from the registry, which
//! closes its channel and lets the transport task shut the connection.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::{
    config::HubConfig,
    error::{AppError, AppResult},
    models::BroadcastEvent,
};

/// Serialized frame shared by every subscriber that receives it
pub type Frame = Arc<str>;

pub type SubscriberId = u64;

/// Connected subscriber counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct HubStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// Receiving side of a registration
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub client_type: String,
    receiver: mpsc::Receiver<Frame>,
}

impl Subscription {
    /// Next frame, or `None` once the hub has dropped this subscriber
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }
}

enum HubCommand {
    Register {
        client_type: String,
        reply: oneshot::Sender<Subscription>,
    },
    Unregister {
        id: SubscriberId,
    },
    Publish {
        event: BroadcastEvent,
        target: Option<String>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Shutdown,
}

struct Subscriber {
    client_type: String,
    sender: mpsc::Sender<Frame>,
}

/// Cloneable handle used by services and transports to talk to the hub
#[derive(Clone)]
pub struct HubHandle {
    mailbox: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub async fn register(&self, client_type: impl Into<String>) -> AppResult<Subscription> {
        let (reply, rx) = oneshot::channel();
        self.mailbox
            .send(HubCommand::Register {
                client_type: client_type.into(),
                reply,
            })
            .await
            .map_err(|_| hub_stopped())?;
        rx.await.map_err(|_| hub_stopped())
    }

    /// Idempotent; unknown or already-evicted ids are ignored
    pub async fn unregister(&self, id: SubscriberId) {
        let _ = self.mailbox.send(HubCommand::Unregister { id }).await;
    }

    /// Fan an event out to every subscriber. Never waits on the hub.
    pub fn publish(&self, event: BroadcastEvent) {
        self.enqueue(event, None);
    }

    /// Deliver only to subscribers registered with `client_type`
    pub fn publish_to_type(&self, client_type: &str, event: BroadcastEvent) {
        self.enqueue(event, Some(client_type.to_string()));
    }

    fn enqueue(&self, event: BroadcastEvent, target: Option<String>) {
        let event_type = event.event_type.clone();
        if let Err(e) = self.mailbox.try_send(HubCommand::Publish { event, target }) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    tracing::warn!("Broadcast hub mailbox full, dropping {} event", event_type)
                }
                mpsc::error::TrySendError::Closed(_) => {
                    tracing::debug!("Broadcast hub stopped, dropping {} event", event_type)
                }
            }
        }
    }

    pub async fn stats(&self) -> AppResult<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.mailbox
            .send(HubCommand::Stats { reply })
            .await
            .map_err(|_| hub_stopped())?;
        rx.await.map_err(|_| hub_stopped())
    }

    pub async fn subscriber_count(&self) -> AppResult<usize> {
        Ok(self.stats().await?.total)
    }

    /// Close every subscriber channel and stop the actor
    pub async fn shutdown(&self) {
        let _ = self.mailbox.send(HubCommand::Shutdown).await;
    }
}

fn hub_stopped() -> AppError {
    AppError::Unavailable("Broadcast hub is not running".to_string())
}

struct BroadcastHub {
    subscribers: BTreeMap<SubscriberId, Subscriber>,
    next_id: SubscriberId,
    queue_capacity: usize,
}

impl BroadcastHub {
    async fn run(mut self, mut mailbox: mpsc::Receiver<HubCommand>) {
        while let Some(command) = mailbox.recv().await {
            match command {
                HubCommand::Register { client_type, reply } => {
                    let subscription = self.register(client_type);
                    let id = subscription.id;
                    // Caller gave up waiting; don't keep a subscriber nobody reads
                    if reply.send(subscription).is_err() {
                        self.subscribers.remove(&id);
                    }
                }
                HubCommand::Unregister { id } => {
                    if self.subscribers.remove(&id).is_some() {
                        tracing::info!(
                            subscriber_id = id,
                            total = self.subscribers.len(),
                            "Subscriber disconnected"
                        );
                    }
                }
                HubCommand::Publish { event, target } => self.fan_out(&event, target.as_deref()),
                HubCommand::Stats { reply } => {
                    let _ = reply.send(self.stats());
                }
                HubCommand::Shutdown => break,
            }
        }

        let remaining = self.subscribers.len();
        self.subscribers.clear();
        tracing::info!("Broadcast hub stopped, closed {} subscriber(s)", remaining);
    }

    fn register(&mut self, client_type: String) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;

        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        self.subscribers.insert(
            id,
            Subscriber {
                client_type: client_type.clone(),
                sender,
            },
        );
        tracing::info!(
            subscriber_id = id,
            client_type = %client_type,
            total = self.subscribers.len(),
            "Subscriber connected"
        );

        Subscription {
            id,
            client_type,
            receiver,
        }
    }

    fn fan_out(&mut self, event: &BroadcastEvent, target: Option<&str>) {
        let frame: Frame = Arc::from(event.to_frame());
        let mut evicted = Vec::new();

        for (id, subscriber) in &self.subscribers {
            if target.is_some_and(|t| t != subscriber.client_type) {
                continue;
            }
            match subscriber.sender.try_send(Arc::clone(&frame)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber_id = *id, "Subscriber queue full, disconnecting");
                    evicted.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => evicted.push(*id),
            }
        }

        for id in evicted {
            self.subscribers.remove(&id);
        }
        tracing::debug!(
            "Published {} to {} subscriber(s)",
            event.event_type,
            self.subscribers.len()
        );
    }

    fn stats(&self) -> HubStats {
        let mut by_type = BTreeMap::new();
        for subscriber in self.subscribers.values() {
            *by_type.entry(subscriber.client_type.clone()).or_insert(0) += 1;
        }
        HubStats {
            total: self.subscribers.len(),
            by_type,
        }
    }
}

/// Start the hub actor on the current runtime
pub fn spawn(config: &HubConfig) -> (HubHandle, JoinHandle<()>) {
    let (mailbox, inbox) = mpsc::channel(config.mailbox_capacity.max(1));
    let hub = BroadcastHub {
        subscribers: BTreeMap::new(),
        next_id: 1,
        queue_capacity: config.subscriber_queue_capacity.max(1),
    };
    let task = tokio::spawn(hub.run(inbox));
    (HubHandle { mailbox }, task)
}
