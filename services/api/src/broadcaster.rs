//! Update broadcaster for live-connected clients
//!
//! Every connection gets its own bounded queue. Delivery is at-most-once and
//! never blocks the caller: a full queue drops the frame for that client only,
//! and a closed queue unregisters the client.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};
use uuid::Uuid;

/// Version of the binary frame layout
pub const PROTOCOL_VERSION: u8 = 1;

/// Trailing byte of every frame
pub const RESERVED: u8 = 0xFF;

/// Wire frame: `[event kind, protocol version, reserved]`
pub type Frame = [u8; 3];

/// Kinds of events pushed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    /// Something about the bet collection changed; re-fetch
    BetUpdate = 1,
}

/// Encode one frame
pub fn encode_frame(kind: EventKind, version: u8) -> Frame {
    [kind as u8, version, RESERVED]
}

/// Receiving side of a registered client
pub struct Subscription {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<Frame>,
}

/// Fan-out of frames to every registered client
pub struct Broadcaster {
    clients: RwLock<HashMap<Uuid, mpsc::Sender<Frame>>>,
    capacity: usize,
}

impl Broadcaster {
    /// `capacity` bounds each client's queue
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a new client
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        self.clients.write().insert(id, sender);
        debug!("Broadcast client {} registered", id);
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&self, id: &Uuid) {
        if self.clients.write().remove(id).is_some() {
            debug!("Broadcast client {} unregistered", id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send one frame to every client without waiting; returns how many
    /// clients accepted it
    pub fn notify_all(&self, kind: EventKind, version: u8) -> usize {
        let frame = encode_frame(kind, version);
        let mut delivered = 0;
        let mut gone = Vec::new();

        {
            let clients = self.clients.read();
            for (id, sender) in clients.iter() {
                match sender.try_send(frame) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        debug!("Broadcast client {} is lagging, frame dropped", id);
                    }
                    Err(TrySendError::Closed(_)) => gone.push(*id),
                }
            }
        }

        if !gone.is_empty() {
            let mut clients = self.clients.write();
            for id in &gone {
                clients.remove(id);
            }
            info!("Dropped {} disconnected broadcast clients", gone.len());
        }

        delivered
    }

    /// Tell every client the bet collection changed
    pub fn notify_bet_update(&self) -> usize {
        self.notify_all(EventKind::BetUpdate, PROTOCOL_VERSION)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(16)
    }
}
