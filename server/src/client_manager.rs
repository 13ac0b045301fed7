//! Registry of connected clients
//!
//! This module tracks every open connection of the server:
//! - Connection lifecycle (id assignment on accept, removal on close)
//! - Capacity enforcement
//! - Display name registration, unique among connected clients
//! - Outbound routing: each client owns a bounded channel drained by its
//!   connection task. A client that stops reading fills it up and is then
//!   signalled for disconnection instead of buffering without limit.
//!
//! The registry is shared as `Arc<RwLock<ClientManager>>`. Name registration
//! goes through the write lock, so two sessions can never hold the same name.

use crate::session::{NameRegistry, SessionEvent, SessionId};
use log::{debug, info, warn};
use parking_lot::RwLock;
use shared::{Notification, MAX_NAME_LENGTH, PLACEHOLDER_NAME};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};

/// Events a connection may have pending before it is considered stuck
pub const OUTBOUND_CAPACITY: usize = 256;

/// A connected client
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: SessionId,
    /// Remote address, for logging
    pub addr: SocketAddr,
    /// Display name, empty until `connect` succeeded
    pub user_name: String,
    pub connected_at: Instant,
    sender: mpsc::Sender<SessionEvent>,
    /// Raised when the outbound channel overflows
    overflow: Arc<Notify>,
}

impl Client {
    pub fn new(id: SessionId, addr: SocketAddr, sender: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            id,
            addr,
            user_name: String::new(),
            connected_at: Instant::now(),
            sender,
            overflow: Arc::new(Notify::new()),
        }
    }

    pub fn has_name(&self) -> bool {
        !self.user_name.is_empty()
    }

    /// Queues an event for the connection task without waiting.
    ///
    /// Returns false if the connection is already gone, or if its channel is
    /// full. In the latter case the overflow signal is raised so the
    /// connection task closes the connection.
    pub fn send(&self, event: SessionEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Client {} does not read its messages, dropping it", self.id);
                self.overflow.notify_one();
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Signal the connection task waits on to drop a client that fell behind
    pub fn overflow_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.overflow)
    }
}

/// Manages all connected clients
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<SessionId, Client>,
    /// Next available client ID for new connections
    next_client_id: SessionId,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to add a new client connection
    ///
    /// Returns Some(client_id) if successful, None if server is at capacity.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::Sender<SessionEvent>,
    ) -> Option<SessionId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, sender));

        Some(client_id)
    }

    /// Removes a client from the server. Returns true if the client was
    /// found and removed.
    pub fn remove_client(&mut self, client_id: &SessionId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            if client.has_name() {
                info!(
                    "Client {} ('{}') disconnected after {} s",
                    client.id,
                    client.user_name,
                    client.connected_at.elapsed().as_secs()
                );
            } else {
                info!(
                    "Client {} disconnected after {} s",
                    client.id,
                    client.connected_at.elapsed().as_secs()
                );
            }
            true
        } else {
            false
        }
    }

    pub fn get(&self, client_id: &SessionId) -> Option<&Client> {
        self.clients.get(client_id)
    }

    /// Reserves a display name for a client.
    ///
    /// The name is trimmed first. Returns the stored name, or the
    /// notification to send back when it is refused.
    pub fn register_user_name(
        &mut self,
        client_id: SessionId,
        name: &str,
    ) -> Result<String, Notification> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH || name == PLACEHOLDER_NAME {
            debug!("Client {} asked for incorrect name '{}'", client_id, name);
            return Err(Notification::IncorrectName);
        }

        // A session only registers while it has no name, so its own entry
        // never matches
        if self.is_user_name_used(name) {
            debug!("Client {} asked for used name '{}'", client_id, name);
            return Err(Notification::UsedName);
        }

        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.user_name = name.to_string();
                info!("Client {} is now known as '{}'", client_id, name);
                Ok(client.user_name.clone())
            }
            None => {
                warn!("Name registration for unknown client {}", client_id);
                Err(Notification::IncorrectName)
            }
        }
    }

    pub fn release_user_name(&mut self, client_id: SessionId) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.user_name.clear();
        }
    }

    pub fn is_user_name_used(&self, name: &str) -> bool {
        self.clients.values().any(|c| c.user_name == name)
    }

    /// Queues an event for one client. Returns false if it is not connected.
    pub fn send(&self, client_id: SessionId, event: SessionEvent) -> bool {
        match self.clients.get(&client_id) {
            Some(client) => client.send(event),
            None => false,
        }
    }

    pub fn notify(&self, client_id: SessionId, notification: Notification) -> bool {
        self.send(client_id, SessionEvent::Notify(notification))
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl NameRegistry for RwLock<ClientManager> {
    fn register_user_name(&self, session: SessionId, name: &str) -> Result<String, Notification> {
        self.write().register_user_name(session, name)
    }

    fn release_user_name(&self, session: SessionId) {
        self.write().release_user_name(session);
    }
}
