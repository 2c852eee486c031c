//! Client struct definition
//!
//! Represents a connected client with their session state and communication channel.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Session state of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no display name yet
    Anonymous,
    /// Display name bound, not in a room
    Identified,
    /// Display name bound and joined to a room
    InRoom,
}

/// The room a client is currently in, and the name it joined under
///
/// The member name is kept separately because an identity change does not
/// migrate room membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRoom {
    pub room: String,
    pub member_name: String,
}

/// Connected client information
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Display name (None before setup)
    pub username: Option<String>,
    /// Current room, if any
    pub joined: Option<JoinedRoom>,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: ClientId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            username: None,
            joined: None,
            sender,
        }
    }

    /// Queue a message for this client without waiting
    ///
    /// A client whose queue is full misses the message; one slow socket
    /// must never stall the server. Returns an error if the message was
    /// dropped or the channel is closed (client disconnected).
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => {
                warn!("Client {} is not keeping up, message dropped", self.id);
                SendError::Full
            }
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    pub fn state(&self) -> SessionState {
        match (&self.username, &self.joined) {
            (None, _) => SessionState::Anonymous,
            (Some(_), None) => SessionState::Identified,
            (Some(_), Some(_)) => SessionState::InRoom,
        }
    }

    /// Current room name, if joined
    pub fn room(&self) -> Option<&str> {
        self.joined.as_ref().map(|j| j.room.as_str())
    }

    /// Check if this client is currently in `room`
    pub fn is_in(&self, room: &str) -> bool {
        self.room() == Some(room)
    }

    pub fn set_username(&mut self, username: String) {
        self.username = Some(username);
    }
}
