//! ChatServer Actor implementation
//!
//! The central actor owning every store: connected clients, identities,
//! rooms, room history and private conversations. Handlers talk to it
//! over an mpsc channel, so each command runs to completion before the
//! next one starts and no locks are needed.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::{Client, JoinedRoom, SessionState};
use crate::config::ServerConfig;
use crate::conversation::ConversationStore;
use crate::error::AppError;
use crate::history::RoomHistory;
use crate::identity::IdentityRegistry;
use crate::message::{ChatEntry, PrivateEntry, ServerMessage};
use crate::notifier;
use crate::room::{LeaveOutcome, RoomDirectory};
use crate::types::{ClientId, ConversationKey, MessageId};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Client disconnected
    Disconnect { client_id: ClientId },
    /// Choose or change the display name
    SetIdentity {
        client_id: ClientId,
        username: String,
    },
    /// Join a room, binding `username` first when given
    Join {
        client_id: ClientId,
        username: Option<String>,
        room: String,
    },
    /// Leave the current room
    Leave { client_id: ClientId },
    /// List known rooms
    ListRooms { client_id: ClientId },
    /// Broadcast to the current room
    Chat { client_id: ClientId, msg: String },
    /// Private message to another user
    PrivateMessage {
        client_id: ClientId,
        recipient: String,
        msg: String,
    },
    /// Fetch the conversation with `with_user`
    GetPrivateHistory {
        client_id: ClientId,
        with_user: String,
    },
    /// Mark a message from `sender` as seen
    MessageSeen {
        client_id: ClientId,
        id: MessageId,
        sender: String,
    },
    /// Typing indicator
    Typing { client_id: ClientId, is_typing: bool },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    identities: IdentityRegistry,
    rooms: RoomDirectory,
    history: RoomHistory,
    conversations: ConversationStore,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a ChatServer with stores built from `config`
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, config: &ServerConfig) -> Self {
        Self::with_stores(
            receiver,
            IdentityRegistry::new(),
            RoomDirectory::with_rooms(config.default_rooms.iter().cloned()),
            RoomHistory::new(config.history_limit),
            ConversationStore::new(config.private_history_limit),
        )
    }

    /// Create a ChatServer around existing stores
    pub fn with_stores(
        receiver: mpsc::Receiver<ServerCommand>,
        identities: IdentityRegistry,
        rooms: RoomDirectory,
        history: RoomHistory,
        conversations: ConversationStore,
    ) -> Self {
        Self {
            clients: HashMap::new(),
            identities,
            rooms,
            history,
            conversations,
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender).await;
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id).await;
            }
            ServerCommand::SetIdentity { client_id, username } => {
                self.handle_set_identity(client_id, username).await;
            }
            ServerCommand::Join {
                client_id,
                username,
                room,
            } => {
                self.handle_join(client_id, username, room).await;
            }
            ServerCommand::Leave { client_id } => {
                self.handle_leave(client_id).await;
            }
            ServerCommand::ListRooms { client_id } => {
                self.handle_list_rooms(client_id).await;
            }
            ServerCommand::Chat { client_id, msg } => {
                self.handle_chat(client_id, msg).await;
            }
            ServerCommand::PrivateMessage {
                client_id,
                recipient,
                msg,
            } => {
                self.handle_private_message(client_id, recipient, msg).await;
            }
            ServerCommand::GetPrivateHistory {
                client_id,
                with_user,
            } => {
                self.handle_get_private_history(client_id, with_user).await;
            }
            ServerCommand::MessageSeen {
                client_id,
                id,
                sender,
            } => {
                self.handle_message_seen(client_id, id, sender).await;
            }
            ServerCommand::Typing {
                client_id,
                is_typing,
            } => {
                self.handle_typing(client_id, is_typing).await;
            }
        }
    }

    /// Handle new client connection
    async fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::Sender<ServerMessage>) {
        info!("Client {} connected", client_id);
        let client = Client::new(client_id, sender);
        self.clients.insert(client_id, client);

        let online = self.clients.len();
        if let Some(client) = self.clients.get(&client_id) {
            let _ = client.send(ServerMessage::Connected {
                client_id: client_id.to_string(),
                online,
            });
        }
        debug!(
            "Total clients: {}, identified: {}",
            online,
            self.identities.len()
        );
    }

    /// Handle client disconnection
    async fn handle_disconnect(&mut self, client_id: ClientId) {
        let Some(client) = self.clients.remove(&client_id) else {
            return;
        };

        let name = self.identities.unbind(client_id);
        info!(
            "Client {} ({}) disconnected",
            client_id,
            name.as_deref().unwrap_or("anonymous")
        );

        if let Some(joined) = client.joined {
            self.vacate_room(client_id, joined).await;
        }

        debug!(
            "Total clients: {}, identified: {}",
            self.clients.len(),
            self.identities.len()
        );
    }

    /// Handle display name selection
    ///
    /// Returns false if the name was rejected.
    async fn handle_set_identity(&mut self, client_id: ClientId, username: String) -> bool {
        let Some(client) = self.clients.get_mut(&client_id) else {
            return false;
        };

        let username = username.trim().to_string();
        if username.is_empty() {
            let _ = client.send(AppError::EmptyName.into());
            return false;
        }

        client.set_username(username.clone());
        self.identities.bind(client_id, username.clone());
        info!("Client {} set username to '{}'", client_id, username);

        let _ = client.send(ServerMessage::IdentitySet { username });
        true
    }

    /// Handle room joining
    async fn handle_join(&mut self, client_id: ClientId, username: Option<String>, room: String) {
        if let Some(username) = username {
            let unchanged = self.identities.lookup_name(client_id) == Some(username.trim());
            if !unchanged && !self.handle_set_identity(client_id, username).await {
                return;
            }
        }

        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        let Some(username) = client.username.clone() else {
            let _ = client.send(AppError::UsernameRequired.into());
            return;
        };

        let room = room.trim().to_string();
        if room.is_empty() {
            let _ = client.send(AppError::EmptyName.into());
            return;
        }

        // Switching rooms (or rejoining under a new name) leaves the old membership first
        let previous = client
            .joined
            .clone()
            .filter(|j| j.room != room || j.member_name != username);
        if let Some(previous) = previous {
            if let Some(client) = self.clients.get_mut(&client_id) {
                client.joined = None;
            }
            self.vacate_room(client_id, previous).await;
        }

        self.rooms.ensure_room(&room);
        self.rooms.join(&room, &username);

        let Some(client) = self.clients.get_mut(&client_id) else {
            return;
        };
        client.joined = Some(JoinedRoom {
            room: room.clone(),
            member_name: username.clone(),
        });

        info!("Client {} joined room {} as '{}'", client_id, room, username);

        let _ = client.send(ServerMessage::History {
            messages: self.history.snapshot(&room),
        });

        let notice = ServerMessage::system(format!("{} joined the chat.", username));
        notifier::broadcast(&self.clients, &room, &notice, None);
        notifier::broadcast_user_list(&self.clients, &self.rooms, &room);
    }

    /// Handle voluntary room leaving
    async fn handle_leave(&mut self, client_id: ClientId) {
        let Some(client) = self.clients.get_mut(&client_id) else {
            return;
        };

        let Some(joined) = client.joined.take() else {
            let _ = client.send(AppError::NotInRoom.into());
            return;
        };

        info!("Client {} left room {}", client_id, joined.room);

        self.vacate_room(client_id, joined).await;
    }

    /// Handle room listing
    async fn handle_list_rooms(&mut self, client_id: ClientId) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        let _ = client.send(ServerMessage::RoomList {
            rooms: self.rooms.list_known_rooms(),
        });
    }

    /// Handle room broadcast
    async fn handle_chat(&mut self, client_id: ClientId, msg: String) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        if client.state() != SessionState::InRoom {
            let _ = client.send(AppError::NotInRoom.into());
            return;
        }
        let (Some(username), Some(room)) = (client.username.clone(), client.room()) else {
            return;
        };
        let room = room.to_string();

        let body = msg.trim();
        if body.is_empty() {
            debug!("Dropping empty message from {}", client_id);
            return;
        }

        let entry = ChatEntry::public(username, body);
        self.history.append(&room, entry.clone());
        debug!(
            "Room {} history at {}/{}",
            room,
            self.history.len(&room),
            self.history.limit()
        );

        notifier::broadcast(&self.clients, &room, &ServerMessage::ChatMessage(entry), None);
    }

    /// Handle private message
    async fn handle_private_message(&mut self, client_id: ClientId, recipient: String, msg: String) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        if client.state() == SessionState::Anonymous {
            let _ = client.send(AppError::UsernameRequired.into());
            return;
        }
        let Some(sender_name) = client.username.clone() else {
            return;
        };

        let body = msg.trim();
        if body.is_empty() {
            debug!("Dropping empty private message from {}", client_id);
            return;
        }

        let recipient = recipient.trim();
        let Some(target) = self
            .identities
            .lookup_connection(recipient)
            .and_then(|id| self.clients.get(&id))
        else {
            warn!(
                "Private message from '{}' to unknown user '{}' dropped",
                sender_name, recipient
            );
            let _ = client.send(AppError::UnknownRecipient(recipient.to_string()).into());
            return;
        };

        let entry = PrivateEntry::new(sender_name.as_str(), recipient, body);
        self.conversations
            .append(&sender_name, recipient, entry.clone());

        debug!(
            "Private message {} in {} ({} conversations)",
            entry.id,
            ConversationKey::new(&sender_name, recipient),
            self.conversations.conversation_count()
        );

        let _ = target.send(ServerMessage::PrivateMessage(entry.clone()));
        if target.id != client_id {
            let _ = client.send(ServerMessage::PrivateMessage(entry));
        }
    }

    /// Handle private history request
    async fn handle_get_private_history(&mut self, client_id: ClientId, with_user: String) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        let Some(username) = client.username.as_deref() else {
            let _ = client.send(AppError::UsernameRequired.into());
            return;
        };

        let with_user = with_user.trim().to_string();
        let messages = self.conversations.history(username, &with_user);

        let _ = client.send(ServerMessage::PrivateHistory {
            with_user,
            messages,
        });
    }

    /// Handle seen receipt from the recipient of a message sent by `sender`
    async fn handle_message_seen(&mut self, client_id: ClientId, id: MessageId, sender: String) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        let Some(username) = client.username.as_deref() else {
            let _ = client.send(AppError::UsernameRequired.into());
            return;
        };

        let sender = sender.trim();
        if !self.conversations.mark_seen(username, sender, id) {
            debug!("Seen receipt for {} from '{}' changed nothing", id, username);
            return;
        }

        debug!("Message {} seen by '{}'", id, username);

        if let Some(counterpart) = self
            .identities
            .lookup_connection(sender)
            .and_then(|cid| self.clients.get(&cid))
        {
            let _ = counterpart.send(ServerMessage::UpdateSeenStatus { id });
        }
    }

    /// Handle typing indicator
    async fn handle_typing(&mut self, client_id: ClientId, is_typing: bool) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        let (Some(username), Some(room)) = (client.username.as_deref(), client.room()) else {
            debug!("Typing from {} outside a room ignored", client_id);
            return;
        };

        notifier::broadcast_typing(&self.clients, room, client_id, username, is_typing);
    }

    /// Helper: drop a connection's membership and notify the remaining members
    ///
    /// The caller must already have detached `joined` from the client.
    async fn vacate_room(&mut self, client_id: ClientId, joined: JoinedRoom) {
        // Another live connection may have joined under the same name
        let still_present = self
            .clients
            .values()
            .any(|c| c.id != client_id && c.joined.as_ref() == Some(&joined));
        if still_present {
            debug!(
                "'{}' still present in room {} on another connection",
                joined.member_name, joined.room
            );
            return;
        }

        if self.rooms.leave(&joined.room, &joined.member_name) == LeaveOutcome::Emptied {
            self.history.clear(&joined.room);
            debug!("Room {} is empty, history cleared", joined.room);
        }

        let notice = ServerMessage::system(format!("{} left the chat.", joined.member_name));
        notifier::broadcast(&self.clients, &joined.room, &notice, None);
        notifier::broadcast_user_list(&self.clients, &self.rooms, &joined.room);
    }
}
