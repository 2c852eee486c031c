//! Message protocol definitions
//!
//! JSON-based bidirectional event protocol. Every frame is an object
//! `{"event": "<name>", "data": {...}}`, mapped with Serde's adjacently
//! tagged enums.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::MessageId;

/// Client → Server event
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Choose or change the display name
    SetIdentity { username: String },
    /// Join a room, optionally binding a display name first
    Join {
        #[serde(default)]
        username: Option<String>,
        room: String,
    },
    /// Leave the current room without disconnecting
    Leave,
    /// Ask for the known room names
    ListRooms,
    /// Broadcast to the current room
    ChatMessage { msg: String },
    /// Send a private message
    PrivateMessage { recipient_username: String, msg: String },
    /// Fetch the conversation with another user
    GetPrivateHistory { with_user: String },
    /// Mark a received private message as seen
    MessageSeen { id: MessageId, sender: String },
    /// Typing indicator
    Typing {
        #[serde(default)]
        is_typing: bool,
    },
}

/// Kind tag carried by room messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Public,
}

/// A broadcast message, as stored in room history and sent to members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: MessageId,
    pub username: String,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl ChatEntry {
    /// Create a public message with a fresh id
    pub fn public(username: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            username: username.into(),
            msg: msg.into(),
            kind: MessageKind::Public,
        }
    }
}

/// A private message between two users
///
/// `seen` is the only field that ever changes, and only from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateEntry {
    pub id: MessageId,
    pub sender: String,
    pub recipient: String,
    pub msg: String,
    pub seen: bool,
}

impl PrivateEntry {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            sender: sender.into(),
            recipient: recipient.into(),
            msg: msg.into(),
            seen: false,
        }
    }
}

/// Server → Client event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome, with the number of live connections
    Connected { client_id: String, online: usize },
    /// Display name bound
    IdentitySet { username: String },
    /// Known rooms, sorted
    RoomList { rooms: Vec<String> },
    /// Room history snapshot, oldest first
    History { messages: Vec<ChatEntry> },
    /// Informational notice
    System { msg: String },
    /// Room broadcast
    ChatMessage(ChatEntry),
    /// Private message (delivered to recipient, echoed to sender)
    PrivateMessage(PrivateEntry),
    /// Conversation snapshot with one counterpart
    PrivateHistory {
        with_user: String,
        messages: Vec<PrivateEntry>,
    },
    /// A message you sent has been seen
    UpdateSeenStatus { id: MessageId },
    /// Another room member started or stopped typing
    UserTyping { username: String, is_typing: bool },
    /// Current room members, sorted
    UpdateUserList { users: Vec<String> },
}

impl ServerMessage {
    /// Shorthand for a system notice
    pub fn system(msg: impl Into<String>) -> Self {
        ServerMessage::System { msg: msg.into() }
    }
}

/// Convert AppError to a system notice for the originating client
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let msg = match &err {
            AppError::UsernameRequired => "Choose a username first".to_string(),
            AppError::NotInRoom => "You are not in a room".to_string(),
            AppError::UnknownRecipient(name) => format!("User '{}' is not connected", name),
            AppError::EmptyName => "Name cannot be empty".to_string(),
            AppError::EmptyMessage => "Message cannot be empty".to_string(),
            AppError::Json(e) => format!("Invalid message format: {}", e),
            // Fatal errors are not typically converted (connection closes)
            _ => "Internal error".to_string(),
        };
        ServerMessage::System { msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_deserialize() {
        let json = r#"{"event": "join", "data": {"username": "Ana", "room": "General"}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Join { username, room } => {
                assert_eq!(username.as_deref(), Some("Ana"));
                assert_eq!(room, "General");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_join_without_username() {
        let json = r#"{"event": "join", "data": {"room": "General"}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Join { username: None, .. }));
    }

    #[test]
    fn test_unit_event_without_data() {
        let msg: ClientMessage = serde_json::from_str(r#"{"event": "leave"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Leave));
    }

    #[test]
    fn test_typing_defaults_to_false() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event": "typing", "data": {}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Typing { is_typing: false }));
    }

    #[test]
    fn test_message_seen_deserialize() {
        let id = MessageId::new();
        let json = format!(
            r#"{{"event": "message_seen", "data": {{"id": "{}", "sender": "Ana"}}}}"#,
            id
        );
        match serde_json::from_str::<ClientMessage>(&json).unwrap() {
            ClientMessage::MessageSeen { id: got, sender } => {
                assert_eq!(got, id);
                assert_eq!(sender, "Ana");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event": "shout"}"#).is_err());
    }

    #[test]
    fn test_chat_message_serialize() {
        let entry = ChatEntry::public("Ana", "hola");
        let value = serde_json::to_value(ServerMessage::ChatMessage(entry.clone())).unwrap();

        assert_eq!(value["event"], "chat_message");
        assert_eq!(value["data"]["username"], "Ana");
        assert_eq!(value["data"]["msg"], "hola");
        assert_eq!(value["data"]["type"], "public");
        assert_eq!(value["data"]["id"], entry.id.to_string());
    }

    #[test]
    fn test_user_list_serialize() {
        let msg = ServerMessage::UpdateUserList {
            users: vec!["Ana".to_string(), "Beto".to_string()],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"event":"update_user_list","data":{"users":["Ana","Beto"]}}"#
        );
    }

    #[test]
    fn test_error_converts_to_system_notice() {
        let msg: ServerMessage = AppError::UnknownRecipient("Beto".to_string()).into();
        match msg {
            ServerMessage::System { msg } => assert!(msg.contains("Beto")),
            _ => panic!("Wrong variant"),
        }
    }
}
