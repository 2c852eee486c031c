//! Multi-room WebSocket Chat Server Library
//!
//! A WebSocket chat server built with tokio-tungstenite using the Actor
//! pattern for state management.
//!
//! # Features
//! - Display name selection
//! - Named rooms with presence lists and bounded history
//! - Room broadcast messaging
//! - Private messages with seen receipts
//! - Typing indicators
//! - Disconnection cleanup
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning every store
//!   (`IdentityRegistry`, `RoomDirectory`, `RoomHistory`, `ConversationStore`)
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use room_chat_server::{ChatServer, ServerConfig, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx, &config).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod handler;
pub mod history;
pub mod identity;
pub mod message;
pub mod notifier;
pub mod room;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::{Client, SessionState};
pub use config::ServerConfig;
pub use conversation::ConversationStore;
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use history::RoomHistory;
pub use identity::IdentityRegistry;
pub use message::{ChatEntry, ClientMessage, PrivateEntry, ServerMessage};
pub use room::RoomDirectory;
pub use server::{ChatServer, ServerCommand};
pub use types::{ClientId, ConversationKey, MessageId};
