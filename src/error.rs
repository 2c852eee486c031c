//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (answered with a system notice to the originator only).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Invalid startup configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Display name is required but not set
    #[error("Username required")]
    UsernameRequired,

    /// Client is not in any room
    #[error("Not in room")]
    NotInRoom,

    /// Private message recipient has no live connection
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    /// Blank display name or room name
    #[error("Empty name")]
    EmptyName,

    /// Blank message body
    #[error("Empty message")]
    EmptyMessage,
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed or full channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client's queue is full; the message was dropped
    #[error("Channel full")]
    Full,
}
