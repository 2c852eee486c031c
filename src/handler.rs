//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake,
//! event parsing, and bidirectional communication with the ChatServer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Performs WebSocket handshake, sets up bidirectional communication,
/// and manages the connection lifecycle.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Generate client ID
    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Create channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(32);

    // Kept for local notices about frames the server never sees
    let notice_tx = msg_tx.clone();

    // Register with ChatServer (it answers with the welcome message)
    if cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            sender: msg_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }

    // Clone cmd_tx for read task
    let cmd_tx_read = cmd_tx.clone();

    // Spawn read task (WebSocket -> ServerCommand)
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            let cmd = client_message_to_command(client_id, client_msg);
                            if cmd_tx_read.send(cmd).await.is_err() {
                                debug!("Server closed, ending read task for {}", client_id);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Invalid event from {}: {}", client_id, e);
                            let _ = notice_tx.send(AppError::Json(e).into()).await;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", client_id);
                    break;
                }
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by tungstenite
                    debug!("Ping from {}", client_id);
                }
                Ok(Message::Pong(_)) => {
                    debug!("Pong from {}", client_id);
                }
                Ok(_) => {
                    // Binary or other message types - ignore
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", client_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", client_id);
    });

    // Spawn write task (ServerMessage -> WebSocket)
    let write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    // Continue - don't break on serialization errors
                }
            }
        }
        debug!("Write task ended for client");

        // Send close frame when done
        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", client_id);
        }
        _ = write_task => {
            debug!("Write task completed for {}", client_id);
        }
    }

    // Send disconnect command
    let _ = cmd_tx
        .send(ServerCommand::Disconnect { client_id })
        .await;

    info!("Client {} disconnected", client_id);

    Ok(())
}

/// Convert a ClientMessage to a ServerCommand
fn client_message_to_command(client_id: ClientId, msg: ClientMessage) -> ServerCommand {
    match msg {
        ClientMessage::SetIdentity { username } => ServerCommand::SetIdentity { client_id, username },
        ClientMessage::Join { username, room } => ServerCommand::Join {
            client_id,
            username,
            room,
        },
        ClientMessage::Leave => ServerCommand::Leave { client_id },
        ClientMessage::ListRooms => ServerCommand::ListRooms { client_id },
        ClientMessage::ChatMessage { msg } => ServerCommand::Chat { client_id, msg },
        ClientMessage::PrivateMessage {
            recipient_username,
            msg,
        } => ServerCommand::PrivateMessage {
            client_id,
            recipient: recipient_username,
            msg,
        },
        ClientMessage::GetPrivateHistory { with_user } => {
            ServerCommand::GetPrivateHistory { client_id, with_user }
        }
        ClientMessage::MessageSeen { id, sender } => ServerCommand::MessageSeen {
            client_id,
            id,
            sender,
        },
        ClientMessage::Typing { is_typing } => ServerCommand::Typing { client_id, is_typing },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ServerCommand {
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        client_message_to_command(ClientId::new(), msg)
    }

    #[test]
    fn test_private_message_maps_recipient() {
        match parse(r#"{"event": "private_message", "data": {"recipient_username": "Beto", "msg": "hola"}}"#) {
            ServerCommand::PrivateMessage { recipient, msg, .. } => {
                assert_eq!(recipient, "Beto");
                assert_eq!(msg, "hola");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_chat_message_maps_to_chat() {
        assert!(matches!(
            parse(r#"{"event": "chat_message", "data": {"msg": "hola"}}"#),
            ServerCommand::Chat { .. }
        ));
    }

    #[test]
    fn test_typing_maps_flag() {
        assert!(matches!(
            parse(r#"{"event": "typing", "data": {"is_typing": true}}"#),
            ServerCommand::Typing { is_typing: true, .. }
        ));
    }
}
