//! Presence and typing fan-out
//!
//! Stateless helpers that deliver a message to every connection currently
//! joined to a room. Sends never wait. Failures are ignored: a closed channel
//! means the client is already on its way out, and a full one means it
//! misses this event.

use std::collections::HashMap;

use tracing::debug;

use crate::client::Client;
use crate::message::ServerMessage;
use crate::room::RoomDirectory;
use crate::types::ClientId;

/// Send `msg` to every connection in `room`, optionally skipping one
pub fn broadcast(
    clients: &HashMap<ClientId, Client>,
    room: &str,
    msg: &ServerMessage,
    except: Option<ClientId>,
) -> usize {
    let mut delivered = 0;
    for client in clients.values() {
        if !client.is_in(room) || Some(client.id) == except {
            continue;
        }
        if client.send(msg.clone()).is_ok() {
            delivered += 1;
        }
    }
    debug!("Fan-out to room {} reached {} clients", room, delivered);
    delivered
}

/// Send the sorted member list of `room` to everyone in it
pub fn broadcast_user_list(
    clients: &HashMap<ClientId, Client>,
    directory: &RoomDirectory,
    room: &str,
) {
    let users = directory.list_members(room);
    broadcast(clients, room, &ServerMessage::UpdateUserList { users }, None);
}

/// Tell everyone else in `room` that `username` started or stopped typing
pub fn broadcast_typing(
    clients: &HashMap<ClientId, Client>,
    room: &str,
    from: ClientId,
    username: &str,
    is_typing: bool,
) {
    let msg = ServerMessage::UserTyping {
        username: username.to_string(),
        is_typing,
    };
    broadcast(clients, room, &msg, Some(from));
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::client::JoinedRoom;

    fn joined_client(
        clients: &mut HashMap<ClientId, Client>,
        name: &str,
        room: Option<&str>,
    ) -> (ClientId, mpsc::Receiver<ServerMessage>) {
        joined_client_with_capacity(clients, name, room, 8)
    }

    fn joined_client_with_capacity(
        clients: &mut HashMap<ClientId, Client>,
        name: &str,
        room: Option<&str>,
        capacity: usize,
    ) -> (ClientId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let id = ClientId::new();
        let mut client = Client::new(id, tx);
        client.set_username(name.to_string());
        client.joined = room.map(|r| JoinedRoom {
            room: r.to_string(),
            member_name: name.to_string(),
        });
        clients.insert(id, client);
        (id, rx)
    }

    #[tokio::test]
    async fn test_broadcast_only_reaches_room() {
        let mut clients = HashMap::new();
        let (_, mut ana_rx) = joined_client(&mut clients, "Ana", Some("General"));
        let (_, mut beto_rx) = joined_client(&mut clients, "Beto", Some("Juegos"));
        let (_, mut carla_rx) = joined_client(&mut clients, "Carla", None);

        let delivered = broadcast(&clients, "General", &ServerMessage::system("hi"), None);

        assert_eq!(delivered, 1);
        assert!(ana_rx.try_recv().is_ok());
        assert!(beto_rx.try_recv().is_err());
        assert!(carla_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_typing_skips_sender() {
        let mut clients = HashMap::new();
        let (ana, mut ana_rx) = joined_client(&mut clients, "Ana", Some("General"));
        let (_, mut beto_rx) = joined_client(&mut clients, "Beto", Some("General"));

        broadcast_typing(&clients, "General", ana, "Ana", true);

        assert!(ana_rx.try_recv().is_err());
        match beto_rx.try_recv().unwrap() {
            ServerMessage::UserTyping { username, is_typing } => {
                assert_eq!(username, "Ana");
                assert!(is_typing);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_user_list_sorted() {
        let mut clients = HashMap::new();
        let (_, mut rx) = joined_client(&mut clients, "Carla", Some("General"));
        let mut directory = RoomDirectory::new();
        directory.join("General", "Carla");
        directory.join("General", "Ana");

        broadcast_user_list(&clients, &directory, "General");

        match rx.try_recv().unwrap() {
            ServerMessage::UpdateUserList { users } => assert_eq!(users, vec!["Ana", "Carla"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_member_skipped() {
        let mut clients = HashMap::new();
        let (_, _slow_rx) = joined_client_with_capacity(&mut clients, "Lento", Some("General"), 1);
        let (_, mut ana_rx) = joined_client(&mut clients, "Ana", Some("General"));

        let first = broadcast(&clients, "General", &ServerMessage::system("uno"), None);
        let second = broadcast(&clients, "General", &ServerMessage::system("dos"), None);

        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert!(ana_rx.try_recv().is_ok());
        assert!(ana_rx.try_recv().is_ok());
    }
}
