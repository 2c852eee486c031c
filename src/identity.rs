//! Identity registry
//!
//! Bidirectional mapping between live connections and display names.
//! Binding a name already held by another connection supersedes the
//! earlier binding for lookups by name (last writer wins).

use std::collections::HashMap;

use tracing::warn;

use crate::types::ClientId;

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    /// ClientId -> display name
    names: HashMap<ClientId, String>,
    /// display name -> most recent ClientId bound to it
    connections: HashMap<String, ClientId>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `client_id`
    ///
    /// A previous name of this connection is released if it still points here.
    pub fn bind(&mut self, client_id: ClientId, name: String) {
        if let Some(previous) = self.names.insert(client_id, name.clone()) {
            if previous != name {
                self.release_name(&previous, client_id);
            }
        }

        if let Some(other) = self.connections.insert(name.clone(), client_id) {
            if other != client_id {
                warn!(
                    "Name '{}' rebound from client {} to client {}",
                    name, other, client_id
                );
            }
        }
    }

    /// Remove the binding for `client_id`, returning the freed name
    ///
    /// Calling this twice is safe; the second call returns `None`.
    pub fn unbind(&mut self, client_id: ClientId) -> Option<String> {
        let name = self.names.remove(&client_id)?;
        self.release_name(&name, client_id);
        Some(name)
    }

    /// Connection currently routed to for `name`
    pub fn lookup_connection(&self, name: &str) -> Option<ClientId> {
        self.connections.get(name).copied()
    }

    pub fn lookup_name(&self, client_id: ClientId) -> Option<&str> {
        self.names.get(&client_id).map(String::as_str)
    }

    /// Number of bound connections
    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }

    // Only drop the name -> connection entry when a newer binding hasn't taken it over.
    fn release_name(&mut self, name: &str, client_id: ClientId) {
        if self.connections.get(name) == Some(&client_id) {
            self.connections.remove(name);
        }
    }
}
