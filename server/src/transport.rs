use lobby_shared::{ConnectionId, ServerMessage};

/// The network collaborator seen from the authority: reliable, ordered
/// delivery to one connection, and the power to drop a connection.
pub trait ServerTransport {
    /// Queue a message for a single connection
    fn send(&mut self, connection: &ConnectionId, message: ServerMessage);

    /// Queue the same message for every listed connection
    fn broadcast(&mut self, connections: &[ConnectionId], message: ServerMessage) {
        for connection in connections {
            self.send(connection, message.clone());
        }
    }

    /// Terminate a connection. The transport reports the loss back through
    /// `LobbyServer::disconnect`.
    fn disconnect(&mut self, connection: &ConnectionId);
}
