use lobby_shared::ClientMessage;

/// The network collaborator seen from an observer: reliable, ordered
/// delivery of requests to the authority
pub trait ClientTransport {
    fn send(&mut self, message: ClientMessage);
}
