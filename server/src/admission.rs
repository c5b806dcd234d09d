use std::collections::BTreeMap;

use log::{info, warn};

use lobby_shared::ConnectionId;

use crate::{seats::SlotAllocator, LobbyServerError};

/// Supplies the credential a connection must present to be admitted
pub trait CredentialSource {
    /// `None` means no credential is required
    fn expected_credential(&self) -> Option<&str>;
}

/// A fixed password chosen by whoever hosts the session
#[derive(Clone)]
pub struct HostPassword(String);

impl HostPassword {
    pub fn new<S: Into<String>>(password: S) -> Self {
        Self(password.into())
    }
}

impl CredentialSource for HostPassword {
    fn expected_credential(&self) -> Option<&str> {
        Some(&self.0)
    }
}

/// How a connection reached the lobby
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionOrigin {
    /// The session's own local connection, which skips admission
    Host,
    Remote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdmissionStatus {
    Pending,
    Admitted,
    Rejected,
}

/// Decides, per connection, whether it may reserve a seat
pub struct AdmissionGate {
    credentials: Option<Box<dyn CredentialSource>>,
    statuses: BTreeMap<ConnectionId, AdmissionStatus>,
}

impl AdmissionGate {
    pub fn new(credentials: Option<Box<dyn CredentialSource>>) -> Self {
        Self {
            credentials,
            statuses: BTreeMap::new(),
        }
    }

    pub fn set_credentials(&mut self, credentials: Option<Box<dyn CredentialSource>>) {
        self.credentials = credentials;
    }

    /// Registers a connection that is ready to communicate. The host is
    /// admitted on the spot, without a reservation.
    pub fn register(&mut self, connection: ConnectionId, origin: ConnectionOrigin) -> AdmissionStatus {
        let status = match origin {
            ConnectionOrigin::Host => AdmissionStatus::Admitted,
            ConnectionOrigin::Remote => AdmissionStatus::Pending,
        };
        self.statuses.insert(connection, status);
        status
    }

    pub fn status(&self, connection: &ConnectionId) -> Option<AdmissionStatus> {
        self.statuses.get(connection).copied()
    }

    pub fn is_admitted(&self, connection: &ConnectionId) -> bool {
        self.status(connection) == Some(AdmissionStatus::Admitted)
    }

    /// Every admitted connection, in id order
    pub fn admitted(&self) -> Vec<ConnectionId> {
        self.statuses
            .iter()
            .filter(|(_, status)| **status == AdmissionStatus::Admitted)
            .map(|(connection, _)| *connection)
            .collect()
    }

    /// Handles an admission request. On success the connection's seat is
    /// reserved in the same step, so a second request racing this one sees
    /// the reservation in its capacity check.
    ///
    /// Returns whether the connection was admitted. An already-admitted
    /// connection asking again is a protocol violation and yields an error.
    pub fn evaluate(
        &mut self,
        connection: &ConnectionId,
        credential: Option<&str>,
        allocator: &mut SlotAllocator,
    ) -> Result<bool, LobbyServerError> {
        match self.status(connection) {
            None => {
                return Err(LobbyServerError::UnknownConnection {
                    connection: *connection,
                })
            }
            Some(AdmissionStatus::Admitted) => {
                warn!("connection {:?} requested admission twice", connection);
                return Err(LobbyServerError::DuplicateAdmission {
                    connection: *connection,
                });
            }
            Some(AdmissionStatus::Pending) | Some(AdmissionStatus::Rejected) => {}
        }

        let credential_ok = self.credential_matches(credential);
        let can_join = allocator.can_join() && credential_ok;

        if can_join {
            allocator.reserve_seat(*connection);
            self.statuses.insert(*connection, AdmissionStatus::Admitted);
            info!("admitted connection {:?}", connection);
        } else {
            self.statuses.insert(*connection, AdmissionStatus::Rejected);
            if credential_ok {
                info!("rejected connection {:?}: lobby is full", connection);
            } else {
                info!("rejected connection {:?}: bad credential", connection);
            }
        }

        Ok(can_join)
    }

    pub fn forget(&mut self, connection: &ConnectionId) -> Option<AdmissionStatus> {
        self.statuses.remove(connection)
    }

    pub fn clear(&mut self) {
        self.statuses.clear();
    }

    fn credential_matches(&self, presented: Option<&str>) -> bool {
        let Some(expected) = self
            .credentials
            .as_ref()
            .and_then(|source| source.expected_credential())
        else {
            return true;
        };
        let Some(presented) = presented else {
            return false;
        };
        ring::constant_time::verify_slices_are_equal(expected.as_bytes(), presented.as_bytes())
            .is_ok()
    }
}
