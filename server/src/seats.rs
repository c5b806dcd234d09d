use log::{debug, info};

use lobby_shared::{ConnectionId, ParticipantKey, SeatTable};

use crate::LobbyServerError;

/// Owns the seat table and the reservation set. The only authority-side
/// mutator of seat state.
pub struct SlotAllocator {
    table: SeatTable,
    reservations: Vec<ConnectionId>,
}

impl SlotAllocator {
    pub fn new(capacity: usize) -> Self {
        Self {
            table: SeatTable::new(capacity),
            reservations: Vec::new(),
        }
    }

    pub fn table(&self) -> &SeatTable {
        &self.table
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn occupied_count(&self) -> usize {
        self.table.occupied_count()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    /// Occupied seats plus outstanding reservations have reached capacity
    pub fn is_full(&self) -> bool {
        self.occupied_count() + self.reservation_count() >= self.capacity()
    }

    pub fn can_join(&self) -> bool {
        !self.is_full()
    }

    pub fn is_reserved(&self, connection: &ConnectionId) -> bool {
        self.reservations.contains(connection)
    }

    /// Holds a seat for an admitted connection. Does not check capacity, the
    /// gate already did. Reserving twice is a no-op.
    pub fn reserve_seat(&mut self, connection: ConnectionId) {
        if !self.is_reserved(&connection) {
            debug!("reserved a seat for connection {:?}", connection);
            self.reservations.push(connection);
        }
    }

    pub fn cancel_reservation(&mut self, connection: &ConnectionId) -> bool {
        let Some(position) = self.reservations.iter().position(|c| c == connection) else {
            return false;
        };
        self.reservations.remove(position);
        true
    }

    /// Turns a request into a seat. An unreserved connection is refused when
    /// the lobby is full; otherwise the lowest empty seat is chosen, the
    /// record is created by `create` and written into the table before this
    /// returns. Nothing can run between the scan and the write.
    pub fn grant_seat<F>(
        &mut self,
        connection: ConnectionId,
        create: F,
    ) -> Result<(usize, ParticipantKey), LobbyServerError>
    where
        F: FnOnce(usize) -> ParticipantKey,
    {
        if !self.is_reserved(&connection) {
            debug!("connection {:?} has no reserved seat", connection);
            if self.is_full() {
                info!("lobby is full, cannot seat connection {:?}", connection);
                return Err(LobbyServerError::LobbyFull { connection });
            }
        }

        let Some(index) = self.table.first_empty() else {
            return Err(LobbyServerError::NoEmptySeat { connection });
        };

        self.cancel_reservation(&connection);

        let key = create(index);
        self.table.occupy(index, key);

        Ok((index, key))
    }

    /// Vacates `index` only if it still holds `key`
    pub fn release_seat(&mut self, index: usize, key: &ParticipantKey) -> bool {
        self.table.release(index, key)
    }

    /// Call after the participant's index has already changed
    pub fn relocate_seat(&mut self, key: ParticipantKey, previous: usize, current: usize) {
        self.table.relocate(key, Some(previous), current);
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.reservations.clear();
    }
}
