use std::ops::Deref;

use log::warn;
use thiserror::Error;

use crate::HostType;

/// Errors that can occur during Replicated value operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicatedError {
    /// Attempted to write a value that only the authority may write
    #[error("Remote Replicated value should never be set locally. Route the write to the authority instead")]
    RemoteWrite,

    /// Attempted to apply an incoming update onto the authority's own value
    #[error("Host-owned Replicated value should never be mirrored from the network")]
    HostMirror,
}

/// The value before and after an incoming update was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

#[derive(Clone, Debug)]
enum ReplicatedImpl<T> {
    HostOwned(T),
    RemoteOwned(T),
}

/// A single field whose authoritative value lives on the Server and is
/// pushed to every observing Client.
///
/// The host-owned side may `set()` but never `mirror()`; the remote side may
/// only `mirror()` what the replication layer received. Change hooks are the
/// replication layer's job: `mirror()` reports the [`Change`] so the caller
/// can notify its subscribers, `set()` reports nothing.
#[derive(Clone, Debug)]
pub struct Replicated<T: Clone + PartialEq> {
    inner: ReplicatedImpl<T>,
}

impl<T: Clone + PartialEq> Replicated<T> {
    /// Create a new host-owned value, writable by the authority
    pub fn host_owned(value: T) -> Self {
        Self {
            inner: ReplicatedImpl::HostOwned(value),
        }
    }

    /// Create a new remote-owned value, a read-only replica on an observer
    pub fn remote_owned(value: T) -> Self {
        Self {
            inner: ReplicatedImpl::RemoteOwned(value),
        }
    }

    pub fn new(host_type: HostType, value: T) -> Self {
        match host_type {
            HostType::Server => Self::host_owned(value),
            HostType::Client => Self::remote_owned(value),
        }
    }

    pub fn is_host_owned(&self) -> bool {
        matches!(self.inner, ReplicatedImpl::HostOwned(_))
    }

    pub fn get(&self) -> &T {
        match &self.inner {
            ReplicatedImpl::HostOwned(value) | ReplicatedImpl::RemoteOwned(value) => value,
        }
    }

    /// Authority write. Returns whether the stored value changed, i.e.
    /// whether an update must be pushed to observers.
    pub fn set(&mut self, value: T) -> Result<bool, ReplicatedError> {
        match &mut self.inner {
            ReplicatedImpl::HostOwned(inner) => {
                if *inner == value {
                    return Ok(false);
                }
                *inner = value;
                Ok(true)
            }
            ReplicatedImpl::RemoteOwned(_) => {
                warn!("refusing local write to a remote-owned Replicated value");
                Err(ReplicatedError::RemoteWrite)
            }
        }
    }

    /// Apply a value received from the authority. Returns the change, or
    /// `None` when the update carried the value already held.
    pub fn mirror(&mut self, value: T) -> Result<Option<Change<T>>, ReplicatedError> {
        match &mut self.inner {
            ReplicatedImpl::RemoteOwned(inner) => {
                if *inner == value {
                    return Ok(None);
                }
                let old = std::mem::replace(inner, value.clone());
                Ok(Some(Change { old, new: value }))
            }
            ReplicatedImpl::HostOwned(_) => Err(ReplicatedError::HostMirror),
        }
    }
}

impl<T: Clone + PartialEq> Deref for Replicated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}
