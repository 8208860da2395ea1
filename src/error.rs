//! Two failure channels, kept deliberately separate: status codes for
//! benign, expected outcomes on mutation, and [`EcsError`] for precondition
//! violations or type misuse. The two are never converted into each other.

use crate::entity_handle::EntityId;
use thiserror::Error;

/// Success sentinel for the status-code channel, kept as a documented alias
/// for readers thinking in the spec's `0`/`-1` vocabulary.
pub const SUCCESS: i32 = 0;
/// Benign-failure sentinel for the status-code channel.
pub const FAILURE: i32 = -1;
/// "Store not registered" sentinel used by the registry.
pub const SENTINEL: i32 = -1;

/// Marker for the status-code channel: already-at-capacity with resizing
/// disabled, absent entity on remove, identical arguments to swap, sort of
/// length <= 1. Never raised for a precondition violation; see [`EcsError`]
/// for that channel instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusErr;

pub type StatusResult<T> = Result<T, StatusErr>;
pub type EcsResult<T> = Result<T, EcsError>;

/// Precondition violations and type misuse. `destroy` of an invalid entity
/// is the only operation in the registry API that treats invalid input as a
/// silent no-op instead of one of these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    #[error("handle {0:?} is not alive")]
    InvalidHandle(EntityId),

    #[error("entity store has exhausted its index space")]
    OutOfHandles,

    #[error("entity store is at capacity and is not resizable")]
    CapacityExceeded,

    #[error("component is missing from entity {0:?}")]
    MissingComponent(EntityId),

    #[error("payload APIs are not available on an empty (tag) component store")]
    EmptyComponentPayloadAccess,

    #[error("malformed entry at index {0} in addComps batch")]
    MalformedAddComponents(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
