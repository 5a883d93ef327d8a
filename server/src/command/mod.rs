//! Admin command targets.
//!
//! A command resolves its target to either a live, in-memory player or an
//! offline character row set, then applies the same [`Manipulation`]
//! vocabulary through whichever backend it got. Both backends must agree on
//! the final stored state for any batch that succeeds.

pub mod live;
mod manipulation;
pub mod offline;

use crate::persistence::PersistenceError;
use std::fmt;
use vek::Vec2;

pub use live::{LivePlayer, LiveTarget};
pub use manipulation::{ItemGrant, Manipulation, MapDestination, SkillChange};
pub use offline::OfflineTarget;

/// A queryable fact about the target, independent of backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterProperty {
    Map,
    Channel,
    Position,
    PlayerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    Map(MapDestination),
    Channel(u8),
    Position(Vec2<i32>),
    PlayerId(i32),
}

#[derive(Debug)]
pub enum CommandError {
    /// The manipulation has no meaning for this backend.
    UnsupportedOperation(&'static str),
    /// The live target logged off between resolution and use.
    TargetNotLive,
    /// An item grant did not fit; nothing was changed.
    InventoryFull { item_id: i32, quantity: i16 },
    Persistence(PersistenceError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedOperation(what) => {
                write!(f, "Operation not supported by this target: {}", what)
            },
            Self::TargetNotLive => write!(f, "Target player is no longer connected"),
            Self::InventoryFull { item_id, quantity } => {
                write!(f, "Not enough room in inventory for {} of item {}", quantity, item_id)
            },
            Self::Persistence(error) => error.fmt(f),
        }
    }
}

impl From<PersistenceError> for CommandError {
    fn from(error: PersistenceError) -> CommandError { CommandError::Persistence(error) }
}

impl From<rusqlite::Error> for CommandError {
    fn from(error: rusqlite::Error) -> CommandError {
        CommandError::Persistence(PersistenceError::from(error))
    }
}

/// Backend-erased command target. Command handlers resolve a name to one of
/// these and run the same batch either way.
pub enum CommandTarget {
    Live(LiveTarget),
    Offline(OfflineTarget),
}

impl CommandTarget {
    /// Applies the batch in order. The offline backend applies all-or-none;
    /// the live one stops at the first failure but keeps earlier effects.
    pub fn mutate(&self, updates: &[Manipulation]) -> Result<(), CommandError> {
        match self {
            Self::Live(target) => target.mutate(updates),
            Self::Offline(target) => target.mutate(updates),
        }
    }

    pub fn access(&self, property: CharacterProperty) -> Option<PropertyValue> {
        match self {
            Self::Live(target) => target.access(property),
            Self::Offline(target) => target.access(property),
        }
    }
}
