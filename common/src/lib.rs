//! Game-rule data and in-memory character state shared by every backend.
//!
//! Everything in this crate is storage-agnostic: the same rule tables and
//! mutation semantics are exercised by the live (in-memory) command path and
//! re-derived by the persistence layer in `solstice-server`.

pub mod character;
pub mod consts;
pub mod equip_bonus;
pub mod exp_table;
pub mod inventory;
pub mod skills;

pub use character::{Character, CharacterId};
