//! The command and persistence layer of the simulation core.
//!
//! Gameplay callers (scripting, quest rewards, admin tooling) build ordered
//! batches of [`command::Manipulation`]s and submit them to a
//! [`command::CommandTarget`], which applies them either to a live
//! in-memory character or directly to storage for an offline one. Both
//! paths share the rule vocabulary in `solstice-common`, so identical input
//! derives identical state on either backend.

pub mod command;
pub mod events;
pub mod persistence;
pub mod world;
