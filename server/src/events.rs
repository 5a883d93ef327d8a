//! Outbound protocol events for live sessions.
//!
//! The emitter translates inventory/stat deltas into an ordered event
//! stream; delivery order must match emission order. The offline backend
//! never emits: only final storage rows matter there.

use common::inventory::{tools::ChangeSet, Inventory, InventoryType, ItemSlot};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKey {
    Level,
    Job,
    Str,
    Dex,
    Int,
    Luk,
    Ap,
    Sp,
    MaxHp,
    Hp,
    MaxMp,
    Mp,
    Fame,
    Exp,
    Mesos,
    Hair,
    Skin,
    Eyes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OutboundEvent {
    StatUpdated { stat: StatKey, value: i32 },
    SkillUpdated { skill_id: i32, level: u8, mastery: u8 },
    InventorySlotUpdated { inventory: InventoryType, position: u8, quantity: i16 },
    InventorySlotAdded { inventory: InventoryType, position: u8, slot: ItemSlot },
    InventorySlotCleared { inventory: InventoryType, position: u8 },
    ItemGainToast { item_id: i32, quantity: i32 },
    InventoryCapacityUpdated { inventory: InventoryType, capacity: u8 },
    BuddyCapacityUpdated { capacity: u8 },
    WarpToMap { map_id: i32, spawn_point: u8 },
    ChannelChange { channel: u8 },
    DebuffsCancelled,
}

/// An active client session: an ordered, unacknowledged outbound channel.
pub trait Session {
    fn send(&mut self, event: OutboundEvent);
}

/// Emits the fixed gain sequence: per-modified-slot quantity updates, then
/// per-created-slot adds. The aggregate toast is the caller's last word
/// since a gain may touch more than one container.
pub fn notify_gain(
    session: &mut dyn Session,
    inventory_type: InventoryType,
    inventory: &Inventory,
    change: &ChangeSet,
) {
    for &position in &change.modified {
        if let Some(slot) = inventory.get(position) {
            session.send(OutboundEvent::InventorySlotUpdated {
                inventory: inventory_type,
                position,
                quantity: slot.quantity,
            });
        }
    }
    for &position in &change.added_or_removed {
        if let Some(slot) = inventory.get(position) {
            session.send(OutboundEvent::InventorySlotAdded {
                inventory: inventory_type,
                position,
                slot: slot.clone(),
            });
        }
    }
}

/// Loss mirror of [`notify_gain`]: quantity updates, then slot clears.
pub fn notify_loss(
    session: &mut dyn Session,
    inventory_type: InventoryType,
    inventory: &Inventory,
    change: &ChangeSet,
) {
    for &position in &change.modified {
        if let Some(slot) = inventory.get(position) {
            session.send(OutboundEvent::InventorySlotUpdated {
                inventory: inventory_type,
                position,
                quantity: slot.quantity,
            });
        }
    }
    for &position in &change.added_or_removed {
        session.send(OutboundEvent::InventorySlotCleared {
            inventory: inventory_type,
            position,
        });
    }
}
