//! Typed item containers.
//!
//! A character carries one [`Inventory`] per [`InventoryType`]. Slots are
//! keyed by 1-based position and are present only while occupied; an empty
//! slot is absent rather than a zero-quantity entry.

pub mod tools;

use crate::{consts::MAX_INVENTORY_CAPACITY, equip_bonus::EquipBonuses};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// The five player-facing item categories plus the worn-gear container.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryType {
    Equip,
    Equipped,
    Use,
    Setup,
    Etc,
    Cash,
}

impl InventoryType {
    /// Resolves the category an item id belongs to. Granted gear always
    /// lands in `Equip`; `Equipped` is only ever reached by wearing it.
    pub fn from_item_id(item_id: i32) -> Self {
        match item_id / 1_000_000 {
            1 => Self::Equip,
            2 => Self::Use,
            3 => Self::Setup,
            4 => Self::Etc,
            _ => Self::Cash,
        }
    }

    /// Storage discriminant. Worn gear uses a negative code so that it can
    /// never collide with a player-facing category.
    pub fn to_db(self) -> i64 {
        match self {
            Self::Equipped => -1,
            Self::Equip => 1,
            Self::Use => 2,
            Self::Setup => 3,
            Self::Etc => 4,
            Self::Cash => 5,
        }
    }

    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Equipped),
            1 => Some(Self::Equip),
            2 => Some(Self::Use),
            3 => Some(Self::Setup),
            4 => Some(Self::Etc),
            5 => Some(Self::Cash),
            _ => None,
        }
    }
}

/// One occupied slot: the item it holds and, for gear, its bonus fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemSlot {
    pub item_id: i32,
    pub quantity: i16,
    pub equip: Option<EquipBonuses>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    capacity: u8,
    slots: BTreeMap<u8, ItemSlot>,
}

impl Inventory {
    pub fn new(capacity: u8) -> Self {
        Self {
            capacity: capacity.min(MAX_INVENTORY_CAPACITY),
            slots: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> u8 { self.capacity }

    /// Raises the capacity bound and returns the new value, clamped at the
    /// system-wide per-category ceiling.
    pub fn increase_capacity(&mut self, delta: u8) -> u8 {
        let requested = self.capacity.saturating_add(delta);
        self.capacity = requested.min(MAX_INVENTORY_CAPACITY);
        if requested > MAX_INVENTORY_CAPACITY {
            warn!(
                requested,
                "Inventory capacity increase clamped at the per-category ceiling"
            );
        }
        self.capacity
    }

    pub fn get(&self, position: u8) -> Option<&ItemSlot> { self.slots.get(&position) }

    pub(crate) fn get_mut(&mut self, position: u8) -> Option<&mut ItemSlot> {
        self.slots.get_mut(&position)
    }

    /// Occupies `position` with `slot`. Positions outside `1..=capacity`
    /// are rejected so the occupancy invariant cannot be broken.
    pub fn put(&mut self, position: u8, slot: ItemSlot) -> bool {
        if position == 0 || position > self.capacity {
            warn!(position, capacity = self.capacity, "Rejected out-of-range slot position");
            return false;
        }
        self.slots.insert(position, slot);
        true
    }

    pub fn remove(&mut self, position: u8) -> Option<ItemSlot> { self.slots.remove(&position) }

    /// Occupied slots in ascending position order.
    pub fn slots(&self) -> impl Iterator<Item = (u8, &ItemSlot)> {
        self.slots.iter().map(|(pos, slot)| (*pos, slot))
    }

    pub fn occupied_positions(&self) -> Vec<u8> { self.slots.keys().copied().collect() }

    pub fn free_slot_count(&self) -> usize { usize::from(self.capacity) - self.slots.len() }

    /// Lowest unoccupied position, if any remain under the capacity bound.
    pub fn first_free_position(&self) -> Option<u8> {
        (1..=self.capacity).find(|pos| !self.slots.contains_key(pos))
    }
}
