//! Inventory mutation: feasibility checks and the gain/loss operations.
//!
//! Gains are all-or-nothing: callers run [`can_fit_entirely`] first and only
//! then apply [`add_to_inventory`]. Both backends derive their change sets
//! from these functions so that live and persisted state cannot diverge.

use crate::{
    character::Character,
    consts::DEFAULT_STACK_SIZE,
    equip_bonus::EquipBonuses,
    inventory::{Inventory, InventoryType, ItemSlot},
};
use tracing::warn;

/// The slot-position partition produced by one inventory mutation, used to
/// drive ordered client notifications.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Slots that existed before and after, quantity only changed.
    pub modified: Vec<u8>,
    /// Slots that went from absent to present (gain) or present to absent
    /// (loss).
    pub added_or_removed: Vec<u8>,
}

/// Units of this item one slot can hold. Gear and cash items never stack.
pub fn stack_size(item_id: i32) -> i16 {
    match InventoryType::from_item_id(item_id) {
        InventoryType::Equip | InventoryType::Equipped | InventoryType::Cash => 1,
        _ => DEFAULT_STACK_SIZE,
    }
}

/// Dry-run feasibility check: can `quantity` be absorbed entirely by
/// existing partial stacks plus remaining empty slots? A non-positive
/// quantity is never a valid grant.
pub fn can_fit_entirely(inv: &Inventory, item_id: i32, quantity: i16) -> bool {
    if quantity <= 0 {
        return false;
    }
    let per_slot = stack_size(item_id);
    let mut room: i32 = 0;
    if per_slot > 1 {
        for (_, slot) in inv.slots() {
            if slot.item_id == item_id {
                room += i32::from((per_slot - slot.quantity).max(0));
            }
        }
    }
    room += inv.free_slot_count() as i32 * i32::from(per_slot);
    room >= i32::from(quantity)
}

/// Applies a grant, splitting across existing partial stacks first and then
/// opening new slots from the lowest free position upward. Callers are
/// expected to have verified fit; anything that cannot be placed is dropped
/// with a warning.
pub fn add_to_inventory(inv: &mut Inventory, item_id: i32, quantity: i16) -> ChangeSet {
    let mut change = ChangeSet::default();
    if quantity <= 0 {
        warn!(item_id, quantity, "Rejected non-positive item grant");
        return change;
    }
    let per_slot = stack_size(item_id);
    let mut remaining = quantity;

    if per_slot > 1 {
        let partial: Vec<u8> = inv
            .slots()
            .filter(|(_, slot)| slot.item_id == item_id && slot.quantity < per_slot)
            .map(|(pos, _)| pos)
            .collect();
        for pos in partial {
            if remaining == 0 {
                break;
            }
            if let Some(slot) = inv.get_mut(pos) {
                let take = remaining.min(per_slot - slot.quantity);
                slot.quantity += take;
                remaining -= take;
                change.modified.push(pos);
            }
        }
    }

    while remaining > 0 {
        let Some(pos) = inv.first_free_position() else {
            warn!(
                item_id,
                remaining, "Inventory ran out of slots mid-grant; caller skipped the fit check"
            );
            break;
        };
        let take = remaining.min(per_slot);
        let equip = matches!(
            InventoryType::from_item_id(item_id),
            InventoryType::Equip | InventoryType::Equipped
        )
        .then(EquipBonuses::default);
        inv.put(pos, ItemSlot {
            item_id,
            quantity: take,
            equip,
        });
        remaining -= take;
        change.added_or_removed.push(pos);
    }

    change
}

/// Removes up to `quantity` units, draining stacks from the highest occupied
/// position downward so the most recently opened slots empty first and a
/// gain-then-loss of the same quantity restores the prior occupancy.
/// Emptied slots become absent.
pub fn remove_from_inventory(inv: &mut Inventory, item_id: i32, quantity: i16) -> ChangeSet {
    let mut remaining = quantity;
    let mut change = ChangeSet::default();

    let matching: Vec<u8> = inv
        .slots()
        .filter(|(_, slot)| slot.item_id == item_id)
        .map(|(pos, _)| pos)
        .collect();
    for pos in matching.into_iter().rev() {
        if remaining <= 0 {
            break;
        }
        let emptied = {
            let Some(slot) = inv.get_mut(pos) else { continue };
            let take = remaining.min(slot.quantity);
            slot.quantity -= take;
            remaining -= take;
            slot.quantity == 0
        };
        if emptied {
            inv.remove(pos);
            change.added_or_removed.push(pos);
        } else {
            change.modified.push(pos);
        }
    }

    change
}

/// Total units of `item_id` held in one inventory.
pub fn total_quantity(inv: &Inventory, item_id: i32) -> i32 {
    inv.slots()
        .filter(|(_, slot)| slot.item_id == item_id)
        .map(|(_, slot)| i32::from(slot.quantity))
        .sum()
}

/// Whether the character holds at least `quantity` of `item_id`. Worn gear
/// counts toward equip-category items.
pub fn has_item(character: &Character, item_id: i32, quantity: i16) -> bool {
    let category = InventoryType::from_item_id(item_id);
    let mut held = total_quantity(character.inventory(category), item_id);
    if category == InventoryType::Equip {
        held += total_quantity(character.inventory(InventoryType::Equipped), item_id);
    }
    held >= i32::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POTION: i32 = 2_000_000;
    const SWORD: i32 = 1_302_000;

    fn stack(item_id: i32, quantity: i16) -> ItemSlot {
        ItemSlot {
            item_id,
            quantity,
            equip: None,
        }
    }

    #[test]
    fn fit_counts_partial_stacks_and_free_slots() {
        let mut inv = Inventory::new(2);
        inv.put(1, stack(POTION, 70));
        // 30 left on the stack plus one free slot of 100
        assert!(can_fit_entirely(&inv, POTION, 130));
        assert!(!can_fit_entirely(&inv, POTION, 131));
    }

    #[test]
    fn full_inventory_rejects_new_item_entirely() {
        let mut inv = Inventory::new(4);
        for pos in 1..=4 {
            inv.put(pos, stack(SWORD + i32::from(pos), 1));
        }
        assert!(!can_fit_entirely(&inv, SWORD, 1));
        let before = inv.occupied_positions();
        // callers gate on the fit check; a forced add places nothing
        let change = add_to_inventory(&mut inv, SWORD, 1);
        assert_eq!(change, ChangeSet::default());
        assert_eq!(inv.occupied_positions(), before);
    }

    #[test]
    fn gain_splits_across_stacks_then_new_slots() {
        let mut inv = Inventory::new(3);
        inv.put(2, stack(POTION, 95));
        let change = add_to_inventory(&mut inv, POTION, 110);
        assert_eq!(change.modified, vec![2]);
        assert_eq!(change.added_or_removed, vec![1, 3]);
        assert_eq!(inv.get(2).unwrap().quantity, 100);
        assert_eq!(inv.get(1).unwrap().quantity, 100);
        assert_eq!(inv.get(3).unwrap().quantity, 5);
    }

    #[test]
    fn non_positive_grants_are_rejected() {
        let mut inv = Inventory::new(2);
        inv.put(1, stack(POTION, 40));
        assert!(!can_fit_entirely(&inv, POTION, 0));
        assert!(!can_fit_entirely(&inv, POTION, -5));
        let change = add_to_inventory(&mut inv, POTION, -5);
        assert_eq!(change, ChangeSet::default());
        assert_eq!(inv.get(1).unwrap().quantity, 40);
    }

    #[test]
    fn gear_never_stacks() {
        let mut inv = Inventory::new(3);
        let change = add_to_inventory(&mut inv, SWORD, 2);
        assert_eq!(change.added_or_removed, vec![1, 2]);
        assert_eq!(inv.get(1).unwrap().quantity, 1);
        assert!(inv.get(1).unwrap().equip.is_some());
    }

    #[test]
    fn gain_then_lose_round_trips_occupancy() {
        let mut inv = Inventory::new(4);
        inv.put(1, stack(POTION, 40));
        let before = inv.occupied_positions();

        let gained = add_to_inventory(&mut inv, POTION, 120);
        let lost = remove_from_inventory(&mut inv, POTION, 120);

        assert_eq!(inv.occupied_positions(), before);
        assert_eq!(inv.get(1).unwrap().quantity, 40);
        // creations are mirrored by removals
        assert_eq!(gained.added_or_removed.len(), lost.added_or_removed.len());
    }

    #[test]
    fn removal_drains_highest_positions_first() {
        let mut inv = Inventory::new(3);
        inv.put(1, stack(POTION, 50));
        inv.put(2, stack(POTION, 10));
        let change = remove_from_inventory(&mut inv, POTION, 30);
        assert_eq!(change.added_or_removed, vec![2]);
        assert_eq!(change.modified, vec![1]);
        assert_eq!(inv.get(1).unwrap().quantity, 30);
        assert_eq!(total_quantity(&inv, POTION), 30);
    }

    #[test]
    fn topped_up_stack_survives_a_matching_loss() {
        let mut inv = Inventory::new(4);
        inv.put(1, stack(POTION, 40));

        add_to_inventory(&mut inv, POTION, 120);
        remove_from_inventory(&mut inv, POTION, 120);

        assert_eq!(inv.occupied_positions(), vec![1]);
        assert_eq!(inv.get(1).unwrap().quantity, 40);
    }
}
