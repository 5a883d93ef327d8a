//! Equipment bonus aggregation.
//!
//! Bonuses are summed across the worn-gear container on demand, never
//! cached: a gear change must be reflected immediately in derived HP/MP
//! caps.

use crate::{character::Character, inventory::InventoryType};
use serde::{Deserialize, Serialize};

/// The named bonus fields carried by one piece of gear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipBonuses {
    pub str: i16,
    pub dex: i16,
    pub int: i16,
    pub luk: i16,
    pub hp: i16,
    pub mp: i16,
    pub watk: i16,
    pub matk: i16,
    pub wdef: i16,
    pub mdef: i16,
    pub acc: i16,
    pub avoid: i16,
    pub hands: i16,
    pub speed: i16,
    pub jump: i16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipBonusField {
    Str,
    Dex,
    Int,
    Luk,
    Hp,
    Mp,
    Watk,
    Matk,
    Wdef,
    Mdef,
    Acc,
    Avoid,
    Hands,
    Speed,
    Jump,
}

impl EquipBonuses {
    pub fn get(&self, field: EquipBonusField) -> i16 {
        match field {
            EquipBonusField::Str => self.str,
            EquipBonusField::Dex => self.dex,
            EquipBonusField::Int => self.int,
            EquipBonusField::Luk => self.luk,
            EquipBonusField::Hp => self.hp,
            EquipBonusField::Mp => self.mp,
            EquipBonusField::Watk => self.watk,
            EquipBonusField::Matk => self.matk,
            EquipBonusField::Wdef => self.wdef,
            EquipBonusField::Mdef => self.mdef,
            EquipBonusField::Acc => self.acc,
            EquipBonusField::Avoid => self.avoid,
            EquipBonusField::Hands => self.hands,
            EquipBonusField::Speed => self.speed,
            EquipBonusField::Jump => self.jump,
        }
    }
}

/// Saturating sum of `field` across every currently worn item. The equip
/// inventory (unworn gear) never contributes.
pub fn equipped_bonus(character: &Character, field: EquipBonusField) -> i16 {
    character
        .inventory(InventoryType::Equipped)
        .slots()
        .filter_map(|(_, slot)| slot.equip.as_ref())
        .fold(0i16, |total, bonuses| total.saturating_add(bonuses.get(field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ItemSlot;

    #[test]
    fn bonus_sum_saturates_instead_of_wrapping() {
        let mut character = Character::new(1, 1, "tess");
        let equipped = character.inventory_mut(InventoryType::Equipped);
        for pos in 1..=3 {
            equipped.put(pos, ItemSlot {
                item_id: 1_302_000,
                quantity: 1,
                equip: Some(EquipBonuses {
                    hp: 30000,
                    ..EquipBonuses::default()
                }),
            });
        }
        assert_eq!(equipped_bonus(&character, EquipBonusField::Hp), i16::MAX);
    }

    #[test]
    fn unworn_gear_does_not_contribute() {
        let mut character = Character::new(1, 1, "tess");
        character
            .inventory_mut(InventoryType::Equip)
            .put(1, ItemSlot {
                item_id: 1_302_000,
                quantity: 1,
                equip: Some(EquipBonuses {
                    hp: 500,
                    ..EquipBonuses::default()
                }),
            });
        assert_eq!(equipped_bonus(&character, EquipBonusField::Hp), 0);
    }
}
