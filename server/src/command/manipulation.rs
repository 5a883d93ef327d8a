//! The mutation vocabulary shared by both command backends.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDestination {
    pub map_id: i32,
    pub spawn_point: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillChange {
    pub skill_id: i32,
    pub level: u8,
    pub mastery: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGrant {
    pub item_id: i32,
    pub quantity: i16,
}

/// One admin-initiated change to a character. Additive variants clamp at
/// their stat's bounds rather than erroring; setters clamp the given value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Manipulation {
    ChangeMap(MapDestination),
    ChangeChannel(u8),
    AddLevel(i16),
    SetLevel(i16),
    SetJob(i16),
    AddStr(i16),
    SetStr(i16),
    AddDex(i16),
    SetDex(i16),
    AddInt(i16),
    SetInt(i16),
    AddLuk(i16),
    SetLuk(i16),
    AddAp(i16),
    SetAp(i16),
    AddSp(i16),
    SetSp(i16),
    AddMaxHp(i16),
    SetMaxHp(i16),
    AddMaxMp(i16),
    SetMaxMp(i16),
    AddHp(i16),
    SetHp(i16),
    AddMp(i16),
    SetMp(i16),
    AddFame(i16),
    SetFame(i16),
    AddExp(i32),
    SetExp(i32),
    AddMesos(i32),
    SetMesos(i32),
    SetHair(i16),
    SetSkin(i8),
    SetEyes(i16),
    SetSkillLevel(SkillChange),
    AddItem(ItemGrant),
    CancelDebuffs,
    MaxAllEquipStats,
    MaxInventorySlots,
    MaxBuddyListSlots,
}
