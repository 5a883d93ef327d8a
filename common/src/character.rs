//! The authoritative in-memory character model.
//!
//! Every mutating method re-establishes the model invariants before
//! returning: experience stays inside `[0, exp_cap(level)]`, and current
//! HP/MP never exceed the effective maximum (stored maximum plus worn-gear
//! bonuses, capped at the hard ceiling). The persistence layer re-derives
//! the same rules against storage rows; keeping both in one vocabulary is
//! what guarantees the two backends cannot diverge.

use crate::{
    consts::{HP_MP_HARD_CAP, MAX_LEVEL, STAT_CAP},
    equip_bonus::{self, EquipBonusField},
    exp_table,
    inventory::{Inventory, InventoryType},
    skills::SkillBook,
};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub type CharacterId = i32;

/// Progress state of one quest in the character's quest log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    Started,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuddyList {
    capacity: u8,
    buddies: Vec<CharacterId>,
}

impl BuddyList {
    pub fn new(capacity: u8) -> Self {
        Self {
            capacity,
            buddies: Vec::new(),
        }
    }

    pub fn capacity(&self) -> u8 { self.capacity }

    pub fn increase_capacity(&mut self, delta: u8) -> u8 {
        self.capacity = self
            .capacity
            .saturating_add(delta)
            .min(crate::consts::MAX_BUDDY_LIST_CAPACITY);
        self.capacity
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Character {
    id: CharacterId,
    account_id: i32,
    name: String,
    level: i16,
    job: i16,
    str: i16,
    dex: i16,
    int: i16,
    luk: i16,
    ap: i16,
    sp: i16,
    max_hp: i16,
    hp: i16,
    max_mp: i16,
    mp: i16,
    exp: i32,
    mesos: i32,
    fame: i16,
    map_id: i32,
    spawn_point: u8,
    hair: i16,
    skin: i8,
    eyes: i16,
    skills: SkillBook,
    quests: HashMap<u16, QuestStatus>,
    buddy_list: BuddyList,
    inventories: HashMap<InventoryType, Inventory>,
}

fn clamp_stat(value: i32) -> i16 { value.clamp(0, i32::from(STAT_CAP)) as i16 }

impl Character {
    pub fn new(id: CharacterId, account_id: i32, name: &str) -> Self {
        let mut inventories = HashMap::new();
        for ty in [
            InventoryType::Equip,
            InventoryType::Equipped,
            InventoryType::Use,
            InventoryType::Setup,
            InventoryType::Etc,
            InventoryType::Cash,
        ] {
            inventories.insert(ty, Inventory::new(24));
        }
        Self {
            id,
            account_id,
            name: name.to_owned(),
            level: 1,
            job: 0,
            str: 4,
            dex: 4,
            int: 4,
            luk: 4,
            ap: 0,
            sp: 0,
            max_hp: 50,
            hp: 50,
            max_mp: 5,
            mp: 5,
            exp: 0,
            mesos: 0,
            fame: 0,
            map_id: 0,
            spawn_point: 0,
            hair: 0,
            skin: 0,
            eyes: 0,
            skills: SkillBook::default(),
            quests: HashMap::new(),
            buddy_list: BuddyList::new(20),
            inventories,
        }
    }

    pub fn id(&self) -> CharacterId { self.id }

    pub fn account_id(&self) -> i32 { self.account_id }

    pub fn name(&self) -> &str { &self.name }

    pub fn level(&self) -> i16 { self.level }

    pub fn job(&self) -> i16 { self.job }

    pub fn str(&self) -> i16 { self.str }

    pub fn dex(&self) -> i16 { self.dex }

    pub fn int(&self) -> i16 { self.int }

    pub fn luk(&self) -> i16 { self.luk }

    pub fn ap(&self) -> i16 { self.ap }

    pub fn sp(&self) -> i16 { self.sp }

    pub fn max_hp(&self) -> i16 { self.max_hp }

    pub fn hp(&self) -> i16 { self.hp }

    pub fn max_mp(&self) -> i16 { self.max_mp }

    pub fn mp(&self) -> i16 { self.mp }

    pub fn exp(&self) -> i32 { self.exp }

    pub fn mesos(&self) -> i32 { self.mesos }

    pub fn fame(&self) -> i16 { self.fame }

    pub fn map_id(&self) -> i32 { self.map_id }

    pub fn spawn_point(&self) -> u8 { self.spawn_point }

    pub fn hair(&self) -> i16 { self.hair }

    pub fn skin(&self) -> i8 { self.skin }

    pub fn eyes(&self) -> i16 { self.eyes }

    pub fn skills(&self) -> &SkillBook { &self.skills }

    pub fn skills_mut(&mut self) -> &mut SkillBook { &mut self.skills }

    pub fn buddy_list(&self) -> &BuddyList { &self.buddy_list }

    pub fn buddy_list_mut(&mut self) -> &mut BuddyList { &mut self.buddy_list }

    pub fn inventory(&self, ty: InventoryType) -> &Inventory {
        self.inventories
            .get(&ty)
            .expect("every character carries all inventory categories")
    }

    pub fn inventory_mut(&mut self, ty: InventoryType) -> &mut Inventory {
        self.inventories
            .get_mut(&ty)
            .expect("every character carries all inventory categories")
    }

    // Level and experience. Experience gain never levels by itself; narrative
    // level-up is composed by the caller as an explicit level change, which in
    // turn re-clips stored experience.

    pub fn set_level(&mut self, level: i16) {
        self.level = level.clamp(0, MAX_LEVEL);
        self.clip_exp();
    }

    pub fn add_level(&mut self, delta: i16) {
        self.set_level((i32::from(self.level) + i32::from(delta)).clamp(0, i32::from(MAX_LEVEL)) as i16);
    }

    pub fn set_exp(&mut self, exp: i32) {
        self.exp = exp;
        self.clip_exp();
    }

    pub fn add_exp(&mut self, delta: i32) {
        self.exp = (i64::from(self.exp) + i64::from(delta)).clamp(0, i64::from(i32::MAX)) as i32;
        self.clip_exp();
    }

    fn clip_exp(&mut self) { self.exp = self.exp.clamp(0, exp_table::exp_cap(self.level)); }

    pub fn set_job(&mut self, job: i16) { self.job = job; }

    // Base stats and point pools, all saturating inside [0, STAT_CAP].

    pub fn set_str(&mut self, value: i16) { self.str = clamp_stat(i32::from(value)); }

    pub fn add_str(&mut self, delta: i16) {
        self.str = clamp_stat(i32::from(self.str) + i32::from(delta));
    }

    pub fn set_dex(&mut self, value: i16) { self.dex = clamp_stat(i32::from(value)); }

    pub fn add_dex(&mut self, delta: i16) {
        self.dex = clamp_stat(i32::from(self.dex) + i32::from(delta));
    }

    pub fn set_int(&mut self, value: i16) { self.int = clamp_stat(i32::from(value)); }

    pub fn add_int(&mut self, delta: i16) {
        self.int = clamp_stat(i32::from(self.int) + i32::from(delta));
    }

    pub fn set_luk(&mut self, value: i16) { self.luk = clamp_stat(i32::from(value)); }

    pub fn add_luk(&mut self, delta: i16) {
        self.luk = clamp_stat(i32::from(self.luk) + i32::from(delta));
    }

    pub fn set_ap(&mut self, value: i16) { self.ap = clamp_stat(i32::from(value)); }

    pub fn add_ap(&mut self, delta: i16) {
        self.ap = clamp_stat(i32::from(self.ap) + i32::from(delta));
    }

    pub fn set_sp(&mut self, value: i16) { self.sp = clamp_stat(i32::from(value)); }

    pub fn add_sp(&mut self, delta: i16) {
        self.sp = clamp_stat(i32::from(self.sp) + i32::from(delta));
    }

    // Fame may go negative.

    pub fn set_fame(&mut self, value: i16) { self.fame = value; }

    pub fn add_fame(&mut self, delta: i16) { self.fame = self.fame.saturating_add(delta); }

    // HP/MP. Stored maxima clamp at the hard ceiling; current values clamp
    // against the effective maximum, which folds in worn-gear bonuses.

    pub fn effective_max_hp(&self) -> i16 {
        self.max_hp
            .saturating_add(equip_bonus::equipped_bonus(self, EquipBonusField::Hp))
            .min(HP_MP_HARD_CAP)
    }

    pub fn effective_max_mp(&self) -> i16 {
        self.max_mp
            .saturating_add(equip_bonus::equipped_bonus(self, EquipBonusField::Mp))
            .min(HP_MP_HARD_CAP)
    }

    pub fn set_max_hp(&mut self, value: i16) {
        self.max_hp = value.clamp(0, HP_MP_HARD_CAP);
        self.clamp_hp();
    }

    pub fn add_max_hp(&mut self, delta: i16) {
        self.set_max_hp(
            (i32::from(self.max_hp) + i32::from(delta)).clamp(0, i32::from(HP_MP_HARD_CAP)) as i16,
        );
    }

    pub fn set_hp(&mut self, value: i16) {
        self.hp = value.clamp(0, self.effective_max_hp());
    }

    pub fn add_hp(&mut self, delta: i16) {
        self.set_hp((i32::from(self.hp) + i32::from(delta)).clamp(0, i32::from(HP_MP_HARD_CAP)) as i16);
    }

    pub fn set_max_mp(&mut self, value: i16) {
        self.max_mp = value.clamp(0, HP_MP_HARD_CAP);
        self.clamp_mp();
    }

    pub fn add_max_mp(&mut self, delta: i16) {
        self.set_max_mp(
            (i32::from(self.max_mp) + i32::from(delta)).clamp(0, i32::from(HP_MP_HARD_CAP)) as i16,
        );
    }

    pub fn set_mp(&mut self, value: i16) {
        self.mp = value.clamp(0, self.effective_max_mp());
    }

    pub fn add_mp(&mut self, delta: i16) {
        self.set_mp((i32::from(self.mp) + i32::from(delta)).clamp(0, i32::from(HP_MP_HARD_CAP)) as i16);
    }

    fn clamp_hp(&mut self) { self.hp = self.hp.clamp(0, self.effective_max_hp()); }

    fn clamp_mp(&mut self) { self.mp = self.mp.clamp(0, self.effective_max_mp()); }

    // Currency, saturating and never negative.

    pub fn set_mesos(&mut self, value: i32) { self.mesos = value.max(0); }

    pub fn gain_mesos(&mut self, delta: i32) {
        self.mesos = (i64::from(self.mesos) + i64::from(delta)).clamp(0, i64::from(i32::MAX)) as i32;
    }

    // Location and cosmetics.

    pub fn set_location(&mut self, map_id: i32, spawn_point: u8) {
        self.map_id = map_id;
        self.spawn_point = spawn_point;
    }

    pub fn set_hair(&mut self, hair: i16) { self.hair = hair; }

    pub fn set_skin(&mut self, skin: i8) { self.skin = skin; }

    pub fn set_eyes(&mut self, eyes: i16) { self.eyes = eyes; }

    // Quest log.

    pub fn set_quest_status(&mut self, quest_id: u16, status: QuestStatus) {
        self.quests.insert(quest_id, status);
    }

    pub fn is_quest_started(&self, quest_id: u16) -> bool { self.quests.contains_key(&quest_id) }

    pub fn is_quest_active(&self, quest_id: u16) -> bool {
        self.quests.get(&quest_id) == Some(&QuestStatus::Started)
    }

    pub fn is_quest_completed(&self, quest_id: u16) -> bool {
        self.quests.get(&quest_id) == Some(&QuestStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{equip_bonus::EquipBonuses, inventory::ItemSlot};

    fn worn(hp: i16, mp: i16) -> ItemSlot {
        ItemSlot {
            item_id: 1_302_000,
            quantity: 1,
            equip: Some(EquipBonuses {
                hp,
                mp,
                ..EquipBonuses::default()
            }),
        }
    }

    #[test]
    fn level_round_trip_preserves_level() {
        let mut character = Character::new(1, 1, "tess");
        character.set_level(30);
        character.add_level(5);
        character.add_level(-5);
        assert_eq!(character.level(), 30);
    }

    #[test]
    fn level_change_reclips_exp() {
        let mut character = Character::new(1, 1, "tess");
        character.set_level(10);
        character.set_exp(exp_table::exp_cap(10));
        character.add_level(-3);
        assert!(character.exp() <= exp_table::exp_cap(7));
        character.set_level(MAX_LEVEL);
        assert_eq!(character.exp(), 0);
    }

    #[test]
    fn exp_gain_clips_against_current_level_only() {
        let mut character = Character::new(1, 1, "tess");
        character.set_level(10);
        character.set_exp(100);
        character.add_exp(i32::MAX);
        // no auto level-up: exp pins at the current level's cap
        assert_eq!(character.level(), 10);
        assert_eq!(character.exp(), exp_table::exp_cap(10));
        character.add_level(1);
        assert_eq!(character.level(), 11);
        assert!(character.exp() <= exp_table::exp_cap(11));
    }

    #[test]
    fn stat_sets_are_idempotent_and_clamped() {
        let mut character = Character::new(1, 1, "tess");
        character.set_str(500);
        character.set_str(500);
        assert_eq!(character.str(), 500);
        character.add_str(i16::MAX);
        assert_eq!(character.str(), STAT_CAP);
        character.add_str(-i16::MAX);
        character.add_str(-i16::MAX);
        assert_eq!(character.str(), 0);
    }

    #[test]
    fn hp_clamps_against_effective_max() {
        let mut character = Character::new(1, 1, "tess");
        character.set_max_hp(1000);
        character
            .inventory_mut(InventoryType::Equipped)
            .put(1, worn(500, 0));
        character.set_hp(30000);
        assert_eq!(character.hp(), 1500);

        // saturating bonus sums still respect the hard ceiling
        for pos in 2..=4 {
            character
                .inventory_mut(InventoryType::Equipped)
                .put(pos, worn(30000, 0));
        }
        assert_eq!(character.effective_max_hp(), HP_MP_HARD_CAP);
        character.set_hp(i16::MAX);
        assert_eq!(character.hp(), HP_MP_HARD_CAP);
    }

    #[test]
    fn lowering_stored_max_reclamps_current() {
        let mut character = Character::new(1, 1, "tess");
        character.set_max_mp(2000);
        character.set_mp(2000);
        character.set_max_mp(300);
        assert_eq!(character.mp(), 300);
    }

    #[test]
    fn mesos_saturate_and_stay_non_negative() {
        let mut character = Character::new(1, 1, "tess");
        character.gain_mesos(i32::MAX);
        character.gain_mesos(i32::MAX);
        assert_eq!(character.mesos(), i32::MAX);
        character.gain_mesos(i32::MIN);
        character.gain_mesos(i32::MIN);
        assert_eq!(character.mesos(), 0);
    }
}
