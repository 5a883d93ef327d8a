//! Live command backend: mutates an in-memory player and streams the
//! matching client events.
//!
//! Effects are immediate and there is no rollback: a batch that fails partway
//! leaves the earlier manipulations applied, and the client has already been
//! told about them. The offline backend owns transactional semantics.

use crate::{
    command::{
        CharacterProperty, CommandError, Manipulation, MapDestination, PropertyValue, SkillChange,
    },
    events::{self, OutboundEvent, Session, StatKey},
};
use common::{
    inventory::{tools, InventoryType},
    Character,
};
use hashbrown::HashSet;
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};
use tracing::warn;

/// A connected player: authoritative character state plus session plumbing.
pub struct LivePlayer {
    pub character: Character,
    pub channel: u8,
    pub position: vek::Vec2<i32>,
    pub active_debuffs: HashSet<i32>,
    session: Box<dyn Session>,
}

impl LivePlayer {
    pub fn new(character: Character, channel: u8, session: Box<dyn Session>) -> Self {
        Self {
            character,
            channel,
            position: vek::Vec2::zero(),
            active_debuffs: HashSet::new(),
            session,
        }
    }

    fn send(&mut self, event: OutboundEvent) { self.session.send(event); }

    fn send_stat(&mut self, stat: StatKey, value: i32) {
        self.session.send(OutboundEvent::StatUpdated { stat, value });
    }

    fn apply(&mut self, update: Manipulation) -> Result<(), CommandError> {
        use Manipulation::*;
        match update {
            ChangeMap(MapDestination { map_id, spawn_point }) => {
                self.character.set_location(map_id, spawn_point);
                self.send(OutboundEvent::WarpToMap { map_id, spawn_point });
            },
            ChangeChannel(channel) => {
                self.channel = channel;
                self.send(OutboundEvent::ChannelChange { channel });
            },
            AddLevel(delta) => {
                self.character.add_level(delta);
                self.send_level_and_exp();
            },
            SetLevel(level) => {
                self.character.set_level(level);
                self.send_level_and_exp();
            },
            SetJob(job) => {
                self.character.set_job(job);
                self.send_stat(StatKey::Job, i32::from(job));
            },
            AddStr(d) => {
                self.character.add_str(d);
                self.send_stat(StatKey::Str, i32::from(self.character.str()));
            },
            SetStr(v) => {
                self.character.set_str(v);
                self.send_stat(StatKey::Str, i32::from(self.character.str()));
            },
            AddDex(d) => {
                self.character.add_dex(d);
                self.send_stat(StatKey::Dex, i32::from(self.character.dex()));
            },
            SetDex(v) => {
                self.character.set_dex(v);
                self.send_stat(StatKey::Dex, i32::from(self.character.dex()));
            },
            AddInt(d) => {
                self.character.add_int(d);
                self.send_stat(StatKey::Int, i32::from(self.character.int()));
            },
            SetInt(v) => {
                self.character.set_int(v);
                self.send_stat(StatKey::Int, i32::from(self.character.int()));
            },
            AddLuk(d) => {
                self.character.add_luk(d);
                self.send_stat(StatKey::Luk, i32::from(self.character.luk()));
            },
            SetLuk(v) => {
                self.character.set_luk(v);
                self.send_stat(StatKey::Luk, i32::from(self.character.luk()));
            },
            AddAp(d) => {
                self.character.add_ap(d);
                self.send_stat(StatKey::Ap, i32::from(self.character.ap()));
            },
            SetAp(v) => {
                self.character.set_ap(v);
                self.send_stat(StatKey::Ap, i32::from(self.character.ap()));
            },
            AddSp(d) => {
                self.character.add_sp(d);
                self.send_stat(StatKey::Sp, i32::from(self.character.sp()));
            },
            SetSp(v) => {
                self.character.set_sp(v);
                self.send_stat(StatKey::Sp, i32::from(self.character.sp()));
            },
            AddMaxHp(d) => {
                self.character.add_max_hp(d);
                self.send_max_hp_and_hp();
            },
            SetMaxHp(v) => {
                self.character.set_max_hp(v);
                self.send_max_hp_and_hp();
            },
            AddMaxMp(d) => {
                self.character.add_max_mp(d);
                self.send_max_mp_and_mp();
            },
            SetMaxMp(v) => {
                self.character.set_max_mp(v);
                self.send_max_mp_and_mp();
            },
            AddHp(d) => {
                self.character.add_hp(d);
                self.send_stat(StatKey::Hp, i32::from(self.character.hp()));
            },
            SetHp(v) => {
                self.character.set_hp(v);
                self.send_stat(StatKey::Hp, i32::from(self.character.hp()));
            },
            AddMp(d) => {
                self.character.add_mp(d);
                self.send_stat(StatKey::Mp, i32::from(self.character.mp()));
            },
            SetMp(v) => {
                self.character.set_mp(v);
                self.send_stat(StatKey::Mp, i32::from(self.character.mp()));
            },
            AddFame(d) => {
                self.character.add_fame(d);
                self.send_stat(StatKey::Fame, i32::from(self.character.fame()));
            },
            SetFame(v) => {
                self.character.set_fame(v);
                self.send_stat(StatKey::Fame, i32::from(self.character.fame()));
            },
            AddExp(d) => {
                self.character.add_exp(d);
                self.send_stat(StatKey::Exp, self.character.exp());
            },
            SetExp(v) => {
                self.character.set_exp(v);
                self.send_stat(StatKey::Exp, self.character.exp());
            },
            AddMesos(d) => {
                self.character.gain_mesos(d);
                self.send_stat(StatKey::Mesos, self.character.mesos());
            },
            SetMesos(v) => {
                self.character.set_mesos(v);
                self.send_stat(StatKey::Mesos, self.character.mesos());
            },
            SetHair(v) => {
                self.character.set_hair(v);
                self.send_stat(StatKey::Hair, i32::from(v));
            },
            SetSkin(v) => {
                self.character.set_skin(v);
                self.send_stat(StatKey::Skin, i32::from(v));
            },
            SetEyes(v) => {
                self.character.set_eyes(v);
                self.send_stat(StatKey::Eyes, i32::from(v));
            },
            SetSkillLevel(SkillChange { skill_id, level, mastery }) => {
                self.character.skills_mut().set(skill_id, level, mastery);
                self.send(OutboundEvent::SkillUpdated { skill_id, level, mastery });
            },
            AddItem(grant) => {
                if !self.gain_item(grant.item_id, grant.quantity) {
                    return Err(CommandError::InventoryFull {
                        item_id: grant.item_id,
                        quantity: grant.quantity,
                    });
                }
            },
            CancelDebuffs => {
                self.active_debuffs.clear();
                self.send(OutboundEvent::DebuffsCancelled);
            },
            MaxAllEquipStats => {
                return Err(CommandError::UnsupportedOperation("MaxAllEquipStats on live target"));
            },
            MaxInventorySlots => {
                return Err(CommandError::UnsupportedOperation("MaxInventorySlots on live target"));
            },
            MaxBuddyListSlots => {
                return Err(CommandError::UnsupportedOperation("MaxBuddyListSlots on live target"));
            },
        }
        Ok(())
    }

    // Level and maximum changes can reclamp a paired value, so both stats go
    // out.
    fn send_level_and_exp(&mut self) {
        let (level, exp) = (i32::from(self.character.level()), self.character.exp());
        self.send_stat(StatKey::Level, level);
        self.send_stat(StatKey::Exp, exp);
    }

    fn send_max_hp_and_hp(&mut self) {
        let (max_hp, hp) = (i32::from(self.character.max_hp()), i32::from(self.character.hp()));
        self.send_stat(StatKey::MaxHp, max_hp);
        self.send_stat(StatKey::Hp, hp);
    }

    fn send_max_mp_and_mp(&mut self) {
        let (max_mp, mp) = (i32::from(self.character.max_mp()), i32::from(self.character.mp()));
        self.send_stat(StatKey::MaxMp, max_mp);
        self.send_stat(StatKey::Mp, mp);
    }

    // Script-facing inventory surface.

    pub fn can_gain_item(&self, item_id: i32, quantity: i16) -> bool {
        tools::can_fit_entirely(
            self.character.inventory(InventoryType::from_item_id(item_id)),
            item_id,
            quantity,
        )
    }

    pub fn has_item(&self, item_id: i32, quantity: i16) -> bool {
        tools::has_item(&self.character, item_id, quantity)
    }

    /// Grants items with the fixed notification order: modified stacks, new
    /// slots, then one aggregate toast. Returns false (and changes nothing)
    /// when the grant does not fit.
    pub fn gain_item(&mut self, item_id: i32, quantity: i16) -> bool {
        let ty = InventoryType::from_item_id(item_id);
        if !self.can_gain_item(item_id, quantity) {
            return false;
        }
        let change = tools::add_to_inventory(self.character.inventory_mut(ty), item_id, quantity);
        events::notify_gain(&mut *self.session, ty, self.character.inventory(ty), &change);
        self.session
            .send(OutboundEvent::ItemGainToast { item_id, quantity: i32::from(quantity) });
        true
    }

    /// Removes items, draining the carried container first and worn gear for
    /// any equip remainder. The character must hold the full quantity;
    /// otherwise nothing is removed and nothing is emitted. Returns the
    /// number of units removed.
    pub fn lose_item(&mut self, item_id: i32, quantity: i16) -> i32 {
        if !self.has_item(item_id, quantity) {
            return 0;
        }
        let ty = InventoryType::from_item_id(item_id);
        let mut removed =
            self.lose_from(ty, item_id, i32::from(quantity));
        if ty == InventoryType::Equip && removed < i32::from(quantity) {
            removed += self.lose_from(
                InventoryType::Equipped,
                item_id,
                i32::from(quantity) - removed,
            );
        }
        if removed > 0 {
            self.session
                .send(OutboundEvent::ItemGainToast { item_id, quantity: -removed });
        }
        removed
    }

    /// Removes every unit of `item_id` the character holds.
    pub fn lose_all(&mut self, item_id: i32) -> i32 {
        let ty = InventoryType::from_item_id(item_id);
        let mut held = tools::total_quantity(self.character.inventory(ty), item_id);
        if ty == InventoryType::Equip {
            held +=
                tools::total_quantity(self.character.inventory(InventoryType::Equipped), item_id);
        }
        match i16::try_from(held) {
            Ok(held) if held > 0 => self.lose_item(item_id, held),
            _ => 0,
        }
    }

    fn lose_from(&mut self, ty: InventoryType, item_id: i32, quantity: i32) -> i32 {
        let before = tools::total_quantity(self.character.inventory(ty), item_id);
        let take = quantity.min(before);
        let Ok(take) = i16::try_from(take) else { return 0 };
        if take <= 0 {
            return 0;
        }
        let change = tools::remove_from_inventory(self.character.inventory_mut(ty), item_id, take);
        events::notify_loss(&mut *self.session, ty, self.character.inventory(ty), &change);
        i32::from(take)
    }

    pub fn has_mesos(&self, amount: i32) -> bool { self.character.mesos() >= amount }

    pub fn gain_mesos(&mut self, amount: i32) {
        self.character.gain_mesos(amount);
        let mesos = self.character.mesos();
        self.send_stat(StatKey::Mesos, mesos);
    }

    pub fn lose_mesos(&mut self, amount: i32) { self.gain_mesos(amount.saturating_neg()); }

    pub fn increase_inventory_capacity(&mut self, ty: InventoryType, delta: u8) {
        let capacity = self.character.inventory_mut(ty).increase_capacity(delta);
        self.send(OutboundEvent::InventoryCapacityUpdated { inventory: ty, capacity });
    }

    pub fn increase_buddy_capacity(&mut self, delta: u8) {
        let capacity = self.character.buddy_list_mut().increase_capacity(delta);
        self.send(OutboundEvent::BuddyCapacityUpdated { capacity });
    }
}

/// Weak handle onto a connected player. Holding one never keeps the player
/// resident; every use re-checks liveness.
pub struct LiveTarget {
    player: Weak<RefCell<LivePlayer>>,
}

impl LiveTarget {
    pub fn new(player: &Rc<RefCell<LivePlayer>>) -> Self { Self { player: Rc::downgrade(player) } }

    fn resolve(&self) -> Result<Rc<RefCell<LivePlayer>>, CommandError> {
        self.player.upgrade().ok_or(CommandError::TargetNotLive)
    }

    pub(super) fn mutate(&self, updates: &[Manipulation]) -> Result<(), CommandError> {
        let player = self.resolve()?;
        let mut player = player.borrow_mut();
        for &update in updates {
            player.apply(update)?;
        }
        Ok(())
    }

    pub(super) fn access(&self, property: CharacterProperty) -> Option<PropertyValue> {
        let Ok(player) = self.resolve() else {
            warn!("Property access against a player who logged off");
            return None;
        };
        let player = player.borrow();
        Some(match property {
            CharacterProperty::Map => PropertyValue::Map(MapDestination {
                map_id: player.character.map_id(),
                spawn_point: player.character.spawn_point(),
            }),
            CharacterProperty::Channel => PropertyValue::Channel(player.channel),
            CharacterProperty::Position => PropertyValue::Position(player.position),
            CharacterProperty::PlayerId => PropertyValue::PlayerId(player.character.id()),
        })
    }
}
