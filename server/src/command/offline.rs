//! Offline command backend: mutates character rows directly in storage.
//!
//! Each call opens its own scoped connection, turns on dirty reads so the
//! batch can observe its own intermediate state cheaply, and runs every
//! manipulation inside one transaction. A failed batch rolls back whole;
//! the dirty-read pragma is restored on every exit path.

use crate::{
    command::{
        CharacterProperty, CommandError, ItemGrant, Manipulation, MapDestination, PropertyValue,
        SkillChange,
    },
    persistence::{
        character_row, establish_connection, DatabaseSettings, PersistenceError,
    },
    world::MapIndex,
};
use common::{
    consts::{HP_MP_HARD_CAP, MAX_LEVEL, STAT_CAP},
    equip_bonus::EquipBonusField,
    exp_table,
    inventory::{tools, InventoryType},
};
use rusqlite::{Connection, DropBehavior};
use std::sync::{Arc, RwLock};
use tracing::{error, warn};

/// Storage-backed handle onto a character who is not connected anywhere.
pub struct OfflineTarget {
    name: String,
    settings: Arc<RwLock<DatabaseSettings>>,
    map_index: Arc<dyn MapIndex>,
}

impl OfflineTarget {
    pub fn new(
        name: String,
        settings: Arc<RwLock<DatabaseSettings>>,
        map_index: Arc<dyn MapIndex>,
    ) -> Self {
        Self { name, settings, map_index }
    }

    pub fn name(&self) -> &str { &self.name }

    pub(super) fn mutate(&self, updates: &[Manipulation]) -> Result<(), CommandError> {
        // Unwrap here is safe as there is no code that can panic when the
        // write lock is taken that could cause the RwLock to become poisoned.
        let settings = self.settings.read().unwrap().clone();
        let mut conn = establish_connection(&settings)?;

        conn.connection
            .pragma_update(None, "read_uncommitted", true)
            .map_err(PersistenceError::DatabaseError)?;
        let result = Self::apply_all(&mut conn.connection, &self.name, updates);
        if let Err(error) = conn.connection.pragma_update(None, "read_uncommitted", false) {
            warn!(%error, "Failed to restore the read_uncommitted pragma");
        }
        result
    }

    fn apply_all(
        connection: &mut Connection,
        name: &str,
        updates: &[Manipulation],
    ) -> Result<(), CommandError> {
        let mut transaction = connection.transaction()?;
        transaction.set_drop_behavior(DropBehavior::Rollback);
        for &update in updates {
            if let Err(error) = Self::apply(&transaction, name, update) {
                error!(%error, name, "Offline manipulation failed, rolling back the batch");
                if let Err(rollback_error) = transaction.rollback() {
                    warn!(%rollback_error, "Rollback of failed offline batch also failed");
                }
                return Err(error);
            }
        }
        transaction.commit()?;
        Ok(())
    }

    fn apply(
        connection: &Connection,
        name: &str,
        update: Manipulation,
    ) -> Result<(), CommandError> {
        use Manipulation::*;
        let stat_cap = i64::from(STAT_CAP);
        let hard_cap = i64::from(HP_MP_HARD_CAP);
        match update {
            ChangeMap(MapDestination { map_id, spawn_point }) => {
                character_row::set_location(connection, name, map_id, spawn_point)?;
            },
            ChangeChannel(_) => {
                return Err(CommandError::UnsupportedOperation(
                    "ChangeChannel on offline target",
                ));
            },
            AddLevel(d) => {
                character_row::add_value_clamped(
                    connection,
                    name,
                    "level",
                    i64::from(d),
                    i64::from(MAX_LEVEL),
                    0,
                )?;
                Self::clip_exp(connection, name)?;
            },
            SetLevel(v) => {
                character_row::set_value(
                    connection,
                    name,
                    "level",
                    i64::from(v),
                    i64::from(MAX_LEVEL),
                    0,
                )?;
                Self::clip_exp(connection, name)?;
            },
            SetJob(v) => {
                character_row::set_value(
                    connection,
                    name,
                    "job",
                    i64::from(v),
                    i64::from(i16::MAX),
                    i64::from(i16::MIN),
                )?;
            },
            AddStr(d) => {
                character_row::add_value_clamped(connection, name, "str", i64::from(d), stat_cap, 0)?;
            },
            SetStr(v) => {
                character_row::set_value(connection, name, "str", i64::from(v), stat_cap, 0)?;
            },
            AddDex(d) => {
                character_row::add_value_clamped(connection, name, "dex", i64::from(d), stat_cap, 0)?;
            },
            SetDex(v) => {
                character_row::set_value(connection, name, "dex", i64::from(v), stat_cap, 0)?;
            },
            AddInt(d) => {
                character_row::add_value_clamped(connection, name, "int", i64::from(d), stat_cap, 0)?;
            },
            SetInt(v) => {
                character_row::set_value(connection, name, "int", i64::from(v), stat_cap, 0)?;
            },
            AddLuk(d) => {
                character_row::add_value_clamped(connection, name, "luk", i64::from(d), stat_cap, 0)?;
            },
            SetLuk(v) => {
                character_row::set_value(connection, name, "luk", i64::from(v), stat_cap, 0)?;
            },
            AddAp(d) => {
                character_row::add_value_clamped(connection, name, "ap", i64::from(d), stat_cap, 0)?;
            },
            SetAp(v) => {
                character_row::set_value(connection, name, "ap", i64::from(v), stat_cap, 0)?;
            },
            AddSp(d) => {
                character_row::add_value_clamped(connection, name, "sp", i64::from(d), stat_cap, 0)?;
            },
            SetSp(v) => {
                character_row::set_value(connection, name, "sp", i64::from(v), stat_cap, 0)?;
            },
            AddMaxHp(d) => {
                character_row::add_value_clamped(
                    connection, name, "maxhp", i64::from(d), hard_cap, 0,
                )?;
                Self::clamp_current(connection, name, "hp", "maxhp", EquipBonusField::Hp)?;
            },
            SetMaxHp(v) => {
                character_row::set_value(connection, name, "maxhp", i64::from(v), hard_cap, 0)?;
                Self::clamp_current(connection, name, "hp", "maxhp", EquipBonusField::Hp)?;
            },
            AddMaxMp(d) => {
                character_row::add_value_clamped(
                    connection, name, "maxmp", i64::from(d), hard_cap, 0,
                )?;
                Self::clamp_current(connection, name, "mp", "maxmp", EquipBonusField::Mp)?;
            },
            SetMaxMp(v) => {
                character_row::set_value(connection, name, "maxmp", i64::from(v), hard_cap, 0)?;
                Self::clamp_current(connection, name, "mp", "maxmp", EquipBonusField::Mp)?;
            },
            AddHp(d) => {
                let max = Self::effective_max(connection, name, "maxhp", EquipBonusField::Hp)?;
                character_row::add_value_clamped(connection, name, "hp", i64::from(d), max, 0)?;
            },
            SetHp(v) => {
                let max = Self::effective_max(connection, name, "maxhp", EquipBonusField::Hp)?;
                character_row::set_value(connection, name, "hp", i64::from(v), max, 0)?;
            },
            AddMp(d) => {
                let max = Self::effective_max(connection, name, "maxmp", EquipBonusField::Mp)?;
                character_row::add_value_clamped(connection, name, "mp", i64::from(d), max, 0)?;
            },
            SetMp(v) => {
                let max = Self::effective_max(connection, name, "maxmp", EquipBonusField::Mp)?;
                character_row::set_value(connection, name, "mp", i64::from(v), max, 0)?;
            },
            AddFame(d) => {
                character_row::add_value_clamped(
                    connection,
                    name,
                    "fame",
                    i64::from(d),
                    i64::from(i16::MAX),
                    i64::from(i16::MIN),
                )?;
            },
            SetFame(v) => {
                character_row::set_value(
                    connection,
                    name,
                    "fame",
                    i64::from(v),
                    i64::from(i16::MAX),
                    i64::from(i16::MIN),
                )?;
            },
            AddExp(d) => {
                let cap = Self::exp_cap(connection, name)?;
                character_row::add_value_clamped(connection, name, "exp", i64::from(d), cap, 0)?;
            },
            SetExp(v) => {
                let cap = Self::exp_cap(connection, name)?;
                character_row::set_value(connection, name, "exp", i64::from(v), cap, 0)?;
            },
            AddMesos(d) => {
                character_row::add_value_clamped(
                    connection,
                    name,
                    "mesos",
                    i64::from(d),
                    i64::from(i32::MAX),
                    0,
                )?;
            },
            SetMesos(v) => {
                character_row::set_value(
                    connection,
                    name,
                    "mesos",
                    i64::from(v),
                    i64::from(i32::MAX),
                    0,
                )?;
            },
            SetHair(v) => {
                character_row::set_value(
                    connection,
                    name,
                    "hair",
                    i64::from(v),
                    i64::from(i16::MAX),
                    0,
                )?;
            },
            SetSkin(v) => {
                character_row::set_value(
                    connection,
                    name,
                    "skin",
                    i64::from(v),
                    i64::from(i8::MAX),
                    0,
                )?;
            },
            SetEyes(v) => {
                character_row::set_value(
                    connection,
                    name,
                    "eyes",
                    i64::from(v),
                    i64::from(i16::MAX),
                    0,
                )?;
            },
            SetSkillLevel(SkillChange { skill_id, level, mastery }) => {
                let character_id = character_row::id_from_name(connection, name)?;
                character_row::set_skill_level(connection, character_id, skill_id, level, mastery)?;
            },
            AddItem(grant) => Self::grant_item(connection, name, grant)?,
            // Offline characters carry no active effects to dispel.
            CancelDebuffs => {},
            MaxAllEquipStats => character_row::max_all_equip_stats(connection, name)?,
            MaxInventorySlots => character_row::max_inventory_slots(connection, name)?,
            MaxBuddyListSlots => character_row::max_buddy_list_slots(connection, name)?,
        }
        Ok(())
    }

    fn exp_cap(connection: &Connection, name: &str) -> Result<i64, PersistenceError> {
        let level = character_row::get_value(connection, name, "level")?;
        Ok(i64::from(exp_table::exp_cap(level.clamp(0, i64::from(MAX_LEVEL)) as i16)))
    }

    fn clip_exp(connection: &Connection, name: &str) -> Result<(), PersistenceError> {
        let cap = Self::exp_cap(connection, name)?;
        character_row::add_value_clamped(connection, name, "exp", 0, cap, 0)
    }

    fn effective_max(
        connection: &Connection,
        name: &str,
        max_column: &str,
        field: EquipBonusField,
    ) -> Result<i64, PersistenceError> {
        let stored = character_row::get_value(connection, name, max_column)?;
        let bonus = character_row::equipped_bonus(connection, name, field)?;
        Ok((stored + bonus).min(i64::from(HP_MP_HARD_CAP)))
    }

    fn clamp_current(
        connection: &Connection,
        name: &str,
        column: &str,
        max_column: &str,
        field: EquipBonusField,
    ) -> Result<(), PersistenceError> {
        let max = Self::effective_max(connection, name, max_column, field)?;
        character_row::add_value_clamped(connection, name, column, 0, max, 0)
    }

    /// All-or-nothing item grant against storage rows, using the same fit
    /// check and placement rules as the live backend.
    fn grant_item(
        connection: &Connection,
        name: &str,
        grant: ItemGrant,
    ) -> Result<(), CommandError> {
        let ty = InventoryType::from_item_id(grant.item_id);
        let header = character_row::character_header(connection, name, ty)?;
        let mut inventory =
            character_row::load_inventory(connection, header.character_id, ty, header.capacity)?;
        if !tools::can_fit_entirely(&inventory, grant.item_id, grant.quantity) {
            return Err(CommandError::InventoryFull {
                item_id: grant.item_id,
                quantity: grant.quantity,
            });
        }
        tools::add_to_inventory(&mut inventory, grant.item_id, grant.quantity);
        character_row::commit_inventory(connection, header.character_id, ty, &inventory)?;
        Ok(())
    }

    pub(super) fn access(&self, property: CharacterProperty) -> Option<PropertyValue> {
        match self.try_access(property) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, name = self.name.as_str(), "Offline property access failed");
                None
            },
        }
    }

    fn try_access(
        &self,
        property: CharacterProperty,
    ) -> Result<Option<PropertyValue>, CommandError> {
        // See `mutate` for why the unwrap is safe.
        let settings = self.settings.read().unwrap().clone();
        let conn = establish_connection(&settings)?;
        let connection = &conn.connection;
        Ok(match property {
            CharacterProperty::Map => {
                let (map_id, spawn_point) = character_row::location(connection, &self.name)?;
                Some(PropertyValue::Map(MapDestination { map_id, spawn_point }))
            },
            // Offline characters sit on no channel.
            CharacterProperty::Channel => Some(PropertyValue::Channel(0)),
            CharacterProperty::Position => {
                let (map_id, spawn_point) = character_row::location(connection, &self.name)?;
                self.map_index
                    .portal_position(map_id, spawn_point)
                    .map(PropertyValue::Position)
            },
            CharacterProperty::PlayerId => {
                let id = character_row::id_from_name(connection, &self.name)?;
                Some(PropertyValue::PlayerId(id as i32))
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{run_migrations, SqlLogMode};
    use rusqlite::params;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vek::Vec2;

    const POTION: i32 = 2_000_000;
    const SWORD: i32 = 1_302_000;

    struct FixedPortal(Vec2<i32>);

    impl MapIndex for FixedPortal {
        fn portal_position(&self, _map_id: i32, _spawn_point: u8) -> Option<Vec2<i32>> {
            Some(self.0)
        }
    }

    fn test_settings() -> DatabaseSettings {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let db_dir = std::env::temp_dir().join(format!(
            "solstice-offline-test-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        DatabaseSettings { db_dir, sql_log_mode: SqlLogMode::Disabled }
    }

    fn seed(settings: &DatabaseSettings, name: &str) {
        run_migrations(settings).unwrap();
        let conn = establish_connection(settings).unwrap();
        conn.connection
            .execute("INSERT INTO accounts (name) VALUES (?1)", params![format!("{}-acct", name)])
            .unwrap();
        let account_id = conn.connection.last_insert_rowid();
        conn.connection
            .execute(
                "INSERT INTO characters (accountid, name) VALUES (?1, ?2)",
                params![account_id, name],
            )
            .unwrap();
    }

    fn target(settings: &DatabaseSettings, name: &str) -> OfflineTarget {
        OfflineTarget::new(
            name.to_string(),
            Arc::new(RwLock::new(settings.clone())),
            Arc::new(FixedPortal(Vec2::new(120, -35))),
        )
    }

    fn column(settings: &DatabaseSettings, name: &str, column: &str) -> i64 {
        let conn = establish_connection(settings).unwrap();
        character_row::get_value(&conn.connection, name, column).unwrap()
    }

    #[test]
    fn level_round_trip_preserves_level() {
        let settings = test_settings();
        seed(&settings, "tess");
        let target = target(&settings, "tess");
        target
            .mutate(&[
                Manipulation::SetLevel(30),
                Manipulation::AddLevel(5),
                Manipulation::AddLevel(-5),
            ])
            .unwrap();
        assert_eq!(column(&settings, "tess", "level"), 30);
    }

    #[test]
    fn exp_clips_to_the_current_level_cap() {
        let settings = test_settings();
        seed(&settings, "tess");
        let target = target(&settings, "tess");
        target
            .mutate(&[Manipulation::SetLevel(10), Manipulation::SetExp(i32::MAX)])
            .unwrap();
        assert_eq!(column(&settings, "tess", "exp"), i64::from(exp_table::exp_cap(10)));

        target.mutate(&[Manipulation::AddLevel(-3)]).unwrap();
        assert!(column(&settings, "tess", "exp") <= i64::from(exp_table::exp_cap(7)));
    }

    #[test]
    fn failed_batch_rolls_back_earlier_manipulations() {
        let settings = test_settings();
        seed(&settings, "tess");
        let target = target(&settings, "tess");
        let result = target.mutate(&[
            Manipulation::AddMesos(500),
            Manipulation::ChangeChannel(2),
        ]);
        assert!(matches!(result, Err(CommandError::UnsupportedOperation(_))));
        assert_eq!(column(&settings, "tess", "mesos"), 0);
    }

    #[test]
    fn missing_character_reports_not_found() {
        let settings = test_settings();
        run_migrations(&settings).unwrap();
        let target = target(&settings, "nobody");
        let result = target.mutate(&[Manipulation::AddMesos(1)]);
        assert!(matches!(
            result,
            Err(CommandError::Persistence(PersistenceError::CharacterNotFound(_)))
        ));
    }

    #[test]
    fn item_grant_persists_split_stacks() {
        let settings = test_settings();
        seed(&settings, "tess");
        let target = target(&settings, "tess");
        target
            .mutate(&[Manipulation::AddItem(ItemGrant { item_id: POTION, quantity: 150 })])
            .unwrap();

        let conn = establish_connection(&settings).unwrap();
        let quantities: Vec<i64> = conn
            .connection
            .prepare(
                "SELECT quantity FROM inventoryitems
                 WHERE itemid = ?1 AND inventorytype = ?2 ORDER BY position",
            )
            .unwrap()
            .query_map(params![POTION, InventoryType::Use.to_db()], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(quantities, vec![100, 50]);
    }

    #[test]
    fn full_inventory_rejects_the_grant_entirely() {
        let settings = test_settings();
        seed(&settings, "tess");
        {
            let conn = establish_connection(&settings).unwrap();
            conn.connection
                .execute("UPDATE characters SET useslots = 1 WHERE name = 'tess'", [])
                .unwrap();
            conn.connection
                .execute(
                    "INSERT INTO inventoryitems (characterid, inventorytype, position, itemid, quantity)
                     SELECT id, ?1, 1, ?2, 100 FROM characters WHERE name = 'tess'",
                    params![InventoryType::Use.to_db(), POTION],
                )
                .unwrap();
        }
        let target = target(&settings, "tess");
        let result =
            target.mutate(&[Manipulation::AddItem(ItemGrant { item_id: POTION, quantity: 1 })]);
        assert!(matches!(result, Err(CommandError::InventoryFull { .. })));

        let conn = establish_connection(&settings).unwrap();
        let rows: i64 = conn
            .connection
            .query_row("SELECT COUNT(*) FROM inventoryitems", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn skill_changes_replace_the_existing_row() {
        let settings = test_settings();
        seed(&settings, "tess");
        let target = target(&settings, "tess");
        let skill = |level, mastery| {
            Manipulation::SetSkillLevel(SkillChange { skill_id: 4_211_003, level, mastery })
        };
        target.mutate(&[skill(5, 10)]).unwrap();
        target.mutate(&[skill(2, 10)]).unwrap();

        let conn = establish_connection(&settings).unwrap();
        let (count, level): (i64, i64) = conn
            .connection
            .query_row(
                "SELECT COUNT(*), MAX(level) FROM skills WHERE skillid = 4211003",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((count, level), (1, 2));
    }

    #[test]
    fn current_hp_clamps_against_worn_gear_bonuses() {
        let settings = test_settings();
        seed(&settings, "tess");
        {
            let conn = establish_connection(&settings).unwrap();
            conn.connection
                .execute(
                    "INSERT INTO inventoryitems (characterid, inventorytype, position, itemid, quantity)
                     SELECT id, ?1, 1, ?2, 1 FROM characters WHERE name = 'tess'",
                    params![InventoryType::Equipped.to_db(), SWORD],
                )
                .unwrap();
            let item_row = conn.connection.last_insert_rowid();
            conn.connection
                .execute(
                    "INSERT INTO inventoryequipment (inventoryitemid, hp) VALUES (?1, 500)",
                    params![item_row],
                )
                .unwrap();
        }
        let target = target(&settings, "tess");
        target
            .mutate(&[Manipulation::SetMaxHp(1000), Manipulation::SetHp(i16::MAX)])
            .unwrap();
        assert_eq!(column(&settings, "tess", "hp"), 1500);

        // shrinking the stored maximum reclamps the current value
        target.mutate(&[Manipulation::SetMaxHp(100)]).unwrap();
        assert_eq!(column(&settings, "tess", "hp"), 600);
    }

    #[test]
    fn max_inventory_slots_sweeps_character_and_account() {
        let settings = test_settings();
        seed(&settings, "tess");
        let target = target(&settings, "tess");
        target.mutate(&[Manipulation::MaxInventorySlots]).unwrap();
        for col in ["equipslots", "useslots", "setupslots", "etcslots", "cashslots"] {
            assert_eq!(column(&settings, "tess", col), 255);
        }
        let conn = establish_connection(&settings).unwrap();
        let storage: i64 = conn
            .connection
            .query_row("SELECT storageslots FROM accounts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(storage, 255);
    }

    #[test]
    fn max_all_equip_stats_sweeps_worn_gear_only() {
        let settings = test_settings();
        seed(&settings, "tess");
        {
            let conn = establish_connection(&settings).unwrap();
            for (ty, position) in
                [(InventoryType::Equipped.to_db(), 1), (InventoryType::Equip.to_db(), 1)]
            {
                conn.connection
                    .execute(
                        "INSERT INTO inventoryitems (characterid, inventorytype, position, itemid, quantity)
                         SELECT id, ?1, ?2, ?3, 1 FROM characters WHERE name = 'tess'",
                        params![ty, position, SWORD],
                    )
                    .unwrap();
                let item_row = conn.connection.last_insert_rowid();
                conn.connection
                    .execute(
                        "INSERT INTO inventoryequipment (inventoryitemid) VALUES (?1)",
                        params![item_row],
                    )
                    .unwrap();
            }
        }
        let target = target(&settings, "tess");
        target.mutate(&[Manipulation::MaxAllEquipStats]).unwrap();

        let conn = establish_connection(&settings).unwrap();
        let row = |ty: i64| -> (i64, i64, i64) {
            conn.connection
                .query_row(
                    "SELECT e.watk, e.speed, e.jump FROM inventoryequipment e
                     INNER JOIN inventoryitems i ON i.inventoryitemid = e.inventoryitemid
                     WHERE i.inventorytype = ?1",
                    params![ty],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .unwrap()
        };
        assert_eq!(row(InventoryType::Equipped.to_db()), (32767, 40, 23));
        // the bagged copy keeps its rolls
        assert_eq!(row(InventoryType::Equip.to_db()), (0, 0, 0));
    }

    #[test]
    fn properties_resolve_from_storage() {
        let settings = test_settings();
        seed(&settings, "tess");
        let target = target(&settings, "tess");
        target
            .mutate(&[Manipulation::ChangeMap(MapDestination { map_id: 100_000_000, spawn_point: 3 })])
            .unwrap();

        assert_eq!(
            target.access(CharacterProperty::Map),
            Some(PropertyValue::Map(MapDestination { map_id: 100_000_000, spawn_point: 3 }))
        );
        assert_eq!(target.access(CharacterProperty::Channel), Some(PropertyValue::Channel(0)));
        assert_eq!(
            target.access(CharacterProperty::Position),
            Some(PropertyValue::Position(Vec2::new(120, -35)))
        );
        assert!(
            matches!(target.access(CharacterProperty::PlayerId), Some(PropertyValue::PlayerId(_)))
        );
        assert!(target.access(CharacterProperty::Map).is_some());

        let stale = OfflineTarget::new(
            "nobody".to_string(),
            Arc::new(RwLock::new(settings.clone())),
            Arc::new(FixedPortal(Vec2::zero())),
        );
        assert_eq!(stale.access(CharacterProperty::Map), None);
    }
}
