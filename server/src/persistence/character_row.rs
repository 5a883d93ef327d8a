//! Row-level SQL for offline character mutation.
//!
//! Every function takes a `&Connection`; callers on the mutation path pass a
//! transaction (which derefs to one) so a batch commits or rolls back as a
//! unit. Column names are interpolated, never user input, and are always
//! double-quoted since `int` collides with a sqlite type name.

use crate::persistence::PersistenceError;
use common::{
    equip_bonus::{EquipBonusField, EquipBonuses},
    inventory::{Inventory, InventoryType, ItemSlot},
};
use rusqlite::{params, Connection, OptionalExtension};

/// Sets a characters column to `value` clamped into `[lower, upper]`.
pub fn set_value(
    connection: &Connection,
    name: &str,
    column: &str,
    value: i64,
    upper: i64,
    lower: i64,
) -> Result<(), PersistenceError> {
    let updated = connection.execute(
        &format!("UPDATE characters SET \"{0}\" = MAX(MIN(?1, ?2), ?3) WHERE name = ?4", column),
        params![value, upper, lower, name],
    )?;
    if updated != 1 {
        return Err(PersistenceError::CharacterNotFound(name.to_string()));
    }
    Ok(())
}

/// Adds `delta` to a characters column, clamping the sum into `[lower,
/// upper]` inside the statement so concurrent readers never observe an
/// out-of-range intermediate.
pub fn add_value_clamped(
    connection: &Connection,
    name: &str,
    column: &str,
    delta: i64,
    upper: i64,
    lower: i64,
) -> Result<(), PersistenceError> {
    let updated = connection.execute(
        &format!(
            "UPDATE characters SET \"{0}\" = MAX(MIN(\"{0}\" + ?1, ?2), ?3) WHERE name = ?4",
            column
        ),
        params![delta, upper, lower, name],
    )?;
    if updated != 1 {
        return Err(PersistenceError::CharacterNotFound(name.to_string()));
    }
    Ok(())
}

pub fn get_value(
    connection: &Connection,
    name: &str,
    column: &str,
) -> Result<i64, PersistenceError> {
    connection
        .query_row(
            &format!("SELECT \"{0}\" FROM characters WHERE name = ?1", column),
            params![name],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| PersistenceError::CharacterNotFound(name.to_string()))
}

/// Sums one bonus column over the character's worn equipment, saturating at
/// the column ceiling.
pub fn equipped_bonus(
    connection: &Connection,
    name: &str,
    field: EquipBonusField,
) -> Result<i64, PersistenceError> {
    let column = bonus_column(field);
    let total = connection.query_row(
        &format!(
            "SELECT MIN(COALESCE(SUM(e.\"{0}\"), 0), 32767)
             FROM inventoryequipment e
             INNER JOIN inventoryitems i ON i.inventoryitemid = e.inventoryitemid
             INNER JOIN characters c ON c.id = i.characterid
             WHERE c.name = ?1 AND i.inventorytype = ?2",
            column
        ),
        params![name, InventoryType::Equipped.to_db()],
        |row| row.get(0),
    )?;
    Ok(total)
}

fn bonus_column(field: EquipBonusField) -> &'static str {
    match field {
        EquipBonusField::Str => "str",
        EquipBonusField::Dex => "dex",
        EquipBonusField::Int => "int",
        EquipBonusField::Luk => "luk",
        EquipBonusField::Hp => "hp",
        EquipBonusField::Mp => "mp",
        EquipBonusField::Watk => "watk",
        EquipBonusField::Matk => "matk",
        EquipBonusField::Wdef => "wdef",
        EquipBonusField::Mdef => "mdef",
        EquipBonusField::Acc => "acc",
        EquipBonusField::Avoid => "avoid",
        EquipBonusField::Hands => "hands",
        EquipBonusField::Speed => "speed",
        EquipBonusField::Jump => "jump",
    }
}

pub fn set_location(
    connection: &Connection,
    name: &str,
    map_id: i32,
    spawn_point: u8,
) -> Result<(), PersistenceError> {
    let updated = connection.execute(
        "UPDATE characters SET map = ?1, spawnpoint = ?2 WHERE name = ?3",
        params![map_id, spawn_point, name],
    )?;
    if updated != 1 {
        return Err(PersistenceError::CharacterNotFound(name.to_string()));
    }
    Ok(())
}

pub fn location(connection: &Connection, name: &str) -> Result<(i32, u8), PersistenceError> {
    connection
        .query_row(
            "SELECT map, spawnpoint FROM characters WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| PersistenceError::CharacterNotFound(name.to_string()))
}

pub fn id_from_name(connection: &Connection, name: &str) -> Result<i64, PersistenceError> {
    connection
        .query_row("SELECT id FROM characters WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?
        .ok_or_else(|| PersistenceError::CharacterNotFound(name.to_string()))
}

/// Replaces the skill row outright so a downgrade behaves like an upgrade.
pub fn set_skill_level(
    connection: &Connection,
    character_id: i64,
    skill_id: i32,
    level: u8,
    mastery: u8,
) -> Result<(), PersistenceError> {
    connection.execute(
        "DELETE FROM skills WHERE characterid = ?1 AND skillid = ?2",
        params![character_id, skill_id],
    )?;
    connection.execute(
        "INSERT INTO skills (characterid, skillid, level, mastery) VALUES (?1, ?2, ?3, ?4)",
        params![character_id, skill_id, level, mastery],
    )?;
    Ok(())
}

pub struct CharacterHeader {
    pub character_id: i64,
    pub capacity: u8,
}

pub fn character_header(
    connection: &Connection,
    name: &str,
    inventory_type: InventoryType,
) -> Result<CharacterHeader, PersistenceError> {
    let slots_column = match inventory_type {
        // Worn gear shares the equip tab's capacity counter.
        InventoryType::Equip | InventoryType::Equipped => "equipslots",
        InventoryType::Use => "useslots",
        InventoryType::Setup => "setupslots",
        InventoryType::Etc => "etcslots",
        InventoryType::Cash => "cashslots",
    };
    connection
        .query_row(
            &format!("SELECT id, \"{0}\" FROM characters WHERE name = ?1", slots_column),
            params![name],
            |row| {
                Ok(CharacterHeader {
                    character_id: row.get(0)?,
                    capacity: row.get::<_, i64>(1)?.clamp(0, u8::MAX as i64) as u8,
                })
            },
        )
        .optional()?
        .ok_or_else(|| PersistenceError::CharacterNotFound(name.to_string()))
}

/// Loads one inventory category into memory. Equipment bonus rows are
/// optional; a bare item row yields plain stackable slots.
pub fn load_inventory(
    connection: &Connection,
    character_id: i64,
    inventory_type: InventoryType,
    capacity: u8,
) -> Result<Inventory, PersistenceError> {
    let mut inventory = Inventory::new(capacity);
    let mut stmt = connection.prepare(
        "SELECT i.position, i.itemid, i.quantity,
                e.inventoryitemid,
                e.str, e.dex, e.\"int\", e.luk, e.hp, e.mp,
                e.watk, e.matk, e.wdef, e.mdef,
                e.acc, e.avoid, e.hands, e.speed, e.jump
         FROM inventoryitems i
         LEFT JOIN inventoryequipment e ON e.inventoryitemid = i.inventoryitemid
         WHERE i.characterid = ?1 AND i.inventorytype = ?2
         ORDER BY i.position",
    )?;
    let rows = stmt.query_map(params![character_id, inventory_type.to_db()], |row| {
        let position: i64 = row.get(0)?;
        let item_id: i32 = row.get(1)?;
        let quantity: i16 = row.get(2)?;
        let equip = match row.get::<_, Option<i64>>(3)? {
            Some(_) => Some(EquipBonuses {
                str: row.get(4)?,
                dex: row.get(5)?,
                int: row.get(6)?,
                luk: row.get(7)?,
                hp: row.get(8)?,
                mp: row.get(9)?,
                watk: row.get(10)?,
                matk: row.get(11)?,
                wdef: row.get(12)?,
                mdef: row.get(13)?,
                acc: row.get(14)?,
                avoid: row.get(15)?,
                hands: row.get(16)?,
                speed: row.get(17)?,
                jump: row.get(18)?,
            }),
            None => None,
        };
        Ok((position, ItemSlot { item_id, quantity, equip }))
    })?;

    for row in rows {
        let (position, slot) = row?;
        let position = u8::try_from(position).map_err(|_| {
            PersistenceError::ConversionError(format!(
                "Inventory position {} out of range for character {}",
                position, character_id
            ))
        })?;
        if !inventory.put(position, slot) {
            return Err(PersistenceError::ConversionError(format!(
                "Duplicate or out-of-range inventory position {} for character {}",
                position, character_id
            )));
        }
    }
    Ok(inventory)
}

/// Writes one inventory category back in full: existing rows for the
/// category are deleted and the in-memory state inserted. Must run inside
/// the caller's transaction.
pub fn commit_inventory(
    connection: &Connection,
    character_id: i64,
    inventory_type: InventoryType,
    inventory: &Inventory,
) -> Result<(), PersistenceError> {
    connection.execute(
        "DELETE FROM inventoryitems WHERE characterid = ?1 AND inventorytype = ?2",
        params![character_id, inventory_type.to_db()],
    )?;
    for (position, slot) in inventory.slots() {
        connection.execute(
            "INSERT INTO inventoryitems (characterid, inventorytype, position, itemid, quantity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![character_id, inventory_type.to_db(), position, slot.item_id, slot.quantity],
        )?;
        if let Some(bonuses) = &slot.equip {
            let row_id = connection.last_insert_rowid();
            connection.execute(
                "INSERT INTO inventoryequipment
                 (inventoryitemid, str, dex, \"int\", luk, hp, mp, watk, matk, wdef, mdef,
                  acc, avoid, hands, speed, jump)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    row_id,
                    bonuses.str,
                    bonuses.dex,
                    bonuses.int,
                    bonuses.luk,
                    bonuses.hp,
                    bonuses.mp,
                    bonuses.watk,
                    bonuses.matk,
                    bonuses.wdef,
                    bonuses.mdef,
                    bonuses.acc,
                    bonuses.avoid,
                    bonuses.hands,
                    bonuses.speed,
                    bonuses.jump
                ],
            )?;
        }
    }
    Ok(())
}

/// Admin sweep: raises every bonus on the character's worn gear to its
/// column ceiling. Bagged equipment is left alone.
pub fn max_all_equip_stats(connection: &Connection, name: &str) -> Result<(), PersistenceError> {
    let character_id = id_from_name(connection, name)?;
    connection.execute(
        "UPDATE inventoryequipment
         SET str = 32767, dex = 32767, \"int\" = 32767, luk = 32767,
             hp = 30000, mp = 30000,
             watk = 32767, matk = 32767, wdef = 32767, mdef = 32767,
             acc = 32767, avoid = 32767, hands = 32767,
             speed = 40, jump = 23
         WHERE inventoryitemid IN
             (SELECT inventoryitemid FROM inventoryitems
              WHERE characterid = ?1 AND inventorytype = ?2)",
        params![character_id, InventoryType::Equipped.to_db()],
    )?;
    Ok(())
}

/// Admin sweep: every inventory tab plus the account's storage to the
/// capacity ceiling.
pub fn max_inventory_slots(connection: &Connection, name: &str) -> Result<(), PersistenceError> {
    let updated = connection.execute(
        "UPDATE characters
         SET equipslots = 255, useslots = 255, setupslots = 255,
             etcslots = 255, cashslots = 255
         WHERE name = ?1",
        params![name],
    )?;
    if updated != 1 {
        return Err(PersistenceError::CharacterNotFound(name.to_string()));
    }
    connection.execute(
        "UPDATE accounts SET storageslots = 255
         WHERE id IN (SELECT accountid FROM characters WHERE name = ?1)",
        params![name],
    )?;
    Ok(())
}

pub fn max_buddy_list_slots(connection: &Connection, name: &str) -> Result<(), PersistenceError> {
    let updated = connection
        .execute("UPDATE characters SET buddyslots = 255 WHERE name = ?1", params![name])?;
    if updated != 1 {
        return Err(PersistenceError::CharacterNotFound(name.to_string()));
    }
    Ok(())
}
