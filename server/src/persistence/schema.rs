//! Embedded schema DDL, executed by `run_migrations` at startup.

pub(super) const DDL: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    storageslots INTEGER NOT NULL DEFAULT 4
);

CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    accountid INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    name TEXT NOT NULL UNIQUE,
    level INTEGER NOT NULL DEFAULT 1,
    job INTEGER NOT NULL DEFAULT 0,
    str INTEGER NOT NULL DEFAULT 4,
    dex INTEGER NOT NULL DEFAULT 4,
    \"int\" INTEGER NOT NULL DEFAULT 4,
    luk INTEGER NOT NULL DEFAULT 4,
    ap INTEGER NOT NULL DEFAULT 0,
    sp INTEGER NOT NULL DEFAULT 0,
    maxhp INTEGER NOT NULL DEFAULT 50,
    hp INTEGER NOT NULL DEFAULT 50,
    maxmp INTEGER NOT NULL DEFAULT 5,
    mp INTEGER NOT NULL DEFAULT 5,
    exp INTEGER NOT NULL DEFAULT 0,
    mesos INTEGER NOT NULL DEFAULT 0,
    fame INTEGER NOT NULL DEFAULT 0,
    map INTEGER NOT NULL DEFAULT 0,
    spawnpoint INTEGER NOT NULL DEFAULT 0,
    hair INTEGER NOT NULL DEFAULT 0,
    skin INTEGER NOT NULL DEFAULT 0,
    eyes INTEGER NOT NULL DEFAULT 0,
    equipslots INTEGER NOT NULL DEFAULT 24,
    useslots INTEGER NOT NULL DEFAULT 24,
    setupslots INTEGER NOT NULL DEFAULT 24,
    etcslots INTEGER NOT NULL DEFAULT 24,
    cashslots INTEGER NOT NULL DEFAULT 24,
    buddyslots INTEGER NOT NULL DEFAULT 20
);

CREATE TABLE IF NOT EXISTS skills (
    characterid INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
    skillid INTEGER NOT NULL,
    level INTEGER NOT NULL,
    mastery INTEGER NOT NULL,
    PRIMARY KEY (characterid, skillid)
);

CREATE TABLE IF NOT EXISTS inventoryitems (
    inventoryitemid INTEGER PRIMARY KEY AUTOINCREMENT,
    characterid INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
    inventorytype INTEGER NOT NULL,
    position INTEGER NOT NULL,
    itemid INTEGER NOT NULL,
    quantity INTEGER NOT NULL,
    UNIQUE (characterid, inventorytype, position)
);

CREATE TABLE IF NOT EXISTS inventoryequipment (
    inventoryitemid INTEGER PRIMARY KEY
        REFERENCES inventoryitems(inventoryitemid) ON DELETE CASCADE,
    str INTEGER NOT NULL DEFAULT 0,
    dex INTEGER NOT NULL DEFAULT 0,
    \"int\" INTEGER NOT NULL DEFAULT 0,
    luk INTEGER NOT NULL DEFAULT 0,
    hp INTEGER NOT NULL DEFAULT 0,
    mp INTEGER NOT NULL DEFAULT 0,
    watk INTEGER NOT NULL DEFAULT 0,
    matk INTEGER NOT NULL DEFAULT 0,
    wdef INTEGER NOT NULL DEFAULT 0,
    mdef INTEGER NOT NULL DEFAULT 0,
    acc INTEGER NOT NULL DEFAULT 0,
    avoid INTEGER NOT NULL DEFAULT 0,
    hands INTEGER NOT NULL DEFAULT 0,
    speed INTEGER NOT NULL DEFAULT 0,
    jump INTEGER NOT NULL DEFAULT 0
);
";
