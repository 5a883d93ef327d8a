/// Highest attainable character level.
pub const MAX_LEVEL: i16 = 200;

/// Hard ceiling for current and maximum HP/MP, equipment bonuses included.
pub const HP_MP_HARD_CAP: i16 = 30000;

/// Saturation bound for the base stats, AP, SP and fame.
pub const STAT_CAP: i16 = i16::MAX;

/// Per-category ceiling on inventory capacity.
pub const MAX_INVENTORY_CAPACITY: u8 = 255;

/// Buddy list capacity ceiling.
pub const MAX_BUDDY_LIST_CAPACITY: u8 = 255;

/// Stack bound for stackable items without item-data overrides.
pub const DEFAULT_STACK_SIZE: i16 = 100;
