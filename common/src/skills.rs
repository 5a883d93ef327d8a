use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub level: u8,
    pub mastery: u8,
}

/// A character's learned skills, keyed by skill id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SkillBook {
    entries: HashMap<i32, SkillEntry>,
}

impl SkillBook {
    /// Idempotent upsert: a missing prior entry is not an error, a present
    /// one is replaced wholesale.
    pub fn set(&mut self, skill_id: i32, level: u8, mastery: u8) {
        self.entries.insert(skill_id, SkillEntry { level, mastery });
    }

    pub fn get(&self, skill_id: i32) -> Option<SkillEntry> { self.entries.get(&skill_id).copied() }

    pub fn iter(&self) -> impl Iterator<Item = (i32, SkillEntry)> + '_ {
        self.entries.iter().map(|(id, entry)| (*id, *entry))
    }
}
