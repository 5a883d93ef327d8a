//! Experience-per-level rule table.
//!
//! Read-only process-wide data: populated once on first use, shared by
//! reference, never mutated afterwards.

use crate::consts::MAX_LEVEL;
use lazy_static::lazy_static;

// Hand-tuned low-level curve; everything past it follows the recurrence in
// `build_table`.
const EARLY_LEVELS: [i32; 10] = [0, 15, 34, 57, 92, 135, 372, 560, 840, 1242];

lazy_static! {
    static ref EXP_TABLE: Vec<i32> = build_table();
}

fn build_table() -> Vec<i32> {
    let mut table = vec![0i32; MAX_LEVEL as usize + 1];
    table[..EARLY_LEVELS.len()].copy_from_slice(&EARLY_LEVELS);
    for level in EARLY_LEVELS.len()..table.len() {
        let prev = i64::from(table[level - 1]);
        table[level] = (prev + prev / 14).min(i64::from(i32::MAX)) as i32;
    }
    table
}

/// Experience required to complete `level`. Out-of-range levels clamp into
/// the table.
pub fn exp_for_level(level: i16) -> i32 { EXP_TABLE[level.clamp(0, MAX_LEVEL) as usize] }

/// Upper bound for stored experience at `level`. At `MAX_LEVEL` experience
/// is driven to zero.
pub fn exp_cap(level: i16) -> i32 {
    if level < MAX_LEVEL {
        exp_for_level(level) - 1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_monotonic() {
        for level in 2..=MAX_LEVEL {
            assert!(
                exp_for_level(level) >= exp_for_level(level - 1),
                "exp requirement shrank between levels {} and {}",
                level - 1,
                level
            );
        }
    }

    #[test]
    fn requirements_are_positive_below_cap() {
        for level in 1..MAX_LEVEL {
            assert!(exp_for_level(level) > 0);
        }
    }

    #[test]
    fn cap_is_zero_at_max_level() {
        assert_eq!(exp_cap(MAX_LEVEL), 0);
        assert_eq!(exp_cap(MAX_LEVEL - 1), exp_for_level(MAX_LEVEL - 1) - 1);
    }

    #[test]
    fn out_of_range_levels_clamp() {
        assert_eq!(exp_for_level(-5), exp_for_level(0));
        assert_eq!(exp_for_level(MAX_LEVEL + 50), exp_for_level(MAX_LEVEL));
    }
}
