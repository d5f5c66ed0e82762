//! Reconcile tentative levels into one level per font size.

use crate::model::{size_key, Candidate, FontProfile, HeadingLevel};
use std::collections::BTreeMap;

const LEVELS: [HeadingLevel; 3] = [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3];

#[derive(Debug, Default, Clone, Copy)]
pub struct LevelAssigner;

impl LevelAssigner {
    /// Rewrite every candidate to its size's canonical level.
    ///
    /// The canonical level is the majority tentative level among candidates of that
    /// size (ties go to the size's font tier, then to the shallower level). Walking
    /// sizes from largest to smallest, a level may only stay equal or get deeper,
    /// so a larger font never ends up nested below a smaller one.
    pub fn assign(&self, mut candidates: Vec<Candidate>, profile: &FontProfile) -> Vec<Candidate> {
        let mut votes: BTreeMap<i32, [usize; 3]> = BTreeMap::new();
        for candidate in &candidates {
            let tally = votes.entry(size_key(candidate.raw_font_size)).or_insert([0; 3]);
            tally[candidate.tentative_level.depth() - 1] += 1;
        }

        let mut canonical: BTreeMap<i32, HeadingLevel> = BTreeMap::new();
        let mut floor = HeadingLevel::H1;
        for (&key, tally) in votes.iter().rev() {
            let majority = majority_level(tally, profile.tier_level(key as f32 / 10.0));
            let level = majority.max(floor);
            if level != majority {
                log::debug!(
                    "Size {:.1}pt voted {} but sits below a {} size; relabeled {}",
                    key as f32 / 10.0,
                    majority,
                    floor,
                    level
                );
            }
            canonical.insert(key, level);
            floor = level;
        }

        for candidate in &mut candidates {
            if let Some(&level) = canonical.get(&size_key(candidate.raw_font_size)) {
                candidate.tentative_level = level;
            }
        }
        candidates
    }
}

fn majority_level(tally: &[usize; 3], tier: Option<HeadingLevel>) -> HeadingLevel {
    let best = tally.iter().copied().max().unwrap_or(0);
    if let Some(tier) = tier {
        if tally[tier.depth() - 1] == best {
            return tier;
        }
    }
    LEVELS
        .iter()
        .zip(tally)
        .find(|&(_, &count)| count == best)
        .map(|(&level, _)| level)
        .unwrap_or(HeadingLevel::H3)
}
