// axiom-consensus/src/equivocation.rs
//
// Generalized from the teacher's `SlashingManager`. Axiom has no staked
// tokens to burn, so there is no penalty distribution to compute — what
// survives from the teacher's design is the shape of the thing: per-
// validator misbehavior bookkeeping that a higher layer consults to
// decide what to do about a bad actor. Here that "what to do" is: reject
// the second block and let `axiom-network`'s reputation system apply the
// penalty (spec.md §7's "equivocation attempt ... penalty applied by the
// network layer").

use axiom_core::Height;
use axiom_crypto::{Fingerprint, Hash};
use std::collections::HashMap;

/// Tracks, for each validator, the block hash it has been seen proposing
/// at each height. A second distinct hash at a height already on record
/// is equivocation.
#[derive(Debug, Default)]
pub struct EquivocationGuard {
    seen: HashMap<(Fingerprint, Height), Hash>,
    offenses: HashMap<Fingerprint, u32>,
}

impl EquivocationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a proposal and report whether it equivocates a prior one.
    /// Returns `true` exactly once per distinct conflicting pair; the
    /// first observation of any `(proposer, height)` is never flagged.
    pub fn record(&mut self, proposer: Fingerprint, height: Height, hash: Hash) -> bool {
        match self.seen.get(&(proposer, height)) {
            Some(existing) if *existing != hash => {
                *self.offenses.entry(proposer).or_insert(0) += 1;
                true
            }
            Some(_) => false,
            None => {
                self.seen.insert((proposer, height), hash);
                false
            }
        }
    }

    pub fn offense_count(&self, proposer: &Fingerprint) -> u32 {
        self.offenses.get(proposer).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(seed: u8) -> Fingerprint {
        Fingerprint::new([seed; 32])
    }

    #[test]
    fn first_proposal_at_a_height_is_never_equivocation() {
        let mut guard = EquivocationGuard::new();
        assert!(!guard.record(fp(1), 10, Hash::zero()));
    }

    #[test]
    fn repeating_the_same_hash_is_not_equivocation() {
        let mut guard = EquivocationGuard::new();
        assert!(!guard.record(fp(1), 10, Hash::zero()));
        assert!(!guard.record(fp(1), 10, Hash::zero()));
    }

    #[test]
    fn conflicting_hash_at_same_height_is_equivocation() {
        let mut guard = EquivocationGuard::new();
        let other = Hash::new([1u8; 32]);
        assert!(!guard.record(fp(1), 10, Hash::zero()));
        assert!(guard.record(fp(1), 10, other));
        assert_eq!(guard.offense_count(&fp(1)), 1);
    }

    #[test]
    fn different_heights_do_not_conflict() {
        let mut guard = EquivocationGuard::new();
        assert!(!guard.record(fp(1), 10, Hash::zero()));
        assert!(!guard.record(fp(1), 11, Hash::new([2u8; 32])));
    }
}
