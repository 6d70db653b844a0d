// axiom-consensus/src/leader.rs

use axiom_core::{Height, ValidatorRecord};
use axiom_crypto::{Fingerprint, Hash};
use num_bigint::BigUint;
use num_traits::Zero;

/// Deterministic slot duration. Every honest node computes `slot` from the
/// same wall-clock formula, so no node needs to be told who the leader is.
pub const SLOT_DURATION_SECS: u64 = 30;

pub fn slot_for(wall_seconds: u64) -> u64 {
    wall_seconds / SLOT_DURATION_SECS
}

/// Picks the leader for a slot from the active validator set.
///
/// This deliberately does not carry any state (no RNG, no seed) — every
/// call with the same arguments returns the same `Fingerprint`, which is
/// the whole point: a stake-weighted *random* selector (the teacher's
/// `ValidatorSelector`) cannot be used here, because two honest nodes
/// seeding their own RNGs independently would pick different leaders for
/// the same slot.
pub struct LeaderSelector;

impl LeaderSelector {
    /// Active validators (`stake > 0`) sorted ascending by fingerprint,
    /// walked via a weighted prefix-sum keyed on
    /// `SHA256(previous_hash || slot) mod total_stake`.
    ///
    /// Returns `None` if there are no active validators.
    pub fn leader_for(slot: u64, previous_hash: Hash, validators: &[ValidatorRecord]) -> Option<Fingerprint> {
        let mut active: Vec<&ValidatorRecord> = validators.iter().filter(|v| v.is_active()).collect();
        if active.is_empty() {
            return None;
        }
        active.sort_by(|a, b| a.public_key_fingerprint.cmp(&b.public_key_fingerprint));

        let total: u64 = active.iter().map(|v| v.stake).sum();
        if total == 0 {
            return None;
        }

        let k = Self::draw(previous_hash, slot, total);

        let mut running: u64 = 0;
        for validator in &active {
            running += validator.stake;
            if BigUint::from(running) > k {
                return Some(validator.public_key_fingerprint);
            }
        }

        // Rounding can never leave the draw unclaimed since k < total by
        // construction, but fall back to the last validator defensively.
        active.last().map(|v| v.public_key_fingerprint)
    }

    /// `SHA256(previous_hash || slot_be_bytes)` reduced mod `total_stake`.
    fn draw(previous_hash: Hash, slot: u64, total_stake: u64) -> BigUint {
        let mut preimage = Vec::with_capacity(40);
        preimage.extend_from_slice(previous_hash.as_bytes());
        preimage.extend_from_slice(&slot.to_be_bytes());
        let digest = {
            use sha2::{Digest, Sha256};
            let mut hasher = Sha256::new();
            hasher.update(&preimage);
            hasher.finalize()
        };
        let raw = BigUint::from_bytes_be(&digest);
        let total = BigUint::from(total_stake);
        if total.is_zero() {
            BigUint::zero()
        } else {
            raw % total
        }
    }
}

pub type Slot = u64;
pub type ChainHeight = Height;

#[cfg(test)]
mod tests {
    use super::*;
    fn fp(seed: u8) -> Fingerprint {
        Fingerprint::new([seed; 32])
    }

    #[test]
    fn no_active_validators_yields_none() {
        let validators = vec![ValidatorRecord { public_key_fingerprint: fp(1), stake: 0 }];
        assert!(LeaderSelector::leader_for(0, Hash::zero(), &validators).is_none());
    }

    #[test]
    fn selection_is_deterministic() {
        let validators = vec![
            ValidatorRecord { public_key_fingerprint: fp(1), stake: 10 },
            ValidatorRecord { public_key_fingerprint: fp(2), stake: 20 },
            ValidatorRecord { public_key_fingerprint: fp(3), stake: 5 },
        ];
        let a = LeaderSelector::leader_for(7, Hash::zero(), &validators);
        let b = LeaderSelector::leader_for(7, Hash::zero(), &validators);
        assert_eq!(a, b);
    }

    #[test]
    fn inactive_validators_are_never_selected() {
        let inactive = fp(9);
        let validators = vec![
            ValidatorRecord { public_key_fingerprint: inactive, stake: 0 },
            ValidatorRecord { public_key_fingerprint: fp(2), stake: 100 },
        ];
        for slot in 0..50 {
            let leader = LeaderSelector::leader_for(slot, Hash::zero(), &validators).unwrap();
            assert_ne!(leader, inactive);
        }
    }

    #[test]
    fn single_validator_always_wins() {
        let only = fp(4);
        let validators = vec![ValidatorRecord { public_key_fingerprint: only, stake: 1 }];
        for slot in 0..20 {
            assert_eq!(LeaderSelector::leader_for(slot, Hash::zero(), &validators), Some(only));
        }
    }

    #[test]
    fn slot_for_divides_by_duration() {
        assert_eq!(slot_for(0), 0);
        assert_eq!(slot_for(29), 0);
        assert_eq!(slot_for(30), 1);
        assert_eq!(slot_for(61), 2);
    }
}
