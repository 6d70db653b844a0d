// axiom-consensus/src/validator_set.rs
//
// A thin in-memory view over axiom-storage's `Validators` column family,
// generalized from the teacher's `ValidatorSet` (which indexed stake,
// commission, uptime and unbonding state). Axiom has no token economics,
// so registration here is just "record a fingerprint's stake"; whether a
// node proposes at all is purely `stake > 0` (spec's resolved Open
// Question on listener-vs-sealer nodes).

use crate::{ConsensusError, ConsensusResult};
use axiom_core::ValidatorRecord;
use axiom_crypto::Fingerprint;
use axiom_storage::Database;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ValidatorSet {
    validators: Vec<ValidatorRecord>,
}

impl ValidatorSet {
    pub fn new(validators: Vec<ValidatorRecord>) -> Self {
        Self { validators }
    }

    /// Load the current validator set from storage.
    pub fn load(db: &Database) -> ConsensusResult<Self> {
        Ok(Self::new(db.get_validators().map_err(|e| ConsensusError::Storage(e.to_string()))?))
    }

    /// Persist the current validator set to storage.
    pub async fn save(&self, db: &Database) -> ConsensusResult<()> {
        db.put_validators(&self.validators).await.map_err(|e| ConsensusError::Storage(e.to_string()))
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&ValidatorRecord> {
        self.validators.iter().find(|v| &v.public_key_fingerprint == fingerprint)
    }

    pub fn is_validator(&self, fingerprint: &Fingerprint) -> bool {
        self.get(fingerprint).map(|v| v.is_active()).unwrap_or(false)
    }

    pub fn all(&self) -> &[ValidatorRecord] {
        &self.validators
    }

    pub fn active(&self) -> Vec<&ValidatorRecord> {
        self.validators.iter().filter(|v| v.is_active()).collect()
    }

    pub fn total_stake(&self) -> u64 {
        self.validators.iter().map(|v| v.stake).sum()
    }

    /// `POST /validator/stake` — set a fingerprint's stake, inserting the
    /// record if it doesn't exist yet. `stake = 0` retires the validator
    /// without removing its row (so historical leader computations over
    /// old slots remain reproducible from a snapshot, if one were kept).
    pub fn set_stake(&mut self, fingerprint: Fingerprint, stake: u64) {
        if let Some(existing) = self.validators.iter_mut().find(|v| v.public_key_fingerprint == fingerprint) {
            existing.stake = stake;
        } else {
            self.validators.push(ValidatorRecord { public_key_fingerprint: fingerprint, stake });
        }
    }

    pub fn count(&self) -> usize {
        self.validators.len()
    }
}

pub type SharedValidatorSet = Arc<tokio::sync::RwLock<ValidatorSet>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(seed: u8) -> Fingerprint {
        Fingerprint::new([seed; 32])
    }

    #[test]
    fn set_stake_inserts_new_validator() {
        let mut set = ValidatorSet::default();
        set.set_stake(fp(1), 500);
        assert_eq!(set.get(&fp(1)).unwrap().stake, 500);
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn set_stake_updates_existing_validator() {
        let mut set = ValidatorSet::default();
        set.set_stake(fp(1), 500);
        set.set_stake(fp(1), 900);
        assert_eq!(set.get(&fp(1)).unwrap().stake, 900);
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn zero_stake_is_inactive_but_retained() {
        let mut set = ValidatorSet::default();
        set.set_stake(fp(1), 0);
        assert!(!set.is_validator(&fp(1)));
        assert_eq!(set.count(), 1);
        assert!(set.active().is_empty());
    }

    #[test]
    fn total_stake_sums_all_validators() {
        let mut set = ValidatorSet::default();
        set.set_stake(fp(1), 10);
        set.set_stake(fp(2), 20);
        assert_eq!(set.total_stake(), 30);
    }
}
