//! Reward distribution for committed blocks.

use crate::error::ProductionError;
use dc_state::StateManager;
use primitive_types::{H256, U256};
use shared_types::{committee_reward_pool, proposer_reward, Address};
use tracing::debug;

/// Credit the proposer reward and split the committee pool among the
/// attesters whose attestations were included.
///
/// Runs in its own journal frame, committed immediately. Each attester
/// gets `floor(pool / n)`; the division remainder is forfeited so total
/// supply stays predictable.
pub fn distribute_rewards(
    state: &mut StateManager,
    proposer: Address,
    attesters: &[Address],
) -> Result<H256, ProductionError> {
    state.start_block()?;
    state.add_balance(proposer, proposer_reward())?;

    if !attesters.is_empty() {
        let share = committee_reward_pool() / U256::from(attesters.len() as u64);
        if !share.is_zero() {
            for attester in attesters {
                state.add_balance(*attester, share)?;
            }
        }
    }

    let root = state.commit_block()?;
    debug!(
        "[rewards] proposer {:?} plus {} attester(s) credited, root {:?}",
        proposer,
        attesters.len(),
        root
    );
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_storage::{InMemoryKvStore, KeyValueStore};
    use std::sync::Arc;

    fn state() -> StateManager {
        StateManager::new(Arc::new(InMemoryKvStore::new()) as Arc<dyn KeyValueStore>)
    }

    fn addr(tag: u8) -> Address {
        Address::repeat_byte(tag)
    }

    #[test]
    fn test_proposer_and_attesters_credited() {
        let mut state = state();
        let attesters = [addr(2), addr(3), addr(4)];
        distribute_rewards(&mut state, addr(1), &attesters).unwrap();

        assert_eq!(
            state.get_account(&addr(1)).unwrap().balance,
            proposer_reward()
        );
        let share = committee_reward_pool() / U256::from(3u64);
        for attester in &attesters {
            assert_eq!(state.get_account(attester).unwrap().balance, share);
        }
    }

    #[test]
    fn test_remainder_is_forfeited() {
        let mut state = state();
        let attesters = [addr(2), addr(3), addr(4)];
        distribute_rewards(&mut state, addr(1), &attesters).unwrap();

        let share = committee_reward_pool() / U256::from(3u64);
        let distributed: U256 = share * U256::from(3u64);
        // 10^18 is not divisible by 3; the last Wei goes nowhere.
        assert!(distributed < committee_reward_pool());
        let total: U256 = attesters
            .iter()
            .map(|a| state.get_account(a).unwrap().balance)
            .fold(U256::zero(), |acc, b| acc + b);
        assert_eq!(total, distributed);
    }

    #[test]
    fn test_proposer_can_also_attest() {
        let mut state = state();
        let proposer = addr(1);
        distribute_rewards(&mut state, proposer, &[proposer]).unwrap();
        assert_eq!(
            state.get_account(&proposer).unwrap().balance,
            proposer_reward() + committee_reward_pool()
        );
    }

    #[test]
    fn test_no_attesters_still_pays_proposer() {
        let mut state = state();
        distribute_rewards(&mut state, addr(1), &[]).unwrap();
        assert_eq!(
            state.get_account(&addr(1)).unwrap().balance,
            proposer_reward()
        );
    }
}
