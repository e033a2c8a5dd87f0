//! The state manager.

use crate::domain::errors::StateError;
use dc_storage::{keys, BatchOperation, KeyValueStore};
use dc_trie::{NodeStore, Trie, TrieError};
use primitive_types::{H256, U256};
use shared_crypto::keccak256;
use shared_types::{Account, Address, EMPTY_TRIE_ROOT};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Adapter exposing the `s:` namespace of the key-value store as the
/// trie's node store.
struct KvNodeStore {
    kv: Arc<dyn KeyValueStore>,
}

impl NodeStore for KvNodeStore {
    fn get_node(&self, hash: &H256) -> Result<Option<Vec<u8>>, TrieError> {
        self.kv
            .get(&keys::state_node(hash))
            .map_err(|e| TrieError::Backend(e.to_string()))
    }
}

/// Per-block write-set: address -> pending account value. The key set is
/// the "touched" set; ordering makes commit batches deterministic.
type Journal = BTreeMap<Address, Account>;

/// Journaled account state over a committed trie snapshot.
///
/// The slot driver is the only writer; query surfaces read committed state
/// through the same API between frames.
pub struct StateManager {
    kv: Arc<dyn KeyValueStore>,
    committed_root: H256,
    journal: Option<Journal>,
}

impl StateManager {
    /// Fresh state over an empty trie.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            committed_root: EMPTY_TRIE_ROOT,
            journal: None,
        }
    }

    /// Reopen a committed snapshot, verifying the root is actually present
    /// in the backend.
    pub fn open_at(kv: Arc<dyn KeyValueStore>, root: H256) -> Result<Self, StateError> {
        if root != EMPTY_TRIE_ROOT {
            let present = kv
                .get(&keys::state_node(&root))
                .map_err(StateError::Store)?
                .is_some();
            if !present {
                return Err(StateError::UnknownStateRoot(root));
            }
        }
        Ok(Self {
            kv,
            committed_root: root,
            journal: None,
        })
    }

    /// Root of the last committed snapshot.
    pub fn committed_root(&self) -> H256 {
        self.committed_root
    }

    /// True while a journal frame is open.
    pub fn in_block(&self) -> bool {
        self.journal.is_some()
    }

    // =========================================================================
    // FRAME LIFECYCLE
    // =========================================================================

    /// Open a new journal frame. Exactly one frame may be open.
    pub fn start_block(&mut self) -> Result<(), StateError> {
        if self.journal.is_some() {
            return Err(StateError::JournalAlreadyOpen);
        }
        self.journal = Some(Journal::new());
        Ok(())
    }

    /// Encode every touched account, persist the new trie nodes in one
    /// atomic batch, advance the committed root and clear the frame.
    ///
    /// On a backend failure the committed root is unchanged and the frame
    /// is dropped; the error is surfaced.
    pub fn commit_block(&mut self) -> Result<H256, StateError> {
        let journal = self.journal.take().ok_or(StateError::NoOpenJournal)?;

        let mut trie = self.open_trie();
        for (address, account) in &journal {
            trie.insert(
                keccak256(address.as_bytes()).as_bytes(),
                rlp::encode(account).to_vec(),
            )?;
        }
        let (root, nodes) = trie.commit();

        let batch: Vec<BatchOperation> = nodes
            .into_iter()
            .map(|(hash, encoded)| BatchOperation::put(keys::state_node(&hash), encoded))
            .collect();
        if let Err(error) = self.kv.atomic_batch_write(batch) {
            warn!("[state] commit aborted, journal dropped: {error}");
            return Err(error.into());
        }

        debug!(
            "[state] committed {} account(s), root {:?} -> {:?}",
            journal.len(),
            self.committed_root,
            root
        );
        self.committed_root = root;
        Ok(root)
    }

    /// Drop the frame without touching the persistent store.
    pub fn rollback_block(&mut self) {
        if self.journal.take().is_some() {
            debug!("[state] journal frame rolled back");
        }
    }

    /// The root a `commit_block()` would persist right now, computed on a
    /// throwaway overlay without writing anything.
    pub fn pending_root(&self) -> Result<H256, StateError> {
        let Some(journal) = &self.journal else {
            return Ok(self.committed_root);
        };
        let mut trie = self.open_trie();
        for (address, account) in journal {
            trie.insert(
                keccak256(address.as_bytes()).as_bytes(),
                rlp::encode(account).to_vec(),
            )?;
        }
        Ok(trie.root_hash())
    }

    // =========================================================================
    // ACCOUNT OPERATIONS (executor-facing)
    // =========================================================================

    /// Read an account, observing pending writes first. A never-touched
    /// address reads as the default account.
    pub fn get_account(&self, address: &Address) -> Result<Account, StateError> {
        if let Some(journal) = &self.journal {
            if let Some(account) = journal.get(address) {
                return Ok(account.clone());
            }
        }
        self.committed_account(address)
    }

    /// Read an account from committed state only, ignoring any open frame.
    /// This is the read path for parallel query callers, which must never
    /// observe an uncommitted block.
    pub fn get_committed_account(&self, address: &Address) -> Result<Account, StateError> {
        self.committed_account(address)
    }

    /// Write an account into the journal frame.
    pub fn set_account(&mut self, address: Address, account: Account) -> Result<(), StateError> {
        let journal = self.journal.as_mut().ok_or(StateError::NoOpenJournal)?;
        journal.insert(address, account);
        Ok(())
    }

    /// Credit `amount` Wei. Fails on 256-bit overflow.
    pub fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), StateError> {
        let mut account = self.get_account(&address)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow { address })?;
        self.set_account(address, account)
    }

    /// Debit `amount` Wei. Fails with `InsufficientBalance` when the
    /// balance is smaller than the debit; nothing is written in that case.
    pub fn sub_balance(&mut self, address: Address, amount: U256) -> Result<(), StateError> {
        let mut account = self.get_account(&address)?;
        let available = account.balance;
        account.balance =
            account
                .balance
                .checked_sub(amount)
                .ok_or(StateError::InsufficientBalance {
                    address,
                    required: amount,
                    available,
                })?;
        self.set_account(address, account)
    }

    /// Bump the account nonce by one.
    pub fn increment_nonce(&mut self, address: Address) -> Result<(), StateError> {
        let mut account = self.get_account(&address)?;
        account.nonce = account
            .nonce
            .checked_add(1)
            .ok_or(StateError::NonceOverflow { address })?;
        self.set_account(address, account)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn open_trie(&self) -> Trie {
        let store: Arc<dyn NodeStore> = Arc::new(KvNodeStore {
            kv: Arc::clone(&self.kv),
        });
        Trie::open(store, self.committed_root)
    }

    fn committed_account(&self, address: &Address) -> Result<Account, StateError> {
        let trie = self.open_trie();
        let key = keccak256(address.as_bytes());
        match trie.get(key.as_bytes())? {
            Some(raw) => rlp::decode(&raw).map_err(|e| StateError::CorruptAccount {
                address: *address,
                reason: e.to_string(),
            }),
            None => Ok(Account::default()),
        }
    }
}
