//! Merkle Patricia Trie sessions over a persistent node store.

use crate::domain::errors::TrieError;
use crate::domain::nibbles::Nibbles;
use crate::domain::node::{decode_node, hash_node, Node, NodeRef};
use crate::ports::backend::{MemoryNodeStore, NodeStore};
use primitive_types::H256;
use shared_types::EMPTY_TRIE_ROOT;
use std::sync::Arc;

/// A trie session.
///
/// Reads resolve committed nodes from the store; mutations build an
/// in-memory overlay of [`NodeRef::Node`] entries hanging off the root.
/// Nothing reaches the store until the session's [`Trie::commit`] output is
/// persisted by the caller.
pub struct Trie {
    store: Arc<dyn NodeStore>,
    root: NodeRef,
}

impl Trie {
    /// A session over the empty trie.
    pub fn empty(store: Arc<dyn NodeStore>) -> Self {
        Self {
            store,
            root: NodeRef::Empty,
        }
    }

    /// Reopen a previously committed snapshot without copying state.
    pub fn open(store: Arc<dyn NodeStore>, root: H256) -> Self {
        let root = if root == EMPTY_TRIE_ROOT {
            NodeRef::Empty
        } else {
            NodeRef::Hash(root)
        };
        Self { store, root }
    }

    /// Root hash the current session content commits to.
    pub fn root_hash(&self) -> H256 {
        match &self.root {
            NodeRef::Empty => EMPTY_TRIE_ROOT,
            NodeRef::Hash(hash) => *hash,
            NodeRef::Node(node) => {
                let mut scratch = Vec::new();
                hash_node(node, &mut scratch)
            }
        }
    }

    /// Encode every node the session created and return them together with
    /// the new root. The caller persists the nodes in one atomic batch;
    /// the session then reads through the committed root.
    pub fn commit(&mut self) -> (H256, Vec<(H256, Vec<u8>)>) {
        match std::mem::take(&mut self.root) {
            NodeRef::Empty => (EMPTY_TRIE_ROOT, Vec::new()),
            NodeRef::Hash(hash) => {
                self.root = NodeRef::Hash(hash);
                (hash, Vec::new())
            }
            NodeRef::Node(node) => {
                let mut new_nodes = Vec::new();
                let root = hash_node(&node, &mut new_nodes);
                self.root = NodeRef::Hash(root);
                (root, new_nodes)
            }
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        let path = Nibbles::from_bytes(key);
        self.get_ref(&self.root, path.as_slice())
    }

    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), TrieError> {
        let path = Nibbles::from_bytes(key);
        let root = std::mem::take(&mut self.root);
        self.root = self.insert_ref(root, path.as_slice(), value)?;
        Ok(())
    }

    /// Remove a key. Returns whether it was present.
    pub fn remove(&mut self, key: &[u8]) -> Result<bool, TrieError> {
        let path = Nibbles::from_bytes(key);
        let root = std::mem::take(&mut self.root);
        let (root, removed) = self.remove_ref(root, path.as_slice())?;
        self.root = root;
        Ok(removed)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    fn load(&self, hash: &H256) -> Result<Node, TrieError> {
        let bytes = self
            .store
            .get_node(hash)?
            .ok_or(TrieError::MissingNode(*hash))?;
        decode_node(&bytes)
    }

    fn get_ref(&self, node: &NodeRef, path: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        match node {
            NodeRef::Empty => Ok(None),
            NodeRef::Hash(hash) => {
                let loaded = self.load(hash)?;
                self.get_node(&loaded, path)
            }
            NodeRef::Node(node) => self.get_node(node, path),
        }
    }

    fn get_node(&self, node: &Node, path: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        match node {
            Node::Leaf { path: leaf_path, value } => {
                Ok((leaf_path.as_slice() == path).then(|| value.clone()))
            }
            Node::Extension { path: ext_path, child } => {
                if path.len() >= ext_path.len() && &path[..ext_path.len()] == ext_path.as_slice() {
                    self.get_ref(child, &path[ext_path.len()..])
                } else {
                    Ok(None)
                }
            }
            Node::Branch { children, value } => {
                if path.is_empty() {
                    Ok(value.clone())
                } else {
                    self.get_ref(&children[path[0] as usize], &path[1..])
                }
            }
        }
    }

    // =========================================================================
    // INSERT
    // =========================================================================

    fn insert_ref(&self, node: NodeRef, path: &[u8], value: Vec<u8>) -> Result<NodeRef, TrieError> {
        let node = match node {
            NodeRef::Empty => {
                return Ok(boxed(Node::Leaf {
                    path: Nibbles::from_raw(path.to_vec()),
                    value,
                }));
            }
            NodeRef::Hash(hash) => self.load(&hash)?,
            NodeRef::Node(node) => *node,
        };

        let updated = match node {
            Node::Leaf {
                path: leaf_path,
                value: leaf_value,
            } => self.insert_into_leaf(leaf_path, leaf_value, path, value)?,
            Node::Extension {
                path: ext_path,
                child,
            } => self.insert_into_extension(ext_path, child, path, value)?,
            Node::Branch {
                mut children,
                value: branch_value,
            } => {
                if path.is_empty() {
                    Node::Branch {
                        children,
                        value: Some(value),
                    }
                } else {
                    let index = path[0] as usize;
                    let child = std::mem::take(&mut children[index]);
                    children[index] = self.insert_ref(child, &path[1..], value)?;
                    Node::Branch {
                        children,
                        value: branch_value,
                    }
                }
            }
        };
        Ok(boxed(updated))
    }

    fn insert_into_leaf(
        &self,
        leaf_path: Nibbles,
        leaf_value: Vec<u8>,
        path: &[u8],
        value: Vec<u8>,
    ) -> Result<Node, TrieError> {
        let common = leaf_path.common_prefix_len(path);
        if common == leaf_path.len() && common == path.len() {
            // Same key: overwrite.
            return Ok(Node::Leaf {
                path: leaf_path,
                value,
            });
        }

        let mut children: [NodeRef; 16] = core::array::from_fn(|_| NodeRef::Empty);
        let mut branch_value = None;

        let leaf_rem = &leaf_path.as_slice()[common..];
        if leaf_rem.is_empty() {
            branch_value = Some(leaf_value);
        } else {
            children[leaf_rem[0] as usize] = boxed(Node::Leaf {
                path: Nibbles::from_raw(leaf_rem[1..].to_vec()),
                value: leaf_value,
            });
        }

        let path_rem = &path[common..];
        if path_rem.is_empty() {
            branch_value = Some(value);
        } else {
            children[path_rem[0] as usize] = boxed(Node::Leaf {
                path: Nibbles::from_raw(path_rem[1..].to_vec()),
                value,
            });
        }

        let branch = Node::Branch {
            children: Box::new(children),
            value: branch_value,
        };
        Ok(wrap_with_extension(&path[..common], branch))
    }

    fn insert_into_extension(
        &self,
        ext_path: Nibbles,
        child: NodeRef,
        path: &[u8],
        value: Vec<u8>,
    ) -> Result<Node, TrieError> {
        let common = ext_path.common_prefix_len(path);
        if common == ext_path.len() {
            let child = self.insert_ref(child, &path[common..], value)?;
            return Ok(Node::Extension {
                path: ext_path,
                child,
            });
        }

        // The extension splits at the divergence point.
        let mut children: [NodeRef; 16] = core::array::from_fn(|_| NodeRef::Empty);
        let mut branch_value = None;

        let ext_rem = &ext_path.as_slice()[common..];
        children[ext_rem[0] as usize] = if ext_rem.len() == 1 {
            child
        } else {
            boxed(Node::Extension {
                path: Nibbles::from_raw(ext_rem[1..].to_vec()),
                child,
            })
        };

        let path_rem = &path[common..];
        if path_rem.is_empty() {
            branch_value = Some(value);
        } else {
            children[path_rem[0] as usize] = boxed(Node::Leaf {
                path: Nibbles::from_raw(path_rem[1..].to_vec()),
                value,
            });
        }

        let branch = Node::Branch {
            children: Box::new(children),
            value: branch_value,
        };
        Ok(wrap_with_extension(&path[..common], branch))
    }

    // =========================================================================
    // REMOVE
    // =========================================================================

    fn remove_ref(&self, node: NodeRef, path: &[u8]) -> Result<(NodeRef, bool), TrieError> {
        match node {
            NodeRef::Empty => Ok((NodeRef::Empty, false)),
            NodeRef::Hash(hash) => {
                let loaded = self.load(&hash)?;
                let (result, removed) = self.remove_node(loaded, path)?;
                if removed {
                    Ok((result, true))
                } else {
                    // Untouched subtree keeps its committed reference.
                    Ok((NodeRef::Hash(hash), false))
                }
            }
            NodeRef::Node(node) => self.remove_node(*node, path),
        }
    }

    fn remove_node(&self, node: Node, path: &[u8]) -> Result<(NodeRef, bool), TrieError> {
        match node {
            Node::Leaf {
                path: leaf_path,
                value,
            } => {
                if leaf_path.as_slice() == path {
                    Ok((NodeRef::Empty, true))
                } else {
                    Ok((
                        boxed(Node::Leaf {
                            path: leaf_path,
                            value,
                        }),
                        false,
                    ))
                }
            }
            Node::Extension {
                path: ext_path,
                child,
            } => {
                if path.len() >= ext_path.len() && &path[..ext_path.len()] == ext_path.as_slice() {
                    let (child, removed) = self.remove_ref(child, &path[ext_path.len()..])?;
                    if !removed {
                        return Ok((boxed(Node::Extension { path: ext_path, child }), false));
                    }
                    Ok((self.collapse_extension(ext_path, child)?, true))
                } else {
                    Ok((boxed(Node::Extension { path: ext_path, child }), false))
                }
            }
            Node::Branch {
                mut children,
                value,
            } => {
                if path.is_empty() {
                    if value.is_none() {
                        return Ok((boxed(Node::Branch { children, value }), false));
                    }
                    Ok((self.collapse_branch(children, None)?, true))
                } else {
                    let index = path[0] as usize;
                    let child = std::mem::take(&mut children[index]);
                    let (child, removed) = self.remove_ref(child, &path[1..])?;
                    children[index] = child;
                    if !removed {
                        return Ok((boxed(Node::Branch { children, value }), false));
                    }
                    Ok((self.collapse_branch(children, value)?, true))
                }
            }
        }
    }

    /// An extension whose child shrank: splice paths back together so no
    /// extension ever points at a leaf, another extension, or nothing.
    fn collapse_extension(&self, ext_path: Nibbles, child: NodeRef) -> Result<NodeRef, TrieError> {
        let child_node = match child {
            NodeRef::Empty => return Ok(NodeRef::Empty),
            NodeRef::Hash(hash) => self.load(&hash)?,
            NodeRef::Node(node) => *node,
        };
        Ok(match child_node {
            Node::Leaf { path, value } => boxed(Node::Leaf {
                path: ext_path.join(&path),
                value,
            }),
            Node::Extension { path, child } => boxed(Node::Extension {
                path: ext_path.join(&path),
                child,
            }),
            branch @ Node::Branch { .. } => boxed(Node::Extension {
                path: ext_path,
                child: boxed(branch),
            }),
        })
    }

    /// A branch that lost an entry: drop to a leaf or splice the single
    /// remaining child upward when fewer than two slots stay occupied.
    fn collapse_branch(
        &self,
        mut children: Box<[NodeRef; 16]>,
        value: Option<Vec<u8>>,
    ) -> Result<NodeRef, TrieError> {
        let occupied: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, child)| !child.is_empty())
            .map(|(index, _)| index)
            .collect();

        match (occupied.as_slice(), value) {
            ([], None) => Ok(NodeRef::Empty),
            ([], Some(value)) => Ok(boxed(Node::Leaf {
                path: Nibbles::from_raw(Vec::new()),
                value,
            })),
            ([index], None) => {
                let head = *index as u8;
                let child = std::mem::take(&mut children[*index]);
                let child_node = match child {
                    NodeRef::Empty => return Ok(NodeRef::Empty),
                    NodeRef::Hash(hash) => self.load(&hash)?,
                    NodeRef::Node(node) => *node,
                };
                Ok(match child_node {
                    Node::Leaf { path, value } => boxed(Node::Leaf {
                        path: path.prepend(head),
                        value,
                    }),
                    Node::Extension { path, child } => boxed(Node::Extension {
                        path: path.prepend(head),
                        child,
                    }),
                    branch @ Node::Branch { .. } => boxed(Node::Extension {
                        path: Nibbles::from_raw(vec![head]),
                        child: boxed(branch),
                    }),
                })
            }
            (_, value) => Ok(boxed(Node::Branch { children, value })),
        }
    }
}

fn boxed(node: Node) -> NodeRef {
    NodeRef::Node(Box::new(node))
}

fn wrap_with_extension(prefix: &[u8], branch: Node) -> Node {
    if prefix.is_empty() {
        branch
    } else {
        Node::Extension {
            path: Nibbles::from_raw(prefix.to_vec()),
            child: NodeRef::Node(Box::new(branch)),
        }
    }
}

/// MPT root of the ordered list `{ RLP(i) -> item_i }`, as used for
/// transaction and receipt roots. The empty list yields the empty-trie
/// root.
pub fn ordered_trie_root<T: AsRef<[u8]>>(items: &[T]) -> Result<H256, TrieError> {
    let store = Arc::new(MemoryNodeStore::new());
    let mut trie = Trie::empty(store);
    for (index, item) in items.iter().enumerate() {
        trie.insert(&rlp::encode(&(index as u64)), item.as_ref().to_vec())?;
    }
    Ok(trie.root_hash())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_trie() -> (Arc<MemoryNodeStore>, Trie) {
        let store = Arc::new(MemoryNodeStore::new());
        let trie = Trie::empty(Arc::clone(&store) as Arc<dyn NodeStore>);
        (store, trie)
    }

    #[test]
    fn test_empty_root() {
        let (_, trie) = memory_trie();
        assert_eq!(trie.root_hash(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_insert_and_get() {
        let (_, mut trie) = memory_trie();
        trie.insert(b"dog", b"puppy".to_vec()).unwrap();
        trie.insert(b"doe", b"reindeer".to_vec()).unwrap();

        assert_eq!(trie.get(b"dog").unwrap(), Some(b"puppy".to_vec()));
        assert_eq!(trie.get(b"doe").unwrap(), Some(b"reindeer".to_vec()));
        assert_eq!(trie.get(b"cat").unwrap(), None);
    }

    #[test]
    fn test_known_ethereum_root_vector() {
        // Classic trie fixture shared across Ethereum implementations.
        let (_, mut trie) = memory_trie();
        trie.insert(b"doe", b"reindeer".to_vec()).unwrap();
        trie.insert(b"dog", b"puppy".to_vec()).unwrap();
        trie.insert(b"dogglesworth", b"cat".to_vec()).unwrap();

        let expected =
            hex::decode("8aad789dff2f538bca5d8ea56e8abe10f4c7ba3a5dea95fea4cd6e7c3a1168d3")
                .unwrap();
        assert_eq!(trie.root_hash().as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_deterministic_root_any_order() {
        let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0u8..32)
            .map(|i| (vec![i, i.wrapping_mul(7)], vec![i; 3]))
            .collect();

        let (_, mut forward) = memory_trie();
        for (k, v) in &pairs {
            forward.insert(k, v.clone()).unwrap();
        }
        let (_, mut backward) = memory_trie();
        for (k, v) in pairs.iter().rev() {
            backward.insert(k, v.clone()).unwrap();
        }
        assert_eq!(forward.root_hash(), backward.root_hash());
    }

    #[test]
    fn test_overwrite_changes_root_back() {
        let (_, mut trie) = memory_trie();
        trie.insert(b"key", b"one".to_vec()).unwrap();
        let first = trie.root_hash();
        trie.insert(b"key", b"two".to_vec()).unwrap();
        assert_ne!(trie.root_hash(), first);
        trie.insert(b"key", b"one".to_vec()).unwrap();
        assert_eq!(trie.root_hash(), first);
    }

    #[test]
    fn test_remove_restores_previous_root() {
        let (_, mut trie) = memory_trie();
        trie.insert(b"alpha", b"1".to_vec()).unwrap();
        trie.insert(b"beta", b"2".to_vec()).unwrap();
        let before = trie.root_hash();

        trie.insert(b"gamma", b"3".to_vec()).unwrap();
        assert!(trie.remove(b"gamma").unwrap());
        assert_eq!(trie.root_hash(), before);

        assert!(!trie.remove(b"gamma").unwrap());
    }

    #[test]
    fn test_remove_everything_yields_empty_root() {
        let (_, mut trie) = memory_trie();
        for i in 0u8..8 {
            trie.insert(&[i], vec![i + 1]).unwrap();
        }
        for i in 0u8..8 {
            assert!(trie.remove(&[i]).unwrap());
        }
        assert_eq!(trie.root_hash(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_commit_then_reopen_snapshot() {
        let (store, mut trie) = memory_trie();
        trie.insert(b"account-a", vec![1; 40]).unwrap();
        trie.insert(b"account-b", vec![2; 40]).unwrap();

        let (root, nodes) = trie.commit();
        store.apply(nodes);

        let reopened = Trie::open(Arc::clone(&store) as Arc<dyn NodeStore>, root);
        assert_eq!(reopened.get(b"account-a").unwrap(), Some(vec![1; 40]));
        assert_eq!(reopened.get(b"account-b").unwrap(), Some(vec![2; 40]));
        assert_eq!(reopened.root_hash(), root);
    }

    #[test]
    fn test_old_snapshot_stays_readable_after_new_commits() {
        let (store, mut trie) = memory_trie();
        trie.insert(b"k", b"v1".to_vec()).unwrap();
        let (root_v1, nodes) = trie.commit();
        store.apply(nodes);

        let mut session = Trie::open(Arc::clone(&store) as Arc<dyn NodeStore>, root_v1);
        session.insert(b"k", b"v2".to_vec()).unwrap();
        let (root_v2, nodes) = session.commit();
        store.apply(nodes);
        assert_ne!(root_v1, root_v2);

        let old = Trie::open(Arc::clone(&store) as Arc<dyn NodeStore>, root_v1);
        assert_eq!(old.get(b"k").unwrap(), Some(b"v1".to_vec()));
        let new = Trie::open(Arc::clone(&store) as Arc<dyn NodeStore>, root_v2);
        assert_eq!(new.get(b"k").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_session_is_isolated_until_commit() {
        let (store, mut trie) = memory_trie();
        trie.insert(b"pending", b"value".to_vec()).unwrap();
        // No nodes are persisted by mutation alone.
        assert!(store.is_empty());
        let (_, nodes) = trie.commit();
        assert!(!nodes.is_empty());
    }

    #[test]
    fn test_missing_node_surfaces_error() {
        let store = Arc::new(MemoryNodeStore::new());
        let trie = Trie::open(store, H256::repeat_byte(0xDE));
        let result = trie.get(b"anything");
        assert!(matches!(result, Err(TrieError::MissingNode(_))));
    }

    #[test]
    fn test_ordered_root_empty_list() {
        let items: Vec<Vec<u8>> = Vec::new();
        assert_eq!(ordered_trie_root(&items).unwrap(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_ordered_root_is_order_sensitive() {
        let a = ordered_trie_root(&[b"first".to_vec(), b"second".to_vec()]).unwrap();
        let b = ordered_trie_root(&[b"second".to_vec(), b"first".to_vec()]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hashed_keys_full_width() {
        // 32-byte keys, the shape the state trie actually uses.
        let (store, mut trie) = memory_trie();
        let keys: Vec<[u8; 32]> = (0u8..16).map(|i| [i.wrapping_mul(17); 32]).collect();
        for (i, key) in keys.iter().enumerate() {
            trie.insert(key, vec![i as u8; 60]).unwrap();
        }
        let (root, nodes) = trie.commit();
        store.apply(nodes);

        let reopened = Trie::open(Arc::clone(&store) as Arc<dyn NodeStore>, root);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(reopened.get(key).unwrap(), Some(vec![i as u8; 60]));
        }
    }
}
