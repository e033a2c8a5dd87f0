//! Trie node representation and its canonical RLP encoding.

use crate::domain::errors::TrieError;
use crate::domain::nibbles::Nibbles;
use primitive_types::H256;
use rlp::{Rlp, RlpStream};
use shared_crypto::keccak256;

/// Reference from a parent node to a child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeRef {
    /// No child.
    Empty,
    /// Committed node in the backend, referenced by hash.
    Hash(H256),
    /// In-memory node: either decoded from an inline reference or mutated
    /// in this session.
    Node(Box<Node>),
}

impl Default for NodeRef {
    fn default() -> Self {
        NodeRef::Empty
    }
}

impl NodeRef {
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }
}

/// The three materialized node kinds. The empty node is represented by
/// [`NodeRef::Empty`] on the referencing side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Terminal node: remaining path + value.
    Leaf { path: Nibbles, value: Vec<u8> },
    /// Shared-prefix optimization: path + single child.
    Extension { path: Nibbles, child: NodeRef },
    /// 16-way branch + optional value for a key ending here.
    Branch {
        children: Box<[NodeRef; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl Node {
    pub fn empty_branch() -> Self {
        Node::Branch {
            children: Box::new(core::array::from_fn(|_| NodeRef::Empty)),
            value: None,
        }
    }
}

/// RLP-encode a node. Children encoded along the way that do not fit
/// inline are appended to `new_nodes` as `(hash, rlp)` pairs for the
/// commit batch.
pub fn encode_node(node: &Node, new_nodes: &mut Vec<(H256, Vec<u8>)>) -> Vec<u8> {
    let mut stream = RlpStream::new();
    match node {
        Node::Leaf { path, value } => {
            stream.begin_list(2);
            stream.append(&path.encode_hex_prefix(true));
            stream.append(value);
        }
        Node::Extension { path, child } => {
            stream.begin_list(2);
            stream.append(&path.encode_hex_prefix(false));
            append_ref(&mut stream, child, new_nodes);
        }
        Node::Branch { children, value } => {
            stream.begin_list(17);
            for child in children.iter() {
                append_ref(&mut stream, child, new_nodes);
            }
            match value {
                Some(value) => stream.append(value),
                None => stream.append_empty_data(),
            };
        }
    }
    stream.out().to_vec()
}

/// Encode a node and return its hash reference, recording it in
/// `new_nodes`. Used for the root, which is always referenced by hash.
pub fn hash_node(node: &Node, new_nodes: &mut Vec<(H256, Vec<u8>)>) -> H256 {
    let encoded = encode_node(node, new_nodes);
    let hash = keccak256(&encoded);
    new_nodes.push((hash, encoded));
    hash
}

fn append_ref(stream: &mut RlpStream, child: &NodeRef, new_nodes: &mut Vec<(H256, Vec<u8>)>) {
    match child {
        NodeRef::Empty => {
            stream.append_empty_data();
        }
        NodeRef::Hash(hash) => {
            stream.append(hash);
        }
        NodeRef::Node(node) => {
            let encoded = encode_node(node, new_nodes);
            if encoded.len() < 32 {
                // Short node: embed its RLP directly inside the parent.
                stream.append_raw(&encoded, 1);
            } else {
                let hash = keccak256(&encoded);
                new_nodes.push((hash, encoded));
                stream.append(&hash);
            }
        }
    }
}

/// Decode a node from its RLP encoding.
pub fn decode_node(bytes: &[u8]) -> Result<Node, TrieError> {
    let rlp = Rlp::new(bytes);
    match rlp.item_count()? {
        2 => {
            let encoded_path: Vec<u8> = rlp.val_at(0)?;
            let (path, is_leaf) = Nibbles::decode_hex_prefix(&encoded_path);
            if is_leaf {
                Ok(Node::Leaf {
                    path,
                    value: rlp.val_at(1)?,
                })
            } else {
                Ok(Node::Extension {
                    path,
                    child: decode_ref(&rlp.at(1)?)?,
                })
            }
        }
        17 => {
            let mut children: [NodeRef; 16] = core::array::from_fn(|_| NodeRef::Empty);
            for (index, child) in children.iter_mut().enumerate() {
                *child = decode_ref(&rlp.at(index)?)?;
            }
            let value_item = rlp.at(16)?;
            let value = if value_item.is_empty() {
                None
            } else {
                Some(value_item.data()?.to_vec())
            };
            Ok(Node::Branch {
                children: Box::new(children),
                value,
            })
        }
        count => Err(TrieError::InvalidEncoding(
            rlp::DecoderError::Custom(if count == 0 {
                "empty node list"
            } else {
                "unexpected node arity"
            }),
        )),
    }
}

fn decode_ref(item: &Rlp<'_>) -> Result<NodeRef, TrieError> {
    if item.is_list() {
        // Inline node: the child's full RLP is embedded in the parent.
        return Ok(NodeRef::Node(Box::new(decode_node(item.as_raw())?)));
    }
    let data = item.data()?;
    match data.len() {
        0 => Ok(NodeRef::Empty),
        32 => Ok(NodeRef::Hash(H256::from_slice(data))),
        length => Err(TrieError::InvalidNodeRef { length }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_roundtrip() {
        let leaf = Node::Leaf {
            path: Nibbles::from_raw(vec![1, 2, 3]),
            value: vec![0xAB; 40],
        };
        let mut scratch = Vec::new();
        let encoded = encode_node(&leaf, &mut scratch);
        assert_eq!(decode_node(&encoded).unwrap(), leaf);
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_branch_with_inline_child_roundtrip() {
        // A tiny leaf encodes under 32 bytes and must be embedded inline.
        let tiny = Node::Leaf {
            path: Nibbles::from_raw(vec![5]),
            value: vec![0x01, 0x02],
        };
        let mut branch = Node::empty_branch();
        if let Node::Branch { children, .. } = &mut branch {
            children[3] = NodeRef::Node(Box::new(tiny.clone()));
        }

        let mut new_nodes = Vec::new();
        let encoded = encode_node(&branch, &mut new_nodes);
        // Inline children produce no standalone stored nodes.
        assert!(new_nodes.is_empty());

        let decoded = decode_node(&encoded).unwrap();
        match decoded {
            Node::Branch { children, .. } => {
                assert_eq!(children[3], NodeRef::Node(Box::new(tiny)));
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }

    #[test]
    fn test_large_child_is_hashed_out() {
        let big = Node::Leaf {
            path: Nibbles::from_raw(vec![1, 2, 3, 4]),
            value: vec![0xCD; 64],
        };
        let mut branch = Node::empty_branch();
        if let Node::Branch { children, .. } = &mut branch {
            children[0] = NodeRef::Node(Box::new(big));
        }

        let mut new_nodes = Vec::new();
        let encoded = encode_node(&branch, &mut new_nodes);
        assert_eq!(new_nodes.len(), 1);

        let decoded = decode_node(&encoded).unwrap();
        match decoded {
            Node::Branch { children, .. } => {
                assert_eq!(children[0], NodeRef::Hash(new_nodes[0].0));
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }
}
