//! Composite (threshold) keys.
//!
//! A composite key is a tree whose leaves are public keys and whose inner
//! nodes carry a threshold. A node is fulfilled when the summed weight of its
//! fulfilled children reaches the threshold.

use std::collections::HashSet;
use std::sync::Arc;

use super::keys::PublicKey;
use crate::error::CompositeKeyError;

/// A child of a composite key: either a plain key or a nested composite key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyNode {
    /// A single public key.
    Leaf(PublicKey),
    /// A nested composite key.
    Composite(Arc<CompositeKey>),
}

impl KeyNode {
    /// Whether this node is satisfied by the given set of signing keys.
    pub fn is_fulfilled_by(&self, keys: &[PublicKey]) -> bool {
        match self {
            KeyNode::Leaf(key) => keys.contains(key),
            KeyNode::Composite(composite) => composite.is_fulfilled_by(keys),
        }
    }

    fn collect_leaves(&self, out: &mut Vec<PublicKey>) {
        match self {
            KeyNode::Leaf(key) => out.push(key.clone()),
            KeyNode::Composite(composite) => {
                for child in &composite.children {
                    child.node.collect_leaves(out);
                }
            }
        }
    }
}

impl From<PublicKey> for KeyNode {
    fn from(key: PublicKey) -> Self {
        KeyNode::Leaf(key)
    }
}

impl From<CompositeKey> for KeyNode {
    fn from(key: CompositeKey) -> Self {
        KeyNode::Composite(Arc::new(key))
    }
}

/// A child node together with its weight.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeAndWeight {
    /// The child node.
    pub node: KeyNode,
    /// Contribution of this child towards the parent's threshold.
    pub weight: u32,
}

/// A threshold key over two or more weighted children.
///
/// Only constructible through [`CompositeKeyBuilder`], which enforces the
/// structural invariants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    threshold: u32,
    children: Vec<NodeAndWeight>,
}

impl CompositeKey {
    /// Start building a composite key.
    pub fn builder() -> CompositeKeyBuilder {
        CompositeKeyBuilder::default()
    }

    /// Minimum total child weight required to fulfil this key.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Weighted children in insertion order.
    pub fn children(&self) -> &[NodeAndWeight] {
        &self.children
    }

    /// Whether the given signing keys fulfil this key.
    pub fn is_fulfilled_by(&self, keys: &[PublicKey]) -> bool {
        let total: u64 = self
            .children
            .iter()
            .filter(|child| child.node.is_fulfilled_by(keys))
            .map(|child| u64::from(child.weight))
            .sum();
        total >= u64::from(self.threshold)
    }

    /// All leaf keys of the tree, depth first.
    pub fn leaf_keys(&self) -> Vec<PublicKey> {
        let mut out = Vec::new();
        for child in &self.children {
            child.node.collect_leaves(&mut out);
        }
        out
    }
}

/// Builder that validates a composite key at construction time.
#[derive(Clone, Debug, Default)]
pub struct CompositeKeyBuilder {
    children: Vec<NodeAndWeight>,
}

impl CompositeKeyBuilder {
    /// Add a weighted child.
    pub fn add_key(mut self, node: impl Into<KeyNode>, weight: u32) -> Self {
        self.children.push(NodeAndWeight {
            node: node.into(),
            weight,
        });
        self
    }

    /// Add several children, each with weight 1.
    pub fn add_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyNode>,
    {
        for key in keys {
            self = self.add_key(key, 1);
        }
        self
    }

    /// Build the key. A missing threshold defaults to the total weight.
    pub fn build(self, threshold: Option<u32>) -> Result<CompositeKey, CompositeKeyError> {
        if self.children.len() < 2 {
            return Err(CompositeKeyError::TooFewChildren {
                count: self.children.len(),
            });
        }
        if self.children.iter().any(|child| child.weight == 0) {
            return Err(CompositeKeyError::ZeroWeight);
        }

        let mut seen = HashSet::with_capacity(self.children.len());
        if !self.children.iter().all(|child| seen.insert(&child.node)) {
            return Err(CompositeKeyError::DuplicateChild);
        }

        let total_weight: u64 = self.children.iter().map(|c| u64::from(c.weight)).sum();
        let threshold = match threshold {
            Some(t) => t,
            None => u32::try_from(total_weight).unwrap_or(u32::MAX),
        };
        if threshold == 0 {
            return Err(CompositeKeyError::ZeroThreshold);
        }
        if u64::from(threshold) > total_weight {
            return Err(CompositeKeyError::ThresholdUnreachable {
                threshold,
                total_weight,
            });
        }

        Ok(CompositeKey {
            threshold,
            children: self.children,
        })
    }
}
