//! Burkhard-Keller tree over a metric space.
//!
//! Each node keeps its children keyed by their exact distance to the node.
//! A search for everything within `threshold` of a target only has to descend
//! into children whose edge label lies in `[d - threshold, d + threshold]`,
//! where `d` is the distance from the node to the target. The triangle
//! inequality guarantees nothing outside that window can match.

pub mod codec;
pub mod hamming;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use codec::{load_tree, read_tree, read_tree_with_limit, save_tree, write_tree};
pub use hamming::Hamming;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("Length of {side} is zero.")]
    EmptyOperand { side: &'static str },

    #[error(
        "Source and target have different length ({} vs {}). The barcode taken from the reads does not match the length of the dictionary barcodes:\n{}\n{}",
        source_len,
        target_len,
        source_seq,
        target_seq
    )]
    LengthMismatch {
        source_seq: String,
        target_seq: String,
        source_len: usize,
        target_len: usize,
    },
}

///////////////////////////////
/// A distance policy for the tree. Must be symmetric and obey the triangle
/// inequality, otherwise `find` will silently miss matches
pub trait Metric<T> {
    fn distance(&self, a: &T, b: &T) -> Result<usize, MetricError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BkNode<T> {
    pub(crate) value: T,
    pub(crate) children: BTreeMap<usize, Box<BkNode<T>>>,
}

impl<T> BkNode<T> {
    fn new(value: T) -> BkNode<T> {
        BkNode {
            value,
            children: BTreeMap::new(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn child(&self, dist: usize) -> Option<&BkNode<T>> {
        self.children.get(&dist).map(|c| c.as_ref())
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Number of nodes in this subtree, including self
    pub fn count(&self) -> usize {
        1 + self.children.values().map(|c| c.count()).sum::<usize>()
    }
}

///////////////////////////////
/// BK-tree handle. Owns the optional root; an empty tree has no root
#[derive(Debug, Clone)]
pub struct BkTree<T, M> {
    root: Option<Box<BkNode<T>>>,
    size: usize,
    metric: M,
}

impl<T, M> BkTree<T, M>
where
    M: Metric<T>,
{
    pub fn new(metric: M) -> BkTree<T, M> {
        BkTree {
            root: None,
            size: 0,
            metric,
        }
    }

    pub(crate) fn from_parts(root: Option<Box<BkNode<T>>>, metric: M) -> BkTree<T, M> {
        let size = root.as_ref().map(|r| r.count()).unwrap_or(0);
        BkTree { root, size, metric }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn root(&self) -> Option<&BkNode<T>> {
        self.root.as_deref()
    }

    ///////////////////////////////
    /// Insert an element. Returns false if an element at distance 0 was
    /// already present, in which case the tree is left untouched
    pub fn insert(&mut self, value: T) -> Result<bool, MetricError> {
        let mut node = match self.root.as_mut() {
            Some(root) => root,
            None => {
                self.root = Some(Box::new(BkNode::new(value)));
                self.size = 1;
                return Ok(true);
            }
        };

        loop {
            let dist = self.metric.distance(&node.value, &value)?;
            if dist == 0 {
                return Ok(false);
            }
            match node.children.entry(dist) {
                Entry::Occupied(child) => node = child.into_mut(),
                Entry::Vacant(slot) => {
                    slot.insert(Box::new(BkNode::new(value)));
                    self.size += 1;
                    return Ok(true);
                }
            }
        }
    }

    ///////////////////////////////
    /// All stored elements within `threshold` of `target`. Order unspecified
    pub fn find(&self, target: &T, threshold: usize) -> Result<Vec<&T>, MetricError> {
        let mut results = Vec::new();
        let mut stack: Vec<&BkNode<T>> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push(root);
        }

        while let Some(node) = stack.pop() {
            let dist = self.metric.distance(&node.value, target)?;
            if dist <= threshold {
                results.push(&node.value);
            }

            let lo = dist.saturating_sub(threshold);
            let hi = dist.saturating_add(threshold);
            for (_, child) in node.children.range(lo..=hi) {
                stack.push(child.as_ref());
            }
        }
        Ok(results)
    }

    /// Pre-order walk over every stored element
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }
}

pub struct Iter<'a, T> {
    stack: Vec<&'a BkNode<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.stack.pop()?;
        // Reverse so that smaller edge labels are visited first
        self.stack
            .extend(node.children.values().rev().map(|c| c.as_ref()));
        Some(&node.value)
    }
}

impl<T: PartialEq, M> PartialEq for BkTree<T, M> {
    /// Structural equality: same values reachable through the same
    /// distance-labelled paths. The metric is not compared
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.root == other.root
    }
}
