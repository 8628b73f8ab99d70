//! Sorted-pair binary Merkle trees.
//!
//! Every pair is ordered before hashing, so a proof is just the list of
//! sibling hashes from leaf to root with no left/right flags. An odd node
//! at the end of a layer is paired with itself, which means its proof
//! carries its own hash at that level.

use std::collections::HashMap;

use harvest_types::{Address, Amount, Hash};

use crate::blake3;
use crate::{CryptoError, Result};

/// Hash two nodes in canonical (ascending) order.
pub fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
    hash_sorted_pair_keyed(&blake3::merkle_inner_key(), a, b)
}

fn hash_sorted_pair_keyed(k_inner: &Hash, a: &Hash, b: &Hash) -> Hash {
    if a <= b {
        blake3::merkle_inner_keyed(k_inner, a, b)
    } else {
        blake3::merkle_inner_keyed(k_inner, b, a)
    }
}

/// Leaf committing to a `(recipient, amount)` allow-list entry.
///
/// `leaf = BLAKE3::hash(0x00 || address || BE128(amount))`
pub fn reward_leaf(recipient: &Address, amount: Amount) -> Hash {
    let mut data = [0u8; 48];
    data[..32].copy_from_slice(recipient.as_bytes());
    data[32..].copy_from_slice(&amount.to_be_bytes());
    blake3::merkle_leaf(&data)
}

/// Fold `leaf` up through `proof` and return the resulting root.
pub fn compute_root(proof: &[Hash], leaf: &Hash) -> Hash {
    let k_inner = blake3::merkle_inner_key();
    proof.iter().fold(*leaf, |computed, sibling| {
        hash_sorted_pair_keyed(&k_inner, &computed, sibling)
    })
}

/// Returns true if `leaf` is proved to be part of the tree committed to by `root`.
pub fn verify(proof: &[Hash], root: &Hash, leaf: &Hash) -> bool {
    compute_root(proof, leaf) == *root
}

/// A fully materialised tree, kept layer by layer so proofs can be read off.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// `layers[0]` holds the leaves, the last layer holds the root alone.
    layers: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over already-hashed leaves, in the given order.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::EmptyTree`] if `leaves` is empty
    pub fn from_leaves(leaves: Vec<Hash>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyTree);
        }

        let k_inner = blake3::merkle_inner_key();
        let mut layers = vec![leaves];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let next_layer: Vec<Hash> = layer
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    hash_sorted_pair_keyed(&k_inner, left, right)
                })
                .collect();
            layers.push(next_layer);
        }

        Ok(Self { layers })
    }

    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Sibling hashes from the leaf at `index` up to (excluding) the root.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::LeafOutOfRange`] if `index` is not a leaf position
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>> {
        let count = self.leaf_count();
        if index >= count {
            return Err(CryptoError::LeafOutOfRange { index, count });
        }

        let mut proof = Vec::with_capacity(self.layers.len().saturating_sub(1));
        let mut position = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = position ^ 1;
            // Odd node pairs with itself.
            let hash = layer.get(sibling).unwrap_or(&layer[position]);
            proof.push(*hash);
            position /= 2;
        }
        Ok(proof)
    }
}

/// An allow-list of `(recipient, amount)` entries and the tree over them.
#[derive(Clone, Debug)]
pub struct RewardTree {
    entries: Vec<(Address, Amount)>,
    positions: HashMap<Address, usize>,
    tree: MerkleTree,
}

impl RewardTree {
    /// Build the tree in entry order.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::EmptyTree`] if there are no entries
    /// - [`CryptoError::DuplicateEntry`] if a recipient appears twice
    pub fn new(entries: Vec<(Address, Amount)>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(entries.len());
        for (i, (recipient, _)) in entries.iter().enumerate() {
            if positions.insert(*recipient, i).is_some() {
                return Err(CryptoError::DuplicateEntry(recipient.to_string()));
            }
        }

        let leaves = entries
            .iter()
            .map(|(recipient, amount)| reward_leaf(recipient, *amount))
            .collect();
        let tree = MerkleTree::from_leaves(leaves)?;

        tracing::debug!(entries = entries.len(), "reward tree built");

        Ok(Self {
            entries,
            positions,
            tree,
        })
    }

    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    pub fn entries(&self) -> &[(Address, Amount)] {
        &self.entries
    }

    /// Sum of all entry amounts.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::TotalOverflow`] if the sum does not fit
    pub fn total(&self) -> Result<Amount> {
        self.entries
            .iter()
            .try_fold(0u128, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(CryptoError::TotalOverflow)
    }

    /// The entitled amount and proof for `recipient`, if listed.
    pub fn proof_for(&self, recipient: &Address) -> Option<(Amount, Vec<Hash>)> {
        let index = *self.positions.get(recipient)?;
        let proof = self.tree.proof(index).ok()?;
        Some((self.entries[index].1, proof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u8) -> Vec<Hash> {
        (0..n).map(|i| blake3::hash(&[i])).collect()
    }

    #[test]
    fn test_empty_tree_rejected() {
        assert_eq!(
            MerkleTree::from_leaves(Vec::new()).err(),
            Some(CryptoError::EmptyTree)
        );
    }

    #[test]
    fn test_root_matches_pairwise_hashing() {
        let all = leaves(3);
        let tree = MerkleTree::from_leaves(all.clone()).expect("tree");
        let left = hash_sorted_pair(&all[0], &all[1]);
        let right = hash_sorted_pair(&all[2], &all[2]);
        assert_eq!(tree.root(), hash_sorted_pair(&left, &right));
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let tree = MerkleTree::from_leaves(leaves(1)).expect("tree");
        assert_eq!(tree.root(), leaves(1)[0]);
        assert!(tree.proof(0).expect("proof").is_empty());
    }

    #[test]
    fn test_every_leaf_verifies() {
        for n in 1..=9u8 {
            let all = leaves(n);
            let tree = MerkleTree::from_leaves(all.clone()).expect("tree");
            for (i, leaf) in all.iter().enumerate() {
                let proof = tree.proof(i).expect("proof");
                assert!(verify(&proof, &tree.root(), leaf), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn test_proof_out_of_range() {
        let tree = MerkleTree::from_leaves(leaves(3)).expect("tree");
        assert_eq!(
            tree.proof(3).err(),
            Some(CryptoError::LeafOutOfRange { index: 3, count: 3 })
        );
    }

    #[test]
    fn test_sorted_pair_is_order_independent() {
        let a = blake3::hash(b"a");
        let b = blake3::hash(b"b");
        assert_eq!(hash_sorted_pair(&a, &b), hash_sorted_pair(&b, &a));
    }

    #[test]
    fn test_wrong_leaf_or_root_fails() {
        let all = leaves(4);
        let tree = MerkleTree::from_leaves(all.clone()).expect("tree");
        let proof = tree.proof(1).expect("proof");
        assert!(!verify(&proof, &tree.root(), &all[2]));
        assert!(!verify(&proof, &[0u8; 32], &all[1]));
        assert!(!verify(&proof[..1], &tree.root(), &all[1]));
    }

    #[test]
    fn test_reward_tree_proofs() {
        let a = Address::repeat(0xA);
        let b = Address::repeat(0xB);
        let c = Address::repeat(0xC);
        let tree = RewardTree::new(vec![(a, 10), (b, 20), (c, 30)]).expect("tree");
        assert_eq!(tree.total().expect("total"), 60);

        let (amount, proof) = tree.proof_for(&b).expect("b listed");
        assert_eq!(amount, 20);
        assert!(verify(&proof, &tree.root(), &reward_leaf(&b, 20)));
        assert!(!verify(&proof, &tree.root(), &reward_leaf(&b, 25)));
        assert!(!verify(&proof, &tree.root(), &reward_leaf(&a, 20)));

        assert!(tree.proof_for(&Address::repeat(0xD)).is_none());
    }

    #[test]
    fn test_reward_tree_rejects_duplicates() {
        let a = Address::repeat(0xA);
        let result = RewardTree::new(vec![(a, 1), (a, 2)]);
        assert!(matches!(result, Err(CryptoError::DuplicateEntry(_))));
    }

    #[test]
    fn test_reward_leaf_binds_amount_and_recipient() {
        let a = Address::repeat(1);
        assert_ne!(reward_leaf(&a, 1), reward_leaf(&a, 2));
        assert_ne!(reward_leaf(&a, 1), reward_leaf(&Address::repeat(2), 1));
    }
}
