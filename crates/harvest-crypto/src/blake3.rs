//! Domain-separated BLAKE3 hashing.
//!
//! Leaves and inner nodes of allow-list trees hash under different
//! domains so a leaf can never be passed off as an inner node.

/// Registered BLAKE3 context strings.
pub mod contexts {
    pub const MERKLE_INNER_NODE: &str = "Harvest v1 merkle-inner-node";

    pub const ALL_CONTEXTS: &[&str] = &[MERKLE_INNER_NODE];
}

/// Compute BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Derive a key using BLAKE3's key derivation mode.
///
/// # Arguments
///
/// * `context` - A registered context string (must start with "Harvest v1 ")
/// * `key_material` - The input key material
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

/// Compute a keyed BLAKE3 hash.
pub fn keyed_hash(key: &[u8; 32], message: &[u8]) -> [u8; 32] {
    *::blake3::keyed_hash(key, message).as_bytes()
}

/// Merkle leaf hash: `BLAKE3::hash(0x00 || data)`.
pub fn merkle_leaf(data: &[u8]) -> [u8; 32] {
    let mut input = Vec::with_capacity(1 + data.len());
    input.push(0x00);
    input.extend_from_slice(data);
    hash(&input)
}

/// `K_inner = BLAKE3::derive_key("Harvest v1 merkle-inner-node", "")`.
///
/// Derive once per tree or proof and hand it to [`merkle_inner_keyed`].
pub fn merkle_inner_key() -> [u8; 32] {
    derive_key(contexts::MERKLE_INNER_NODE, b"")
}

/// Merkle inner node hash: `BLAKE3::keyed_hash(K_inner, left || right)`.
pub fn merkle_inner_keyed(
    k_inner: &[u8; 32],
    left: &[u8; 32],
    right: &[u8; 32],
) -> [u8; 32] {
    let mut message = [0u8; 64];
    message[..32].copy_from_slice(left);
    message[32..].copy_from_slice(right);
    keyed_hash(k_inner, &message)
}

/// [`merkle_inner_keyed`] with a freshly derived key.
pub fn merkle_inner(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    merkle_inner_keyed(&merkle_inner_key(), left, right)
}
