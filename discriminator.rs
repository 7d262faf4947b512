//! Anchor discriminator utilities.
//!
//! Candy Guard is an Anchor program: instructions are prefixed with
//! `sha256("global:<name>")[..8]` and accounts with `sha256("account:<Name>")[..8]`.

use sha2::{Digest, Sha256};

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let preimage = format!("{}:{}", namespace, name);
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    let hash_result = hasher.finalize();
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash_result[..8]);
    discriminator
}

/// Compute Anchor instruction discriminator: sha256("global:<name>")[0..8]
///
/// # Example
///
/// ```
/// use candy_guard_codec::instruction_discriminator;
///
/// let mint = instruction_discriminator("mint");
/// assert_eq!(mint.len(), 8);
/// ```
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    sighash("global", name)
}

/// Compute Anchor account discriminator: sha256("account:<Name>")[0..8]
pub fn account_discriminator(name: &str) -> [u8; 8] {
    sighash("account", name)
}
