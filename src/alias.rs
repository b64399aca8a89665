//! Random alias generation.
//!
//! Aliases are sampled uniformly from a fixed alphanumeric alphabet. This
//! module makes no uniqueness promise; the store's UNIQUE constraint is the
//! single arbiter, so there is no collision-avoidance loop here.

use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default alias length for records saved without a caller-supplied alias.
pub const DEFAULT_LEN: usize = 6;

pub fn generate(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
