//! License key generation.
//!
//! Format: `PAKT-XXXX-XXXX-XXXX`, each `X` drawn from a 32-symbol alphabet
//! without the look-alikes `0`, `1`, `I` and `O` (60 bits of entropy).
//! Generation does not consult the store; collisions are left to entropy.

use rand::Rng;

pub const LICENSE_KEY_PREFIX: &str = "PAKT";

/// Uppercase letters and digits minus `0`, `1`, `I`, `O`.
pub const KEY_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const SEGMENTS: usize = 3;
const SEGMENT_LEN: usize = 4;

/// Produces license keys from an entropy source.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Key generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> String {
        generate_license_key(&mut rand::thread_rng())
    }
}

/// Generate a license key from the given RNG.
pub fn generate_license_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut segment = || -> String {
        (0..SEGMENT_LEN)
            .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect()
    };

    let segments: Vec<String> = (0..SEGMENTS).map(|_| segment()).collect();
    format!("{}-{}", LICENSE_KEY_PREFIX, segments.join("-"))
}

/// Check that a string has the shape of a generated license key.
///
/// Cheap syntactic check only; it says nothing about whether the key exists.
pub fn is_valid_license_key(s: &str) -> bool {
    let Some(rest) = s
        .strip_prefix(LICENSE_KEY_PREFIX)
        .and_then(|r| r.strip_prefix('-'))
    else {
        return false;
    };

    let parts: Vec<&str> = rest.split('-').collect();
    parts.len() == SEGMENTS
        && parts.iter().all(|p| {
            p.len() == SEGMENT_LEN && p.bytes().all(|b| KEY_ALPHABET.contains(&b))
        })
}
