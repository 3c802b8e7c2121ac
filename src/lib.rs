//! Hashcash version 1 proof-of-work stamps.
//!
//! A stamp is a colon-delimited line
//! `version:bits:date:resource:extension:random:counter` whose SHA-1 digest
//! starts with a number of zero bits. Minting searches counters until the
//! digest qualifies; verification checks the resource, the issuance date and
//! the digest.
//!
//! ```no_run
//! use hashcash::Stamp;
//!
//! let stamp = Stamp::mint("alice@example.org", Some(16)).unwrap();
//! stamp.verify("alice@example.org", 16).unwrap();
//! let parsed: Stamp = stamp.text().parse().unwrap();
//! assert_eq!(parsed, stamp);
//! ```
//!
//! Double-spend tracking of accepted stamps is left to the caller.

use std::time::Duration;

use sha1::{Digest, Sha1};

pub mod counter;
pub mod date;
pub mod error;
pub mod mint;
pub mod provider;
pub mod resource;
pub mod stamp;
pub mod stream;
pub mod verify;

pub use error::{Error, Result};
pub use mint::{Minter, MinterBuilder};
pub use provider::{
    Clock, FixedClock, FixedRandomSource, OsRandomSource, RandomSource, SystemClock,
};
pub use resource::Resources;
pub use stamp::Stamp;
pub use verify::{Verifier, VerifierConfig};

/// The only stamp version produced or accepted.
pub const STAMP_VERSION: u32 = 1;

/// Difficulty used when the caller does not pick one.
pub const DEFAULT_BITS: u32 = 20;

/// Largest accepted distance between a stamp's date and the verifier's clock.
pub const DEFAULT_MAX_SKEW: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Number of random bytes in a freshly minted stamp.
pub const RANDOM_BYTES: usize = 12;

/// Length in bits of the stamp digest.
pub const DIGEST_BITS: u32 = 160;

/// SHA-1 digest of a stamp line.
pub fn digest(text: &[u8]) -> [u8; 20] {
    Sha1::digest(text).into()
}

/// Count leading zero bits in a hash.
pub fn leading_zero_bits(hash: &[u8]) -> u32 {
    let mut count = 0u32;
    for byte in hash {
        if *byte == 0 {
            count += 8;
            continue;
        }
        count += byte.leading_zeros();
        break;
    }
    count
}

/// Whether the first `bits` bits of `hash` are all zero.
///
/// A requirement longer than the hash is never met.
pub fn meets_leading_zero_bits(hash: &[u8], bits: u32) -> bool {
    if bits as usize > hash.len() * 8 {
        return false;
    }
    leading_zero_bits(hash) >= bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_bits_counts_across_bytes() {
        assert_eq!(leading_zero_bits(&[0x00, 0x00, 0x10]), 19);
        assert_eq!(leading_zero_bits(&[0x80]), 0);
        assert_eq!(leading_zero_bits(&[0x00, 0x01]), 15);
        assert_eq!(leading_zero_bits(&[0u8; 4]), 32);
    }

    #[test]
    fn meets_bits_is_bit_level() {
        let hash = [0x00, 0x0f, 0xff];
        assert!(meets_leading_zero_bits(&hash, 0));
        assert!(meets_leading_zero_bits(&hash, 12));
        assert!(!meets_leading_zero_bits(&hash, 13));
    }

    #[test]
    fn requirement_longer_than_hash_fails() {
        assert!(!meets_leading_zero_bits(&[0u8; 2], 17));
        assert!(meets_leading_zero_bits(&[0u8; 2], 16));
    }

    #[test]
    fn sha1_digest_of_known_input() {
        assert_eq!(
            hex::encode(digest(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn wikipedia_stamp_carries_twenty_zero_bits() {
        let hash = digest(b"1:20:060408:adam@cypherspace.org::1QTjaYd7niiQA/sc:ePa");
        assert!(leading_zero_bits(&hash) >= 20);
    }
}
