//! Stable node identifiers.
//!
//! Every node is addressed by a 64-bit FNV-1 hash of a semantic key: the
//! category name, the feed title, or the rendered bytes of an item. The same
//! key always yields the same identifier, across refreshes and across
//! process restarts, which is what lets the kernel keep a stable handle on an
//! entry whose contents are regenerated on every listing.
//!
//! Collisions are tolerated: identifiers are addressing hints, never used to
//! compare content.

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Identifier of the filesystem root (FUSE convention).
pub const ROOT_ID: u64 = 1;

/// Hashes `key` into a node identifier (64-bit FNV-1).
pub fn identify(key: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in key {
        hash = hash.wrapping_mul(FNV_PRIME);
        hash ^= u64::from(*byte);
    }
    hash
}

/// Identifier of a category directory.
pub fn category_id(name: &str) -> u64 {
    identify(format!("Cat {name}").as_bytes())
}

/// Identifier of a feed directory.
///
/// `key` is the feed's title, qualified as `"<category>/<title>"` when the same
/// title is configured in more than one category.
pub fn feed_id(key: &str) -> u64 {
    identify(format!("feed {key}").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_key_is_offset_basis() {
        assert_eq!(identify(b""), FNV_OFFSET);
    }

    #[test]
    fn test_known_vectors() {
        // Reference FNV-1 64 values.
        assert_eq!(identify(b"a"), 0xaf63bd4c8601b7be);
        assert_eq!(identify(b"foobar"), 0x340d8765a4dda9c2);
    }

    #[test]
    fn test_category_and_feed_keys_are_namespaced() {
        assert_ne!(category_id("Tech"), feed_id("Tech"));
        assert_eq!(category_id("Tech"), identify(b"Cat Tech"));
        assert_eq!(feed_id("HN"), identify(b"feed HN"));
    }

    proptest! {
        #[test]
        fn identify_is_deterministic(key in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(identify(&key), identify(&key.clone()));
        }
    }
}
