//! Composite record identifiers.
//!
//! Derived records are keyed by fixed-width composite byte keys built from
//! one or more unsigned integers, each encoded as a 32-byte big-endian
//! zero-padded value. The encoding is deterministic, injective and
//! sortable, so the keys double as stable primary keys in ordered stores.
//! The 256-bit precondition on every component is enforced by the `U256`
//! argument type.

use primitive_types::U256;

/// Builds a 64-byte key from two padded integers.
#[must_use]
pub fn id_from_2_padded(first: U256, second: U256) -> [u8; 64] {
    let mut id = [0u8; 64];
    id[..32].copy_from_slice(&first.to_big_endian());
    id[32..].copy_from_slice(&second.to_big_endian());
    id
}

/// Builds a 96-byte key from three padded integers.
#[must_use]
pub fn id_from_3_padded(first: U256, second: U256, third: U256) -> [u8; 96] {
    let mut id = [0u8; 96];
    id[..32].copy_from_slice(&first.to_big_endian());
    id[32..64].copy_from_slice(&second.to_big_endian());
    id[64..].copy_from_slice(&third.to_big_endian());
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_from_2_padded_bigints() {
        let id = id_from_2_padded(U256::from(2u64), U256::from(3u64));
        assert_eq!(
            hex::encode(id),
            "00000000000000000000000000000000000000000000000000000000000000020000000000000000000000000000000000000000000000000000000000000003",
        );
    }

    #[test]
    fn id_from_3_padded_bigints() {
        let id = id_from_3_padded(U256::from(1u64), U256::from(2u64), U256::from(3u64));
        assert_eq!(id.len(), 96);
        assert_eq!(&id[..32], U256::from(1u64).to_big_endian().as_slice());
        assert_eq!(&id[32..64], U256::from(2u64).to_big_endian().as_slice());
        assert_eq!(&id[64..], U256::from(3u64).to_big_endian().as_slice());
    }

    #[test]
    fn ids_distinct_across_full_tree() {
        // Neighbouring positions must never collide, including across the
        // wrap from one tree to the next.
        let mut ids = std::collections::BTreeSet::new();
        for position in 0..402u64 {
            let id = id_from_2_padded(U256::zero(), U256::from(position));
            assert!(ids.insert(id), "duplicate id at position {position}");
        }
        assert_ne!(
            id_from_2_padded(U256::from(1u64), U256::zero()),
            id_from_2_padded(U256::zero(), U256::from(1u64)),
        );
    }
}
