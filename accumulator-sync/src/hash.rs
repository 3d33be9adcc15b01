//! Note commitment hashing and the transaction verification hash chain.
//!
//! The cryptographic primitives themselves are external collaborators: a
//! 3-input hash over a prime field large enough to hold 256-bit values
//! (note and token hashing, reached through [`FieldHasher`]) and keccak-256
//! (the verification chain). Substituting either primitive changes every
//! derived identity, so implementations of [`FieldHasher`] must bind the
//! exact upstream gadget.

use primitive_types::U256;
use sha3::{Digest, Keccak256};

use crate::error::HashError;
use crate::event::{NotePreimage, TokenDescriptor};

/// Content-derived identity of a token descriptor.
pub type TokenHash = [u8; 32];

/// External field hash collaborator.
///
/// Both operations are pure functions of their inputs. Errors are fatal for
/// the batch being reduced; the reducer never retries a failed call.
pub trait FieldHasher {
    /// Computes the 3-input field hash over `(input1, input2, input3)`.
    fn hash3(&self, input1: U256, input2: U256, input3: U256) -> Result<U256, HashError>;

    /// Combines a token descriptor into its 256-bit content hash.
    fn token_hash(&self, token: &TokenDescriptor) -> Result<TokenHash, HashError>;
}

/// Reads a little-endian-stored 32-byte event field as an unsigned integer.
///
/// Owner keys, nullifiers and token hashes arrive in little-endian byte
/// order and must be byte-reversed before interpretation as big-endian
/// field integers. Skipping the reversal silently derives wrong identities
/// for every note, so all integer reinterpretation goes through here.
#[must_use]
pub fn u256_from_reversed_bytes(bytes: &[u8; 32]) -> U256 {
    U256::from_little_endian(bytes)
}

/// Computes a note commitment hash from `(owner key, token hash, value)`.
///
/// The owner key and token hash are little-endian-stored byte fields; see
/// [`u256_from_reversed_bytes`].
pub fn note_hash(
    hasher: &impl FieldHasher,
    npk: &[u8; 32],
    token_hash: &TokenHash,
    value: U256,
) -> Result<U256, HashError> {
    hasher
        .hash3(
            u256_from_reversed_bytes(npk),
            u256_from_reversed_bytes(token_hash),
            value,
        )
        .map_err(|e| {
            tracing::error!(
                "field hash failed for note commitment. npk: {}, token hash: {}, value: {}",
                hex::encode(npk),
                hex::encode(token_hash),
                value,
            );
            e
        })
}

/// Computes the note commitment hash of an unshield preimage.
pub fn unshield_preimage_note_hash(
    hasher: &impl FieldHasher,
    preimage: &NotePreimage,
) -> Result<U256, HashError> {
    let token_hash = hasher.token_hash(&preimage.token)?;
    note_hash(hasher, &preimage.npk, &token_hash, preimage.value)
}

/// Extends the verification hash chain by one transaction.
///
/// `hash[n] = keccak256(hash[n-1] ++ first_nullifier)` where `hash[-1]` is
/// the zero-length byte string.
#[must_use]
pub fn verification_hash(previous: Option<&[u8; 32]>, first_nullifier: &[u8; 32]) -> [u8; 32] {
    let mut keccak = Keccak256::new();
    if let Some(previous) = previous {
        keccak.update(previous);
    }
    keccak.update(first_nullifier);
    keccak.finalize().into()
}

/// Injectable verification hash chain context.
///
/// Holds the process-wide chain value while a batch is reduced. The chain
/// is strictly sequential and global: it must be extended exactly once per
/// transaction, in processing order, across the lifetime of the whole
/// event stream. Callers load the chain from the singleton ledger record
/// before reducing a batch and persist the final value only when the whole
/// batch commits, so a failed batch leaves the stored chain untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationChain {
    value: Option<[u8; 32]>,
}

impl VerificationChain {
    /// Constructs the chain context from the stored singleton state.
    ///
    /// `None` means the chain has never been extended.
    #[must_use]
    pub fn new(value: Option<[u8; 32]>) -> Self {
        VerificationChain { value }
    }

    /// Extends the chain with a transaction's first nullifier and returns
    /// the new chain value.
    pub fn extend(&mut self, first_nullifier: &[u8; 32]) -> [u8; 32] {
        let extended = verification_hash(self.value.as_ref(), first_nullifier);
        self.value = Some(extended);
        extended
    }

    /// Latest chain value, if the chain has ever been extended.
    #[must_use]
    pub fn value(&self) -> Option<[u8; 32]> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::MockFieldHasher;

    const NULLIFIER_1: [u8; 32] = [0x11; 32];
    const NULLIFIER_2: [u8; 32] = [0x22; 32];

    #[test]
    fn chain_replay_is_deterministic() {
        let mut first = VerificationChain::new(None);
        first.extend(&NULLIFIER_1);
        first.extend(&NULLIFIER_2);

        let mut second = VerificationChain::new(None);
        second.extend(&NULLIFIER_1);
        second.extend(&NULLIFIER_2);

        assert_eq!(first.value(), second.value());
        assert!(first.value().is_some());
    }

    #[test]
    fn chain_is_order_sensitive() {
        let mut forward = VerificationChain::new(None);
        forward.extend(&NULLIFIER_1);
        forward.extend(&NULLIFIER_2);

        let mut reversed = VerificationChain::new(None);
        reversed.extend(&NULLIFIER_2);
        reversed.extend(&NULLIFIER_1);

        assert_ne!(forward.value(), reversed.value());
    }

    #[test]
    fn first_link_hashes_nullifier_alone() {
        let mut chain = VerificationChain::new(None);
        let extended = chain.extend(&NULLIFIER_1);

        let mut keccak = Keccak256::new();
        keccak.update(NULLIFIER_1);
        let expected: [u8; 32] = keccak.finalize().into();

        assert_eq!(extended, expected);
    }

    #[test]
    fn note_hash_reverses_byte_fields() {
        let hasher = MockFieldHasher::new();
        let mut npk = [0u8; 32];
        npk[0] = 1;
        let token_hash = [0u8; 32];

        // npk is little-endian so the leading byte is the least
        // significant: the hash input must be the integer 1, which is what
        // an all-zero npk with a trailing 1 would be in big-endian order.
        let mut npk_big_endian = [0u8; 32];
        npk_big_endian[31] = 1;

        let from_little_endian = note_hash(&hasher, &npk, &token_hash, U256::zero()).unwrap();
        let direct = hasher
            .hash3(
                U256::from_big_endian(&npk_big_endian),
                U256::zero(),
                U256::zero(),
            )
            .unwrap();
        assert_eq!(from_little_endian, direct);
    }
}
