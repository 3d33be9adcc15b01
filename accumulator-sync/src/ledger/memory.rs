//! In-memory ledger store.
//!
//! BTreeMap-backed implementation of the full store trait family. Used by
//! the test suite and suitable as a real store for replay tooling; pair it
//! with the serialization methods to snapshot and reload indexer state.

use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::hash::TokenHash;
use crate::ledger::traits::{
    LedgerCommitments, LedgerNullifiers, LedgerStore, LedgerTokens, LedgerTransactions,
    LedgerUnshields, LedgerVerificationHash,
};
use crate::ledger::{
    CommitmentCiphertext, CommitmentPreimage, Nullifier, RailgunTransaction, ShieldCommitment,
    Token, TransactCommitment, Unshield,
};

/// An in-memory ledger holding every derived record family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    pub(crate) tokens: BTreeMap<TokenHash, Token>,
    pub(crate) commitment_preimages: BTreeMap<[u8; 64], CommitmentPreimage>,
    pub(crate) commitment_ciphertexts: BTreeMap<[u8; 64], CommitmentCiphertext>,
    pub(crate) shield_commitments: BTreeMap<[u8; 64], ShieldCommitment>,
    pub(crate) transact_commitments: BTreeMap<[u8; 64], TransactCommitment>,
    pub(crate) nullifiers: BTreeMap<[u8; 64], Nullifier>,
    pub(crate) unshields: BTreeMap<[u8; 96], Unshield>,
    pub(crate) railgun_transactions: BTreeMap<[u8; 96], RailgunTransaction>,
    pub(crate) verification_hash: Option<[u8; 32]>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedger {
    type Error = Infallible;
}

impl LedgerTokens for MemoryLedger {
    fn get_tokens(&self) -> Result<&BTreeMap<TokenHash, Token>, Self::Error> {
        Ok(&self.tokens)
    }

    fn get_tokens_mut(&mut self) -> Result<&mut BTreeMap<TokenHash, Token>, Self::Error> {
        Ok(&mut self.tokens)
    }
}

impl LedgerCommitments for MemoryLedger {
    fn get_commitment_preimages(
        &self,
    ) -> Result<&BTreeMap<[u8; 64], CommitmentPreimage>, Self::Error> {
        Ok(&self.commitment_preimages)
    }

    fn get_commitment_preimages_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], CommitmentPreimage>, Self::Error> {
        Ok(&mut self.commitment_preimages)
    }

    fn get_commitment_ciphertexts(
        &self,
    ) -> Result<&BTreeMap<[u8; 64], CommitmentCiphertext>, Self::Error> {
        Ok(&self.commitment_ciphertexts)
    }

    fn get_commitment_ciphertexts_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], CommitmentCiphertext>, Self::Error> {
        Ok(&mut self.commitment_ciphertexts)
    }

    fn get_shield_commitments(&self) -> Result<&BTreeMap<[u8; 64], ShieldCommitment>, Self::Error> {
        Ok(&self.shield_commitments)
    }

    fn get_shield_commitments_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], ShieldCommitment>, Self::Error> {
        Ok(&mut self.shield_commitments)
    }

    fn get_transact_commitments(
        &self,
    ) -> Result<&BTreeMap<[u8; 64], TransactCommitment>, Self::Error> {
        Ok(&self.transact_commitments)
    }

    fn get_transact_commitments_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], TransactCommitment>, Self::Error> {
        Ok(&mut self.transact_commitments)
    }
}

impl LedgerNullifiers for MemoryLedger {
    fn get_nullifiers(&self) -> Result<&BTreeMap<[u8; 64], Nullifier>, Self::Error> {
        Ok(&self.nullifiers)
    }

    fn get_nullifiers_mut(&mut self) -> Result<&mut BTreeMap<[u8; 64], Nullifier>, Self::Error> {
        Ok(&mut self.nullifiers)
    }
}

impl LedgerUnshields for MemoryLedger {
    fn get_unshields(&self) -> Result<&BTreeMap<[u8; 96], Unshield>, Self::Error> {
        Ok(&self.unshields)
    }

    fn get_unshields_mut(&mut self) -> Result<&mut BTreeMap<[u8; 96], Unshield>, Self::Error> {
        Ok(&mut self.unshields)
    }
}

impl LedgerTransactions for MemoryLedger {
    fn get_railgun_transactions(
        &self,
    ) -> Result<&BTreeMap<[u8; 96], RailgunTransaction>, Self::Error> {
        Ok(&self.railgun_transactions)
    }

    fn get_railgun_transactions_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 96], RailgunTransaction>, Self::Error> {
        Ok(&mut self.railgun_transactions)
    }
}

impl LedgerVerificationHash for MemoryLedger {
    fn get_verification_hash(&self) -> Result<Option<[u8; 32]>, Self::Error> {
        Ok(self.verification_hash)
    }

    fn set_verification_hash(&mut self, verification_hash: [u8; 32]) -> Result<(), Self::Error> {
        self.verification_hash = Some(verification_hash);

        Ok(())
    }
}
