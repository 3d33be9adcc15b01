//! Traits for interfacing a record store with the sync engine.
//!
//! The engine writes through these traits only, so any store able to hand
//! out map references can back the ledger: the in-memory implementation in
//! [`crate::ledger::memory`], or a host wallet/database wrapper. All
//! operations are synchronous; store failures surface through the
//! associated error type and are treated as fatal infrastructure errors.

use std::collections::BTreeMap;

use crate::hash::TokenHash;
use crate::ledger::{
    CommitmentCiphertext, CommitmentPreimage, Nullifier, RailgunTransaction, ShieldCommitment,
    Token, TransactCommitment, Unshield,
};

/// Base trait for interfacing a record store with the sync engine.
pub trait LedgerStore {
    /// Errors associated with the backing store.
    type Error: std::fmt::Debug + std::fmt::Display + std::error::Error;
}

/// Trait for interfacing [`Token`] records with the store.
pub trait LedgerTokens: LedgerStore {
    /// Returns a reference to the token records, keyed by token hash.
    fn get_tokens(&self) -> Result<&BTreeMap<TokenHash, Token>, Self::Error>;

    /// Returns a mutable reference to the token records.
    fn get_tokens_mut(&mut self) -> Result<&mut BTreeMap<TokenHash, Token>, Self::Error>;

    /// Inserts a token record unless its identity already exists,
    /// returning the stored record.
    ///
    /// Identity is a pure function of the descriptor content, so repeated
    /// inserts of the same descriptor are no-ops by construction.
    fn ensure_token(&mut self, token: Token) -> Result<Token, Self::Error> {
        if let Some(existing) = self.get_tokens()?.get(&token.id) {
            return Ok(existing.clone());
        }
        self.get_tokens_mut()?.insert(token.id, token.clone());

        Ok(token)
    }
}

/// Trait for interfacing commitment records with the store.
pub trait LedgerCommitments: LedgerStore {
    /// Returns a reference to the commitment preimage records.
    fn get_commitment_preimages(
        &self,
    ) -> Result<&BTreeMap<[u8; 64], CommitmentPreimage>, Self::Error>;

    /// Returns a mutable reference to the commitment preimage records.
    fn get_commitment_preimages_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], CommitmentPreimage>, Self::Error>;

    /// Returns a reference to the commitment ciphertext records.
    fn get_commitment_ciphertexts(
        &self,
    ) -> Result<&BTreeMap<[u8; 64], CommitmentCiphertext>, Self::Error>;

    /// Returns a mutable reference to the commitment ciphertext records.
    fn get_commitment_ciphertexts_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], CommitmentCiphertext>, Self::Error>;

    /// Returns a reference to the shield commitment records.
    fn get_shield_commitments(&self) -> Result<&BTreeMap<[u8; 64], ShieldCommitment>, Self::Error>;

    /// Returns a mutable reference to the shield commitment records.
    fn get_shield_commitments_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], ShieldCommitment>, Self::Error>;

    /// Returns a reference to the transact commitment records.
    fn get_transact_commitments(
        &self,
    ) -> Result<&BTreeMap<[u8; 64], TransactCommitment>, Self::Error>;

    /// Returns a mutable reference to the transact commitment records.
    fn get_transact_commitments_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 64], TransactCommitment>, Self::Error>;

    /// Inserts a commitment preimage record.
    fn insert_commitment_preimage(
        &mut self,
        preimage: CommitmentPreimage,
    ) -> Result<(), Self::Error> {
        self.get_commitment_preimages_mut()?
            .insert(preimage.id, preimage);

        Ok(())
    }

    /// Inserts a commitment ciphertext record.
    fn insert_commitment_ciphertext(
        &mut self,
        ciphertext: CommitmentCiphertext,
    ) -> Result<(), Self::Error> {
        self.get_commitment_ciphertexts_mut()?
            .insert(ciphertext.id, ciphertext);

        Ok(())
    }

    /// Inserts a shield commitment record.
    fn insert_shield_commitment(&mut self, shield: ShieldCommitment) -> Result<(), Self::Error> {
        self.get_shield_commitments_mut()?.insert(shield.id, shield);

        Ok(())
    }

    /// Inserts a transact commitment record.
    fn insert_transact_commitment(
        &mut self,
        transact: TransactCommitment,
    ) -> Result<(), Self::Error> {
        self.get_transact_commitments_mut()?
            .insert(transact.id, transact);

        Ok(())
    }
}

/// Trait for interfacing [`Nullifier`] records with the store.
pub trait LedgerNullifiers: LedgerStore {
    /// Returns a reference to the nullifier records.
    fn get_nullifiers(&self) -> Result<&BTreeMap<[u8; 64], Nullifier>, Self::Error>;

    /// Returns a mutable reference to the nullifier records.
    fn get_nullifiers_mut(&mut self) -> Result<&mut BTreeMap<[u8; 64], Nullifier>, Self::Error>;

    /// Inserts a nullifier record.
    fn insert_nullifier(&mut self, nullifier: Nullifier) -> Result<(), Self::Error> {
        self.get_nullifiers_mut()?.insert(nullifier.id, nullifier);

        Ok(())
    }
}

/// Trait for interfacing [`Unshield`] records with the store.
pub trait LedgerUnshields: LedgerStore {
    /// Returns a reference to the unshield records.
    fn get_unshields(&self) -> Result<&BTreeMap<[u8; 96], Unshield>, Self::Error>;

    /// Returns a mutable reference to the unshield records.
    fn get_unshields_mut(&mut self) -> Result<&mut BTreeMap<[u8; 96], Unshield>, Self::Error>;

    /// Inserts an unshield record.
    fn insert_unshield(&mut self, unshield: Unshield) -> Result<(), Self::Error> {
        self.get_unshields_mut()?.insert(unshield.id, unshield);

        Ok(())
    }
}

/// Trait for interfacing [`RailgunTransaction`] records with the store.
pub trait LedgerTransactions: LedgerStore {
    /// Returns a reference to the railgun transaction records.
    fn get_railgun_transactions(
        &self,
    ) -> Result<&BTreeMap<[u8; 96], RailgunTransaction>, Self::Error>;

    /// Returns a mutable reference to the railgun transaction records.
    fn get_railgun_transactions_mut(
        &mut self,
    ) -> Result<&mut BTreeMap<[u8; 96], RailgunTransaction>, Self::Error>;

    /// Inserts a railgun transaction record.
    fn insert_railgun_transaction(
        &mut self,
        transaction: RailgunTransaction,
    ) -> Result<(), Self::Error> {
        self.get_railgun_transactions_mut()?
            .insert(transaction.id, transaction);

        Ok(())
    }
}

/// Trait for interfacing the verification hash singleton with the store.
///
/// The singleton holds the latest value of the global verification hash
/// chain. It is created lazily by the first committed transaction and
/// rewritten by every one after it; it is never deleted.
pub trait LedgerVerificationHash: LedgerStore {
    /// Returns the stored chain value, or `None` if the chain has never
    /// been extended.
    fn get_verification_hash(&self) -> Result<Option<[u8; 32]>, Self::Error>;

    /// Replaces the stored chain value.
    fn set_verification_hash(&mut self, verification_hash: [u8; 32]) -> Result<(), Self::Error>;
}
