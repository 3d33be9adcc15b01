//! Batch event reduction.
//!
//! One [`AccumulatorStateUpdate`] event is expanded into the full set of
//! derived ledger records in two phases: transactions first, then shields,
//! each in event order, sharing one rolling UTXO tree cursor. Reduction is
//! pure with respect to the store: records accumulate in a
//! [`BatchResults`] value and are committed in a separate step, so a
//! failed batch writes nothing and leaves the verification hash chain
//! untouched.
//!
//! The reducer keeps no cursor of its own between events: each event's
//! `(accumulator_number, start_position)` must already encode the correct
//! starting cursor, an invariant guaranteed by the event source.

use std::collections::BTreeMap;

use crate::error::{HashError, IndexError, ReduceError};
use crate::event::{AccumulatorStateUpdate, TokenDescriptor};
use crate::fees;
use crate::hash::{FieldHasher, TokenHash, VerificationChain};
use crate::ledger::traits::{
    LedgerCommitments, LedgerNullifiers, LedgerTokens, LedgerTransactions, LedgerUnshields,
    LedgerVerificationHash,
};
use crate::ledger::{
    CommitmentCiphertext, CommitmentPreimage, Nullifier, RailgunTransaction, ShieldCommitment,
    Token, TransactCommitment, Unshield,
};

pub(crate) mod shields;
pub(crate) mod transactions;

/// Leaf capacity of one UTXO tree.
pub const TREE_MAX_ITEMS: u64 = 65536;

/// Sentinel tree coordinate stored for unshield-only transactions, which
/// append no commitments and therefore occupy no real tree position.
pub const UNSHIELD_ONLY_TREE_SENTINEL: u64 = 99999;

/// Rolling UTXO tree cursor.
///
/// Tracks where the next commitment will be appended. Advancing across the
/// tree capacity starts the next tree at position zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoCursor {
    tree: u64,
    position: u64,
}

impl UtxoCursor {
    /// Creates a cursor at the given tree coordinates.
    #[must_use]
    pub fn new(tree: u64, position: u64) -> Self {
        UtxoCursor { tree, position }
    }

    /// The tree index under the cursor.
    #[must_use]
    pub fn tree(&self) -> u64 {
        self.tree
    }

    /// The position within the tree under the cursor.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Advances the cursor by `count` appended commitments.
    ///
    /// On reaching the tree capacity the position resets to zero and the
    /// tree index increments by one.
    pub fn advance(&mut self, count: u64) {
        self.position += count;
        if self.position >= TREE_MAX_ITEMS {
            self.position = 0;
            self.tree += 1;
        }
    }
}

/// Tree coordinates assigned to one transaction's commitment batch.
///
/// Unshield-only transactions have no real coordinates; the legacy
/// sentinel value appears only when converting for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCoordinates {
    /// The batch occupies real tree coordinates.
    Real {
        /// UTXO tree index.
        tree: u64,
        /// Position of the batch's first commitment.
        position: u64,
    },
    /// The transaction only unshields and appends no commitments.
    UnshieldOnly,
}

impl BatchCoordinates {
    /// Tree number as stored, sentinel for unshield-only batches.
    #[must_use]
    pub fn tree_number(&self) -> u64 {
        match self {
            Self::Real { tree, .. } => *tree,
            Self::UnshieldOnly => UNSHIELD_ONLY_TREE_SENTINEL,
        }
    }

    /// Batch start position as stored, sentinel for unshield-only batches.
    #[must_use]
    pub fn batch_start_position(&self) -> u64 {
        match self {
            Self::Real { position, .. } => *position,
            Self::UnshieldOnly => UNSHIELD_ONLY_TREE_SENTINEL,
        }
    }
}

/// Every record derived from one batch event, pending commit.
#[derive(Debug, Default)]
pub(crate) struct BatchResults {
    pub(crate) tokens: BTreeMap<TokenHash, Token>,
    pub(crate) commitment_preimages: Vec<CommitmentPreimage>,
    pub(crate) commitment_ciphertexts: Vec<CommitmentCiphertext>,
    pub(crate) shield_commitments: Vec<ShieldCommitment>,
    pub(crate) transact_commitments: Vec<TransactCommitment>,
    pub(crate) nullifiers: Vec<Nullifier>,
    pub(crate) unshields: Vec<Unshield>,
    pub(crate) railgun_transactions: Vec<RailgunTransaction>,
    pub(crate) verification_hash: Option<[u8; 32]>,
}

/// Builds the token record for a descriptor and stages it for the
/// registry.
pub(crate) fn stage_token(
    hasher: &impl FieldHasher,
    tokens: &mut BTreeMap<TokenHash, Token>,
    descriptor: &TokenDescriptor,
) -> Result<TokenHash, HashError> {
    let token_hash = hasher.token_hash(descriptor).map_err(|e| {
        tracing::error!(
            "token hash failed. token type: {}, token address: {}",
            descriptor.token_type,
            hex::encode(descriptor.token_address),
        );
        e
    })?;
    tokens.entry(token_hash).or_insert_with(|| Token {
        id: token_hash,
        token_type: descriptor.token_type,
        token_address: descriptor.token_address,
        token_sub_id: descriptor.token_sub_id,
    });

    Ok(token_hash)
}

/// Applies one accumulator state update event to the ledger.
///
/// Loads the verification hash chain, reduces the event into its derived
/// records and commits all of them. Batches must be applied in strict
/// block/log order; the `&mut` store access serializes writers.
pub fn apply_state_update<S, H>(
    store: &mut S,
    hasher: &H,
    event: &AccumulatorStateUpdate,
) -> Result<(), IndexError<S::Error>>
where
    S: LedgerTokens
        + LedgerCommitments
        + LedgerNullifiers
        + LedgerUnshields
        + LedgerTransactions
        + LedgerVerificationHash,
    H: FieldHasher,
{
    tracing::debug!(
        "Applying accumulator state update. block: {}, log index: {}",
        event.block_number,
        event.log_index,
    );

    let chain = VerificationChain::new(
        store
            .get_verification_hash()
            .map_err(IndexError::LedgerError)?,
    );
    let results = reduce_state_update(hasher, event, chain)?;
    commit(store, results).map_err(IndexError::LedgerError)?;

    Ok(())
}

/// Reduces one batch event into its derived records.
///
/// Pure with respect to the store: the only carried-over state consumed is
/// the verification hash chain, taken by value so a failed reduction
/// discards the partially extended chain.
pub(crate) fn reduce_state_update(
    hasher: &impl FieldHasher,
    event: &AccumulatorStateUpdate,
    mut chain: VerificationChain,
) -> Result<BatchResults, ReduceError> {
    let fee_map = fees::treasury_fee_map(
        hasher,
        &event.update.transactions,
        &event.update.shields,
        &event.update.treasury_fees,
    )?;

    let mut cursor = UtxoCursor::new(event.accumulator_number, event.start_position);
    let mut results = BatchResults::default();

    transactions::reduce_transactions(
        hasher,
        event,
        &fee_map,
        &mut chain,
        &mut cursor,
        &mut results,
    )?;
    shields::reduce_shields(hasher, event, &fee_map, &mut cursor, &mut results)?;

    results.verification_hash = chain.value();

    tracing::debug!(
        "Reduced accumulator state update. transactions: {}, shields: {}, nullifiers: {}",
        results.railgun_transactions.len(),
        results.shield_commitments.len(),
        results.nullifiers.len(),
    );

    Ok(results)
}

/// Commits every derived record of a reduced batch to the store.
fn commit<S>(store: &mut S, results: BatchResults) -> Result<(), S::Error>
where
    S: LedgerTokens
        + LedgerCommitments
        + LedgerNullifiers
        + LedgerUnshields
        + LedgerTransactions
        + LedgerVerificationHash,
{
    for token in results.tokens.into_values() {
        store.ensure_token(token)?;
    }
    for preimage in results.commitment_preimages {
        store.insert_commitment_preimage(preimage)?;
    }
    for ciphertext in results.commitment_ciphertexts {
        store.insert_commitment_ciphertext(ciphertext)?;
    }
    for shield in results.shield_commitments {
        store.insert_shield_commitment(shield)?;
    }
    for transact in results.transact_commitments {
        store.insert_transact_commitment(transact)?;
    }
    for nullifier in results.nullifiers {
        store.insert_nullifier(nullifier)?;
    }
    for unshield in results.unshields {
        store.insert_unshield(unshield)?;
    }
    for transaction in results.railgun_transactions {
        store.insert_railgun_transaction(transaction)?;
    }
    if let Some(verification_hash) = results.verification_hash {
        store.set_verification_hash(verification_hash)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use primitive_types::U256;

    use super::*;
    use crate::event::TokenType;
    use crate::hash::{u256_from_reversed_bytes, verification_hash};
    use crate::id::{id_from_2_padded, id_from_3_padded};
    use crate::ledger::memory::MemoryLedger;
    use crate::testutils::{
        accumulator_state_update_event, bytes32, MockFieldHasher, PoolTransactionBuilder,
        DEFAULT_TOKEN_ID, TEST_BYTES_32,
    };

    #[test]
    fn cursor_advances_with_wraparound() {
        let mut cursor = UtxoCursor::new(0, 0);
        cursor.advance(TREE_MAX_ITEMS);
        assert_eq!(cursor, UtxoCursor::new(1, 0));

        // Crossing the capacity mid-batch also resets to position zero.
        let mut cursor = UtxoCursor::new(4, TREE_MAX_ITEMS - 6);
        cursor.advance(10);
        assert_eq!(cursor, UtxoCursor::new(5, 0));

        let mut cursor = UtxoCursor::new(7, 100);
        cursor.advance(3);
        assert_eq!(cursor, UtxoCursor::new(7, 103));
    }

    #[test]
    fn processes_accumulator_state_update() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let event = accumulator_state_update_event();

        apply_state_update(&mut ledger, &hasher, &event).unwrap();

        // One railgun transaction with the unshield note hash appended to
        // its three ordinary commitments.
        let transaction_id = id_from_3_padded(
            U256::from(event.block_number),
            U256::from(event.log_index),
            U256::zero(),
        );
        let transaction = ledger.railgun_transactions.get(&transaction_id).unwrap();
        assert_eq!(transaction.commitments.len(), 4);
        assert!(transaction.has_unshield);
        assert_eq!(transaction.utxo_tree_in, 0);
        assert_eq!(transaction.utxo_tree_out, 0);
        assert_eq!(transaction.utxo_batch_start_position_out, 0);
        assert_eq!(transaction.unshield_value, U256::from(1_000_000_000u64));
        assert_eq!(&transaction.unshield_to_address, &TEST_BYTES_32[12..]);
        assert_eq!(
            transaction.verification_hash,
            verification_hash(None, &TEST_BYTES_32),
        );

        // One transact commitment at the batch start with three ciphertext
        // children at consecutive positions.
        let transact_id = id_from_2_padded(U256::zero(), U256::zero());
        let transact = ledger.transact_commitments.get(&transact_id).unwrap();
        assert_eq!(transact.hashes.len(), 3);
        assert_eq!(transact.transact_index, 0);
        assert_eq!(
            transact.commitment_ciphertexts,
            vec![
                id_from_2_padded(U256::zero(), U256::zero()),
                id_from_2_padded(U256::zero(), U256::from(1u64)),
                id_from_2_padded(U256::zero(), U256::from(2u64)),
            ],
        );
        assert_eq!(ledger.commitment_ciphertexts.len(), 3);

        // One nullifier keyed by the spend tree and the byte-reversed
        // nullifier integer, storing the original byte order.
        let nullifier_id =
            id_from_2_padded(U256::zero(), u256_from_reversed_bytes(&TEST_BYTES_32));
        let nullifier = ledger.nullifiers.get(&nullifier_id).unwrap();
        assert_eq!(nullifier.nullifier, TEST_BYTES_32);
        assert_eq!(nullifier.tree_number, 0);

        // The unshield takes the whole unshield portion: it is the only
        // unshield of its token in the batch.
        let unshield = ledger.unshields.get(&transaction_id).unwrap();
        assert_eq!(unshield.fee, U256::from(833_333u64));
        assert_eq!(unshield.amount, U256::from(1_000_000_000u64));
        assert_eq!(&unshield.to, &TEST_BYTES_32[12..]);

        // The shield lands after the transaction's three commitments and
        // takes the whole shield portion.
        let shield_id = id_from_2_padded(U256::zero(), U256::from(3u64));
        let shield = ledger.shield_commitments.get(&shield_id).unwrap();
        assert_eq!(shield.tree_number, 0);
        assert_eq!(shield.tree_position, 3);
        assert_eq!(shield.fee, U256::from(1_666_667u64));
        assert!(ledger.commitment_preimages.contains_key(&shield_id));

        // Token registered once under its content hash.
        assert_eq!(ledger.tokens.len(), 1);
        assert!(ledger.tokens.contains_key(&DEFAULT_TOKEN_ID));

        // Chain state committed.
        assert_eq!(
            ledger.verification_hash,
            Some(verification_hash(None, &TEST_BYTES_32)),
        );
    }

    #[test]
    fn zero_value_unshield_preimage_emits_no_unshield() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let mut event = accumulator_state_update_event();
        event.update.transactions[0].unshield_preimage.value = U256::zero();

        apply_state_update(&mut ledger, &hasher, &event).unwrap();

        assert!(ledger.unshields.is_empty());

        let transaction = ledger.railgun_transactions.values().next().unwrap();
        assert!(!transaction.has_unshield);
        assert_eq!(transaction.commitments.len(), 3);
        assert_eq!(transaction.utxo_tree_out, 0);
        assert_eq!(transaction.utxo_batch_start_position_out, 0);

        // With no unshield value for the token, the whole fee falls on the
        // shield side.
        let shield_id = id_from_2_padded(U256::zero(), U256::from(3u64));
        let shield = ledger.shield_commitments.get(&shield_id).unwrap();
        assert_eq!(shield.fee, U256::from(2_500_000u64));
        assert_eq!(shield.tree_position, 3);
    }

    #[test]
    fn unshield_only_transaction_uses_sentinel_coordinates() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let mut event = accumulator_state_update_event();
        event.update.commitments.clear();
        event.update.commitment_ciphertext.clear();
        event.update.shields.clear();
        event.update.transactions = vec![PoolTransactionBuilder::default()
            .commitments_count(0)
            .build()];

        apply_state_update(&mut ledger, &hasher, &event).unwrap();

        let transaction = ledger.railgun_transactions.values().next().unwrap();
        assert!(transaction.has_unshield);
        assert_eq!(transaction.utxo_tree_out, UNSHIELD_ONLY_TREE_SENTINEL);
        assert_eq!(
            transaction.utxo_batch_start_position_out,
            UNSHIELD_ONLY_TREE_SENTINEL,
        );
        // The synthetic unshield note hash is the only commitment.
        assert_eq!(transaction.commitments.len(), 1);

        // The unshield is the token's only one, so it takes the full fee:
        // with no shields the whole aggregate is the unshield portion.
        let unshield = ledger.unshields.values().next().unwrap();
        assert_eq!(unshield.fee, U256::from(2_500_000u64));
    }

    #[test]
    fn commitment_count_mismatch_rejects_batch() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let mut event = accumulator_state_update_event();
        event.update.transactions[0].commitments_count = 5;

        let result = apply_state_update(&mut ledger, &hasher, &event);
        assert!(matches!(
            result,
            Err(IndexError::ReduceError(
                ReduceError::CommitmentHashesLengthMismatch {
                    expected: 5,
                    found: 3,
                },
            )),
        ));

        // Atomicity: nothing was written.
        assert_eq!(ledger, MemoryLedger::new());
    }

    #[test]
    fn missing_erc20_fee_entry_rejects_batch() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let mut event = accumulator_state_update_event();
        event.update.treasury_fees.clear();

        let result = apply_state_update(&mut ledger, &hasher, &event);
        assert!(matches!(
            result,
            Err(IndexError::ReduceError(
                ReduceError::MissingTreasuryFeeEntry { .. },
            )),
        ));
        assert_eq!(ledger, MemoryLedger::new());
    }

    #[test]
    fn non_erc20_tokens_are_fee_exempt() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let mut event = accumulator_state_update_event();
        event.update.treasury_fees.clear();
        event.update.transactions[0].unshield_preimage.token.token_type = TokenType::Erc721;
        event.update.transactions[0].unshield_preimage.token.token_sub_id = U256::from(7u64);
        event.update.shields[0].preimage.token.token_type = TokenType::Erc721;
        event.update.shields[0].preimage.token.token_sub_id = U256::from(7u64);

        apply_state_update(&mut ledger, &hasher, &event).unwrap();

        let unshield = ledger.unshields.values().next().unwrap();
        assert_eq!(unshield.fee, U256::zero());
        let shield = ledger.shield_commitments.values().next().unwrap();
        assert_eq!(shield.fee, U256::zero());
    }

    #[test]
    fn tokens_deduplicate_across_batches() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let event = accumulator_state_update_event();

        apply_state_update(&mut ledger, &hasher, &event).unwrap();
        let token = ledger.tokens.get(&DEFAULT_TOKEN_ID).unwrap().clone();

        let mut next_event = accumulator_state_update_event();
        next_event.block_number += 1;
        apply_state_update(&mut ledger, &hasher, &next_event).unwrap();

        assert_eq!(ledger.tokens.len(), 1);
        assert_eq!(ledger.tokens.get(&DEFAULT_TOKEN_ID), Some(&token));

        // Direct registry reinsert is also a no-op returning the stored
        // record.
        let ensured = ledger.ensure_token(token.clone()).unwrap();
        assert_eq!(ensured, token);
        assert_eq!(ledger.tokens.len(), 1);
    }

    #[test]
    fn verification_chain_spans_batches() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();

        let first_nullifier = TEST_BYTES_32;
        let second_nullifier =
            bytes32("2222222233334444555566667777888811112222333344445555666677778888");

        let event = accumulator_state_update_event();
        apply_state_update(&mut ledger, &hasher, &event).unwrap();

        let mut second_event = accumulator_state_update_event();
        second_event.block_number += 1;
        second_event.update.transactions[0].nullifiers = vec![second_nullifier];
        apply_state_update(&mut ledger, &hasher, &second_event).unwrap();

        let first_link = verification_hash(None, &first_nullifier);
        let second_link = verification_hash(Some(&first_link), &second_nullifier);
        assert_eq!(ledger.verification_hash, Some(second_link));

        let second_id = id_from_3_padded(
            U256::from(second_event.block_number),
            U256::from(second_event.log_index),
            U256::zero(),
        );
        assert_eq!(
            ledger
                .railgun_transactions
                .get(&second_id)
                .unwrap()
                .verification_hash,
            second_link,
        );
    }

    #[test]
    fn shield_positions_continue_across_tree_boundary() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        let mut event = accumulator_state_update_event();
        event.start_position = TREE_MAX_ITEMS - 2;

        apply_state_update(&mut ledger, &hasher, &event).unwrap();

        // The transaction's three commitments cross the capacity, so the
        // next tree opens and the shield lands at its start.
        let shield_id = id_from_2_padded(U256::from(1u64), U256::zero());
        let shield = ledger.shield_commitments.get(&shield_id).unwrap();
        assert_eq!(shield.tree_number, 1);
        assert_eq!(shield.tree_position, 0);
    }
}
