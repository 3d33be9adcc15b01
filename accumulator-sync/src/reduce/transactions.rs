//! Phase A: reduction of the batch's transactions.

use primitive_types::U256;

use crate::error::ReduceError;
use crate::event::{AccumulatorStateUpdate, TokenType};
use crate::fees::{self, TreasuryFeeMap};
use crate::hash::{
    u256_from_reversed_bytes, unshield_preimage_note_hash, FieldHasher, VerificationChain,
};
use crate::id::{id_from_2_padded, id_from_3_padded};
use crate::ledger::{
    CommitmentCiphertext, Nullifier, RailgunTransaction, TransactCommitment, Unshield,
};
use crate::reduce::{stage_token, BatchCoordinates, BatchResults, UtxoCursor};

/// Walks the batch's transactions in order, emitting their derived records
/// and advancing the shared tree cursor by each transaction's commitment
/// count.
pub(crate) fn reduce_transactions(
    hasher: &impl FieldHasher,
    event: &AccumulatorStateUpdate,
    fee_map: &TreasuryFeeMap,
    chain: &mut VerificationChain,
    cursor: &mut UtxoCursor,
    results: &mut BatchResults,
) -> Result<(), ReduceError> {
    let update = &event.update;
    let mut commitments_cursor = 0usize;

    for (index, transaction) in update.transactions.iter().enumerate() {
        let transact_index = index as u64;
        let commitments_count = transaction.commitments_count as usize;
        let commitments_end = commitments_cursor + commitments_count;

        let commitment_hashes = update
            .commitments
            .get(commitments_cursor..commitments_end)
            .ok_or(ReduceError::CommitmentHashesLengthMismatch {
                expected: commitments_count,
                found: update.commitments.len().saturating_sub(commitments_cursor),
            })?;
        let commitment_ciphertexts = update
            .commitment_ciphertext
            .get(commitments_cursor..commitments_end)
            .ok_or(ReduceError::CommitmentCiphertextsLengthMismatch {
                expected: commitments_count,
                found: update
                    .commitment_ciphertext
                    .len()
                    .saturating_sub(commitments_cursor),
            })?;
        commitments_cursor = commitments_end;

        let preimage = &transaction.unshield_preimage;
        let has_unshield = !preimage.value.is_zero();
        let has_only_unshield = has_unshield && commitments_count == 0;

        let coordinates = if has_only_unshield {
            BatchCoordinates::UnshieldOnly
        } else {
            BatchCoordinates::Real {
                tree: cursor.tree(),
                position: cursor.position(),
            }
        };

        let mut commitments = commitment_hashes.to_vec();
        if has_unshield {
            commitments.push(unshield_preimage_note_hash(hasher, preimage)?.to_big_endian());
        }

        let first_nullifier = transaction.nullifiers.first().ok_or(
            ReduceError::TransactionWithoutNullifiers { transact_index },
        )?;
        let verification_hash = chain.extend(first_nullifier);

        let unshield_token = stage_token(hasher, &mut results.tokens, &preimage.token)?;
        let mut unshield_to_address = [0u8; 20];
        unshield_to_address.copy_from_slice(&preimage.npk[12..]);

        let transaction_id = id_from_3_padded(
            U256::from(event.block_number),
            U256::from(event.log_index),
            U256::from(transact_index),
        );

        results.railgun_transactions.push(RailgunTransaction {
            id: transaction_id,
            transaction_hash: event.transaction_hash,
            block_number: event.block_number,
            block_timestamp: event.block_timestamp,
            nullifiers: transaction.nullifiers.clone(),
            commitments,
            bound_params_hash: transaction.bound_params_hash,
            has_unshield,
            utxo_tree_in: transaction.spend_accumulator_number,
            utxo_tree_out: coordinates.tree_number(),
            utxo_batch_start_position_out: coordinates.batch_start_position(),
            unshield_token,
            unshield_to_address,
            unshield_value: preimage.value,
            verification_hash,
        });

        let transact_id = id_from_2_padded(U256::from(cursor.tree()), U256::from(cursor.position()));
        let mut ciphertext_ids = Vec::with_capacity(commitment_ciphertexts.len());
        for (offset, ciphertext) in commitment_ciphertexts.iter().enumerate() {
            let ciphertext_id = id_from_2_padded(
                U256::from(cursor.tree()),
                U256::from(cursor.position() + offset as u64),
            );
            ciphertext_ids.push(ciphertext_id);
            results.commitment_ciphertexts.push(CommitmentCiphertext {
                id: ciphertext_id,
                ciphertext: ciphertext.ciphertext.clone(),
                blinded_sender_viewing_key: ciphertext.blinded_sender_viewing_key,
                blinded_receiver_viewing_key: ciphertext.blinded_receiver_viewing_key,
            });
        }

        results.transact_commitments.push(TransactCommitment {
            id: transact_id,
            block_number: event.block_number,
            block_timestamp: event.block_timestamp,
            transaction_hash: event.transaction_hash,
            tree_number: cursor.tree(),
            batch_start_tree_position: cursor.position(),
            transact_index,
            hashes: commitment_hashes.to_vec(),
            commitment_ciphertexts: ciphertext_ids,
            sender_ciphertext: update.sender_ciphertext.clone(),
        });

        for nullifier in &transaction.nullifiers {
            results.nullifiers.push(Nullifier {
                id: id_from_2_padded(
                    U256::from(transaction.spend_accumulator_number),
                    u256_from_reversed_bytes(nullifier),
                ),
                block_number: event.block_number,
                block_timestamp: event.block_timestamp,
                transaction_hash: event.transaction_hash,
                tree_number: transaction.spend_accumulator_number,
                nullifier: *nullifier,
            });
        }

        if has_unshield {
            let split = fee_map.get(&fees::fee_map_key(&unshield_token));
            if split.is_none() && preimage.token.token_type == TokenType::Erc20 {
                tracing::error!(
                    "no treasury fee entry for unshielded ERC20 token. token hash: {}",
                    hex::encode(unshield_token),
                );
                return Err(ReduceError::MissingTreasuryFeeEntry {
                    token_hash: hex::encode(unshield_token),
                });
            }

            let total_unshield_value = fees::total_unshield_value_for_token(
                hasher,
                &update.transactions,
                &unshield_token,
            )?;
            let unshield_fee = split.map_or(U256::zero(), |split| {
                fees::proportional_fee(split.unshield, preimage.value, total_unshield_value)
            });

            results.unshields.push(Unshield {
                id: transaction_id,
                block_number: event.block_number,
                block_timestamp: event.block_timestamp,
                transaction_hash: event.transaction_hash,
                to: unshield_to_address,
                token: unshield_token,
                amount: preimage.value,
                fee: unshield_fee,
                transact_commitment_batch_index: transact_index,
            });
        }

        cursor.advance(commitments_count as u64);
    }

    Ok(())
}
