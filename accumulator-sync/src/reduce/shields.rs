//! Phase B: reduction of the batch's shields.

use primitive_types::U256;

use crate::error::ReduceError;
use crate::event::{AccumulatorStateUpdate, TokenType};
use crate::fees::{self, TreasuryFeeMap};
use crate::hash::{note_hash, FieldHasher};
use crate::id::id_from_2_padded;
use crate::ledger::{CommitmentPreimage, ShieldCommitment};
use crate::reduce::{stage_token, BatchResults, UtxoCursor};

/// Walks the batch's shields in order, continuing from the tree cursor
/// left by the transaction phase and advancing it by one per shield.
pub(crate) fn reduce_shields(
    hasher: &impl FieldHasher,
    event: &AccumulatorStateUpdate,
    fee_map: &TreasuryFeeMap,
    cursor: &mut UtxoCursor,
    results: &mut BatchResults,
) -> Result<(), ReduceError> {
    let update = &event.update;

    for shield in &update.shields {
        let preimage = &shield.preimage;
        let token_hash = stage_token(hasher, &mut results.tokens, &preimage.token)?;

        let split = fee_map.get(&fees::fee_map_key(&token_hash));
        if split.is_none() && preimage.token.token_type == TokenType::Erc20 {
            tracing::error!(
                "no treasury fee entry for shielded ERC20 token. token hash: {}",
                hex::encode(token_hash),
            );
            return Err(ReduceError::MissingTreasuryFeeEntry {
                token_hash: hex::encode(token_hash),
            });
        }

        let total_shield_value =
            fees::total_shield_value_for_token(hasher, &update.shields, &token_hash)?;
        let shield_fee = split.map_or(U256::zero(), |split| {
            fees::proportional_fee(split.shield, preimage.value, total_shield_value)
        });

        let commitment_hash =
            note_hash(hasher, &preimage.npk, &token_hash, preimage.value)?.to_big_endian();

        let shield_id = id_from_2_padded(U256::from(cursor.tree()), U256::from(cursor.position()));

        results.commitment_preimages.push(CommitmentPreimage {
            id: shield_id,
            npk: preimage.npk,
            token: token_hash,
            value: preimage.value,
        });

        results.shield_commitments.push(ShieldCommitment {
            id: shield_id,
            block_number: event.block_number,
            block_timestamp: event.block_timestamp,
            transaction_hash: event.transaction_hash,
            tree_number: cursor.tree(),
            tree_position: cursor.position(),
            from: shield.from,
            commitment_hash,
            preimage: shield_id,
            encrypted_bundle: shield.ciphertext.encrypted_bundle.clone(),
            shield_key: shield.ciphertext.shield_key,
            fee: shield_fee,
        });

        cursor.advance(1);
    }

    Ok(())
}
