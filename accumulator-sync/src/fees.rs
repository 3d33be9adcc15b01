//! Treasury fee apportionment.
//!
//! Each batch settles one aggregate fee per token, which must be split
//! between the batch's shielding and unshielding flows before it can be
//! attributed to individual shields and unshields. The split rule is part
//! of the protocol's observable ledger semantics and is reproduced exactly,
//! including its asymmetric rounding: the side with the larger aggregate
//! value absorbs the residual rounding unit, so the two portions always sum
//! to the aggregate fee.

use std::collections::HashMap;

use primitive_types::{U256, U512};

use crate::error::HashError;
use crate::event::{PoolTransaction, Shield, TreasuryFee};
use crate::hash::{FieldHasher, TokenHash};

/// Shield/unshield portions of one token's aggregate treasury fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// Portion attributed to the batch's shields of this token.
    pub shield: U256,
    /// Portion attributed to the batch's unshields of this token.
    pub unshield: U256,
}

/// Per-token treasury fee splits, keyed by the lowercase hex string of the
/// token hash.
pub type TreasuryFeeMap = HashMap<String, FeeSplit>;

/// Map key for a token hash.
pub(crate) fn fee_map_key(token_hash: &TokenHash) -> String {
    hex::encode(token_hash)
}

/// Builds the treasury fee map for one batch event.
///
/// For every aggregate fee entry, the batch's unshield and shield values of
/// the entry's token are summed and the fee is split proportionally with
/// floor division. The smaller side receives the floored proportional
/// amount and the larger side receives the remainder, so
/// `shield + unshield == fee` exactly. A token moved in the batch but
/// absent from the fee entries is handled downstream during attribution
/// (fatal for ERC20, zero fee otherwise).
pub fn treasury_fee_map(
    hasher: &impl FieldHasher,
    transactions: &[PoolTransaction],
    shields: &[Shield],
    treasury_fees: &[TreasuryFee],
) -> Result<TreasuryFeeMap, HashError> {
    let mut fee_map = TreasuryFeeMap::new();

    for entry in treasury_fees {
        let unshield_value = total_unshield_value_for_token(hasher, transactions, &entry.token_id)?;
        let shield_value = total_shield_value_for_token(hasher, shields, &entry.token_id)?;

        // Sums are widened so two full-range values cannot overflow.
        let total_value = to_u512(unshield_value) + to_u512(shield_value);

        let (shield_portion, unshield_portion) = if total_value.is_zero() {
            (U256::zero(), U256::zero())
        } else if unshield_value < shield_value {
            let unshield_portion = truncate_u512(unshield_value.full_mul(entry.fee) / total_value);
            (entry.fee - unshield_portion, unshield_portion)
        } else {
            let shield_portion = truncate_u512(shield_value.full_mul(entry.fee) / total_value);
            (shield_portion, entry.fee - shield_portion)
        };

        fee_map.insert(
            fee_map_key(&entry.token_id),
            FeeSplit {
                shield: shield_portion,
                unshield: unshield_portion,
            },
        );
    }

    Ok(fee_map)
}

/// Sums the unshield values of every transaction moving the given token.
pub(crate) fn total_unshield_value_for_token(
    hasher: &impl FieldHasher,
    transactions: &[PoolTransaction],
    token_hash: &TokenHash,
) -> Result<U256, HashError> {
    let mut total = U256::zero();
    for transaction in transactions {
        if hasher.token_hash(&transaction.unshield_preimage.token)? == *token_hash {
            total += transaction.unshield_preimage.value;
        }
    }

    Ok(total)
}

/// Sums the shield values of every shield moving the given token.
pub(crate) fn total_shield_value_for_token(
    hasher: &impl FieldHasher,
    shields: &[Shield],
    token_hash: &TokenHash,
) -> Result<U256, HashError> {
    let mut total = U256::zero();
    for shield in shields {
        if hasher.token_hash(&shield.preimage.token)? == *token_hash {
            total += shield.preimage.value;
        }
    }

    Ok(total)
}

/// Scales an aggregate fee portion down to one instance's share.
///
/// Floor division, mirroring the aggregate split rule, so the per-instance
/// portions of a token can never sum past the aggregate portion.
pub(crate) fn proportional_fee(portion: U256, value: U256, total_value: U256) -> U256 {
    if total_value.is_zero() {
        return U256::zero();
    }

    truncate_u512(portion.full_mul(value) / to_u512(total_value))
}

fn to_u512(value: U256) -> U512 {
    let mut bytes = [0u8; 64];
    bytes[32..].copy_from_slice(&value.to_big_endian());
    U512::from_big_endian(&bytes)
}

/// Truncates to the low 256 bits. Callers guarantee the value fits: every
/// quotient taken here is bounded by one of its 256-bit inputs.
fn truncate_u512(value: U512) -> U256 {
    U256::from_big_endian(&value.to_big_endian()[32..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{accumulator_state_update_event, MockFieldHasher, DEFAULT_TOKEN_ID};

    #[test]
    fn extracts_treasury_fee_map() {
        let hasher = MockFieldHasher::new();
        let event = accumulator_state_update_event();

        let fee_map = treasury_fee_map(
            &hasher,
            &event.update.transactions,
            &event.update.shields,
            &event.update.treasury_fees,
        )
        .unwrap();

        assert!(!fee_map.contains_key("00"));
        let split = fee_map
            .get(&fee_map_key(&DEFAULT_TOKEN_ID))
            .expect("fee entry for the default token");

        // fee 2_500_000 against 1_000_000_000 unshield / 2_000_000_000
        // shield: the unshield side is smaller and gets the floored
        // proportional third, the shield side absorbs the remainder.
        assert_eq!(split.shield, U256::from(1_666_667u64));
        assert_eq!(split.unshield, U256::from(833_333u64));
    }

    #[test]
    fn split_portions_sum_to_fee_exactly() {
        let cases: &[(u64, u64, u64)] = &[
            (2_500_000, 1_000_000_000, 2_000_000_000),
            (2_500_000, 2_000_000_000, 1_000_000_000),
            (1, 1, 2),
            (7, 3, 3),
            (999_983, 1, 1_000_000_000_000),
            (999_983, 1_000_000_000_000, 1),
        ];

        for &(fee, unshield_value, shield_value) in cases {
            let fee = U256::from(fee);
            let unshield_value = U256::from(unshield_value);
            let shield_value = U256::from(shield_value);
            let total = unshield_value + shield_value;

            let (shield_portion, unshield_portion) = if unshield_value < shield_value {
                let unshield_portion = unshield_value * fee / total;
                (fee - unshield_portion, unshield_portion)
            } else {
                let shield_portion = shield_value * fee / total;
                (shield_portion, fee - shield_portion)
            };

            assert_eq!(shield_portion + unshield_portion, fee);

            // The allocator must agree with the directly-computed rule.
            let hasher = MockFieldHasher::new();
            let mut event = accumulator_state_update_event();
            event.update.transactions[0].unshield_preimage.value = unshield_value;
            event.update.shields[0].preimage.value = shield_value;
            event.update.treasury_fees[0].fee = fee;

            let fee_map = treasury_fee_map(
                &hasher,
                &event.update.transactions,
                &event.update.shields,
                &event.update.treasury_fees,
            )
            .unwrap();
            let split = fee_map.get(&fee_map_key(&DEFAULT_TOKEN_ID)).unwrap();
            assert_eq!(split.shield, shield_portion);
            assert_eq!(split.unshield, unshield_portion);
        }
    }

    #[test]
    fn zero_total_value_yields_zero_portions() {
        let hasher = MockFieldHasher::new();
        let mut event = accumulator_state_update_event();
        event.update.transactions[0].unshield_preimage.value = U256::zero();
        event.update.shields[0].preimage.value = U256::zero();

        let fee_map = treasury_fee_map(
            &hasher,
            &event.update.transactions,
            &event.update.shields,
            &event.update.treasury_fees,
        )
        .unwrap();

        let split = fee_map.get(&fee_map_key(&DEFAULT_TOKEN_ID)).unwrap();
        assert_eq!(split.shield, U256::zero());
        assert_eq!(split.unshield, U256::zero());
    }

    #[test]
    fn proportional_fee_never_exceeds_aggregate() {
        let portion = U256::from(833_333u64);
        let values = [
            U256::from(250_000_000u64),
            U256::from(250_000_000u64),
            U256::from(500_000_000u64),
        ];
        let total: U256 = values.iter().fold(U256::zero(), |acc, v| acc + *v);

        let attributed: U256 = values
            .iter()
            .map(|value| proportional_fee(portion, *value, total))
            .fold(U256::zero(), |acc, fee| acc + fee);

        assert!(attributed <= portion);
    }

    #[test]
    fn proportional_fee_with_zero_total_is_zero() {
        assert_eq!(
            proportional_fee(U256::from(10u64), U256::zero(), U256::zero()),
            U256::zero(),
        );
    }
}
