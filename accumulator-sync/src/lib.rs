#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = r#"
# Accumulator Sync

## Overview
Accumulator-sync is a rust-based sync engine library deriving a canonical,
replayable shielded-pool ledger from a stream of append-only accumulator
state update events, providing the following:
- Deterministic expansion of each batch event into normalized records:
  nullifiers, transact commitments, commitment ciphertexts, shield
  commitments, commitment preimages, unshields, railgun transactions and
  deduplicated tokens.
- Rolling UTXO tree position bookkeeping, wrapping across fixed-capacity
  trees, shared by the transaction and shield phases of every batch.
- Treasury fee apportionment per token between the shielding and
  unshielding sides, reproduced exactly including its rounding behavior.
- A global verification hash chain over the sequence of every
  transaction's first nullifier, proving processing order.
- Atomic batch application: each event's records commit together or not at
  all, through a store trait family any wallet or database backend can
  implement.

## Terminology
- Shield - deposit of external value into the private pool, producing one
  new commitment.
- Unshield - withdrawal of pool value to an external address, consuming
  pool balance without necessarily producing a new commitment.
- Nullifier - a one-time value proving a specific note was spent,
  preventing double-spend.
- Commitment - a hash sealing a note's contents; published on-chain, never
  revealing its plaintext.
- UTXO tree - a fixed-capacity append-only structure of commitments; a new
  tree begins when the current one is full.
- Treasury fee - a protocol fee charged per token per batch, apportioned
  between the shielding and unshielding sides.
- Verification hash chain - a running hash over successive transactions'
  first nullifiers, used to prove processing order and inclusion.

## Processing
1. Decode one accumulator state update log into the typed event shapes
   (external to this crate).
2. Build the batch's treasury fee map from its transactions, shields and
   aggregate fee entries.
3. Walk the transactions in order: verify each one's commitment slice
   against its declared count, extend the verification hash chain with its
   first nullifier, emit its derived records and advance the tree cursor
   by its commitment count.
4. Walk the shields in order, continuing from the same cursor: compute
   each note commitment hash, attribute its fee portion and emit its
   records, advancing the cursor by one.
5. Commit every derived record and the final chain value to the store.

Batches must be applied strictly in block/log order, exactly once. Every
failure is fatal for its whole batch: nothing is written and the caller is
expected to halt the event source, since skipping an event would
desynchronise the tree cursor and the verification hash chain for
everything after it.
"#]

pub mod error;
pub mod event;
pub mod fees;
pub mod hash;
pub mod id;
pub mod ledger;
pub mod reduce;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod testutils;

pub use reduce::apply_state_update;
