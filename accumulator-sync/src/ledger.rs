//! Persisted ledger records derived from accumulator state update events.
//!
//! Every record is created exactly once per logical on-chain occurrence
//! and never updated afterwards, with one exception: the verification hash
//! singleton, which is rewritten by every processed transaction. Records
//! reference each other by id (token hashes and composite byte keys), not
//! by ownership, so the stored ledger stays flat and append-only.

use primitive_types::U256;

use crate::event::TokenType;
use crate::hash::TokenHash;

pub mod memory;
pub mod traits;

mod serialization;

/// A deduplicated token descriptor record.
///
/// Content-addressed: the id is the token hash of the
/// `(type, address, sub id)` triple, so inserting the same descriptor
/// twice cannot create a second record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token hash of the descriptor triple.
    pub id: TokenHash,
    /// Token standard.
    pub token_type: TokenType,
    /// Token contract address.
    pub token_address: [u8; 20],
    /// Sub-identifier within the contract.
    pub token_sub_id: U256,
}

/// Preimage of a shield's note commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentPreimage {
    /// Composite key of the shield's tree coordinates.
    pub id: [u8; 64],
    /// Note public key of the note owner.
    pub npk: [u8; 32],
    /// Token record reference.
    pub token: TokenHash,
    /// Note value.
    pub value: U256,
}

/// Ciphertext of one transact-output commitment slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentCiphertext {
    /// Composite key of the slot's tree coordinates.
    pub id: [u8; 64],
    /// Encrypted note data.
    pub ciphertext: Vec<u8>,
    /// Blinded sender viewing key.
    pub blinded_sender_viewing_key: [u8; 32],
    /// Blinded receiver viewing key.
    pub blinded_receiver_viewing_key: [u8; 32],
}

/// A spent-note nullifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nullifier {
    /// Composite key of the spend tree and the nullifier integer.
    pub id: [u8; 64],
    /// Block number of the emitting log.
    pub block_number: u64,
    /// Block timestamp of the emitting log.
    pub block_timestamp: u64,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: [u8; 32],
    /// The spend tree: the historical tree the spent note belonged to.
    pub tree_number: u64,
    /// Nullifier value in event byte order.
    pub nullifier: [u8; 32],
}

/// A shield commitment: one new note created by an external deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldCommitment {
    /// Composite key of the shield's tree coordinates.
    pub id: [u8; 64],
    /// Block number of the emitting log.
    pub block_number: u64,
    /// Block timestamp of the emitting log.
    pub block_timestamp: u64,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: [u8; 32],
    /// UTXO tree the commitment was appended to.
    pub tree_number: u64,
    /// Position of the commitment within the tree.
    pub tree_position: u64,
    /// External address the deposit came from.
    pub from: [u8; 20],
    /// The note commitment hash.
    pub commitment_hash: [u8; 32],
    /// Commitment preimage record reference.
    pub preimage: [u8; 64],
    /// Encrypted note data blobs.
    pub encrypted_bundle: Vec<Vec<u8>>,
    /// Key the bundle was encrypted against.
    pub shield_key: [u8; 32],
    /// Treasury fee attributed to this shield.
    pub fee: U256,
}

/// A transact commitment: the batch of notes created by one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactCommitment {
    /// Composite key of the batch's starting tree coordinates.
    pub id: [u8; 64],
    /// Block number of the emitting log.
    pub block_number: u64,
    /// Block timestamp of the emitting log.
    pub block_timestamp: u64,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: [u8; 32],
    /// UTXO tree the commitments were appended to.
    pub tree_number: u64,
    /// Position of the batch's first commitment within the tree.
    pub batch_start_tree_position: u64,
    /// Index of the transaction within its batch event.
    pub transact_index: u64,
    /// Commitment hashes in batch order.
    pub hashes: Vec<[u8; 32]>,
    /// Commitment ciphertext record references, parallel to `hashes`.
    pub commitment_ciphertexts: Vec<[u8; 64]>,
    /// Opaque sender ciphertext shared by the batch's transactions.
    pub sender_ciphertext: Vec<u8>,
}

/// A withdrawal of pool value to an external address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unshield {
    /// Composite key of `(block number, log index, transact index)`.
    pub id: [u8; 96],
    /// Block number of the emitting log.
    pub block_number: u64,
    /// Block timestamp of the emitting log.
    pub block_timestamp: u64,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: [u8; 32],
    /// External address receiving the withdrawn value.
    pub to: [u8; 20],
    /// Token record reference.
    pub token: TokenHash,
    /// Withdrawn amount.
    pub amount: U256,
    /// Treasury fee attributed to this unshield.
    pub fee: U256,
    /// Index of the unshielding transaction within its batch event.
    pub transact_commitment_batch_index: u64,
}

/// The normalized view of one shielded pool transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RailgunTransaction {
    /// Composite key of `(block number, log index, transact index)`.
    pub id: [u8; 96],
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: [u8; 32],
    /// Block number of the emitting log.
    pub block_number: u64,
    /// Block timestamp of the emitting log.
    pub block_timestamp: u64,
    /// Nullifiers of the notes spent, in transaction order.
    pub nullifiers: Vec<[u8; 32]>,
    /// Commitment hashes produced, with the synthetic unshield note hash
    /// appended when the transaction unshields.
    pub commitments: Vec<[u8; 32]>,
    /// Hash binding the transaction's remaining parameters to its proof.
    pub bound_params_hash: [u8; 32],
    /// Whether the transaction carries a nonzero unshield.
    pub has_unshield: bool,
    /// The spend tree the transaction's notes belonged to.
    pub utxo_tree_in: u64,
    /// The tree its commitments were appended to, or the unshield-only
    /// sentinel.
    pub utxo_tree_out: u64,
    /// Starting position of its commitments, or the unshield-only
    /// sentinel.
    pub utxo_batch_start_position_out: u64,
    /// Token record reference of the unshield preimage.
    pub unshield_token: TokenHash,
    /// Unshield destination: the last 20 bytes of the preimage owner key.
    pub unshield_to_address: [u8; 20],
    /// Unshield value (zero when the transaction does not unshield).
    pub unshield_value: U256,
    /// Verification hash chain value after including this transaction's
    /// first nullifier.
    pub verification_hash: [u8; 32],
}
