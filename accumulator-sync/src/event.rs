//! Decoded accumulator state update event shapes.
//!
//! One [`AccumulatorStateUpdate`] is produced per on-chain log by an
//! external event decoder and consumed whole by the reducer. Decoding raw
//! log bytes into these shapes is out of scope here; the types below are
//! the inbound interface contract.

use primitive_types::U256;

use crate::error::UnknownTokenType;

/// One decoded accumulator state update batch event.
///
/// Batches the shielded pool activity of a single on-chain log: new
/// transactions (spending nullifiers, producing commitments, possibly a
/// partial unshield), new shields (external deposits) and treasury fee
/// settlements, together with the ambient block metadata of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatorStateUpdate {
    /// UTXO tree index the batch starts appending commitments to.
    pub accumulator_number: u64,
    /// Position within the starting tree of the batch's first commitment.
    pub start_position: u64,
    /// The batched pool activity.
    pub update: StateUpdate,
    /// Block number of the emitting log.
    pub block_number: u64,
    /// Block timestamp of the emitting log.
    pub block_timestamp: u64,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: [u8; 32],
    /// Index of the log within its block.
    pub log_index: u64,
}

/// The batched pool activity carried by one state update event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    /// Commitment hashes appended by the batch's transactions, flattened
    /// in transaction order.
    pub commitments: Vec<[u8; 32]>,
    /// Transactions in batch order.
    pub transactions: Vec<PoolTransaction>,
    /// Shields in batch order.
    pub shields: Vec<Shield>,
    /// Commitment ciphertexts, parallel to `commitments`.
    pub commitment_ciphertext: Vec<CiphertextData>,
    /// Aggregate treasury fees settled by this batch, one entry per token.
    pub treasury_fees: Vec<TreasuryFee>,
    /// Opaque sender ciphertext shared by the batch's transactions.
    pub sender_ciphertext: Vec<u8>,
}

/// One shielded pool transaction within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTransaction {
    /// Nullifiers of the notes spent by this transaction.
    pub nullifiers: Vec<[u8; 32]>,
    /// Number of ordinary commitments this transaction appends.
    pub commitments_count: u32,
    /// UTXO tree the spent notes belonged to.
    pub spend_accumulator_number: u64,
    /// Unshield preimage; a zero value means the transaction does not
    /// unshield.
    pub unshield_preimage: NotePreimage,
    /// Hash binding the transaction's non-nullifier, non-commitment
    /// parameters to its proof.
    pub bound_params_hash: [u8; 32],
}

/// One shield (external deposit into the pool) within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shield {
    /// External address the deposit came from.
    pub from: [u8; 20],
    /// Preimage of the commitment the shield produces.
    pub preimage: NotePreimage,
    /// Encrypted note data for the recipient.
    pub ciphertext: ShieldCiphertext,
}

/// Preimage of a note commitment.
///
/// Carried both by shields (the note being created) and by transactions
/// (the note being unshielded, zero-valued when the transaction does not
/// unshield).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePreimage {
    /// Note public key of the note owner, little-endian byte order.
    pub npk: [u8; 32],
    /// The note's token.
    pub token: TokenDescriptor,
    /// The note's value.
    pub value: U256,
}

/// Encrypted bundle attached to a shield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldCiphertext {
    /// Encrypted note data blobs.
    pub encrypted_bundle: Vec<Vec<u8>>,
    /// Key the bundle was encrypted against.
    pub shield_key: [u8; 32],
}

/// Ciphertext attached to one transact-output commitment slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextData {
    /// Encrypted note data.
    pub ciphertext: Vec<u8>,
    /// Blinded sender viewing key.
    pub blinded_sender_viewing_key: [u8; 32],
    /// Blinded receiver viewing key.
    pub blinded_receiver_viewing_key: [u8; 32],
}

/// One aggregate treasury fee settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasuryFee {
    /// Token hash the fee was charged in.
    pub token_id: [u8; 32],
    /// Aggregate fee amount for the batch.
    pub fee: U256,
}

/// On-chain token descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    /// Token standard.
    pub token_type: TokenType,
    /// Token contract address.
    pub token_address: [u8; 20],
    /// Sub-identifier within the contract (zero for fungible tokens).
    pub token_sub_id: U256,
}

/// Token standard of a [`TokenDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Fungible ERC20 token.
    Erc20,
    /// Non-fungible ERC721 token.
    Erc721,
    /// Semi-fungible ERC1155 token.
    Erc1155,
}

impl TryFrom<u8> for TokenType {
    type Error = UnknownTokenType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Erc20),
            1 => Ok(Self::Erc721),
            2 => Ok(Self::Erc1155),
            unknown => Err(UnknownTokenType(unknown)),
        }
    }
}

impl From<TokenType> for u8 {
    fn from(token_type: TokenType) -> Self {
        match token_type {
            TokenType::Erc20 => 0,
            TokenType::Erc721 => 1,
            TokenType::Erc1155 => 2,
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Erc20 => write!(f, "ERC20"),
            Self::Erc721 => write!(f, "ERC721"),
            Self::Erc1155 => write!(f, "ERC1155"),
        }
    }
}
