//! Accumulator sync error module

/// Top level error enumerating any error that may occur while applying a
/// batch event to the ledger.
#[derive(Debug, thiserror::Error)]
pub enum IndexError<E>
where
    E: std::fmt::Debug + std::fmt::Display,
{
    /// Reduce error.
    #[error("reduce error. {0}")]
    ReduceError(#[from] ReduceError),
    /// Ledger store error.
    #[error("ledger error. {0}")]
    LedgerError(E),
}

/// Errors that may occur while reducing a batch event into derived records.
///
/// Every variant is fatal for the whole batch. No records are written when
/// reduction fails and the caller is expected to halt the event source
/// instead of skipping the event, as skipping would desynchronise the tree
/// position cursor and the verification hash chain for all subsequent
/// events.
#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    /// Sliced commitment hashes disagree with the declared count.
    #[error(
        "commitment hashes length does not match commitments count. expected {expected}, found {found}"
    )]
    CommitmentHashesLengthMismatch {
        /// Declared commitment count
        expected: usize,
        /// Commitment hashes available in the batch slice
        found: usize,
    },
    /// Sliced commitment ciphertexts disagree with the declared count.
    #[error(
        "commitment ciphertexts length does not match commitments count. expected {expected}, found {found}"
    )]
    CommitmentCiphertextsLengthMismatch {
        /// Declared commitment count
        expected: usize,
        /// Commitment ciphertexts available in the batch slice
        found: usize,
    },
    /// An ERC20 shield or unshield references a token absent from the
    /// treasury fee map.
    #[error("expected treasury fee entry for token hash {token_hash}")]
    MissingTreasuryFeeEntry {
        /// Lowercase hex encoding of the token hash
        token_hash: String,
    },
    /// Transaction carries no nullifiers, so the verification hash chain
    /// cannot be extended.
    #[error("transaction {transact_index} carries no nullifiers")]
    TransactionWithoutNullifiers {
        /// Index of the transaction within the batch
        transact_index: u64,
    },
    /// Hash error.
    #[error("hash error. {0}")]
    HashError(#[from] HashError),
}

/// Errors returned by the external hash primitives.
///
/// The field hash is an external collaborator (an on-chain precompile or a
/// native gadget supplied by the host process); any failure it reports is
/// unrecoverable for the batch.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The 3-input field hash call failed or reverted.
    #[error("field hash call failed. {reason}")]
    FieldHashFailed {
        /// Reason reported by the primitive
        reason: String,
    },
    /// The token hash call failed or reverted.
    #[error("token hash call failed. {reason}")]
    TokenHashFailed {
        /// Reason reported by the primitive
        reason: String,
    },
}

/// Unknown token type discriminant.
///
/// Returned when decoding a token type byte that is not one of the known
/// token standards.
#[derive(Debug, thiserror::Error)]
#[error("unknown token type. {0}")]
pub struct UnknownTokenType(pub u8);
